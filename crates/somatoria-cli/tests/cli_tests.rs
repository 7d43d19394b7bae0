//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use somatoria_core::model::{ExamDefinition, LanguageVariant};

fn somatoria() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("somatoria").unwrap();
    cmd.env_remove("GOOGLE_CLOUD_API_KEY");
    cmd
}

/// Answer text that matches the built-in key exactly.
fn perfect_answers(variant: LanguageVariant) -> String {
    ExamDefinition::pss2_2025(variant)
        .key
        .iter()
        .enumerate()
        .map(|(i, k)| format!("{}) {}\n", i + 1, k))
        .collect()
}

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn only_file_with_extension(dir: &Path, ext: &str) -> std::path::PathBuf {
    let files: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|e| e == ext))
        .collect();
    assert_eq!(files.len(), 1, "expected one .{ext} file, got {files:?}");
    files.into_iter().next().unwrap()
}

const MOCK_CONFIG: &str = r#"
default_provider = "offline"
retry_delay_ms = 1

[providers.offline]
type = "mock"
pages = ["1) 6\n2) 10\n3) 3", "3) 1\n4) 13"]
"#;

// --- validate ---

#[test]
fn validate_bundled_exam() {
    somatoria()
        .arg("validate")
        .arg("--exam")
        .arg("../../exams/pss2-2025-ingles.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("60 questions, 12 subjects"))
        .stdout(predicate::str::contains("All exams valid"));
}

#[test]
fn validate_directory() {
    somatoria()
        .arg("validate")
        .arg("--exam")
        .arg("../../exams")
        .assert()
        .success()
        .stdout(predicate::str::contains("PSS 2 2025 (Inglês)"))
        .stdout(predicate::str::contains("PSS 2 2025 (Espanhol)"));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "holes.toml",
        r#"
[exam]
id = "holes"
name = "Holes"
key = [1, 2, 4, 8, 16, 31]

[[subjects]]
name = "First"
start = 1
end = 3

[[subjects]]
name = "First"
start = 3
end = 4
"#,
    );

    somatoria()
        .arg("validate")
        .arg("--exam")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[First] WARNING: duplicate subject name"))
        .stdout(predicate::str::contains("questions 5-6 belong to no subject"))
        .stdout(predicate::str::contains("question 3 belongs to more than one subject"));
}

#[test]
fn validate_nonexistent_file() {
    somatoria()
        .arg("validate")
        .arg("--exam")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

// --- init ---

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    somatoria()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created somatoria.toml"))
        .stdout(predicate::str::contains("Created exams/pss2-2025-ingles.toml"));

    assert!(dir.path().join("somatoria.toml").exists());

    // The generated exam is valid as written
    somatoria()
        .current_dir(dir.path())
        .arg("validate")
        .arg("--exam")
        .arg("exams/pss2-2025-ingles.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("All exams valid"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    somatoria()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    somatoria()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

// --- parse ---

#[test]
fn parse_structured_text_from_file() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "ocr.txt", "1) 10\n2) 15\nQ3: 7\n150) 99\n");

    somatoria()
        .arg("parse")
        .arg("--input")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Q1: 10 (2+8)"))
        .stdout(predicate::str::contains("Q3: 7 (1+2+4)"))
        .stdout(predicate::str::contains("3 answer(s) detected."));
}

#[test]
fn parse_flattened_text_from_stdin_as_json() {
    let output = somatoria()
        .arg("parse")
        .arg("--format")
        .arg("json")
        .write_stdin("5 12 6 9")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["count"], 2);
    assert_eq!(json["answers"][0]["question"], 5);
    assert_eq!(json["answers"][0]["answer"], 12);
    assert_eq!(json["sparse"][4], 12);
    assert!(json["sparse"][0].is_null());
}

#[test]
fn parse_rejects_unknown_format() {
    somatoria()
        .arg("parse")
        .arg("--format")
        .arg("yaml")
        .write_stdin("1) 1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format"));
}

// --- grade ---

#[test]
fn grade_perfect_sheet_with_preset() {
    let dir = TempDir::new().unwrap();
    let answers = write(dir.path(), "answers.txt", &perfect_answers(LanguageVariant::Ingles));

    somatoria()
        .current_dir(dir.path())
        .arg("grade")
        .arg("--preset")
        .arg("ingles")
        .arg("--answers")
        .arg(&answers)
        .arg("--student")
        .arg("Ana")
        .assert()
        .success()
        .stdout(predicate::str::contains("Student: Ana"))
        .stdout(predicate::str::contains("Língua Portuguesa"))
        .stdout(predicate::str::contains("75.0 / 75"))
        .stdout(predicate::str::contains("Total: 900.0 / 900 (60 correct, 0 partial, 0 incorrect)"));
}

#[test]
fn grade_partial_credit_with_fewer_questions() {
    let dir = TempDir::new().unwrap();
    // Key: 6, 10, 3, 13, 11
    let answers = write(dir.path(), "answers.txt", "1) 2\n2) 10\n3) 7\n");

    somatoria()
        .current_dir(dir.path())
        .arg("grade")
        .arg("--exam")
        .arg(Path::new(env!("CARGO_MANIFEST_DIR")).join("../../exams/pss2-2025-espanhol.toml"))
        .arg("--questions")
        .arg("5")
        .arg("--answers")
        .arg(&answers)
        .assert()
        .success()
        .stdout(predicate::str::contains("1.50 / 5"))
        .stdout(predicate::str::contains("22.5 / 75"))
        .stdout(predicate::str::contains("(1 correct, 1 partial, 3 incorrect)"));
}

#[test]
fn grade_writes_json_report() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("reports");
    let answers = write(dir.path(), "answers.txt", &perfect_answers(LanguageVariant::Espanhol));

    somatoria()
        .current_dir(dir.path())
        .arg("grade")
        .arg("--preset")
        .arg("espanhol")
        .arg("--answers")
        .arg(&answers)
        .arg("--format")
        .arg("json")
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("Results saved to"));

    let path = only_file_with_extension(&out, "json");
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(json["exam"]["id"], "pss2-2025-espanhol");
    assert_eq!(json["result"]["total_points"], 900.0);
    assert_eq!(json["result"]["subjects"].as_array().unwrap().len(), 12);
    assert_eq!(json["detected_answers"], 0);
}

#[test]
fn grade_all_formats() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("reports");

    somatoria()
        .current_dir(dir.path())
        .arg("grade")
        .arg("--preset")
        .arg("ingles")
        .arg("--format")
        .arg("all")
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: 0.0 / 900"));

    let html = std::fs::read_to_string(only_file_with_extension(&out, "html")).unwrap();
    assert!(html.contains("class=\"cell incorrect\""));
    only_file_with_extension(&out, "json");
    only_file_with_extension(&out, "md");
}

#[test]
fn grade_requires_exam_or_preset() {
    somatoria()
        .arg("grade")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--exam"));
}

#[test]
fn grade_rejects_exam_and_preset_together() {
    somatoria()
        .arg("grade")
        .arg("--exam")
        .arg("../../exams/pss2-2025-ingles.toml")
        .arg("--preset")
        .arg("ingles")
        .assert()
        .failure();
}

#[test]
fn grade_rejects_bad_question_count() {
    let dir = TempDir::new().unwrap();
    somatoria()
        .current_dir(dir.path())
        .arg("grade")
        .arg("--preset")
        .arg("ingles")
        .arg("--questions")
        .arg("101")
        .assert()
        .failure()
        .stderr(predicate::str::contains("101"));
}

#[test]
fn grade_rejects_unknown_format() {
    let dir = TempDir::new().unwrap();
    somatoria()
        .current_dir(dir.path())
        .arg("grade")
        .arg("--preset")
        .arg("ingles")
        .arg("--format")
        .arg("text,pdf")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format: pdf"));
}

#[test]
fn grade_rejects_unknown_preset() {
    somatoria()
        .arg("grade")
        .arg("--preset")
        .arg("frances")
        .assert()
        .failure();
}

// --- scan / OCR ---

#[test]
fn scan_merges_pages_last_wins() {
    let dir = TempDir::new().unwrap();
    let config = write(dir.path(), "somatoria.toml", MOCK_CONFIG);
    let a = write(dir.path(), "a.jpg", "fake");
    let b = write(dir.path(), "b.jpg", "fake");

    somatoria()
        .current_dir(dir.path())
        .arg("scan")
        .arg("--image")
        .arg(&a)
        .arg(&b)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Q3: 1 (1)"))
        .stdout(predicate::str::contains("Q4: 13 (1+4+8)"))
        .stdout(predicate::str::contains("4 answer(s) detected."))
        .stderr(predicate::str::contains("Reading [2/2]"));
}

#[test]
fn scan_first_wins_keeps_earlier_detection() {
    let dir = TempDir::new().unwrap();
    let config = write(dir.path(), "somatoria.toml", MOCK_CONFIG);
    let a = write(dir.path(), "a.png", "fake");
    let b = write(dir.path(), "b.png", "fake");

    somatoria()
        .current_dir(dir.path())
        .arg("scan")
        .arg("--image")
        .arg(&a)
        .arg(&b)
        .arg("--merge")
        .arg("first-wins")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Q3: 3 (1+2)"));
}

#[test]
fn scan_skips_non_images() {
    let dir = TempDir::new().unwrap();
    let config = write(dir.path(), "somatoria.toml", MOCK_CONFIG);
    let notes = write(dir.path(), "notes.txt", "1) 1");

    somatoria()
        .current_dir(dir.path())
        .arg("scan")
        .arg("--image")
        .arg(&notes)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no images found"));
}

#[test]
fn scan_without_api_key_fails() {
    let dir = TempDir::new().unwrap();
    let config = write(dir.path(), "somatoria.toml", "max_retries = 0\n");
    let image = write(dir.path(), "sheet.jpg", "fake");

    somatoria()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .arg("scan")
        .arg("--image")
        .arg(&image)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key not configured"));
}

#[test]
fn grade_with_ocr_detections() {
    let dir = TempDir::new().unwrap();
    let config = write(dir.path(), "somatoria.toml", MOCK_CONFIG);
    let out = dir.path().join("reports");
    let image = write(dir.path(), "sheet.jpeg", "fake");
    // Typed answers are overwritten by OCR for the same question
    let answers = write(dir.path(), "answers.txt", "1) 1\n10) 15\n");

    somatoria()
        .current_dir(dir.path())
        .arg("grade")
        .arg("--preset")
        .arg("ingles")
        .arg("--answers")
        .arg(&answers)
        .arg("--image")
        .arg(&image)
        .arg("--config")
        .arg(&config)
        .arg("--format")
        .arg("json")
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    let json: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(only_file_with_extension(&out, "json")).unwrap(),
    )
    .unwrap();
    assert_eq!(json["detected_answers"], 3);
    let questions = json["result"]["questions"].as_array().unwrap();
    assert_eq!(questions[0]["answer"], 6);
    assert_eq!(questions[0]["classification"], "correct");
    assert_eq!(questions[9]["answer"], 15);
}

// --- meta ---

#[test]
fn help_output() {
    somatoria()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Sum-coded answer-sheet grader"));
}

#[test]
fn version_output() {
    somatoria()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("somatoria"));
}
