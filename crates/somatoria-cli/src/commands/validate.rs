//! The `somatoria validate` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(exam_path: PathBuf) -> Result<()> {
    let exams = if exam_path.is_dir() {
        somatoria_core::exam::load_exam_directory(&exam_path)?
    } else {
        vec![somatoria_core::exam::parse_exam(&exam_path)?]
    };

    let mut total_warnings = 0;

    for exam in &exams {
        println!(
            "Exam: {} ({} questions, {} subjects)",
            exam.name,
            exam.question_count,
            exam.subjects.len()
        );

        let warnings = somatoria_core::exam::validate_exam(exam);
        for w in &warnings {
            let prefix = w
                .subject
                .as_ref()
                .map(|name| format!("  [{name}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if exams.is_empty() {
        println!("No exam definitions found.");
    } else if total_warnings == 0 {
        println!("All exams valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
