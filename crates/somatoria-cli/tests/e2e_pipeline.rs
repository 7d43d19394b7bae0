//! End-to-end pipeline tests: OCR text through parsing, merging, grading and
//! reporting, using the mock OCR provider.

use std::sync::Arc;
use std::time::Duration;

use somatoria_core::engine::{MergePolicy, NoopProgress, ScanConfig, ScanEngine};
use somatoria_core::model::{ExamDefinition, LanguageVariant};
use somatoria_core::report::GradeReport;
use somatoria_core::scoring::Classification;
use somatoria_core::session::GradingSession;
use somatoria_core::traits::OcrRequest;
use somatoria_ocr::mock::MockOcrProvider;
use somatoria_report::html::generate_html;

fn config(policy: MergePolicy) -> ScanConfig {
    ScanConfig {
        max_retries: 0,
        retry_delay: Duration::from_millis(1),
        merge_policy: policy,
    }
}

fn pages(n: usize) -> Vec<OcrRequest> {
    (1..=n)
        .map(|i| OcrRequest::new("data:image/png;base64,aGk=").with_source(format!("page{i}.png")))
        .collect()
}

/// OCR text for the whole PSS 2 sheet, answered perfectly.
fn perfect_sheet_text(exam: &ExamDefinition) -> String {
    exam.key
        .iter()
        .enumerate()
        .map(|(i, k)| format!("{}) {}\n", i + 1, k))
        .collect()
}

#[tokio::test]
async fn e2e_perfect_sheet_over_two_photos() {
    let exam = ExamDefinition::pss2_2025(LanguageVariant::Ingles);
    let text = perfect_sheet_text(&exam);
    let lines: Vec<&str> = text.lines().collect();
    let (front, back) = lines.split_at(30);

    let provider = Arc::new(MockOcrProvider::with_pages(vec![
        front.join("\n"),
        back.join("\n"),
    ]));
    let engine = ScanEngine::new(provider.clone(), config(MergePolicy::LastWins));
    let scan = engine.scan(&pages(2), &NoopProgress).await.unwrap();
    assert_eq!(provider.call_count(), 2);
    assert_eq!(scan.merged.len(), 60);

    let mut session = GradingSession::new(exam).unwrap();
    assert_eq!(session.apply_detections(&scan.merged), 60);

    let result = session.grade();
    assert_eq!(result.count(Classification::Correct), 60);
    assert_eq!(result.total_points, 900.0);
    assert!(result.subjects.iter().all(|s| s.points == 75.0));
}

#[tokio::test]
async fn e2e_flattened_ocr_text_with_partial_credit() {
    // Key 1..5 for the Spanish sheet: 6, 10, 3, 13, 11
    let exam = ExamDefinition::pss2_2025(LanguageVariant::Espanhol).with_question_count(5);
    let provider = Arc::new(MockOcrProvider::with_fixed_text("1 6 2 8 3 3 4 12 5 11"));

    let engine = ScanEngine::new(provider, config(MergePolicy::LastWins));
    let scan = engine.scan(&pages(1), &NoopProgress).await.unwrap();

    let mut session = GradingSession::new(exam).unwrap();
    session.apply_detections(&scan.merged);
    let result = session.grade();

    let classes: Vec<Classification> = result.questions.iter().map(|q| q.classification).collect();
    assert_eq!(
        classes,
        vec![
            Classification::Correct,
            Classification::Partial,
            Classification::Correct,
            Classification::Partial,
            Classification::Correct,
        ]
    );
    // 1 + 1/2 + 1 + 2/3 + 1
    assert!((result.raw_score - (3.0 + 0.5 + 2.0 / 3.0)).abs() < 1e-9);

    let subject_sum: f64 = result.subjects.iter().map(|s| s.raw_score).sum();
    assert!((subject_sum - result.raw_score).abs() < 1e-9);
}

#[tokio::test]
async fn e2e_detections_past_question_count_are_ignored() {
    let exam = ExamDefinition::pss2_2025(LanguageVariant::Ingles).with_question_count(10);
    let provider = Arc::new(MockOcrProvider::with_fixed_text("1) 6\n11) 3\n60) 5"));

    let engine = ScanEngine::new(provider, config(MergePolicy::FirstWins));
    let scan = engine.scan(&pages(1), &NoopProgress).await.unwrap();
    assert_eq!(scan.merged.len(), 3);

    let mut session = GradingSession::new(exam).unwrap();
    assert_eq!(session.apply_detections(&scan.merged), 1);
    assert_eq!(session.grade().count(Classification::Correct), 1);
}

#[tokio::test]
async fn e2e_report_round_trip_and_html() {
    let exam = ExamDefinition::pss2_2025(LanguageVariant::Ingles);
    let provider = Arc::new(MockOcrProvider::with_fixed_text("1) 6\n2) 2\n3) 4"));
    let engine = ScanEngine::new(provider, config(MergePolicy::LastWins));
    let scan = engine.scan(&pages(1), &NoopProgress).await.unwrap();

    let mut session = GradingSession::new(exam).unwrap();
    let detected = session.apply_detections(&scan.merged);
    let report = GradeReport::new(session.exam(), session.grade())
        .with_student(Some("Turma B".into()))
        .with_detected_answers(detected);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    report.save_json(&path).unwrap();
    let loaded = GradeReport::load_json(&path).unwrap();
    assert_eq!(loaded.detected_answers, 3);
    assert_eq!(loaded.result.questions[1].classification, Classification::Partial);
    assert_eq!(loaded.result.questions[2].classification, Classification::Incorrect);

    let html = generate_html(&loaded);
    assert!(html.contains("Turma B"));
    assert!(html.contains("Q2: 0.50 (50%)"));
}

#[tokio::test]
async fn e2e_blank_page_grades_zero() {
    let exam = ExamDefinition::pss2_2025(LanguageVariant::Ingles);
    let provider = Arc::new(MockOcrProvider::with_pages(vec![]));
    let engine = ScanEngine::new(provider, config(MergePolicy::LastWins));
    let scan = engine.scan(&pages(1), &NoopProgress).await.unwrap();
    assert!(scan.merged.is_empty());
    assert_eq!(scan.pages[0].text, "");

    let session = GradingSession::new(exam).unwrap();
    assert_eq!(session.grade().total_points, 0.0);
}
