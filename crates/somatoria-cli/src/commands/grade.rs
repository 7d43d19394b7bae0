//! The `somatoria grade` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use somatoria_core::engine::MergePolicy;
use somatoria_core::exam::parse_exam;
use somatoria_core::model::{ExamDefinition, LanguageVariant};
use somatoria_core::parser::parse_answers;
use somatoria_core::report::GradeReport;
use somatoria_core::scoring::Classification;
use somatoria_core::session::GradingSession;
use somatoria_ocr::config::load_config_from;
use somatoria_report::html::write_html_report;

use super::scan::scan_images;

/// Arguments for `somatoria grade`.
pub struct GradeArgs {
    pub exam: Option<PathBuf>,
    pub preset: Option<LanguageVariant>,
    pub questions: Option<usize>,
    pub answers: Option<PathBuf>,
    pub images: Vec<PathBuf>,
    pub student: Option<String>,
    pub provider: Option<String>,
    pub merge: Option<MergePolicy>,
    pub format: String,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

const FORMATS: [&str; 4] = ["text", "json", "html", "markdown"];

pub async fn execute(args: GradeArgs) -> Result<()> {
    let formats: Vec<&str> = if args.format == "all" {
        FORMATS.to_vec()
    } else {
        args.format.split(',').map(str::trim).collect()
    };
    if let Some(unknown) = formats.iter().find(|f| !FORMATS.contains(*f)) {
        anyhow::bail!("unknown format: {unknown} (expected one of text, json, html, markdown, all)");
    }

    let config = load_config_from(args.config.as_deref())?;

    let exam = match (&args.exam, args.preset) {
        (Some(path), _) => parse_exam(path)?,
        (None, Some(variant)) => ExamDefinition::pss2_2025(variant),
        (None, None) => anyhow::bail!("either --exam or --preset is required"),
    };

    let mut session = GradingSession::new(exam)?;
    if let Some(count) = args.questions {
        session.resize(count)?;
    }

    // Typed answers first; OCR detections overwrite them.
    let mut detected = 0;
    if let Some(path) = &args.answers {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read answers: {}", path.display()))?;
        let filled = session.apply_detections(&parse_answers(&text));
        tracing::info!(filled, "answers loaded from {}", path.display());
    }
    if !args.images.is_empty() {
        let scan = scan_images(&config, &args.images, args.provider.as_deref(), args.merge).await?;
        detected = session.apply_detections(&scan.merged);
    }

    let result = session.grade();
    let report = GradeReport::new(session.exam(), result)
        .with_student(args.student)
        .with_detected_answers(detected);

    let output = args.output.unwrap_or_else(|| config.output_dir.clone());
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
    let stem = format!("grade-{}-{timestamp}", report.exam.id);

    for fmt in &formats {
        match *fmt {
            "text" => print_summary(&report),
            "json" => {
                let path = output.join(format!("{stem}.json"));
                report.save_json(&path)?;
                eprintln!("Results saved to: {}", path.display());
            }
            "html" => {
                let path = output.join(format!("{stem}.html"));
                write_html_report(&report, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            "markdown" => {
                let path = output.join(format!("{stem}.md"));
                std::fs::create_dir_all(&output)?;
                std::fs::write(&path, report.to_markdown())
                    .with_context(|| format!("failed to write {}", path.display()))?;
                eprintln!("Markdown report: {}", path.display());
            }
            other => anyhow::bail!("unknown format: {other}"),
        }
    }

    Ok(())
}

fn print_summary(report: &GradeReport) {
    use comfy_table::{Cell, Table};

    let result = &report.result;
    let mut table = Table::new();
    table.set_header(vec!["Subject", "Questions", "Score", "Points"]);

    for s in &result.subjects {
        table.add_row(vec![
            Cell::new(&s.name),
            Cell::new(format!("{}-{}", s.start, s.end)),
            Cell::new(s.score_label()),
            Cell::new(s.points_label()),
        ]);
    }

    println!("{}", report.exam.name);
    if let Some(student) = &report.student {
        println!("Student: {student}");
    }
    println!("{table}");
    if !result.unassigned_questions.is_empty() {
        println!(
            "Questions outside every subject: {:?}",
            result.unassigned_questions
        );
    }
    println!(
        "Total: {} ({} correct, {} partial, {} incorrect)",
        result.total_label(),
        result.count(Classification::Correct),
        result.count(Classification::Partial),
        result.count(Classification::Incorrect),
    );
}
