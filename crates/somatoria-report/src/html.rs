//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS inlined.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;

use somatoria_core::mask::AnswerMask;
use somatoria_core::report::GradeReport;
use somatoria_core::scoring::{Classification, QuestionResult};

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// `1+2+4`, or `-` for a blank mask.
fn format_options(mask: AnswerMask) -> String {
    if mask.is_empty() {
        return "-".to_string();
    }
    mask.options()
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join("+")
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn css_class(classification: Classification) -> &'static str {
    match classification {
        Classification::Correct => "correct",
        Classification::Partial => "partial",
        Classification::Incorrect => "incorrect",
    }
}

/// Tooltip for one grid cell.
fn question_tooltip(q: &QuestionResult) -> String {
    format!(
        "{} | key {} = {} | answer {} = {}",
        q.summary(),
        q.key,
        format_options(q.key),
        q.answer,
        format_options(q.answer)
    )
}

/// Generate an HTML report from a grade report.
pub fn generate_html(report: &GradeReport) -> String {
    let result = &report.result;
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"pt-BR\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>somatoria: {}</title>\n",
        html_escape(&report.exam.name)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", html_escape(&report.exam.name)));
    let student = report
        .student
        .as_deref()
        .map(|s| format!("Student: <strong>{}</strong> | ", html_escape(s)))
        .unwrap_or_default();
    html.push_str(&format!(
        "<p class=\"meta\">{}{} questions | {} points each | {}</p>\n",
        student,
        report.exam.question_count,
        result.points_per_question,
        format_timestamp(&report.created_at)
    ));
    html.push_str("</header>\n");

    // Final score
    html.push_str("<section class=\"total\">\n");
    html.push_str(&format!(
        "<p class=\"score\">{}</p>\n",
        html_escape(&result.total_label())
    ));
    html.push_str(&format!(
        "<p class=\"meta\">{} correct | {} partial | {} incorrect | {} answers detected by OCR</p>\n",
        result.count(Classification::Correct),
        result.count(Classification::Partial),
        result.count(Classification::Incorrect),
        report.detected_answers
    ));
    html.push_str("</section>\n");

    // Subject table
    html.push_str("<section class=\"subjects\">\n");
    html.push_str("<h2>Performance by subject</h2>\n");
    html.push_str("<table>\n");
    html.push_str("<thead><tr><th>Subject</th><th>Questions</th><th>Score</th><th>Points</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for s in &result.subjects {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}-{}</td><td>{}</td><td>{}</td></tr>\n",
            html_escape(&s.name),
            s.start,
            s.end,
            s.score_label(),
            s.points_label()
        ));
    }
    html.push_str("</tbody></table>\n");
    if !result.unassigned_questions.is_empty() {
        let list: Vec<String> = result
            .unassigned_questions
            .iter()
            .map(usize::to_string)
            .collect();
        html.push_str(&format!(
            "<p class=\"meta\">Questions outside every subject: {}</p>\n",
            list.join(", ")
        ));
    }
    html.push_str("</section>\n");

    // Per-question grid
    html.push_str("<section class=\"questions\">\n");
    html.push_str("<h2>Questions</h2>\n");
    html.push_str("<div class=\"grid\">\n");
    for q in &result.questions {
        html.push_str(&format!(
            "<div class=\"cell {}\" title=\"{}\"><span class=\"num\">{}</span><span class=\"ans\">{}</span></div>\n",
            css_class(q.classification),
            html_escape(&question_tooltip(q)),
            q.number,
            q.answer
        ));
    }
    html.push_str("</div>\n");
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &GradeReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --correct: #dcfce7; --partial: #fef9c3; --incorrect: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --correct: #064e3b; --partial: #713f12; --incorrect: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.score { font-size: 2.5rem; font-weight: bold; margin: 0.5rem 0; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); }
.grid { display: grid; grid-template-columns: repeat(10, minmax(3rem, 1fr)); gap: 0.4rem; }
.cell { border: 1px solid var(--border); border-radius: 6px; padding: 0.4rem; text-align: center; cursor: default; }
.cell .num { display: block; font-size: 0.75rem; color: #6b7280; }
.cell .ans { font-weight: bold; }
.correct { background: var(--correct); }
.partial { background: var(--partial); }
.incorrect { background: var(--incorrect); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
"#;
