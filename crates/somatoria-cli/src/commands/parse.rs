//! The `somatoria parse` command.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};

use somatoria_core::parser::{parse_answers, ParsedAnswers};

pub fn execute(input: Option<PathBuf>, format: String) -> Result<()> {
    let text = match &input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };

    print_detections(&parse_answers(&text), &format)
}

/// Print detections as `Q1: 10 (2+8)` lines or as JSON.
pub fn print_detections(detections: &ParsedAnswers, format: &str) -> Result<()> {
    match format {
        "text" => {
            for entry in detections.entries() {
                let options: Vec<String> =
                    entry.answer.options().iter().map(u8::to_string).collect();
                let options = if options.is_empty() {
                    "blank".to_string()
                } else {
                    options.join("+")
                };
                println!("Q{}: {} ({options})", entry.question, entry.answer);
            }
            println!("{} answer(s) detected.", detections.len());
        }
        "json" => {
            let entries: Vec<_> = detections.entries().collect();
            let json = serde_json::json!({
                "count": detections.len(),
                "answers": entries,
                "sparse": detections.to_sparse_vec(),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        other => anyhow::bail!("unknown format: {other} (expected text or json)"),
    }
    Ok(())
}
