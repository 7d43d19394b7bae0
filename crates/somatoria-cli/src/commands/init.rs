//! The `somatoria init` command.

use anyhow::Result;

use somatoria_core::exam::render_exam_toml;
use somatoria_core::model::{ExamDefinition, LanguageVariant};

pub fn execute() -> Result<()> {
    // Create somatoria.toml
    if std::path::Path::new("somatoria.toml").exists() {
        println!("somatoria.toml already exists, skipping.");
    } else {
        std::fs::write("somatoria.toml", SAMPLE_CONFIG)?;
        println!("Created somatoria.toml");
    }

    // Create example exam definition
    std::fs::create_dir_all("exams")?;
    let example_path = std::path::Path::new("exams/pss2-2025-ingles.toml");
    if example_path.exists() {
        println!("exams/pss2-2025-ingles.toml already exists, skipping.");
    } else {
        let exam = ExamDefinition::pss2_2025(LanguageVariant::Ingles);
        std::fs::write(example_path, render_exam_toml(&exam)?)?;
        println!("Created exams/pss2-2025-ingles.toml");
    }

    println!("\nNext steps:");
    println!("  1. Export GOOGLE_CLOUD_API_KEY or edit somatoria.toml");
    println!("  2. Run: somatoria validate --exam exams/pss2-2025-ingles.toml");
    println!("  3. Run: somatoria grade --exam exams/pss2-2025-ingles.toml --image sheet.jpg");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# somatoria configuration

default_provider = "google-vision"
max_retries = 3
retry_delay_ms = 1000
merge_policy = "last-wins"
output_dir = "./somatoria-reports"

[providers.google-vision]
type = "google-vision"
api_key = "${GOOGLE_CLOUD_API_KEY}"
"#;
