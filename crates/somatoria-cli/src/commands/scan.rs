//! The `somatoria scan` command.

use std::path::PathBuf;

use anyhow::Result;

use somatoria_core::engine::{MergePolicy, PageScan, ScanEngine, ScanProgress, ScanReport};
use somatoria_ocr::config::load_config_from;
use somatoria_ocr::{create_provider, load_images, SomatoriaConfig};

use super::parse::print_detections;

/// Console progress reporter.
struct ConsoleProgress;

impl ScanProgress for ConsoleProgress {
    fn on_page_start(&self, position: usize, total: usize, source: &str) {
        eprintln!("  Reading [{position}/{total}] {source}");
    }

    fn on_page_complete(&self, page: &PageScan, total: usize) {
        eprintln!(
            "  Done [{}/{}] {}: {} answer(s) ({}ms)",
            page.position,
            total,
            page.source,
            page.detected.len(),
            page.latency_ms
        );
    }

    fn on_retry(&self, source: &str, attempt: u32, error: &str) {
        eprintln!("  RETRY: {source} (attempt {attempt}): {error}");
    }
}

pub async fn execute(
    images: Vec<PathBuf>,
    provider: Option<String>,
    merge: Option<MergePolicy>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(
        format == "text" || format == "json",
        "unknown format: {format} (expected text or json)"
    );
    let config = load_config_from(config_path.as_deref())?;
    let report = scan_images(&config, &images, provider.as_deref(), merge).await?;
    print_detections(&report.merged, &format)
}

/// Load the images, then run them through the configured OCR provider.
pub async fn scan_images(
    config: &SomatoriaConfig,
    images: &[PathBuf],
    provider: Option<&str>,
    merge: Option<MergePolicy>,
) -> Result<ScanReport> {
    let requests = load_images(images)?;
    anyhow::ensure!(
        !requests.is_empty(),
        "no images found in {}",
        describe_paths(images)
    );

    let (name, provider_config) = config.provider(provider)?;
    let provider = create_provider(&name, &provider_config)?;

    let mut scan_config = config.scan_config();
    if let Some(policy) = merge {
        scan_config.merge_policy = policy;
    }

    eprintln!(
        "somatoria v{}: reading {} image(s) with {} ({})",
        env!("CARGO_PKG_VERSION"),
        requests.len(),
        name,
        scan_config.merge_policy
    );

    let engine = ScanEngine::new(provider, scan_config);
    let report = engine.scan(&requests, &ConsoleProgress).await?;
    eprintln!(
        "  {} answer(s) detected in {:.1}s",
        report.merged.len(),
        report.duration_ms as f64 / 1000.0
    );
    Ok(report)
}

fn describe_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
