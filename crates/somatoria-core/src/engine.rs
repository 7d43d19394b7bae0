//! Answer-sheet scan orchestrator.
//!
//! Sends each photographed page to an OCR provider, one after another in
//! input order, parses the recognized text and merges the detections.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::OcrError;
use crate::parser::{parse_answers, ParsedAnswers};
use crate::traits::{OcrProvider, OcrRequest, OcrResponse};

/// Upper bound for any single wait between attempts.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// How detections from several pages are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// A later page overwrites an earlier detection for the same question.
    #[default]
    LastWins,
    /// The first detection for a question is kept.
    FirstWins,
}

impl MergePolicy {
    /// Merge `incoming` into `merged`.
    pub fn merge(self, merged: &mut ParsedAnswers, incoming: &ParsedAnswers) {
        for entry in incoming.entries() {
            match self {
                MergePolicy::LastWins => {
                    merged.insert(entry);
                }
                MergePolicy::FirstWins => {
                    merged.insert_if_absent(entry);
                }
            }
        }
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergePolicy::LastWins => write!(f, "last-wins"),
            MergePolicy::FirstWins => write!(f, "first-wins"),
        }
    }
}

impl FromStr for MergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "last-wins" | "last" => Ok(MergePolicy::LastWins),
            "first-wins" | "first" => Ok(MergePolicy::FirstWins),
            other => Err(format!("unknown merge policy: {other}")),
        }
    }
}

/// Configuration for the scan engine.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Retries on transient provider errors.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub retry_delay: Duration,
    pub merge_policy: MergePolicy,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            merge_policy: MergePolicy::LastWins,
        }
    }
}

/// Progress reporting trait.
pub trait ScanProgress: Send + Sync {
    fn on_page_start(&self, position: usize, total: usize, source: &str);
    fn on_page_complete(&self, page: &PageScan, total: usize);
    fn on_retry(&self, source: &str, attempt: u32, error: &str);
}

/// No-op progress reporter.
pub struct NoopProgress;

impl ScanProgress for NoopProgress {
    fn on_page_start(&self, _: usize, _: usize, _: &str) {}
    fn on_page_complete(&self, _: &PageScan, _: usize) {}
    fn on_retry(&self, _: &str, _: u32, _: &str) {}
}

/// What was read from one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageScan {
    /// 1-based position in the batch.
    pub position: usize,
    pub source: String,
    pub text: String,
    pub detected: ParsedAnswers,
    pub latency_ms: u64,
    pub attempts: u32,
}

/// Result of scanning a batch of pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub provider: String,
    pub merge_policy: MergePolicy,
    pub pages: Vec<PageScan>,
    /// Detections from all pages, combined with `merge_policy`.
    pub merged: ParsedAnswers,
    pub duration_ms: u64,
}

/// Runs OCR over answer-sheet photos.
pub struct ScanEngine {
    provider: Arc<dyn OcrProvider>,
    config: ScanConfig,
}

impl ScanEngine {
    pub fn new(provider: Arc<dyn OcrProvider>, config: ScanConfig) -> Self {
        Self { provider, config }
    }

    /// Scan every page in order. The first page that still fails after
    /// retries aborts the batch.
    pub async fn scan(
        &self,
        pages: &[OcrRequest],
        progress: &dyn ScanProgress,
    ) -> Result<ScanReport> {
        let start = Instant::now();
        let total = pages.len();
        let mut merged = ParsedAnswers::new();
        let mut scans = Vec::with_capacity(total);

        for (i, request) in pages.iter().enumerate() {
            let position = i + 1;
            let source = request.label().to_string();
            progress.on_page_start(position, total, &source);

            let (response, attempts) = self
                .recognize_with_retry(request, progress)
                .await
                .with_context(|| format!("OCR failed for page {position}/{total} ({source})"))?;

            let detected = parse_answers(&response.text);
            tracing::info!(
                page = position,
                source = %source,
                detected = detected.len(),
                "page recognized"
            );
            self.config.merge_policy.merge(&mut merged, &detected);

            let page = PageScan {
                position,
                source,
                text: response.text,
                detected,
                latency_ms: response.latency_ms,
                attempts,
            };
            progress.on_page_complete(&page, total);
            scans.push(page);
        }

        Ok(ScanReport {
            provider: self.provider.name().to_string(),
            merge_policy: self.config.merge_policy,
            pages: scans,
            merged,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Retry on transient provider errors with exponential backoff.
    async fn recognize_with_retry(
        &self,
        request: &OcrRequest,
        progress: &dyn ScanProgress,
    ) -> Result<(OcrResponse, u32)> {
        let mut retry_delay = self.config.retry_delay;
        let mut last_error = None;

        for retry in 0..=self.config.max_retries {
            if retry > 0 {
                tokio::time::sleep(retry_delay).await;
                retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
            }

            match self.provider.recognize(request).await {
                Ok(response) => return Ok((response, retry + 1)),
                Err(e) => {
                    if let Some(ocr_error) = e.downcast_ref::<OcrError>() {
                        if ocr_error.is_permanent() {
                            return Err(e);
                        }
                        if let Some(ms) = ocr_error.retry_after_ms() {
                            retry_delay = Duration::from_millis(ms).min(MAX_RETRY_DELAY);
                        }
                    }
                    if retry < self.config.max_retries {
                        tracing::warn!(
                            source = request.label(),
                            attempt = retry + 1,
                            "OCR request failed, retrying: {e:#}"
                        );
                        progress.on_retry(request.label(), retry + 1, &e.to_string());
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("unknown error")))
    }
}
