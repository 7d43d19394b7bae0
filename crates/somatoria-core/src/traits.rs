//! Core trait definitions for OCR providers.
//!
//! Implemented by the `somatoria-ocr` crate.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// OCR Provider trait
// ---------------------------------------------------------------------------

/// Trait for text-recognition backends that read photographed answer sheets.
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Human-readable provider name (e.g. "google-vision").
    fn name(&self) -> &str;

    /// Recognize the full text of one image.
    async fn recognize(&self, request: &OcrRequest) -> anyhow::Result<OcrResponse>;
}

/// One image to recognize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrRequest {
    /// Base64 image content, optionally as a `data:image/...;base64,` URL.
    pub image: String,
    /// Where the image came from (file path, upload name).
    #[serde(default)]
    pub source: Option<String>,
}

impl OcrRequest {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Label for logs and progress output.
    pub fn label(&self) -> &str {
        self.source.as_deref().unwrap_or("<inline image>")
    }

    /// Image content with any data-URL prefix removed.
    pub fn base64_content(&self) -> &str {
        strip_data_url_prefix(&self.image)
    }
}

/// Text recognized in one image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrResponse {
    /// Best-guess full text; empty when nothing was detected.
    pub text: String,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

// ---------------------------------------------------------------------------
// Data URL handling
// ---------------------------------------------------------------------------

static DATA_URL_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^data:image/(?-u:\w)+;base64,").expect("valid regex"));

/// Strip a leading `data:image/<type>;base64,` prefix, if present.
pub fn strip_data_url_prefix(image: &str) -> &str {
    match DATA_URL_PREFIX.find(image) {
        Some(prefix) => &image[prefix.end()..],
        None => image,
    }
}
