//! Mock provider for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use somatoria_core::traits::{OcrProvider, OcrRequest, OcrResponse};

/// A mock OCR provider for exercising the scan pipeline without real API calls.
///
/// Returns one canned text per call, in order. Once the list runs out the
/// last text repeats; with no texts at all every page reads as blank.
pub struct MockOcrProvider {
    pages: Vec<String>,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Last request received.
    last_request: Mutex<Option<OcrRequest>>,
}

impl MockOcrProvider {
    /// Create a mock that returns `pages[i]` on the i-th call.
    pub fn with_pages(pages: Vec<String>) -> Self {
        Self {
            pages,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same text.
    pub fn with_fixed_text(text: &str) -> Self {
        Self::with_pages(vec![text.to_string()])
    }

    /// Get the number of calls made to this provider.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this provider.
    pub fn last_request(&self) -> Option<OcrRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl OcrProvider for MockOcrProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn recognize(&self, request: &OcrRequest) -> anyhow::Result<OcrResponse> {
        let call = self.call_count.fetch_add(1, Ordering::Relaxed) as usize;
        *self.last_request.lock().unwrap_or_else(|e| e.into_inner()) = Some(request.clone());

        let text = self
            .pages
            .get(call)
            .or_else(|| self.pages.last())
            .cloned()
            .unwrap_or_default();

        Ok(OcrResponse {
            text,
            latency_ms: 1,
        })
    }
}
