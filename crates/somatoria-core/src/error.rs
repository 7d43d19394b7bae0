//! Error types.
//!
//! `OcrError` lives in the core crate so the scan orchestrator can downcast
//! provider failures and decide whether to retry without string matching.

use thiserror::Error;

/// Errors that can occur when calling an OCR provider.
#[derive(Debug, Error)]
pub enum OcrError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid or revoked API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// No usable API key was configured.
    #[error("API key not configured for provider '{0}'")]
    MissingApiKey(String),

    /// The request itself was rejected (bad image, unsupported format).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The service reported a failed operation in an otherwise successful
    /// response. `code` is the service's own status code, not HTTP.
    #[error("service error (code {code}): {message}")]
    ServiceError { code: i32, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl OcrError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            OcrError::AuthenticationFailed(_)
                | OcrError::MissingApiKey(_)
                | OcrError::InvalidRequest(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            OcrError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

/// Errors raised when editing a grading session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("question count must be between {min} and {max}, got {got}")]
    QuestionCountOutOfRange { got: usize, min: usize, max: usize },

    #[error("question {question} is outside 1..={count}")]
    QuestionOutOfRange { question: usize, count: usize },

    #[error("answer {0} is outside 0..=31")]
    AnswerOutOfRange(u32),
}
