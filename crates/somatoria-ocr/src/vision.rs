//! Google Cloud Vision `TEXT_DETECTION` provider.

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use somatoria_core::error::OcrError;
use somatoria_core::traits::{OcrProvider, OcrRequest, OcrResponse};

const DEFAULT_BASE_URL: &str = "https://vision.googleapis.com";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Google Cloud Vision API provider.
pub struct GoogleVisionProvider {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl GoogleVisionProvider {
    pub fn new(api_key: &str, base_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client");

        Self {
            api_key: api_key.to_string(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            client,
        }
    }
}

#[derive(Serialize)]
struct AnnotateRequest<'a> {
    requests: Vec<AnnotateImageRequest<'a>>,
}

#[derive(Serialize)]
struct AnnotateImageRequest<'a> {
    image: VisionImage<'a>,
    features: Vec<Feature>,
}

#[derive(Serialize)]
struct VisionImage<'a> {
    content: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    max_results: u32,
}

#[derive(Deserialize, Default)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
    #[serde(default)]
    error: Option<VisionStatus>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    text_annotations: Vec<TextAnnotation>,
    #[serde(default)]
    error: Option<VisionStatus>,
}

#[derive(Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    description: String,
}

#[derive(Deserialize)]
struct VisionStatus {
    #[serde(default)]
    code: Option<i32>,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: VisionStatus,
}

/// Prefer the `error.message` of a JSON error body over the raw body.
fn error_message(body: String) -> String {
    serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

/// Map a per-image `google.rpc.Status` onto the retry classification.
fn status_error(status: VisionStatus) -> OcrError {
    match status.code.unwrap_or(2) {
        // INVALID_ARGUMENT, NOT_FOUND, FAILED_PRECONDITION, OUT_OF_RANGE
        3 | 5 | 9 | 11 => OcrError::InvalidRequest(status.message),
        // PERMISSION_DENIED, UNAUTHENTICATED
        7 | 16 => OcrError::AuthenticationFailed(status.message),
        // RESOURCE_EXHAUSTED
        8 => OcrError::RateLimited {
            retry_after_ms: DEFAULT_RETRY_AFTER_SECS * 1000,
        },
        code => OcrError::ServiceError {
            code,
            message: status.message,
        },
    }
}

#[async_trait]
impl OcrProvider for GoogleVisionProvider {
    fn name(&self) -> &str {
        "google-vision"
    }

    #[instrument(skip(self, request), fields(source = request.label()))]
    async fn recognize(&self, request: &OcrRequest) -> anyhow::Result<OcrResponse> {
        let start = Instant::now();

        let body = AnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: VisionImage {
                    content: request.base64_content(),
                },
                features: vec![Feature {
                    kind: "TEXT_DETECTION",
                    max_results: 1,
                }],
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/images:annotate", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OcrError::Timeout(DEFAULT_TIMEOUT_SECS)
                } else {
                    OcrError::NetworkError(e.without_url().to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
                .saturating_mul(1000);
            return Err(OcrError::RateLimited {
                retry_after_ms: retry_after,
            }
            .into());
        }
        if status == 401 || status == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::AuthenticationFailed(error_message(body)).into());
        }
        if status == 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::InvalidRequest(error_message(body)).into());
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::ApiError {
                status,
                message: error_message(body),
            }
            .into());
        }

        let api_response: AnnotateResponse =
            response.json().await.map_err(|e| OcrError::ApiError {
                status,
                message: format!("failed to parse response: {}", e.without_url()),
            })?;

        if let Some(error) = api_response.error {
            return Err(status_error(error).into());
        }

        let first = api_response.responses.into_iter().next().unwrap_or_default();
        if let Some(error) = first.error {
            return Err(status_error(error).into());
        }

        let text = first
            .text_annotations
            .into_iter()
            .next()
            .map(|a| a.description)
            .unwrap_or_default();
        if text.is_empty() {
            tracing::info!("no text detected");
        }

        Ok(OcrResponse {
            text,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
