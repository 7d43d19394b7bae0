//! somatoria-ocr — OCR provider integrations.
//!
//! Implements the `OcrProvider` trait for Google Cloud Vision and a mock
//! backend, and loads provider configuration and answer-sheet images.

pub mod config;
pub mod image;
pub mod mock;
pub mod vision;

pub use config::{create_provider, load_config, ProviderConfig, SomatoriaConfig};
pub use image::{load_image, load_images};
pub use somatoria_core::error::OcrError;
