//! somatoria-core — Answer parsing, partial-credit scoring and grading.
//!
//! This crate defines the data model for sum-coded answer sheets, the parser
//! that turns OCR text into detected answers, the partial-credit scoring
//! engine, and the scan orchestrator that drives OCR providers.

pub mod engine;
pub mod error;
pub mod exam;
pub mod mask;
pub mod model;
pub mod parser;
pub mod report;
pub mod scoring;
pub mod session;
pub mod traits;
