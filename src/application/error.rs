//! Errors returned to callers of the crawl pipeline
//!
//! Extraction, parsing and per-row problems never surface here; they end up
//! in the report. Only misuse and setup failures do.

use thiserror::Error;

use crate::infrastructure::{ConfigError, ParsingError};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Unknown parse mode '{0}' (expected auto, student_list, student_detail or frontend)")]
    UnknownStrategy(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to build extractor: {0}")]
    Extractor(#[from] ParsingError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}
