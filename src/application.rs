//! Application layer module
//!
//! This module contains the strategy cascade, normalization, bulk import
//! and the crawl pipeline that strings them together.

pub mod bulk_import;
pub mod crawl_pipeline;
pub mod error;
pub mod normalizer;
pub mod strategy_selector;

pub use bulk_import::BulkImportEngine;
pub use crawl_pipeline::{CrawlPipeline, ExtractionSummary, PipelineReport, PreviewReport};
pub use error::PipelineError;
pub use normalizer::{FieldNormalizer, Normalized};
pub use strategy_selector::{ParseMode, StrategySelector};
