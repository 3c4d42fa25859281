//! Student Crawler - heuristic student-data extraction and bulk import
//!
//! Pulls student records out of web pages (server-rendered tables, local
//! client-rendered frontends and their backing APIs, single-student detail
//! pages), normalizes them into validated records and imports them into a
//! store. Rows that collide with existing ids are skipped and reported; the
//! rest are committed in a single transaction.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{CrawlPipeline, ParseMode, PipelineError, PipelineReport, PreviewReport};
pub use domain::{CanonicalRecord, ImportOutcome, RawRecord, StudentStore};
pub use infrastructure::{CrawlerConfig, init_logging};
