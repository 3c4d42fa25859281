//! Infrastructure layer for configuration, fetching, parsing and storage
//!
//! This module provides the HTTP client, the backing-API client, the HTML
//! extractors, the student stores and the logging/config plumbing.

pub mod api_client; // Backing JSON API retrieval
pub mod config; // Configuration loading and defaults
pub mod database_connection;
pub mod http_client;
pub mod logging; // Logging infrastructure
pub mod memory_store;
pub mod parsing; // Table and detail page extraction
pub mod parsing_error; // Extraction and parsing error types
pub mod student_repository;

// Re-export commonly used items
pub use api_client::{ApiFallbackClient, ApiFetch};
pub use config::{ApiConfig, ConfigError, CrawlerConfig, FrontendConfig, LoggingConfig};
pub use database_connection::DatabaseConnection;
pub use http_client::{HttpClient, HttpClientConfig};
pub use logging::init_logging;
pub use memory_store::InMemoryStudentStore;
pub use parsing::{
    DetailPageExtractor, DetailSelectors, PageContext, ParsingError, ParsingResult, TableHeuristicExtractor,
    TableParsingConfig, TableStructure,
};
pub use parsing_error::{ExtractionError, FetchResult};
pub use student_repository::SqliteStudentRepository;
