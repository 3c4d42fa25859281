//! Extraction and parsing error types
//!
//! None of these ever escape the strategy selector. They are logged and
//! recorded on the extraction result as attempt outcomes.

use thiserror::Error;

/// Failure while fetching or decoding a source (page, file or API)
#[derive(Error, Debug, Clone)]
pub enum ExtractionError {
    #[error("Request to {url} failed: {message}")]
    Fetch { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Request to {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    #[error("Could not decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Invalid locator '{locator}': {reason}")]
    InvalidLocator { locator: String, reason: String },

    #[error("Failed to read {path}: {message}")]
    FileRead { path: String, message: String },

    #[error("No backing API answered on ports {ports:?}")]
    NoApi { ports: Vec<u16> },

    #[error("Refusing to call own origin {origin}")]
    SelfCall { origin: String },

    #[error(transparent)]
    Parsing(#[from] ParsingError),
}

impl ExtractionError {
    pub fn fetch(url: &str, error: &reqwest::Error) -> Self {
        Self::Fetch {
            url: url.to_string(),
            message: error.to_string(),
        }
    }

    pub fn invalid_locator(locator: &str, reason: impl Into<String>) -> Self {
        Self::InvalidLocator {
            locator: locator.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the failure came from the network rather than the payload
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Status { .. } | Self::Timeout { .. })
    }
}

/// Failure inside HTML parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("No table found, tried {tried_selectors:?}")]
    NoTableFound { tried_selectors: Vec<String> },

    #[error("No selector for '{field}' compiled")]
    NoUsableSelectors { field: String },
}

impl ParsingError {
    pub fn invalid_selector(selector: &str, reason: impl ToString) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn no_table_found(tried_selectors: &[String]) -> Self {
        Self::NoTableFound {
            tried_selectors: tried_selectors.to_vec(),
        }
    }
}

pub type FetchResult<T> = Result<T, ExtractionError>;
pub type ParsingResult<T> = Result<T, ParsingError>;
