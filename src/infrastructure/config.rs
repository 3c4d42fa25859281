//! Configuration infrastructure
//!
//! All crawler tunables live in one immutable [`CrawlerConfig`] value that is
//! handed to each component's constructor. Loading layers, lowest first:
//! 1. Built-in defaults (see [`defaults`])
//! 2. An optional config file (TOML/JSON/YAML, by extension)
//! 3. `STUDENT_CRAWLER__*` environment variables (`__` separates sections)

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use super::parsing::config::{DetailSelectors, TableParsingConfig};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {source}")]
    Load {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

/// Complete crawler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// User agent sent with every request
    pub user_agent: String,

    /// Pause after every external fetch, in milliseconds
    pub crawl_delay_ms: u64,

    /// Timeout for page fetches, in seconds
    pub request_timeout_secs: u64,

    /// SQLite database URL
    pub database_url: String,

    pub api: ApiConfig,
    pub frontend: FrontendConfig,
    pub table: TableParsingConfig,
    pub detail: DetailSelectors,
    pub logging: LoggingConfig,
}

/// Backing-API retrieval settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Host used when the locator does not name a local host (e.g. `file://`)
    pub default_host: String,

    /// Ports tried in order
    pub candidate_ports: Vec<u16>,

    /// Collection path on the API
    pub path: String,

    /// Items requested per page
    pub page_size: usize,

    /// Hard ceiling on pages fetched from one endpoint
    pub max_pages: usize,

    /// Limit used for the single last-resort request
    pub fallback_limit: usize,

    /// Timeout for each API call, in seconds
    pub timeout_secs: u64,

    /// Origin of the service running the crawl; never called back. Unset
    /// for the CLI, which serves nothing itself.
    pub self_origin: Option<String>,

    pub offset_param: String,
    pub limit_param: String,
}

/// Detection of local/frontend locators
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontendConfig {
    /// Substrings that mark a locator as a local dev page
    pub local_signatures: Vec<String>,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted console logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable daily-rolling file output
    pub file_output: bool,

    /// Directory for log files
    pub log_dir: String,

    /// Log file name prefix
    pub file_prefix: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::USER_AGENT.to_string(),
            crawl_delay_ms: defaults::CRAWL_DELAY_MS,
            request_timeout_secs: defaults::REQUEST_TIMEOUT_SECONDS,
            database_url: defaults::DATABASE_URL.to_string(),
            api: ApiConfig::default(),
            frontend: FrontendConfig::default(),
            table: TableParsingConfig::default(),
            detail: DetailSelectors::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            default_host: defaults::API_DEFAULT_HOST.to_string(),
            candidate_ports: defaults::API_CANDIDATE_PORTS.to_vec(),
            path: defaults::API_PATH.to_string(),
            page_size: defaults::API_PAGE_SIZE,
            max_pages: defaults::API_MAX_PAGES,
            fallback_limit: defaults::API_FALLBACK_LIMIT,
            timeout_secs: defaults::API_TIMEOUT_SECONDS,
            self_origin: None,
            offset_param: "skip".to_string(),
            limit_param: "limit".to_string(),
        }
    }
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            local_signatures: defaults::LOCAL_SIGNATURES.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            log_dir: "logs".to_string(),
            file_prefix: "student-crawler.log".to_string(),
        }
    }
}

impl CrawlerConfig {
    /// Load defaults, then an optional file, then the environment
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            info!("Loading crawler config from {}", path);
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(defaults::ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("api.candidate_ports")
                    .with_list_parse_key("frontend.local_signatures")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            (self.api.page_size == 0, "api.page_size must be greater than 0"),
            (self.api.max_pages == 0, "api.max_pages must be greater than 0"),
            (self.api.fallback_limit == 0, "api.fallback_limit must be greater than 0"),
            (self.api.timeout_secs == 0, "api.timeout_secs must be greater than 0"),
            (self.request_timeout_secs == 0, "request_timeout_secs must be greater than 0"),
            (self.table.header_scan_rows == 0, "table.header_scan_rows must be greater than 0"),
        ];

        match checks.iter().find(|(failed, _)| *failed) {
            Some((_, message)) => Err(ConfigError::Validation {
                message: (*message).to_string(),
            }),
            None => Ok(()),
        }
    }

    pub fn crawl_delay(&self) -> Duration {
        Duration::from_millis(self.crawl_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Default values
pub mod defaults {
    pub const USER_AGENT: &str = "Student Management Crawler 1.0";

    /// Delay between consecutive requests
    pub const CRAWL_DELAY_MS: u64 = 1000;

    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    pub const DATABASE_URL: &str = "sqlite:students.db";

    pub const API_DEFAULT_HOST: &str = "127.0.0.1";
    pub const API_CANDIDATE_PORTS: [u16; 4] = [8000, 8001, 5000, 3001];
    pub const API_PATH: &str = "/api/v1/students";
    pub const API_PAGE_SIZE: usize = 100;
    pub const API_MAX_PAGES: usize = 1000;
    pub const API_FALLBACK_LIMIT: usize = 1000;
    pub const API_TIMEOUT_SECONDS: u64 = 5;

    pub const LOCAL_SIGNATURES: [&str; 8] = [
        "localhost",
        "127.0.0.1",
        "file://",
        "index.html",
        ":3000",
        ":5000",
        ":5500",
        ":8080",
    ];

    pub const HEADER_SCAN_ROWS: usize = 3;

    pub const LOG_LEVEL: &str = "info";
    pub const LOG_JSON_FORMAT: bool = false;
    pub const LOG_CONSOLE_OUTPUT: bool = true;
    pub const LOG_FILE_OUTPUT: bool = false;

    pub const ENV_PREFIX: &str = "STUDENT_CRAWLER";
}
