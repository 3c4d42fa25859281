//! Logging system configuration and initialization
//!
//! - `RUST_LOG` wins when set; otherwise the configured level applies and
//!   chatty dependencies (sqlx, reqwest, hyper) are held back unless the
//!   level is `trace`
//! - Console output goes to stderr so stdout stays clean for reports
//! - Optional daily-rolling file output
//! - Local-time timestamps

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;

// Global guard to keep the log file writer alive
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<WorkerGuard>> = Mutex::new(Vec::new());
}

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Dependency targets held back unless the level is `trace`
const QUIET_TARGETS: [&str; 5] = [
    "sqlx::query=warn",
    "sqlx::sqlite=warn",
    "reqwest=info",
    "hyper=warn",
    "hyper_util=warn",
];

/// Build the filter used when `RUST_LOG` is not set
pub fn build_env_filter(level: &str) -> Result<EnvFilter> {
    let mut filter = EnvFilter::try_new(level).with_context(|| format!("Invalid log level '{}'", level))?;

    if !level.to_lowercase().contains("trace") {
        for directive in QUIET_TARGETS {
            filter = filter.add_directive(directive.parse()?);
        }
        filter = filter.add_directive(format!("student_crawler={}", level).parse()?);
    }

    Ok(filter)
}

/// Initialize logging with the given configuration.
///
/// Fails if no output is enabled or a global subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    if !config.console_output && !config.file_output {
        anyhow::bail!("No logging output configured");
    }

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_env_filter(&config.level)?,
    };

    let console_layer = config.console_output.then(|| {
        let timer = ChronoLocal::new(TIME_FORMAT.to_string());
        if config.json_format {
            fmt::Layer::new()
                .json()
                .with_writer(std::io::stderr)
                .with_timer(timer)
                .with_target(true)
                .boxed()
        } else {
            fmt::Layer::new()
                .with_writer(std::io::stderr)
                .with_timer(timer)
                .with_target(false)
                .boxed()
        }
    });

    let file_layer = if config.file_output {
        let log_dir = Path::new(&config.log_dir);
        std::fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

        let (file_writer, file_guard) = non_blocking(rolling::daily(log_dir, &config.file_prefix));
        LOG_GUARDS
            .lock()
            .map_err(|_| anyhow::anyhow!("Log guard registry poisoned"))?
            .push(file_guard);

        Some(
            fmt::Layer::new()
                .with_writer(file_writer)
                .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
                .with_target(true)
                .with_ansi(false),
        )
    } else {
        None
    };

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    info!(
        "Logging initialized (level: {}, json: {}, file: {})",
        config.level, config.json_format, config.file_output
    );
    Ok(())
}
