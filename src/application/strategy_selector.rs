//! Strategy selection and cascading
//!
//! A locator and a parse mode give an explicit ordered plan of strategies.
//! The plan runs front to back, each strategy at most once, and stops at the
//! first one that yields records. Strategy failures are logged and recorded
//! as attempts; nothing here ever fails the call.

#![allow(clippy::uninlined_format_args)]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::PipelineError;
use crate::domain::{AttemptOutcome, ExtractionResult, RawRecord, StrategyAttempt, StrategyKind};
use crate::infrastructure::{
    ApiFallbackClient, CrawlerConfig, DetailPageExtractor, FetchResult, HttpClient, PageContext,
    TableHeuristicExtractor,
};

/// Caller-selected extraction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    /// Decide from the locator
    #[default]
    Auto,
    StudentList,
    StudentDetail,
    /// Local dev frontend: backing API first, then the page itself
    Frontend,
}

impl ParseMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::StudentList => "student_list",
            Self::StudentDetail => "student_detail",
            Self::Frontend => "frontend",
        }
    }
}

impl FromStr for ParseMode {
    type Err = PipelineError;

    fn from_str(keyword: &str) -> Result<Self, Self::Err> {
        match keyword.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(Self::Auto),
            "student_list" => Ok(Self::StudentList),
            "student_detail" => Ok(Self::StudentDetail),
            "frontend" => Ok(Self::Frontend),
            _ => Err(PipelineError::UnknownStrategy(keyword.to_string())),
        }
    }
}

impl fmt::Display for ParseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct StrategySelector {
    http: Arc<HttpClient>,
    api: ApiFallbackClient,
    tables: TableHeuristicExtractor,
    detail: DetailPageExtractor,
    local_signatures: Vec<String>,
}

impl StrategySelector {
    pub fn new(config: &CrawlerConfig, http: Arc<HttpClient>) -> Result<Self, PipelineError> {
        let tables = TableHeuristicExtractor::with_config(&config.table)?;
        Ok(Self::with_extractors(
            config,
            Arc::clone(&http),
            ApiFallbackClient::new(http, config.api.clone()),
            tables,
            DetailPageExtractor::with_config(&config.detail),
        ))
    }

    /// Assemble a selector from pre-built parts (custom keyword rules etc.)
    pub fn with_extractors(
        config: &CrawlerConfig,
        http: Arc<HttpClient>,
        api: ApiFallbackClient,
        tables: TableHeuristicExtractor,
        detail: DetailPageExtractor,
    ) -> Self {
        Self {
            http,
            api,
            tables,
            detail,
            local_signatures: config.frontend.local_signatures.clone(),
        }
    }

    /// Whether the locator looks like a local dev page or file
    pub fn is_local(&self, locator: &str) -> bool {
        let locator = locator.to_lowercase();
        self.local_signatures
            .iter()
            .any(|signature| locator.contains(&signature.to_lowercase()))
    }

    /// Ordered strategies for a locator and mode
    pub fn plan(&self, locator: &str, mode: ParseMode) -> Vec<StrategyKind> {
        match mode {
            ParseMode::Auto if self.is_local(locator) => {
                vec![StrategyKind::ApiFallback, StrategyKind::FrontendTable]
            }
            ParseMode::Auto | ParseMode::StudentList => vec![StrategyKind::GenericTable],
            ParseMode::Frontend => vec![StrategyKind::ApiFallback, StrategyKind::FrontendTable],
            ParseMode::StudentDetail => vec![StrategyKind::DetailPage],
        }
    }

    /// Run the plan until a strategy yields records
    pub async fn extract(&self, locator: &str, mode: ParseMode) -> ExtractionResult {
        let plan = self.plan(locator, mode);
        info!("Extracting {} with mode {} using plan {:?}", locator, mode, plan);

        let mut attempts = Vec::with_capacity(plan.len());

        for kind in plan {
            match self.run_strategy(kind, locator).await {
                Ok((source, records)) if !records.is_empty() => {
                    info!("{} found {} records at {}", kind, records.len(), source);
                    attempts.push(StrategyAttempt {
                        strategy: kind,
                        outcome: AttemptOutcome::Succeeded { found: records.len() },
                    });
                    return ExtractionResult::from_records(kind, source, records).with_attempts(attempts);
                }
                Ok(_) => {
                    debug!("{} found nothing for {}", kind, locator);
                    attempts.push(StrategyAttempt {
                        strategy: kind,
                        outcome: AttemptOutcome::Empty,
                    });
                }
                Err(e) => {
                    warn!("{} failed for {}: {}", kind, locator, e);
                    attempts.push(StrategyAttempt {
                        strategy: kind,
                        outcome: AttemptOutcome::Failed(e.to_string()),
                    });
                }
            }
        }

        info!("No strategy found records for {}", locator);
        ExtractionResult::empty(locator).with_attempts(attempts)
    }

    /// Run one strategy, returning the effective source and its records
    async fn run_strategy(&self, kind: StrategyKind, locator: &str) -> FetchResult<(String, Vec<RawRecord>)> {
        match kind {
            StrategyKind::ApiFallback => {
                let fetch = self.api.try_fetch(locator).await?;
                Ok((fetch.endpoint, fetch.records))
            }
            StrategyKind::FrontendTable => {
                let html = self.http.get_text(locator).await?;
                let records = self.tables.extract_from(&html, &PageContext::new(locator));
                Ok((locator.to_string(), records))
            }
            StrategyKind::GenericTable => {
                let html = self.http.get_text(locator).await?;
                let records = self.tables.extract_any_table_from(&html, &PageContext::new(locator));
                Ok((locator.to_string(), records))
            }
            StrategyKind::DetailPage => {
                let html = self.http.get_text(locator).await?;
                let record = self.detail.extract_from(&html, &PageContext::new(locator));
                let records = if record.is_empty() { Vec::new() } else { vec![record] };
                Ok((locator.to_string(), records))
            }
        }
    }
}
