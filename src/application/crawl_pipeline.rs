//! One request-scoped crawl: select, extract, normalize, import
//!
//! The pipeline owns a single HTTP client that every strategy of a run
//! shares. Only an unknown parse mode stops a run; everything else that goes
//! wrong ends up in the report.

#![allow(clippy::uninlined_format_args)]

use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use super::bulk_import::BulkImportEngine;
use super::error::PipelineError;
use super::normalizer::{FieldNormalizer, Normalized};
use super::strategy_selector::{ParseMode, StrategySelector};
use crate::domain::{CanonicalRecord, ExtractionResult, ImportOutcome, StrategyAttempt, StrategyKind, StudentStore};
use crate::infrastructure::{CrawlerConfig, HttpClient, HttpClientConfig};

/// Where the raw records came from, without the records themselves
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionSummary {
    pub strategy: Option<StrategyKind>,
    pub source: String,
    pub found: usize,
    pub attempts: Vec<StrategyAttempt>,
}

impl From<&ExtractionResult> for ExtractionSummary {
    fn from(result: &ExtractionResult) -> Self {
        Self {
            strategy: result.strategy,
            source: result.source.clone(),
            found: result.found,
            attempts: result.attempts.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub locator: String,
    pub mode: ParseMode,
    pub extraction: ExtractionSummary,
    /// Records that survived normalization and were handed to the importer
    pub accepted: usize,
    pub normalization_errors: Vec<String>,
    pub import: ImportOutcome,
}

/// Extraction and normalization only, nothing written
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewReport {
    pub locator: String,
    pub mode: ParseMode,
    pub extraction: ExtractionSummary,
    pub normalization_errors: Vec<String>,
    pub records: Vec<CanonicalRecord>,
}

pub struct CrawlPipeline {
    selector: StrategySelector,
    normalizer: FieldNormalizer,
    importer: BulkImportEngine,
}

impl CrawlPipeline {
    pub fn new(config: &CrawlerConfig, store: Arc<dyn StudentStore>) -> Result<Self, PipelineError> {
        let http = HttpClient::new(HttpClientConfig::from(config))
            .map_err(|e| PipelineError::HttpClient(e.to_string()))?;
        let selector = StrategySelector::new(config, Arc::new(http))?;
        Ok(Self::with_components(selector, FieldNormalizer::new(), BulkImportEngine::new(store)))
    }

    pub fn with_components(selector: StrategySelector, normalizer: FieldNormalizer, importer: BulkImportEngine) -> Self {
        Self {
            selector,
            normalizer,
            importer,
        }
    }

    /// Extract, normalize and import whatever the locator yields
    pub async fn run(&self, locator: &str, mode_keyword: &str) -> Result<PipelineReport, PipelineError> {
        let mode: ParseMode = mode_keyword.parse()?;
        let (extraction, normalized) = self.extract_and_normalize(locator, mode).await;

        let accepted = normalized.records.len();
        let import = self.importer.import(normalized.records).await;
        info!(
            "Crawl of {} finished: {} found, {} accepted, {} imported",
            locator, extraction.found, accepted, import.succeeded
        );

        Ok(PipelineReport {
            locator: locator.to_string(),
            mode,
            extraction,
            accepted,
            normalization_errors: normalized.errors,
            import,
        })
    }

    /// Extract and normalize without touching the store
    pub async fn preview(&self, locator: &str, mode_keyword: &str) -> Result<PreviewReport, PipelineError> {
        let mode: ParseMode = mode_keyword.parse()?;
        let (extraction, normalized) = self.extract_and_normalize(locator, mode).await;

        Ok(PreviewReport {
            locator: locator.to_string(),
            mode,
            extraction,
            normalization_errors: normalized.errors,
            records: normalized.records,
        })
    }

    async fn extract_and_normalize(&self, locator: &str, mode: ParseMode) -> (ExtractionSummary, Normalized) {
        let result = self.selector.extract(locator, mode).await;
        let normalized = self.normalizer.normalize(&result.records);
        info!(
            "{} raw records from {} normalized into {} ({} rejected)",
            result.found,
            result.source,
            normalized.records.len(),
            normalized.errors.len()
        );
        (ExtractionSummary::from(&result), normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::InMemoryStudentStore;

    fn pipeline() -> CrawlPipeline {
        let config = CrawlerConfig {
            crawl_delay_ms: 0,
            ..CrawlerConfig::default()
        };
        CrawlPipeline::new(&config, Arc::new(InMemoryStudentStore::new())).unwrap()
    }

    #[tokio::test]
    async fn unknown_mode_stops_the_run() {
        let result = pipeline().run("https://school.example.edu/students", "sitemap").await;
        assert!(matches!(result, Err(PipelineError::UnknownStrategy(_))));
    }

    #[tokio::test]
    async fn missing_page_yields_empty_report() {
        let report = pipeline()
            .run("file:///no/such/dir/students.html", "student_list")
            .await
            .unwrap();

        assert_eq!(report.mode, ParseMode::StudentList);
        assert_eq!(report.extraction.strategy, None);
        assert_eq!(report.extraction.found, 0);
        assert_eq!(report.extraction.attempts.len(), 1);
        assert_eq!(report.accepted, 0);
        assert_eq!(report.import, ImportOutcome::new(0, Vec::new(), Vec::new()));
    }
}
