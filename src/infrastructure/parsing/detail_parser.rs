//! Single-student detail page extraction
//!
//! Every field has an ordered list of CSS selectors. The first selector that
//! matches any element decides the field: its first element's trimmed text is
//! the value, and an empty text leaves the field absent. Later selectors are
//! not consulted once one has matched.

#![allow(clippy::uninlined_format_args)]

use scraper::{Html, Selector};
use tracing::{debug, warn};

use super::config::DetailSelectors;
use super::context::PageContext;
use super::text::{clean_text, first_number, split_full_name};
use super::{ContextualParser, ParsingResult};
use crate::domain::{CanonicalField, RawRecord};

pub struct DetailPageExtractor {
    /// Compiled selectors per field, in lookup order
    field_selectors: Vec<(CanonicalField, Vec<Selector>)>,
}

impl DetailPageExtractor {
    /// Create a new extractor with default selectors
    pub fn new() -> Self {
        Self::with_config(&DetailSelectors::default())
    }

    /// Create an extractor with custom selector configuration.
    ///
    /// Invalid selectors are logged and skipped, never fatal.
    pub fn with_config(selectors: &DetailSelectors) -> Self {
        let field_selectors = CanonicalField::ALL
            .into_iter()
            .map(|field| (field, Self::compile_selectors(field, selectors.for_field(field))))
            .collect();

        Self { field_selectors }
    }

    fn compile_selectors(field: CanonicalField, selector_strings: &[String]) -> Vec<Selector> {
        let mut selectors = Vec::new();

        for selector_str in selector_strings {
            match Selector::parse(selector_str) {
                Ok(selector) => selectors.push(selector),
                Err(e) => warn!("Failed to compile {} selector '{}': {}", field, selector_str, e),
            }
        }

        if selectors.is_empty() && !selector_strings.is_empty() {
            warn!("No usable selectors for {}, field will never be extracted", field);
        }

        selectors
    }

    /// Extract one record from a detail page
    pub fn extract(&self, html: &str) -> RawRecord {
        self.extract_from(html, &PageContext::default())
    }

    pub fn extract_from(&self, html: &str, context: &PageContext) -> RawRecord {
        let document = Html::parse_document(html);
        self.parse_with_context(&document, context).unwrap_or_default()
    }

    fn extract_record(&self, html: &Html) -> RawRecord {
        let mut record = RawRecord::new();

        for (field, selectors) in &self.field_selectors {
            let Some(text) = Self::first_text(html, selectors) else {
                continue;
            };

            if field.is_score() {
                match first_number(&text) {
                    Some(number) => record.set(*field, number),
                    None => debug!("Dropping non-numeric {} '{}'", field, text),
                }
            } else {
                record.set(*field, text);
            }
        }

        // Pages that only print a combined name still yield first/last
        if !record.contains(CanonicalField::FirstName) {
            let split = record.field(CanonicalField::FullName).and_then(split_full_name);
            if let Some((first, last)) = split {
                record.set(CanonicalField::FirstName, first);
                if !record.contains(CanonicalField::LastName) {
                    record.insert(CanonicalField::LastName.as_str(), last);
                }
            }
        }

        record
    }

    fn first_text(html: &Html, selectors: &[Selector]) -> Option<String> {
        let element = selectors
            .iter()
            .find_map(|selector| html.select(selector).next())?;
        let text = clean_text(&element.text().collect::<String>());
        (!text.is_empty()).then_some(text)
    }
}

impl Default for DetailPageExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextualParser for DetailPageExtractor {
    type Output = RawRecord;
    type Context = PageContext;

    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> ParsingResult<Self::Output> {
        let record = self.extract_record(html);
        debug!("Extracted {} detail fields from {}", record.len(), context.source);
        Ok(record)
    }
}
