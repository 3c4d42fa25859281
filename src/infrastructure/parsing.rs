//! HTML parsing infrastructure for student pages
//!
//! Two extractors share one parsing contract: a list-page table extractor
//! driven by bilingual header keywords, and a selector-driven detail page
//! extractor. Both produce unvalidated [`RawRecord`](crate::domain::RawRecord)s.

pub mod config;
pub mod context;
pub mod detail_parser;
pub mod keywords;
pub mod table_parser;
pub mod text;

// Re-export public types
pub use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};
pub use config::{DetailSelectors, TableParsingConfig};
pub use context::PageContext;
pub use detail_parser::DetailPageExtractor;
pub use keywords::{ColumnRule, Keyword, COLUMN_RULES};
pub use table_parser::{ColumnInfo, TableHeuristicExtractor, TableStructure};

use scraper::Html;

/// Parser over an already-parsed document with contextual information
pub trait ContextualParser {
    type Output;
    type Context;

    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> ParsingResult<Self::Output>;
}
