//! Generic student table extraction
//!
//! Finds a table, decides which row is the header by looking for bilingual
//! header indicators, maps header cells to canonical fields through the
//! keyword rule table, and turns every later row into a [`RawRecord`]. Pages
//! without a recognizable header fall back to a fixed positional layout.

#![allow(clippy::uninlined_format_args)]

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tracing::{debug, warn};

use super::config::TableParsingConfig;
use super::context::PageContext;
use super::keywords::{self, ColumnRule, COLUMN_RULES};
use super::text::{clean_text, first_number, is_pure_glyph, normalize_key, split_full_name};
use super::{ContextualParser, ParsingError, ParsingResult};
use crate::domain::{CanonicalField, RawRecord};

/// Column layout used when no header row is found. Column 0 is the
/// selection checkbox column; it only yields an id when it holds text.
const POSITIONAL_LAYOUT: [CanonicalField; 9] = [
    CanonicalField::StudentId,
    CanonicalField::StudentId,
    CanonicalField::FullName,
    CanonicalField::Email,
    CanonicalField::BirthDate,
    CanonicalField::Hometown,
    CanonicalField::MathScore,
    CanonicalField::LiteratureScore,
    CanonicalField::EnglishScore,
];

/// Structure of the preferred table on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStructure {
    pub table_id: Option<String>,
    pub columns: Vec<ColumnInfo>,
    pub has_pagination: bool,
    pub has_search: bool,
    pub has_hometown_filter: bool,
    pub has_grade_filter: bool,
}

impl TableStructure {
    pub fn has_filters(&self) -> bool {
        self.has_hometown_filter || self.has_grade_filter
    }

    pub fn has_sorting(&self) -> bool {
        self.columns.iter().any(|c| c.sortable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub index: usize,
    pub label: String,
    /// Canonical field the label maps to, if any
    pub field: Option<CanonicalField>,
    /// Value of the `data-sort` attribute
    pub sort_key: Option<String>,
    pub sortable: bool,
}

/// How the columns of one table map to fields
#[derive(Debug, Clone, PartialEq)]
struct ColumnMapping {
    columns: Vec<Option<CanonicalField>>,
    data_start_row: usize,
}

impl ColumnMapping {
    fn positional() -> Self {
        Self {
            columns: POSITIONAL_LAYOUT.iter().copied().map(Some).collect(),
            data_start_row: 1,
        }
    }

    fn field_at(&self, column: usize) -> Option<CanonicalField> {
        self.columns.get(column).copied().flatten()
    }
}

pub struct TableHeuristicExtractor {
    table_selectors: Vec<(String, Selector)>,
    header_scan_rows: usize,
    rules: Vec<ColumnRule>,
    any_table: Selector,
    row: Selector,
    cell: Selector,
    header_cell: Selector,
    pagination: Selector,
    search_input: Selector,
    hometown_filter: Selector,
    grade_filter: Selector,
}

impl TableHeuristicExtractor {
    /// Create an extractor with default configuration
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&TableParsingConfig::default())
    }

    pub fn with_config(config: &TableParsingConfig) -> ParsingResult<Self> {
        let table_selectors = compile_selectors(&config.table_selectors);
        if table_selectors.is_empty() {
            return Err(ParsingError::NoUsableSelectors {
                field: "table".to_string(),
            });
        }

        Ok(Self {
            table_selectors,
            header_scan_rows: config.header_scan_rows,
            rules: COLUMN_RULES.to_vec(),
            any_table: parse_static("table")?,
            row: parse_static("tr")?,
            cell: parse_static("th, td")?,
            header_cell: parse_static("thead tr th")?,
            pagination: parse_static("#pagination")?,
            search_input: parse_static("#searchInput")?,
            hometown_filter: parse_static("#hometownFilter")?,
            grade_filter: parse_static("#gradeFilter")?,
        })
    }

    /// Replace the keyword rule table
    pub fn with_rules(mut self, rules: Vec<ColumnRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Records from the preferred table only
    pub fn extract(&self, html: &str) -> Vec<RawRecord> {
        self.extract_from(html, &PageContext::default())
    }

    /// Records from the table the context points at, or the preferred table
    pub fn extract_from(&self, html: &str, context: &PageContext) -> Vec<RawRecord> {
        let document = Html::parse_document(html);
        self.records_or_empty(&document, context)
    }

    /// Records from the preferred table, then from every table in document
    /// order until one yields records
    pub fn extract_any_table(&self, html: &str) -> Vec<RawRecord> {
        self.extract_any_table_from(html, &PageContext::default())
    }

    pub fn extract_any_table_from(&self, html: &str, context: &PageContext) -> Vec<RawRecord> {
        let document = Html::parse_document(html);

        let preferred = PageContext {
            table_index: None,
            ..context.clone()
        };
        let records = self.records_or_empty(&document, &preferred);
        if !records.is_empty() {
            return records;
        }

        let tables = document.select(&self.any_table).count();
        for index in 0..tables {
            let records = self.records_or_empty(&document, &context.clone().with_table_index(index));
            if !records.is_empty() {
                debug!("Table #{} yielded {} records", index, records.len());
                return records;
            }
        }

        Vec::new()
    }

    fn records_or_empty(&self, document: &Html, context: &PageContext) -> Vec<RawRecord> {
        match self.parse_with_context(document, context) {
            Ok(records) => records,
            Err(e) => {
                debug!("Table extraction found nothing in {}: {}", context.source, e);
                Vec::new()
            }
        }
    }

    /// Describe the preferred table and the page controls around it
    pub fn inspect_structure(&self, html: &str) -> ParsingResult<TableStructure> {
        let document = Html::parse_document(html);
        let table = self.preferred_table(&document).ok_or_else(|| self.no_table())?;

        let mut header_cells: Vec<ElementRef> = table.select(&self.header_cell).collect();
        if header_cells.is_empty() {
            let rows = table_rows(table, &self.row);
            let header_index = self.detect_header_row(&rows).unwrap_or(0);
            header_cells = rows
                .get(header_index)
                .map(|row| row.select(&self.cell).collect())
                .unwrap_or_default();
        }

        let columns = header_cells
            .iter()
            .enumerate()
            .filter_map(|(index, cell)| {
                let label = element_text(cell);
                if is_pure_glyph(&label) || keywords::is_action_text(&label.to_lowercase()) {
                    return None;
                }
                Some(ColumnInfo {
                    index,
                    field: keywords::match_header(&self.rules, &normalize_key(&label)),
                    sort_key: cell.value().attr("data-sort").map(str::to_string),
                    sortable: cell.value().classes().any(|c| c == "sortable"),
                    label,
                })
            })
            .collect();

        Ok(TableStructure {
            table_id: table.value().id().map(str::to_string),
            columns,
            has_pagination: document.select(&self.pagination).next().is_some(),
            has_search: document.select(&self.search_input).next().is_some(),
            has_hometown_filter: document.select(&self.hometown_filter).next().is_some(),
            has_grade_filter: document.select(&self.grade_filter).next().is_some(),
        })
    }

    fn preferred_table<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        self.table_selectors
            .iter()
            .find_map(|(_, selector)| document.select(selector).next())
    }

    fn no_table(&self) -> ParsingError {
        let tried: Vec<String> = self.table_selectors.iter().map(|(s, _)| s.clone()).collect();
        ParsingError::no_table_found(&tried)
    }

    /// Index of the first header-looking row within the scan window
    fn detect_header_row(&self, rows: &[ElementRef]) -> Option<usize> {
        rows.iter().take(self.header_scan_rows).position(|row| {
            let joined = row_texts(*row, &self.cell).join(" ").to_lowercase();
            keywords::is_header_text(&joined)
        })
    }

    fn column_mapping(&self, rows: &[ElementRef]) -> ColumnMapping {
        let Some(header_index) = self.detect_header_row(rows) else {
            debug!("No header row detected, using positional layout");
            return ColumnMapping::positional();
        };

        let columns: Vec<Option<CanonicalField>> = row_texts(rows[header_index], &self.cell)
            .iter()
            .map(|header| keywords::match_header(&self.rules, &normalize_key(header)))
            .collect();

        if columns.iter().all(Option::is_none) {
            debug!("Header row {} mapped no columns, using positional layout", header_index);
            return ColumnMapping::positional();
        }

        debug!("Header row {} mapped columns {:?}", header_index, columns);
        ColumnMapping {
            columns,
            data_start_row: header_index + 1,
        }
    }

    fn extract_from_table(&self, table: ElementRef) -> Vec<RawRecord> {
        let rows = table_rows(table, &self.row);
        if rows.is_empty() {
            return Vec::new();
        }

        let mapping = self.column_mapping(&rows);
        rows.iter()
            .skip(mapping.data_start_row)
            .filter_map(|row| self.extract_row(&mapping, &row_texts(*row, &self.cell)))
            .collect()
    }

    fn extract_row(&self, mapping: &ColumnMapping, cells: &[String]) -> Option<RawRecord> {
        let mut record = RawRecord::new();

        for (column, text) in cells.iter().enumerate() {
            if is_pure_glyph(text) {
                continue;
            }
            let Some(field) = mapping.field_at(column) else {
                continue;
            };

            match field {
                CanonicalField::FullName => {
                    if let Some((first, last)) = split_full_name(text) {
                        record.set(CanonicalField::FirstName, first);
                        record.insert(CanonicalField::LastName.as_str(), last);
                        record.set(CanonicalField::FullName, text.clone());
                    }
                }
                score if score.is_score() => match first_number(text) {
                    Some(number) => record.set(score, number),
                    None => debug!("Dropping non-numeric {} cell '{}'", score, text),
                },
                other => record.set(other, text.clone()),
            }
        }

        if record.is_empty() {
            return None;
        }

        let identified = record.contains(CanonicalField::StudentId)
            || record.contains(CanonicalField::FirstName)
            || record.contains(CanonicalField::FullName);
        if !identified && keywords::is_action_text(&cells.join(" ").to_lowercase()) {
            debug!("Skipping action-only row {:?}", cells);
            return None;
        }

        Some(record)
    }
}

impl ContextualParser for TableHeuristicExtractor {
    type Output = Vec<RawRecord>;
    type Context = PageContext;

    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> ParsingResult<Self::Output> {
        let table = match context.table_index {
            Some(index) => html.select(&self.any_table).nth(index),
            None => self.preferred_table(html),
        }
        .ok_or_else(|| self.no_table())?;

        let records = self.extract_from_table(table);
        debug!("Extracted {} rows from {}", records.len(), context.source);
        Ok(records)
    }
}

fn parse_static(selector: &str) -> ParsingResult<Selector> {
    Selector::parse(selector).map_err(|e| ParsingError::invalid_selector(selector, e))
}

/// Compile selector strings, logging and skipping the invalid ones
fn compile_selectors(selector_strings: &[String]) -> Vec<(String, Selector)> {
    selector_strings
        .iter()
        .filter_map(|s| match Selector::parse(s) {
            Ok(selector) => Some((s.clone(), selector)),
            Err(e) => {
                warn!("Failed to compile selector '{}': {}", s, e);
                None
            }
        })
        .collect()
}

fn table_rows<'a>(table: ElementRef<'a>, row: &Selector) -> Vec<ElementRef<'a>> {
    table.select(row).collect()
}

fn row_texts(row: ElementRef, cell: &Selector) -> Vec<String> {
    row.select(cell).map(|c| element_text(&c)).collect()
}

fn element_text(element: &ElementRef) -> String {
    clean_text(&element.text().collect::<String>())
}
