//! Parsing context for HTML extraction

/// Where the HTML being parsed came from
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    /// Locator the page was fetched from (URL or `file://` path)
    pub source: String,

    /// Index of the table within the document, once one is chosen
    pub table_index: Option<usize>,
}

impl PageContext {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            table_index: None,
        }
    }

    pub fn with_table_index(mut self, index: usize) -> Self {
        self.table_index = Some(index);
        self
    }
}
