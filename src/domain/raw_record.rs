//! Unvalidated records and extraction provenance
//!
//! A [`RawRecord`] is whatever an extractor managed to pull out of a page or an
//! API item. Nothing about it is trusted until the normalizer has seen it.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::fields::CanonicalField;

/// String-keyed bag of optional string values, as found on the page.
///
/// Keys keep the order they were first inserted in, so consumers that pick
/// the first of several synonymous keys see them in source order. Equality
/// ignores that order.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    fields: Vec<(String, Option<String>)>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value under an arbitrary key; the last write for a key wins
    /// and keeps the key's original position
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn set(&mut self, field: CanonicalField, value: impl Into<String>) {
        self.insert(field.as_str(), Some(value.into()));
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, Some(value.into()));
        self
    }

    fn raw(&self, key: &str) -> Option<&Option<String>> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Non-empty value for a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.raw(key)
            .and_then(Option::as_deref)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn field(&self, field: CanonicalField) -> Option<&str> {
        self.get(field.as_str())
    }

    pub fn contains(&self, field: CanonicalField) -> bool {
        self.field(field).is_some()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl PartialEq for RawRecord {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.fields.iter().all(|(key, value)| other.raw(key) == Some(value))
    }
}

impl Eq for RawRecord {}

impl FromIterator<(String, Option<String>)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (String, Option<String>)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

impl Serialize for RawRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct RawRecordVisitor;

impl<'de> Visitor<'de> for RawRecordVisitor {
    type Value = RawRecord;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of field names to optional strings")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut record = RawRecord::new();
        while let Some((key, value)) = access.next_entry::<String, Option<String>>()? {
            record.insert(key, value);
        }
        Ok(record)
    }
}

impl<'de> Deserialize<'de> for RawRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RawRecordVisitor)
    }
}

/// The strategies the selector knows how to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Paginated retrieval from a backing JSON API on a local port
    ApiFallback,
    /// Table heuristics against a local/frontend page
    FrontendTable,
    /// Table heuristics against an arbitrary fetched page
    GenericTable,
    /// Ordered CSS selectors against a single-student page
    DetailPage,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ApiFallback => "api_fallback",
            Self::FrontendTable => "frontend_table",
            Self::GenericTable => "generic_table",
            Self::DetailPage => "detail_page",
        };
        f.write_str(name)
    }
}

/// How a single strategy attempt ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Succeeded { found: usize },
    Empty,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyAttempt {
    pub strategy: StrategyKind,
    pub outcome: AttemptOutcome,
}

/// Raw records plus where they came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub records: Vec<RawRecord>,
    /// Strategy that produced `records`, `None` when every strategy came up empty
    pub strategy: Option<StrategyKind>,
    pub source: String,
    pub found: usize,
    pub attempts: Vec<StrategyAttempt>,
}

impl ExtractionResult {
    pub fn empty(source: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            strategy: None,
            source: source.into(),
            found: 0,
            attempts: Vec::new(),
        }
    }

    pub fn from_records(strategy: StrategyKind, source: impl Into<String>, records: Vec<RawRecord>) -> Self {
        Self {
            found: records.len(),
            records,
            strategy: Some(strategy),
            source: source.into(),
            attempts: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn with_attempts(mut self, attempts: Vec<StrategyAttempt>) -> Self {
        self.attempts = attempts;
        self
    }
}
