//! Parsing configuration for HTML extraction
//!
//! Centralized configuration for CSS selectors and parsing behavior.

use serde::{Deserialize, Serialize};

use crate::domain::CanonicalField;
use crate::infrastructure::config::defaults;

/// Table discovery and header detection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableParsingConfig {
    /// Selectors tried in order to find the preferred student table
    pub table_selectors: Vec<String>,

    /// How many leading rows are scanned for a header
    pub header_scan_rows: usize,
}

impl Default for TableParsingConfig {
    fn default() -> Self {
        Self {
            table_selectors: vec![
                "table#studentsTable".to_string(),
                "table.students-table".to_string(),
                "table.table".to_string(),
                "table".to_string(),
            ],
            header_scan_rows: defaults::HEADER_SCAN_ROWS,
        }
    }
}

/// CSS selectors for single-student pages, tried in order per field
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailSelectors {
    pub student_id: Vec<String>,
    pub first_name: Vec<String>,
    pub last_name: Vec<String>,
    pub full_name: Vec<String>,
    pub email: Vec<String>,
    pub birth_date: Vec<String>,
    pub hometown: Vec<String>,
    pub math_score: Vec<String>,
    pub literature_score: Vec<String>,
    pub english_score: Vec<String>,
}

impl DetailSelectors {
    pub fn for_field(&self, field: CanonicalField) -> &[String] {
        match field {
            CanonicalField::StudentId => &self.student_id,
            CanonicalField::FirstName => &self.first_name,
            CanonicalField::LastName => &self.last_name,
            CanonicalField::FullName => &self.full_name,
            CanonicalField::Email => &self.email,
            CanonicalField::BirthDate => &self.birth_date,
            CanonicalField::Hometown => &self.hometown,
            CanonicalField::MathScore => &self.math_score,
            CanonicalField::LiteratureScore => &self.literature_score,
            CanonicalField::EnglishScore => &self.english_score,
        }
    }
}

/// `#a-b`, `.a-b`, `[data-field="a_b"]` for a field named `a_b`
fn field_selectors(field: CanonicalField) -> Vec<String> {
    let name = field.as_str();
    let dashed = name.replace('_', "-");
    vec![
        format!("#{dashed}"),
        format!(".{dashed}"),
        format!("[data-field=\"{name}\"]"),
    ]
}

impl Default for DetailSelectors {
    fn default() -> Self {
        let mut student_id = field_selectors(CanonicalField::StudentId);
        student_id.push("[data-student-id]".to_string());

        Self {
            student_id,
            first_name: field_selectors(CanonicalField::FirstName),
            last_name: field_selectors(CanonicalField::LastName),
            full_name: field_selectors(CanonicalField::FullName),
            email: field_selectors(CanonicalField::Email),
            birth_date: field_selectors(CanonicalField::BirthDate),
            hometown: field_selectors(CanonicalField::Hometown),
            math_score: field_selectors(CanonicalField::MathScore),
            literature_score: field_selectors(CanonicalField::LiteratureScore),
            english_score: field_selectors(CanonicalField::EnglishScore),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_detail_selectors_follow_field_names() {
        let selectors = DetailSelectors::default();
        assert_eq!(
            selectors.for_field(CanonicalField::StudentId)[..3],
            [
                "#student-id".to_string(),
                ".student-id".to_string(),
                "[data-field=\"student_id\"]".to_string()
            ]
        );
        assert_eq!(selectors.for_field(CanonicalField::MathScore)[0], "#math-score");
    }
}
