//! Raw record canonicalization
//!
//! Maps arbitrary source keys (English, Vietnamese with or without
//! diacritics) onto canonical fields, coerces each value, and builds typed
//! records. Nothing here fails: rejected rows become row-indexed reasons.

#![allow(clippy::uninlined_format_args)]

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::domain::{CanonicalField, CanonicalRecord, RawRecord, StudentFields};
use crate::infrastructure::parsing::text::{normalize_key, parse_first_number, split_full_name};

/// Minimum number of alphanumerics a student id keeps after stripping
pub const MIN_STUDENT_ID_LEN: usize = 6;

/// Source key spellings accepted for each field, compared after
/// [`normalize_key`]
static SYNONYMS: &[(&str, CanonicalField)] = &[
    ("student_id", CanonicalField::StudentId),
    ("studentid", CanonicalField::StudentId),
    ("student id", CanonicalField::StudentId),
    ("id", CanonicalField::StudentId),
    ("mssv", CanonicalField::StudentId),
    ("masv", CanonicalField::StudentId),
    ("mã sv", CanonicalField::StudentId),
    ("ma sv", CanonicalField::StudentId),
    ("mã số sinh viên", CanonicalField::StudentId),
    ("ma so sinh vien", CanonicalField::StudentId),
    ("first_name", CanonicalField::FirstName),
    ("firstname", CanonicalField::FirstName),
    ("fname", CanonicalField::FirstName),
    ("tên", CanonicalField::FirstName),
    ("ten", CanonicalField::FirstName),
    ("last_name", CanonicalField::LastName),
    ("lastname", CanonicalField::LastName),
    ("lname", CanonicalField::LastName),
    ("surname", CanonicalField::LastName),
    ("họ", CanonicalField::LastName),
    ("ho", CanonicalField::LastName),
    ("full_name", CanonicalField::FullName),
    ("fullname", CanonicalField::FullName),
    ("name", CanonicalField::FullName),
    ("họ tên", CanonicalField::FullName),
    ("ho ten", CanonicalField::FullName),
    ("họ và tên", CanonicalField::FullName),
    ("ho va ten", CanonicalField::FullName),
    ("email", CanonicalField::Email),
    ("e mail", CanonicalField::Email),
    ("mail", CanonicalField::Email),
    ("thư điện tử", CanonicalField::Email),
    ("thu dien tu", CanonicalField::Email),
    ("birth_date", CanonicalField::BirthDate),
    ("birthdate", CanonicalField::BirthDate),
    ("date of birth", CanonicalField::BirthDate),
    ("dob", CanonicalField::BirthDate),
    ("ngày sinh", CanonicalField::BirthDate),
    ("ngay sinh", CanonicalField::BirthDate),
    ("hometown", CanonicalField::Hometown),
    ("home town", CanonicalField::Hometown),
    ("address", CanonicalField::Hometown),
    ("quê quán", CanonicalField::Hometown),
    ("que quan", CanonicalField::Hometown),
    ("nơi sinh", CanonicalField::Hometown),
    ("noi sinh", CanonicalField::Hometown),
    ("math_score", CanonicalField::MathScore),
    ("math", CanonicalField::MathScore),
    ("mathematics", CanonicalField::MathScore),
    ("toán", CanonicalField::MathScore),
    ("toan", CanonicalField::MathScore),
    ("điểm toán", CanonicalField::MathScore),
    ("diem toan", CanonicalField::MathScore),
    ("literature_score", CanonicalField::LiteratureScore),
    ("literature", CanonicalField::LiteratureScore),
    ("văn", CanonicalField::LiteratureScore),
    ("van", CanonicalField::LiteratureScore),
    ("ngữ văn", CanonicalField::LiteratureScore),
    ("ngu van", CanonicalField::LiteratureScore),
    ("điểm văn", CanonicalField::LiteratureScore),
    ("diem van", CanonicalField::LiteratureScore),
    ("english_score", CanonicalField::EnglishScore),
    ("english", CanonicalField::EnglishScore),
    ("anh", CanonicalField::EnglishScore),
    ("tiếng anh", CanonicalField::EnglishScore),
    ("tieng anh", CanonicalField::EnglishScore),
    ("điểm anh", CanonicalField::EnglishScore),
    ("diem anh", CanonicalField::EnglishScore),
    ("điểm tiếng anh", CanonicalField::EnglishScore),
    ("diem tieng anh", CanonicalField::EnglishScore),
];

const DATE_FORMATS: [&str; 6] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%m/%d/%Y"];

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Accepted records and the reasons the others were rejected
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub records: Vec<CanonicalRecord>,
    pub errors: Vec<String>,
}

pub struct FieldNormalizer {
    synonyms: HashMap<String, CanonicalField>,
}

impl FieldNormalizer {
    pub fn new() -> Self {
        let synonyms = SYNONYMS
            .iter()
            .map(|(key, field)| (normalize_key(key), *field))
            .collect();
        Self { synonyms }
    }

    /// Canonical field for a source key, if it is a known spelling
    pub fn canonical_field(&self, key: &str) -> Option<CanonicalField> {
        self.synonyms.get(&normalize_key(key)).copied()
    }

    /// Normalize a batch, keeping the first record seen for each id
    pub fn normalize(&self, raw_records: &[RawRecord]) -> Normalized {
        let mut normalized = Normalized::default();
        let mut seen = HashSet::new();

        for (index, raw) in raw_records.iter().enumerate() {
            let row = index + 1;
            match self.normalize_record(raw) {
                Ok(record) => {
                    if seen.insert(record.student_id().to_string()) {
                        normalized.records.push(record);
                    } else {
                        debug!("Row {}: dropping duplicate of {}", row, record.student_id());
                    }
                }
                Err(reason) => normalized.errors.push(format!("Row {}: {}", row, reason)),
            }
        }

        debug!(
            "Normalized {} raw records into {} ({} rejected)",
            raw_records.len(),
            normalized.records.len(),
            normalized.errors.len()
        );
        normalized
    }

    /// Normalize one record, returning the rejection reason on failure
    pub fn normalize_record(&self, raw: &RawRecord) -> Result<CanonicalRecord, String> {
        let values = self.resolve_fields(raw);
        let value = |field: CanonicalField| values.get(&field).map(|v| v.trim()).filter(|v| !v.is_empty());

        let student_id = match value(CanonicalField::StudentId) {
            Some(id) => normalize_student_id(id)?,
            None => return Err("Student ID is required".to_string()),
        };

        let mut first_name = value(CanonicalField::FirstName).map(str::to_string);
        let mut last_name = value(CanonicalField::LastName).map(str::to_string);
        if first_name.is_none() || last_name.is_none() {
            if let Some((first, last)) = value(CanonicalField::FullName).and_then(split_full_name) {
                first_name = first_name.or(Some(first));
                last_name = last_name.or(last);
            }
        }
        let first_name = first_name.ok_or("First name is required")?;
        let last_name = last_name.ok_or("Last name is required")?;

        let fields = StudentFields {
            student_id,
            first_name,
            last_name,
            email: value(CanonicalField::Email).and_then(normalize_email),
            birth_date: value(CanonicalField::BirthDate).and_then(parse_birth_date),
            hometown: value(CanonicalField::Hometown).map(str::to_string),
            math_score: value(CanonicalField::MathScore).and_then(normalize_score),
            literature_score: value(CanonicalField::LiteratureScore).and_then(normalize_score),
            english_score: value(CanonicalField::EnglishScore).and_then(normalize_score),
        };

        CanonicalRecord::new(fields).map_err(|e| e.to_string())
    }

    /// One value per field: the canonical key when it is set, else the first
    /// non-empty synonym in key order
    fn resolve_fields<'a>(&self, raw: &'a RawRecord) -> HashMap<CanonicalField, &'a str> {
        let mut values = HashMap::new();

        for field in CanonicalField::ALL {
            if let Some(value) = raw.field(field) {
                values.insert(field, value);
            }
        }

        for (key, value) in raw.iter() {
            let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
                continue;
            };
            match self.canonical_field(key) {
                Some(field) => {
                    values.entry(field).or_insert(value);
                }
                None => debug!("Ignoring unknown key '{}'", key),
            }
        }

        values
    }
}

impl Default for FieldNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip everything but letters and digits, require at least six left, uppercase
pub fn normalize_student_id(raw: &str) -> Result<String, String> {
    let cleaned: String = raw.chars().filter(|c| c.is_alphanumeric()).collect();
    if cleaned.chars().count() < MIN_STUDENT_ID_LEN {
        return Err(format!(
            "Student ID '{}' is too short (minimum {} alphanumeric characters)",
            raw.trim(),
            MIN_STUDENT_ID_LEN
        ));
    }
    Ok(cleaned.to_uppercase())
}

/// Keep values that at least look like an address
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim();
    if email.contains('@') && email.contains('.') {
        Some(email.to_string())
    } else {
        debug!("Dropping malformed email '{}'", email);
        None
    }
}

/// Scores on a 10-point scale: `[0,10]` as is, `(10,100]` divided by ten,
/// anything else dropped
pub fn normalize_score(raw: &str) -> Option<f64> {
    let value = parse_first_number(raw)?;
    if (0.0..=10.0).contains(&value) {
        Some(value)
    } else if value > 10.0 && value <= 100.0 {
        Some(value / 10.0)
    } else {
        debug!("Dropping out-of-range score '{}'", raw);
        None
    }
}

pub fn parse_birth_date(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            debug!("Dropping unparseable birth date '{}'", text);
            None
        })
}
