//! Student records: the validated draft and the persisted row
//!
//! [`CanonicalRecord`] is the only way a student enters the import engine.
//! Its fields are private, so once built it cannot drift away from the rules
//! checked in [`CanonicalRecord::new`].

use chrono::{DateTime, NaiveDate, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

lazy_static! {
    static ref STUDENT_ID_PATTERN: Regex = Regex::new(r"^[A-Za-z0-9]{6,12}$").unwrap();
    static ref EMAIL_PATTERN: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
}

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Student ID is required")]
    MissingStudentId,

    #[error("Student ID '{0}' must be 6-12 alphanumeric characters")]
    InvalidStudentId(String),

    #[error("{field} cannot be empty")]
    EmptyName { field: &'static str },

    #[error("Invalid email format: '{0}'")]
    InvalidEmail(String),

    #[error("{field} must be between 0 and 10, got {value}")]
    ScoreOutOfRange { field: &'static str, value: f64 },
}

/// Unchecked input for [`CanonicalRecord::new`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentFields {
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub hometown: Option<String>,
    pub math_score: Option<f64>,
    pub literature_score: Option<f64>,
    pub english_score: Option<f64>,
}

/// A validated student draft, ready for import
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRecord {
    student_id: String,
    first_name: String,
    last_name: String,
    email: Option<String>,
    birth_date: Option<NaiveDate>,
    hometown: Option<String>,
    math_score: Option<f64>,
    literature_score: Option<f64>,
    english_score: Option<f64>,
}

impl CanonicalRecord {
    /// Validate and build a record.
    ///
    /// The id is uppercased, names and optional text are trimmed, and the
    /// email must pass the RFC-lite pattern used by the API-facing schema.
    pub fn new(fields: StudentFields) -> Result<Self, ValidationError> {
        let student_id = fields.student_id.trim();
        if student_id.is_empty() {
            return Err(ValidationError::MissingStudentId);
        }
        if !STUDENT_ID_PATTERN.is_match(student_id) {
            return Err(ValidationError::InvalidStudentId(student_id.to_string()));
        }

        let first_name = required_name(&fields.first_name, "First name")?;
        let last_name = required_name(&fields.last_name, "Last name")?;

        let email = match fields.email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() => {
                if !EMAIL_PATTERN.is_match(email) {
                    return Err(ValidationError::InvalidEmail(email.to_string()));
                }
                Some(email.to_string())
            }
            _ => None,
        };

        Ok(Self {
            student_id: student_id.to_ascii_uppercase(),
            first_name,
            last_name,
            email,
            birth_date: fields.birth_date,
            hometown: fields
                .hometown
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty()),
            math_score: checked_score(fields.math_score, "math_score")?,
            literature_score: checked_score(fields.literature_score, "literature_score")?,
            english_score: checked_score(fields.english_score, "english_score")?,
        })
    }

    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn birth_date(&self) -> Option<NaiveDate> {
        self.birth_date
    }

    pub fn hometown(&self) -> Option<&str> {
        self.hometown.as_deref()
    }

    pub fn math_score(&self) -> Option<f64> {
        self.math_score
    }

    pub fn literature_score(&self) -> Option<f64> {
        self.literature_score
    }

    pub fn english_score(&self) -> Option<f64> {
        self.english_score
    }

    /// "First Last", the way the list pages print it
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn average_score(&self) -> Option<f64> {
        average(&[self.math_score, self.literature_score, self.english_score])
    }

    pub fn grade(&self) -> Option<Grade> {
        self.average_score().map(Grade::from_average)
    }
}

fn required_name(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName { field });
    }
    Ok(trimmed.to_string())
}

fn checked_score(value: Option<f64>, field: &'static str) -> Result<Option<f64>, ValidationError> {
    match value {
        Some(v) if !(MIN_SCORE..=MAX_SCORE).contains(&v) => {
            Err(ValidationError::ScoreOutOfRange { field, value: v })
        }
        other => Ok(other),
    }
}

#[allow(clippy::cast_precision_loss)]
fn average(scores: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = scores.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    Some(present.iter().sum::<f64>() / present.len() as f64)
}

/// Grade classification by average score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    Excellent,
    Good,
    Average,
    BelowAverage,
    Poor,
}

impl Grade {
    pub fn from_average(avg: f64) -> Self {
        if avg >= 8.5 {
            Self::Excellent
        } else if avg >= 7.0 {
            Self::Good
        } else if avg >= 5.5 {
            Self::Average
        } else if avg >= 4.0 {
            Self::BelowAverage
        } else {
            Self::Poor
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Average => "Average",
            Self::BelowAverage => "Below Average",
            Self::Poor => "Poor",
        }
    }
}

/// A student row as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub hometown: Option<String>,
    pub math_score: Option<f64>,
    pub literature_score: Option<f64>,
    pub english_score: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    /// Materialize a draft as a stored row with the given primary key
    pub fn from_record(id: i64, record: &CanonicalRecord, now: DateTime<Utc>) -> Self {
        Self {
            id,
            student_id: record.student_id().to_string(),
            first_name: record.first_name().to_string(),
            last_name: record.last_name().to_string(),
            email: record.email().map(str::to_string),
            birth_date: record.birth_date(),
            hometown: record.hometown().map(str::to_string),
            math_score: record.math_score(),
            literature_score: record.literature_score(),
            english_score: record.english_score(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn average_score(&self) -> Option<f64> {
        average(&[self.math_score, self.literature_score, self.english_score])
    }
}
