//! Canonical student field names
//!
//! Every extractor and the normalizer speak in terms of this fixed field set.
//! Raw records use the `as_str()` spelling as their keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of fields a student record can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    StudentId,
    FirstName,
    LastName,
    FullName,
    Email,
    BirthDate,
    Hometown,
    MathScore,
    LiteratureScore,
    EnglishScore,
}

impl CanonicalField {
    pub const ALL: [Self; 10] = [
        Self::StudentId,
        Self::FirstName,
        Self::LastName,
        Self::FullName,
        Self::Email,
        Self::BirthDate,
        Self::Hometown,
        Self::MathScore,
        Self::LiteratureScore,
        Self::EnglishScore,
    ];

    pub const SCORES: [Self; 3] = [Self::MathScore, Self::LiteratureScore, Self::EnglishScore];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StudentId => "student_id",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::FullName => "full_name",
            Self::Email => "email",
            Self::BirthDate => "birth_date",
            Self::Hometown => "hometown",
            Self::MathScore => "math_score",
            Self::LiteratureScore => "literature_score",
            Self::EnglishScore => "english_score",
        }
    }

    pub const fn is_score(self) -> bool {
        matches!(self, Self::MathScore | Self::LiteratureScore | Self::EnglishScore)
    }

    /// Exact lookup by canonical spelling
    pub fn from_canonical(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == key)
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
