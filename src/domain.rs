//! Domain module - student records, extraction provenance and storage contracts
//!
//! Modern Rust module organization (Rust 2018+ style):
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod fields;
pub mod import_outcome;
pub mod raw_record;
pub mod repositories;
pub mod student;

pub use fields::CanonicalField;
pub use import_outcome::ImportOutcome;
pub use raw_record::{AttemptOutcome, ExtractionResult, RawRecord, StrategyAttempt, StrategyKind};
pub use repositories::{StoreError, StoreResult, StudentStore};
pub use student::{CanonicalRecord, Grade, Student, StudentFields, ValidationError};
