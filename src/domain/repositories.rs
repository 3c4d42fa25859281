//! Repository interfaces for student persistence
//!
//! The import engine only needs two operations from storage; everything else
//! about the schema stays behind the implementation.

use async_trait::async_trait;
use thiserror::Error;

use super::student::{CanonicalRecord, Student};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Student {0} already exists")]
    Duplicate(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait StudentStore: Send + Sync {
    /// Look a student up by its business id (not the row id)
    async fn get_by_id(&self, student_id: &str) -> StoreResult<Option<Student>>;

    /// Insert every record in one transaction and commit it.
    ///
    /// Either all records are committed and their ids returned in input
    /// order, or nothing is and the error is returned.
    async fn bulk_insert_and_commit(&self, records: &[CanonicalRecord]) -> StoreResult<Vec<String>>;
}
