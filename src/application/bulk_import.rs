//! Bulk import with per-row skips and an atomic commit
//!
//! Every record is checked against the store and against the rest of the
//! batch before anything is written. Rows that fail a check are skipped and
//! reported without stopping the batch. The survivors go to the store in a
//! single transaction: either all of them are committed or none are.

#![allow(clippy::uninlined_format_args)]

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{CanonicalRecord, ImportOutcome, StudentStore};

pub struct BulkImportEngine {
    store: Arc<dyn StudentStore>,
}

impl BulkImportEngine {
    pub fn new(store: Arc<dyn StudentStore>) -> Self {
        Self { store }
    }

    /// Import a batch of validated records.
    ///
    /// Duplicates and lookup failures become per-row errors. The commit is
    /// attempted exactly once, even for an empty batch; if it fails nothing
    /// is imported and the failure is appended to the errors.
    pub async fn import(&self, records: Vec<CanonicalRecord>) -> ImportOutcome {
        let processed = records.len();
        let mut errors = Vec::new();
        let mut staged_ids = HashSet::new();
        let mut staged = Vec::with_capacity(processed);

        for record in records {
            let student_id = record.student_id().to_string();

            if staged_ids.contains(&student_id) {
                errors.push(format!("Student {} already exists", student_id));
                continue;
            }

            match self.store.get_by_id(&student_id).await {
                Ok(Some(_)) => errors.push(format!("Student {} already exists", student_id)),
                Ok(None) => {
                    staged_ids.insert(student_id);
                    staged.push(record);
                }
                Err(e) => errors.push(format!("Error creating student {}: {}", student_id, e)),
            }
        }

        match self.store.bulk_insert_and_commit(&staged).await {
            Ok(imported_ids) => {
                info!("Imported {} of {} students", imported_ids.len(), processed);
                ImportOutcome::new(processed, imported_ids, errors)
            }
            Err(e) => {
                warn!("Bulk import of {} students rolled back: {}", staged.len(), e);
                errors.push(format!("Transaction failed: {}", e));
                ImportOutcome::new(processed, Vec::new(), errors)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StudentFields;
    use crate::infrastructure::InMemoryStudentStore;

    fn record(id: &str) -> CanonicalRecord {
        CanonicalRecord::new(StudentFields {
            student_id: id.to_string(),
            first_name: "An".to_string(),
            last_name: "Nguyễn".to_string(),
            ..StudentFields::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn imports_fresh_batch() {
        let store = Arc::new(InMemoryStudentStore::new());
        let engine = BulkImportEngine::new(store.clone());

        let outcome = engine.import(vec![record("SV000001"), record("SV000002")]).await;

        assert_eq!(outcome.processed, 2);
        assert_eq!(outcome.succeeded, 2);
        assert_eq!(outcome.failed, 0);
        assert_eq!(outcome.imported_ids, vec!["SV000001", "SV000002"]);
        assert!(outcome.errors.is_empty());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn existing_ids_are_reported_not_fatal() {
        let store = Arc::new(InMemoryStudentStore::with_records(&[record("SV000001")]).await.unwrap());
        let engine = BulkImportEngine::new(store.clone());

        let outcome = engine
            .import(vec![record("SV000001"), record("SV000002"), record("SV000002")])
            .await;

        assert_eq!(outcome.processed, 3);
        assert_eq!(outcome.succeeded, 1);
        assert_eq!(outcome.failed, 2);
        assert_eq!(
            outcome.errors,
            vec!["Student SV000001 already exists", "Student SV000002 already exists"]
        );
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let engine = BulkImportEngine::new(Arc::new(InMemoryStudentStore::new()));
        let outcome = engine.import(Vec::new()).await;
        assert_eq!(outcome, ImportOutcome::new(0, Vec::new(), Vec::new()));
    }
}
