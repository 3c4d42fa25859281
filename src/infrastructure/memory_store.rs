//! In-memory student store for dry runs and tests

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;

use crate::domain::{CanonicalRecord, StoreError, StoreResult, Student, StudentStore};

#[derive(Default)]
struct Inner {
    students: BTreeMap<String, Student>,
    next_id: i64,
}

/// Same contract as the SQLite store: unique business ids and batch commits
/// that either land whole or not at all
#[derive(Default)]
pub struct InMemoryStudentStore {
    inner: RwLock<Inner>,
}

impl InMemoryStudentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the given records
    pub async fn with_records(records: &[CanonicalRecord]) -> StoreResult<Self> {
        let store = Self::new();
        store.bulk_insert_and_commit(records).await?;
        Ok(store)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.students.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn all(&self) -> Vec<Student> {
        self.inner.read().await.students.values().cloned().collect()
    }
}

#[async_trait]
impl StudentStore for InMemoryStudentStore {
    async fn get_by_id(&self, student_id: &str) -> StoreResult<Option<Student>> {
        Ok(self.inner.read().await.students.get(student_id).cloned())
    }

    async fn bulk_insert_and_commit(&self, records: &[CanonicalRecord]) -> StoreResult<Vec<String>> {
        let mut inner = self.inner.write().await;

        // validate the whole batch before touching the map
        let mut batch = BTreeSet::new();
        for record in records {
            let id = record.student_id();
            if inner.students.contains_key(id) || !batch.insert(id) {
                return Err(StoreError::Duplicate(id.to_string()));
            }
        }

        let now = Utc::now();
        let mut inserted = Vec::with_capacity(records.len());
        for record in records {
            inner.next_id += 1;
            let student = Student::from_record(inner.next_id, record, now);
            inner.students.insert(student.student_id.clone(), student);
            inserted.push(record.student_id().to_string());
        }

        Ok(inserted)
    }
}
