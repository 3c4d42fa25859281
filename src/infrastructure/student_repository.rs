//! SQLite-backed student store

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use tracing::debug;

use crate::domain::{CanonicalRecord, StoreError, StoreResult, Student, StudentStore};

const SELECT_COLUMNS: &str = r"
    id, student_id, first_name, last_name, email, birth_date, hometown,
    math_score, literature_score, english_score, created_at, updated_at
";

pub struct SqliteStudentRepository {
    pool: SqlitePool,
}

impl SqliteStudentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_student(row: &SqliteRow) -> Result<Student, sqlx::Error> {
        Ok(Student {
            id: row.try_get("id")?,
            student_id: row.try_get("student_id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
            birth_date: row.try_get("birth_date")?,
            hometown: row.try_get("hometown")?,
            math_score: row.try_get("math_score")?,
            literature_score: row.try_get("literature_score")?,
            english_score: row.try_get("english_score")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    /// Number of stored students
    pub async fn count(&self) -> StoreResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM students")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("total")?)
    }

    /// All students ordered by business id
    pub async fn list_all(&self) -> StoreResult<Vec<Student>> {
        let rows = sqlx::query(&format!("SELECT {SELECT_COLUMNS} FROM students ORDER BY student_id"))
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| Self::row_to_student(row).map_err(StoreError::from))
            .collect()
    }
}

#[async_trait]
impl StudentStore for SqliteStudentRepository {
    async fn get_by_id(&self, student_id: &str) -> StoreResult<Option<Student>> {
        let row = sqlx::query(&format!("SELECT {SELECT_COLUMNS} FROM students WHERE student_id = ?"))
            .bind(student_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref()
            .map(Self::row_to_student)
            .transpose()
            .map_err(StoreError::from)
    }

    async fn bulk_insert_and_commit(&self, records: &[CanonicalRecord]) -> StoreResult<Vec<String>> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(records.len());

        for record in records {
            let result = sqlx::query(
                r"
                INSERT INTO students (
                    student_id, first_name, last_name, email, birth_date, hometown,
                    math_score, literature_score, english_score, created_at, updated_at
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
            )
            .bind(record.student_id())
            .bind(record.first_name())
            .bind(record.last_name())
            .bind(record.email())
            .bind(record.birth_date())
            .bind(record.hometown())
            .bind(record.math_score())
            .bind(record.literature_score())
            .bind(record.english_score())
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await;

            // dropping `tx` on any early return rolls the whole batch back
            match result {
                Ok(_) => inserted.push(record.student_id().to_string()),
                Err(e) if is_unique_violation(&e) => {
                    return Err(StoreError::Duplicate(record.student_id().to_string()));
                }
                Err(e) => return Err(e.into()),
            }
        }

        tx.commit().await?;
        debug!("Committed {} students", inserted.len());
        Ok(inserted)
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StudentFields;
    use crate::infrastructure::database_connection::DatabaseConnection;
    use chrono::NaiveDate;

    async fn repository() -> SqliteStudentRepository {
        let db = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        SqliteStudentRepository::new(db.pool().clone())
    }

    fn record(id: &str) -> CanonicalRecord {
        CanonicalRecord::new(StudentFields {
            student_id: id.to_string(),
            first_name: "An".to_string(),
            last_name: "Nguyễn Văn".to_string(),
            email: Some("an@school.edu.vn".to_string()),
            birth_date: NaiveDate::from_ymd_opt(2002, 3, 4),
            math_score: Some(8.5),
            ..StudentFields::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn inserts_and_reads_back() {
        let repo = repository().await;
        let ids = repo
            .bulk_insert_and_commit(&[record("SV000001"), record("SV000002")])
            .await
            .unwrap();
        assert_eq!(ids, vec!["SV000001", "SV000002"]);

        let student = repo.get_by_id("SV000001").await.unwrap().unwrap();
        assert_eq!(student.first_name, "An");
        assert_eq!(student.birth_date, NaiveDate::from_ymd_opt(2002, 3, 4));
        assert_eq!(student.math_score, Some(8.5));
        assert_eq!(student.literature_score, None);
        assert!(repo.get_by_id("SV999999").await.unwrap().is_none());
        assert_eq!(repo.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn duplicate_rolls_back_whole_batch() {
        let repo = repository().await;
        repo.bulk_insert_and_commit(&[record("SV000001")]).await.unwrap();

        let result = repo
            .bulk_insert_and_commit(&[record("SV000002"), record("SV000001")])
            .await;
        assert!(matches!(result, Err(StoreError::Duplicate(id)) if id == "SV000001"));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_batch_commits_nothing() {
        let repo = repository().await;
        assert!(repo.bulk_insert_and_commit(&[]).await.unwrap().is_empty());
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
