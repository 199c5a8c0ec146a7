use chrono::{DateTime, Utc};
use sqlx::{PgPool, Pool, Postgres};

use folio_core::AppError;
use folio_core::file::{FileCategory, NewStoredFile, StoredFile};
use folio_core::traits::OrphanFileStore;

/// PostgreSQL-backed metadata for uploaded files.
#[derive(Clone)]
pub struct FileRepository {
    pool: Pool<Postgres>,
}

#[derive(sqlx::FromRow)]
struct FileRow {
    id: i64,
    original_name: String,
    storage_key: String,
    content_type: String,
    size: i64,
    category: String,
    created_at: DateTime<Utc>,
}

impl From<FileRow> for StoredFile {
    fn from(row: FileRow) -> Self {
        StoredFile {
            id: row.id,
            original_name: row.original_name,
            storage_key: row.storage_key,
            content_type: row.content_type,
            size: row.size,
            category: row.category.parse().unwrap_or(FileCategory::Document),
            created_at: row.created_at,
        }
    }
}

impl FileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, file: &NewStoredFile) -> Result<StoredFile, AppError> {
        let row = sqlx::query_as::<_, FileRow>(
            r#"
            INSERT INTO files (original_name, storage_key, content_type, size, category)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&file.original_name)
        .bind(&file.storage_key)
        .bind(&file.content_type)
        .bind(file.size)
        .bind(file.category.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.into())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<StoredFile>, AppError> {
        let row = sqlx::query_as::<_, FileRow>(r#"SELECT * FROM files WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    /// Fail with `NotFound` unless every id refers to an uploaded file.
    pub async fn ensure_exist(&self, ids: &[i64]) -> Result<(), AppError> {
        if ids.is_empty() {
            return Ok(());
        }
        let found = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM files WHERE id = ANY($1)"#,
        )
        .bind(ids)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        if found != ids.len() as i64 {
            return Err(AppError::NotFound(
                "One or more referenced files do not exist".into(),
            ));
        }
        Ok(())
    }
}

impl OrphanFileStore for FileRepository {
    async fn orphans_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<StoredFile>, AppError> {
        let rows = sqlx::query_as::<_, FileRow>(
            r#"
            SELECT f.* FROM files f
            WHERE f.created_at < $1
              AND NOT EXISTS (SELECT 1 FROM post_file pf WHERE pf.file_id = f.id)
              AND NOT EXISTS (SELECT 1 FROM user_file uf WHERE uf.file_id = f.id)
            ORDER BY f.created_at ASC
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_record(&self, file_id: i64) -> Result<(), AppError> {
        sqlx::query(r#"DELETE FROM files WHERE id = $1"#)
            .bind(file_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}
