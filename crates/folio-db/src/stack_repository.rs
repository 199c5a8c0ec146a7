use sqlx::{PgPool, Pool, Postgres};

use folio_core::AppError;
use folio_core::stack::{Stack, StackGroup, StackWithCount};

use crate::map_unique;

/// PostgreSQL-backed technology stack catalogue.
#[derive(Clone)]
pub struct StackRepository {
    pool: Pool<Postgres>,
}

#[derive(sqlx::FromRow)]
struct StackRow {
    id: i64,
    name: String,
    stack_group: String,
}

impl From<StackRow> for Stack {
    fn from(row: StackRow) -> Self {
        Stack {
            id: row.id,
            name: row.name,
            group: row.stack_group.parse().unwrap_or_default(),
        }
    }
}

#[derive(sqlx::FromRow)]
struct StackCountRow {
    id: i64,
    name: String,
    stack_group: String,
    post_count: i64,
}

impl From<StackCountRow> for StackWithCount {
    fn from(row: StackCountRow) -> Self {
        StackWithCount {
            id: row.id,
            name: row.name,
            group: row.stack_group.parse().unwrap_or_default(),
            post_count: row.post_count,
        }
    }
}

const COUNTED_STACKS: &str = r#"
    SELECT s.id, s.name, s.stack_group, COUNT(p.id) AS post_count
    FROM stacks s
    LEFT JOIN post_stack ps ON ps.stack_id = s.id
    LEFT JOIN posts p ON p.id = ps.post_id AND p.status = 'PUBLISHED'
    GROUP BY s.id, s.name, s.stack_group
"#;

impl StackRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_all(&self) -> Result<Vec<Stack>, AppError> {
        let rows = sqlx::query_as::<_, StackRow>(
            r#"SELECT id, name, stack_group FROM stacks ORDER BY name ASC"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn list_by_group(&self, group: StackGroup) -> Result<Vec<Stack>, AppError> {
        let rows = sqlx::query_as::<_, StackRow>(
            r#"SELECT id, name, stack_group FROM stacks WHERE stack_group = $1 ORDER BY name ASC"#,
        )
        .bind(group.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Stack>, AppError> {
        let row = sqlx::query_as::<_, StackRow>(
            r#"SELECT id, name, stack_group FROM stacks WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    /// Stacks whose name is in `names`. Unknown names are silently skipped.
    pub async fn find_by_names(&self, names: &[String]) -> Result<Vec<Stack>, AppError> {
        if names.is_empty() {
            return Ok(vec![]);
        }
        let rows = sqlx::query_as::<_, StackRow>(
            r#"SELECT id, name, stack_group FROM stacks WHERE name = ANY($1) ORDER BY name ASC"#,
        )
        .bind(names)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Whether `name` is taken, optionally ignoring the stack being renamed.
    pub async fn name_exists(&self, name: &str, excluding: Option<i64>) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM stacks
                WHERE name = $1 AND ($2::BIGINT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(name)
        .bind(excluding)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))
    }

    pub async fn create(&self, name: &str, group: StackGroup) -> Result<Stack, AppError> {
        let row = sqlx::query_as::<_, StackRow>(
            r#"
            INSERT INTO stacks (name, stack_group)
            VALUES ($1, $2)
            RETURNING id, name, stack_group
            "#,
        )
        .bind(name)
        .bind(group.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique(e, "Stack name is already in use"))?;

        Ok(row.into())
    }

    /// Rename/regroup a stack. Returns `None` if it does not exist.
    pub async fn update(
        &self,
        id: i64,
        name: &str,
        group: StackGroup,
    ) -> Result<Option<Stack>, AppError> {
        let row = sqlx::query_as::<_, StackRow>(
            r#"
            UPDATE stacks SET name = $2, stack_group = $3
            WHERE id = $1
            RETURNING id, name, stack_group
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(group.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique(e, "Stack name is already in use"))?;

        Ok(row.map(Into::into))
    }

    /// Delete a stack; post links cascade. Returns false if it did not exist.
    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(r#"DELETE FROM stacks WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Every stack with the number of published posts using it.
    pub async fn with_counts(&self) -> Result<Vec<StackWithCount>, AppError> {
        let sql = format!("{COUNTED_STACKS} ORDER BY s.name ASC");
        let rows = sqlx::query_as::<_, StackCountRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Most used stacks among published posts, ties broken by name.
    pub async fn popular(&self, limit: i64) -> Result<Vec<StackWithCount>, AppError> {
        let sql = format!(
            "{COUNTED_STACKS} HAVING COUNT(p.id) > 0 ORDER BY post_count DESC, s.name ASC LIMIT $1"
        );
        let rows = sqlx::query_as::<_, StackCountRow>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
