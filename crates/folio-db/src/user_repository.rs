use chrono::{DateTime, Utc};
use sqlx::{PgPool, Pool, Postgres};

use folio_core::AppError;
use folio_core::user::{NewUser, ProfileChanges, ProfileImageChange, Role, User};

use crate::map_unique;

/// PostgreSQL-backed user accounts and their profile image mapping.
#[derive(Clone)]
pub struct UserRepository {
    pool: Pool<Postgres>,
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password_hash: String,
    name: Option<String>,
    nickname: String,
    position: Option<String>,
    about: Option<String>,
    role: String,
    profile_image_path: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            name: row.name,
            nickname: row.nickname,
            position: row.position,
            about: row.about,
            role: row.role.parse().unwrap_or(Role::User),
            profile_image_path: row.profile_image_path,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user: &NewUser) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, password_hash, name, nickname, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.nickname)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique(e, "Email or nickname is already in use"))?;

        tracing::info!(user_id = row.id, nickname = %row.nickname, "User created");
        Ok(row.into())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(r#"SELECT * FROM users WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(r#"SELECT * FROM users WHERE email = $1"#)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    pub async fn find_by_nickname(&self, nickname: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(r#"SELECT * FROM users WHERE nickname = $1"#)
            .bind(nickname)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, bool>(r#"SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)"#)
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))
    }

    pub async fn nickname_exists(&self, nickname: &str) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS(SELECT 1 FROM users WHERE nickname = $1)"#,
        )
        .bind(nickname)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))
    }

    /// Apply profile field changes and the profile image change in one transaction.
    pub async fn update_profile(
        &self,
        user_id: i64,
        changes: &ProfileChanges,
        image: &ProfileImageChange,
    ) -> Result<User, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        sqlx::query(
            r#"
            UPDATE users
            SET nickname = COALESCE($2, nickname),
                position = COALESCE($3, position),
                about = COALESCE($4, about),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(&changes.nickname)
        .bind(&changes.position)
        .bind(&changes.about)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique(e, "Nickname is already in use"))?;

        match image {
            ProfileImageChange::Keep => {}
            ProfileImageChange::Remove => {
                sqlx::query(r#"DELETE FROM user_file WHERE user_id = $1 AND file_type = 'PROFILE'"#)
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| AppError::DatabaseError(e.to_string()))?;
                sqlx::query(r#"UPDATE users SET profile_image_path = NULL WHERE id = $1"#)
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| AppError::DatabaseError(e.to_string()))?;
            }
            ProfileImageChange::Replace { file_id, path } => {
                sqlx::query(r#"DELETE FROM user_file WHERE user_id = $1 AND file_type = 'PROFILE'"#)
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| AppError::DatabaseError(e.to_string()))?;
                sqlx::query(
                    r#"
                    INSERT INTO user_file (user_id, file_id, file_type)
                    VALUES ($1, $2, 'PROFILE')
                    "#,
                )
                .bind(user_id)
                .bind(file_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::DatabaseError(e.to_string()))?;
                sqlx::query(r#"UPDATE users SET profile_image_path = $2 WHERE id = $1"#)
                    .bind(user_id)
                    .bind(path)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| AppError::DatabaseError(e.to_string()))?;
            }
        }

        let row = sqlx::query_as::<_, UserRow>(r#"SELECT * FROM users WHERE id = $1"#)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.into())
    }

    pub async fn update_password(&self, user_id: i64, password_hash: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1"#,
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".into()));
        }
        Ok(())
    }
}
