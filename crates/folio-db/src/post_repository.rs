use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Pool, Postgres, QueryBuilder, Transaction};

use folio_core::AppError;
use folio_core::page::{Page, PageRequest};
use folio_core::post::{
    Author, NewPost, Post, PostChanges, PostFileKind, PostFilter, PostStatus, PostSuggestion,
    PostType, Thumbnail, ThumbnailChange, like_pattern,
};
use folio_core::related::{self, RELATED_LIMIT, SAME_TYPE_LIMIT};
use folio_core::slug;
use folio_core::traits::PostPurgeStore;

pub const AUTOCOMPLETE_LIMIT: i64 = 10;

const TITLE_CONSTRAINT: &str = "uq_posts_title";
const SLUG_CONSTRAINT: &str = "uq_posts_user_slug";

/// Slugs tried when concurrent writes keep taking the chosen one.
const SLUG_ATTEMPTS: usize = 3;

/// PostgreSQL-backed posts with their tags, stacks, and file mappings.
#[derive(Clone)]
pub struct PostRepository {
    pool: Pool<Postgres>,
}

// -- Internal row types for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    user_id: i64,
    post_type: String,
    title: String,
    slug: String,
    excerpt: String,
    content: String,
    status: String,
    thumbnail_path: Option<String>,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author_nickname: String,
    author_profile_image_path: Option<String>,
    tags: Vec<String>,
    stacks: Vec<String>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            user_id: row.user_id,
            author: Author {
                nickname: row.author_nickname,
                profile_image_path: row.author_profile_image_path,
            },
            post_type: row.post_type.parse().unwrap_or(PostType::Core),
            title: row.title,
            slug: row.slug,
            excerpt: row.excerpt,
            content: row.content,
            status: row.status.parse().unwrap_or(PostStatus::Published),
            thumbnail_path: row.thumbnail_path,
            tags: row.tags,
            stacks: row.stacks,
            deleted_at: row.deleted_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Why a post write failed.
enum WriteError {
    /// Another write took the slug between the check and the insert.
    SlugTaken,
    Other(AppError),
}

impl From<AppError> for WriteError {
    fn from(e: AppError) -> Self {
        WriteError::Other(e)
    }
}

fn map_write(e: sqlx::Error) -> WriteError {
    let constraint = e
        .as_database_error()
        .filter(|db| db.is_unique_violation())
        .and_then(|db| db.constraint());
    match constraint {
        Some(TITLE_CONSTRAINT) => {
            WriteError::Other(AppError::field("title", "Title is already in use"))
        }
        Some(SLUG_CONSTRAINT) => WriteError::SlugTaken,
        _ => WriteError::Other(AppError::DatabaseError(e.to_string())),
    }
}

#[derive(sqlx::FromRow)]
struct SuggestionRow {
    id: i64,
    title: String,
    slug: String,
    nickname: String,
}

impl From<SuggestionRow> for PostSuggestion {
    fn from(row: SuggestionRow) -> Self {
        PostSuggestion {
            id: row.id,
            title: row.title,
            slug: row.slug,
            nickname: row.nickname,
        }
    }
}

const POST_SELECT: &str = r#"
    SELECT p.id, p.user_id, p.post_type, p.title, p.slug, p.excerpt, p.content, p.status,
           p.thumbnail_path, p.deleted_at, p.created_at, p.updated_at,
           u.nickname AS author_nickname,
           u.profile_image_path AS author_profile_image_path,
           COALESCE(
               (SELECT array_agg(t.tag::TEXT ORDER BY t.order_idx)
                FROM post_tag t WHERE t.post_id = p.id),
               '{}'::TEXT[]
           ) AS tags,
           COALESCE(
               (SELECT array_agg(s.name::TEXT ORDER BY s.name)
                FROM post_stack ps JOIN stacks s ON s.id = ps.stack_id
                WHERE ps.post_id = p.id),
               '{}'::TEXT[]
           ) AS stacks
    FROM posts p
    JOIN users u ON u.id = p.user_id
"#;

/// Which slice of posts a listing covers.
#[derive(Debug, Clone, Copy)]
enum Scope {
    /// Every published post; keyword matches title and excerpt.
    Published,
    /// One author's live posts; keyword also matches content.
    Author(i64),
    /// One author's soft-deleted posts.
    Trash(i64),
}

fn push_conditions(qb: &mut QueryBuilder<'_, Postgres>, scope: Scope, filter: &PostFilter) {
    match scope {
        Scope::Published => {
            qb.push("p.status = 'PUBLISHED'");
        }
        Scope::Author(user_id) => {
            qb.push("p.status = 'PUBLISHED' AND p.user_id = ");
            qb.push_bind(user_id);
        }
        Scope::Trash(user_id) => {
            qb.push("p.status = 'DELETED' AND p.user_id = ");
            qb.push_bind(user_id);
        }
    }

    if let Some(post_type) = filter.post_type {
        qb.push(" AND p.post_type = ");
        qb.push_bind(post_type.as_str());
    }

    if let Some(stack) = filter.stack() {
        qb.push(
            " AND EXISTS (SELECT 1 FROM post_stack ps JOIN stacks s ON s.id = ps.stack_id \
             WHERE ps.post_id = p.id AND s.name = ",
        );
        qb.push_bind(stack.to_string());
        qb.push(")");
    }

    if let Some(keyword) = filter.keyword() {
        let pattern = like_pattern(keyword);
        qb.push(" AND (p.title ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR p.excerpt ILIKE ");
        qb.push_bind(pattern.clone());
        if matches!(scope, Scope::Author(_)) {
            qb.push(" OR p.content ILIKE ");
            qb.push_bind(pattern);
        }
        qb.push(")");
    }

    if let (Scope::Published, Some(nickname)) = (scope, filter.nickname()) {
        qb.push(" AND u.nickname = ");
        qb.push_bind(nickname.to_string());
    }
}

async fn replace_tags(
    tx: &mut Transaction<'_, Postgres>,
    post_id: i64,
    tags: &[String],
) -> Result<(), AppError> {
    sqlx::query(r#"DELETE FROM post_tag WHERE post_id = $1"#)
        .bind(post_id)
        .execute(&mut **tx)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

    for (idx, tag) in tags.iter().enumerate() {
        sqlx::query(r#"INSERT INTO post_tag (post_id, order_idx, tag) VALUES ($1, $2, $3)"#)
            .bind(post_id)
            .bind(idx as i32)
            .bind(tag)
            .execute(&mut **tx)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
    }
    Ok(())
}

async fn replace_stacks(
    tx: &mut Transaction<'_, Postgres>,
    post_id: i64,
    names: &[String],
) -> Result<(), AppError> {
    sqlx::query(r#"DELETE FROM post_stack WHERE post_id = $1"#)
        .bind(post_id)
        .execute(&mut **tx)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

    // Names without a matching stack are dropped by the join.
    sqlx::query(
        r#"
        INSERT INTO post_stack (post_id, stack_id)
        SELECT $1, id FROM stacks WHERE name = ANY($2)
        "#,
    )
    .bind(post_id)
    .bind(names)
    .execute(&mut **tx)
    .await
    .map_err(|e| AppError::DatabaseError(e.to_string()))?;
    Ok(())
}

async fn set_thumbnail(
    tx: &mut Transaction<'_, Postgres>,
    post_id: i64,
    thumbnail: Option<&Thumbnail>,
) -> Result<(), AppError> {
    sqlx::query(r#"DELETE FROM post_file WHERE post_id = $1 AND file_type = $2"#)
        .bind(post_id)
        .bind(PostFileKind::Thumbnail.as_str())
        .execute(&mut **tx)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

    if let Some(thumbnail) = thumbnail {
        sqlx::query(
            r#"
            INSERT INTO post_file (post_id, file_id, file_type, display_order)
            VALUES ($1, $2, $3, 0)
            "#,
        )
        .bind(post_id)
        .bind(thumbnail.file_id)
        .bind(PostFileKind::Thumbnail.as_str())
        .execute(&mut **tx)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;
    }

    sqlx::query(r#"UPDATE posts SET thumbnail_path = $2 WHERE id = $1"#)
        .bind(post_id)
        .bind(thumbnail.map(|t| t.path.as_str()))
        .execute(&mut **tx)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;
    Ok(())
}

/// Bring CONTENT mappings in line with the ids referenced by the body.
async fn sync_content_files(
    tx: &mut Transaction<'_, Postgres>,
    post_id: i64,
    referenced: &BTreeSet<i64>,
) -> Result<(), AppError> {
    let current: BTreeSet<i64> = sqlx::query_scalar::<_, i64>(
        r#"SELECT file_id FROM post_file WHERE post_id = $1 AND file_type = $2"#,
    )
    .bind(post_id)
    .bind(PostFileKind::Content.as_str())
    .fetch_all(&mut **tx)
    .await
    .map_err(|e| AppError::DatabaseError(e.to_string()))?
    .into_iter()
    .collect();

    let removed: Vec<i64> = current.difference(referenced).copied().collect();
    if !removed.is_empty() {
        sqlx::query(
            r#"
            DELETE FROM post_file
            WHERE post_id = $1 AND file_type = $2 AND file_id = ANY($3)
            "#,
        )
        .bind(post_id)
        .bind(PostFileKind::Content.as_str())
        .bind(&removed)
        .execute(&mut **tx)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;
    }

    let next_order = current.len() as i32;
    for (offset, file_id) in referenced.difference(&current).enumerate() {
        sqlx::query(
            r#"
            INSERT INTO post_file (post_id, file_id, file_type, display_order)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(post_id)
        .bind(file_id)
        .bind(PostFileKind::Content.as_str())
        .bind(next_order + offset as i32)
        .execute(&mut **tx)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;
    }

    if !removed.is_empty() || referenced.len() != current.len() {
        tracing::debug!(
            post_id,
            removed = removed.len(),
            total = referenced.len(),
            "Content files synced"
        );
    }
    Ok(())
}

impl PostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Whether another post already uses `title`.
    pub async fn title_exists(
        &self,
        title: &str,
        excluding: Option<i64>,
    ) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM posts
                WHERE title = $1 AND ($2::BIGINT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(title)
        .bind(excluding)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))
    }

    pub async fn slug_exists(
        &self,
        user_id: i64,
        slug: &str,
        excluding: Option<i64>,
    ) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM posts
                WHERE user_id = $1 AND slug = $2 AND ($3::BIGINT IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(user_id)
        .bind(slug)
        .bind(excluding)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))
    }

    /// First free slug for the author derived from `title`.
    pub async fn unique_slug(
        &self,
        user_id: i64,
        title: &str,
        excluding: Option<i64>,
    ) -> Result<String, AppError> {
        let base = slug::generate(title)?;
        for candidate in slug::candidates(&base) {
            if !self.slug_exists(user_id, &candidate, excluding).await? {
                return Ok(candidate);
            }
        }
        let fallback = slug::fallback(&base, Utc::now().timestamp_millis());
        tracing::warn!(%base, %fallback, "Numbered slugs exhausted, using timestamp");
        Ok(fallback)
    }

    pub async fn create(&self, post: &NewPost) -> Result<Post, AppError> {
        let mut slug = post.slug.clone();
        for _ in 0..SLUG_ATTEMPTS {
            match self.insert_post(post, &slug).await {
                Ok(post_id) => {
                    tracing::info!(post_id, %slug, "Post created");
                    return self
                        .find_by_id(post_id)
                        .await?
                        .ok_or_else(|| AppError::NotFound("Post not found".into()));
                }
                Err(WriteError::SlugTaken) => {
                    tracing::debug!(%slug, "Slug taken concurrently, choosing another");
                    slug = self.unique_slug(post.user_id, &post.title, None).await?;
                }
                Err(WriteError::Other(e)) => return Err(e),
            }
        }
        Err(AppError::Conflict("Could not reserve a unique slug".into()))
    }

    async fn insert_post(&self, post: &NewPost, slug: &str) -> Result<i64, WriteError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        let post_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO posts (user_id, post_type, title, slug, excerpt, content, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'PUBLISHED')
            RETURNING id
            "#,
        )
        .bind(post.user_id)
        .bind(post.post_type.as_str())
        .bind(&post.title)
        .bind(slug)
        .bind(&post.excerpt)
        .bind(&post.content)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write)?;

        replace_tags(&mut tx, post_id, &post.tags).await?;
        replace_stacks(&mut tx, post_id, &post.stack_names).await?;
        if post.thumbnail.is_some() {
            set_thumbnail(&mut tx, post_id, post.thumbnail.as_ref()).await?;
        }
        sync_content_files(&mut tx, post_id, &post.content_file_ids).await?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(post_id)
    }

    pub async fn update(&self, post_id: i64, changes: &PostChanges) -> Result<Post, AppError> {
        let mut slug = changes.slug.clone();
        for _ in 0..SLUG_ATTEMPTS {
            match self.apply_changes(post_id, changes, &slug).await {
                Ok(()) => {
                    return self
                        .find_by_id(post_id)
                        .await?
                        .ok_or_else(|| AppError::NotFound("Post not found".into()));
                }
                Err(WriteError::SlugTaken) => {
                    let user_id = self
                        .find_by_id(post_id)
                        .await?
                        .ok_or_else(|| AppError::NotFound("Post not found".into()))?
                        .user_id;
                    tracing::debug!(post_id, %slug, "Slug taken concurrently, choosing another");
                    slug = self
                        .unique_slug(user_id, &changes.title, Some(post_id))
                        .await?;
                }
                Err(WriteError::Other(e)) => return Err(e),
            }
        }
        Err(AppError::Conflict("Could not reserve a unique slug".into()))
    }

    async fn apply_changes(
        &self,
        post_id: i64,
        changes: &PostChanges,
        slug: &str,
    ) -> Result<(), WriteError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        let updated = sqlx::query(
            r#"
            UPDATE posts
            SET post_type = $2, title = $3, slug = $4, excerpt = $5, content = $6,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(post_id)
        .bind(changes.post_type.as_str())
        .bind(&changes.title)
        .bind(slug)
        .bind(&changes.excerpt)
        .bind(&changes.content)
        .execute(&mut *tx)
        .await
        .map_err(map_write)?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("Post not found".into()).into());
        }

        if let Some(tags) = &changes.tags {
            replace_tags(&mut tx, post_id, tags).await?;
        }
        if let Some(names) = &changes.stack_names {
            replace_stacks(&mut tx, post_id, names).await?;
        }
        match &changes.thumbnail {
            ThumbnailChange::Keep => {}
            ThumbnailChange::Remove => set_thumbnail(&mut tx, post_id, None).await?,
            ThumbnailChange::Replace(thumbnail) => {
                set_thumbnail(&mut tx, post_id, Some(thumbnail)).await?
            }
        }
        sync_content_files(&mut tx, post_id, &changes.content_file_ids).await?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    pub async fn find_by_id(&self, post_id: i64) -> Result<Option<Post>, AppError> {
        let sql = format!("{POST_SELECT} WHERE p.id = $1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    /// An author's post by slug, whatever its status.
    pub async fn find_by_slug_for_user(
        &self,
        user_id: i64,
        slug: &str,
    ) -> Result<Option<Post>, AppError> {
        let sql = format!("{POST_SELECT} WHERE p.user_id = $1 AND p.slug = $2");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(user_id)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    /// A published post addressed by its author's nickname and slug.
    pub async fn find_published(
        &self,
        nickname: &str,
        slug: &str,
    ) -> Result<Option<Post>, AppError> {
        let sql = format!(
            "{POST_SELECT} WHERE u.nickname = $1 AND p.slug = $2 AND p.status = 'PUBLISHED'"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(nickname)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    /// Mark a published post as deleted. Returns false if it was not published.
    pub async fn soft_delete(&self, post_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE posts SET status = 'DELETED', deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = 'PUBLISHED'
            "#,
        )
        .bind(post_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Bring a deleted post back. Returns false if it was not deleted.
    pub async fn restore(&self, post_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE posts SET status = 'PUBLISHED', deleted_at = NULL, updated_at = NOW()
            WHERE id = $1 AND status = 'DELETED'
            "#,
        )
        .bind(post_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn fetch_page(
        &self,
        scope: Scope,
        filter: &PostFilter,
        request: PageRequest,
    ) -> Result<Page<Post>, AppError> {
        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM posts p JOIN users u ON u.id = p.user_id WHERE ",
        );
        push_conditions(&mut count, scope, filter);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        let mut select = QueryBuilder::<Postgres>::new(POST_SELECT);
        select.push(" WHERE ");
        push_conditions(&mut select, scope, filter);
        match scope {
            Scope::Trash(_) => select.push(" ORDER BY p.deleted_at DESC, p.id DESC"),
            _ => select.push(" ORDER BY p.created_at DESC, p.id DESC"),
        };
        select.push(" LIMIT ");
        select.push_bind(request.limit());
        select.push(" OFFSET ");
        select.push_bind(request.offset());

        let rows = select
            .build_query_as::<PostRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(Page::new(
            rows.into_iter().map(Into::into).collect(),
            total,
            request,
        ))
    }

    /// Published posts, newest first.
    pub async fn search_published(
        &self,
        filter: &PostFilter,
        request: PageRequest,
    ) -> Result<Page<Post>, AppError> {
        self.fetch_page(Scope::Published, filter, request).await
    }

    /// An author's live posts, newest first.
    pub async fn search_mine(
        &self,
        user_id: i64,
        filter: &PostFilter,
        request: PageRequest,
    ) -> Result<Page<Post>, AppError> {
        self.fetch_page(Scope::Author(user_id), filter, request).await
    }

    /// An author's soft-deleted posts, most recently deleted first.
    pub async fn list_deleted(
        &self,
        user_id: i64,
        request: PageRequest,
    ) -> Result<Page<Post>, AppError> {
        self.fetch_page(Scope::Trash(user_id), &PostFilter::default(), request)
            .await
    }

    /// Title matches first, then excerpt-only matches, among published posts.
    pub async fn autocomplete(&self, keyword: &str) -> Result<Vec<PostSuggestion>, AppError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(vec![]);
        }
        let pattern = like_pattern(keyword);

        let mut suggestions: Vec<PostSuggestion> = sqlx::query_as::<_, SuggestionRow>(
            r#"
            SELECT p.id, p.title, p.slug, u.nickname
            FROM posts p JOIN users u ON u.id = p.user_id
            WHERE p.status = 'PUBLISHED' AND p.title ILIKE $1
            ORDER BY p.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(&pattern)
        .bind(AUTOCOMPLETE_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?
        .into_iter()
        .map(Into::into)
        .collect();

        let remaining = AUTOCOMPLETE_LIMIT - suggestions.len() as i64;
        if remaining > 0 {
            let by_excerpt = sqlx::query_as::<_, SuggestionRow>(
                r#"
                SELECT p.id, p.title, p.slug, u.nickname
                FROM posts p JOIN users u ON u.id = p.user_id
                WHERE p.status = 'PUBLISHED'
                  AND p.excerpt ILIKE $1
                  AND p.title NOT ILIKE $1
                ORDER BY p.created_at DESC
                LIMIT $2
                "#,
            )
            .bind(&pattern)
            .bind(remaining)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
            suggestions.extend(by_excerpt.into_iter().map(Into::into));
        }

        Ok(suggestions)
    }

    async fn latest_published(&self, excluding: i64, limit: i64) -> Result<Vec<Post>, AppError> {
        let sql = format!(
            "{POST_SELECT} WHERE p.status = 'PUBLISHED' AND p.id <> $1 \
             ORDER BY p.created_at DESC, p.id DESC LIMIT $2"
        );
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(excluding)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Published posts sharing stacks with `post`, by overlap then recency.
    async fn overlapping(
        &self,
        post: &Post,
        stack_ids: &[i64],
        same_type: bool,
        limit: i64,
    ) -> Result<Vec<Post>, AppError> {
        let type_op = if same_type { "=" } else { "<>" };
        let sql = format!(
            r#"
            {POST_SELECT}
            WHERE p.status = 'PUBLISHED' AND p.id <> $1 AND p.post_type {type_op} $2
              AND EXISTS (
                  SELECT 1 FROM post_stack ps
                  WHERE ps.post_id = p.id AND ps.stack_id = ANY($3)
              )
            ORDER BY (
                SELECT COUNT(*) FROM post_stack ps
                WHERE ps.post_id = p.id AND ps.stack_id = ANY($3)
            ) DESC, p.created_at DESC
            LIMIT $4
            "#
        );
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(post.id)
            .bind(post.post_type.as_str())
            .bind(stack_ids)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Up to three posts to suggest after `post`.
    pub async fn related(&self, post: &Post) -> Result<Vec<Post>, AppError> {
        let stack_ids = sqlx::query_scalar::<_, i64>(
            r#"SELECT stack_id FROM post_stack WHERE post_id = $1"#,
        )
        .bind(post.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        // Enough to fill every slot even if all earlier picks reappear.
        let latest_limit = (RELATED_LIMIT * 2) as i64;

        if stack_ids.is_empty() {
            let latest = self.latest_published(post.id, latest_limit).await?;
            return Ok(related::merge(post.id, vec![], vec![], latest));
        }

        let same_type = self
            .overlapping(post, &stack_ids, true, SAME_TYPE_LIMIT as i64)
            .await?;
        let other_type = self
            .overlapping(post, &stack_ids, false, RELATED_LIMIT as i64)
            .await?;
        let latest = self.latest_published(post.id, latest_limit).await?;

        Ok(related::merge(post.id, same_type, other_type, latest))
    }
}

impl PostPurgeStore for PostRepository {
    async fn expired_deleted(&self, cutoff: DateTime<Utc>) -> Result<Vec<i64>, AppError> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id FROM posts
            WHERE status = 'DELETED' AND deleted_at < $1
            ORDER BY deleted_at ASC
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))
    }

    async fn purge(&self, post_id: i64) -> Result<(), AppError> {
        // Tags, stack links, and file mappings cascade.
        sqlx::query(r#"DELETE FROM posts WHERE id = $1 AND status = 'DELETED'"#)
            .bind(post_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        tracing::info!(post_id, "Post purged");
        Ok(())
    }
}
