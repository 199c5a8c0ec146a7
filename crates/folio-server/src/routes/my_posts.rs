use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use folio_core::post::{NewPost, PostChanges, PostFilter, Thumbnail, ThumbnailChange};
use folio_core::{AppError, PageRequest, Post, PostType, markdown};

use crate::auth::CurrentUser;
use crate::dto::{PageQuery, PostDetailResponse, PostPageResponse, PostRequest, PostSearchQuery};
use crate::error::ApiError;
use crate::extract::ValidatedJson;
use crate::state::AppState;

/// A post of the caller's, found by slug whatever its status.
async fn find_owned(state: &AppState, user_id: i64, slug: &str) -> Result<Post, AppError> {
    state
        .db
        .post_repo()
        .find_by_slug_for_user(user_id, slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post '{slug}' not found")))
}

async fn resolve_thumbnail(state: &AppState, file_id: i64) -> Result<Thumbnail, AppError> {
    let file = state
        .db
        .file_repo()
        .find_by_id(file_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Thumbnail file {file_id} not found")))?;
    Ok(Thumbnail {
        file_id,
        path: file.storage_key,
    })
}

/// Checks shared by create and update that need no database.
fn check_body(body: &PostRequest) -> Result<PostType, AppError> {
    let post_type = body.post_type.parse::<PostType>()?;
    markdown::reject_html(&body.content)?;
    Ok(post_type)
}

fn non_empty(list: Option<Vec<String>>) -> Option<Vec<String>> {
    list.map(|items| {
        items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
    })
    .filter(|items| !items.is_empty())
}

pub(crate) fn filter_from(query: &PostSearchQuery) -> Result<PostFilter, AppError> {
    let post_type = query
        .post_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::parse::<PostType>)
        .transpose()?;
    Ok(PostFilter {
        post_type,
        stack: query.stack.clone(),
        keyword: query.keyword.clone(),
        nickname: query.nickname.clone(),
    })
}

#[utoipa::path(
    post,
    path = "/api/my/posts",
    request_body = PostRequest,
    responses(
        (status = 201, description = "Post published", body = PostDetailResponse),
        (status = 400, description = "Invalid input, raw HTML, or duplicate title", body = crate::dto::ErrorResponse),
        (status = 404, description = "Referenced file not found", body = crate::dto::ErrorResponse),
    ),
    security(("cookie" = []), ("bearer" = [])),
    tag = "my-posts"
)]
pub async fn create(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ValidatedJson(body): ValidatedJson<PostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post_type = check_body(&body)?;
    let repo = state.db.post_repo();
    let title = body.title.trim().to_string();

    if repo.title_exists(&title, None).await? {
        return Err(AppError::field("title", "Title is already in use").into());
    }
    let slug = repo.unique_slug(current.id, &title, None).await?;

    let thumbnail = match body.thumbnail_file_id {
        Some(file_id) => Some(resolve_thumbnail(&state, file_id).await?),
        None => None,
    };
    let content_file_ids = markdown::file_references(&body.content);
    let ids: Vec<i64> = content_file_ids.iter().copied().collect();
    state.db.file_repo().ensure_exist(&ids).await?;

    let post = repo
        .create(&NewPost {
            user_id: current.id,
            post_type,
            title,
            slug,
            excerpt: body.excerpt.trim().to_string(),
            content: body.content,
            tags: non_empty(body.tags).unwrap_or_default(),
            stack_names: non_empty(body.stacks).unwrap_or_default(),
            thumbnail,
            content_file_ids,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PostDetailResponse::new(post, vec![], &state.storage)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/my/posts",
    params(PostSearchQuery),
    responses(
        (status = 200, description = "The caller's live posts", body = PostPageResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("cookie" = []), ("bearer" = [])),
    tag = "my-posts"
)]
pub async fn list(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Query(query): Query<PostSearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut filter = filter_from(&query)?;
    filter.nickname = None;
    let page = state
        .db
        .post_repo()
        .search_mine(current.id, &filter, PageRequest::new(query.page, query.size))
        .await?;
    Ok(Json(PostPageResponse::new(page, &state.storage)))
}

#[utoipa::path(
    get,
    path = "/api/my/posts/deleted",
    params(PageQuery),
    responses((status = 200, description = "The caller's deleted posts", body = PostPageResponse)),
    security(("cookie" = []), ("bearer" = [])),
    tag = "my-posts"
)]
pub async fn list_deleted(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .db
        .post_repo()
        .list_deleted(current.id, PageRequest::new(query.page, query.size))
        .await?;
    Ok(Json(PostPageResponse::new(page, &state.storage)))
}

#[utoipa::path(
    get,
    path = "/api/my/posts/{slug}/edit",
    params(("slug" = String, Path, description = "Post slug")),
    responses(
        (status = 200, description = "Post for editing", body = PostDetailResponse),
        (status = 404, description = "No such post", body = crate::dto::ErrorResponse),
    ),
    security(("cookie" = []), ("bearer" = [])),
    tag = "my-posts"
)]
pub async fn edit_view(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post = find_owned(&state, current.id, &slug).await?;
    Ok(Json(PostDetailResponse::new(post, vec![], &state.storage)))
}

#[utoipa::path(
    put,
    path = "/api/my/posts/{slug}",
    params(("slug" = String, Path, description = "Post slug")),
    request_body = PostRequest,
    responses(
        (status = 200, description = "Post updated", body = PostDetailResponse),
        (status = 400, description = "Invalid input, duplicate title, or deleted post", body = crate::dto::ErrorResponse),
        (status = 404, description = "No such post or file", body = crate::dto::ErrorResponse),
    ),
    security(("cookie" = []), ("bearer" = [])),
    tag = "my-posts"
)]
pub async fn update(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(slug): Path<String>,
    ValidatedJson(body): ValidatedJson<PostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let existing = find_owned(&state, current.id, &slug).await?;
    if existing.is_deleted() {
        return Err(AppError::BadRequest("Deleted posts cannot be edited".into()).into());
    }

    let post_type = check_body(&body)?;
    let repo = state.db.post_repo();
    let title = body.title.trim().to_string();

    let slug = if title != existing.title {
        if repo.title_exists(&title, Some(existing.id)).await? {
            return Err(AppError::field("title", "Title is already in use").into());
        }
        repo.unique_slug(current.id, &title, Some(existing.id)).await?
    } else {
        existing.slug.clone()
    };

    let thumbnail = if body.remove_thumbnail {
        ThumbnailChange::Remove
    } else if let Some(file_id) = body.thumbnail_file_id {
        ThumbnailChange::Replace(resolve_thumbnail(&state, file_id).await?)
    } else {
        ThumbnailChange::Keep
    };

    let content_file_ids = markdown::file_references(&body.content);
    let ids: Vec<i64> = content_file_ids.iter().copied().collect();
    state.db.file_repo().ensure_exist(&ids).await?;

    let post = repo
        .update(
            existing.id,
            &PostChanges {
                post_type,
                title,
                slug,
                excerpt: body.excerpt.trim().to_string(),
                content: body.content,
                tags: non_empty(body.tags),
                stack_names: non_empty(body.stacks),
                thumbnail,
                content_file_ids,
            },
        )
        .await?;
    tracing::info!(post_id = post.id, slug = %post.slug, "Post updated");

    Ok(Json(PostDetailResponse::new(post, vec![], &state.storage)))
}

#[utoipa::path(
    delete,
    path = "/api/my/posts/{slug}",
    params(("slug" = String, Path, description = "Post slug")),
    responses(
        (status = 204, description = "Post moved to trash"),
        (status = 400, description = "Post is already deleted", body = crate::dto::ErrorResponse),
        (status = 404, description = "No such post", body = crate::dto::ErrorResponse),
    ),
    security(("cookie" = []), ("bearer" = [])),
    tag = "my-posts"
)]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post = find_owned(&state, current.id, &slug).await?;
    if !state.db.post_repo().soft_delete(post.id).await? {
        return Err(AppError::BadRequest("Post is already deleted".into()).into());
    }
    tracing::info!(post_id = post.id, "Post soft-deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/my/posts/{slug}/restore",
    params(("slug" = String, Path, description = "Post slug")),
    responses(
        (status = 200, description = "Post restored", body = PostDetailResponse),
        (status = 400, description = "Post is not deleted", body = crate::dto::ErrorResponse),
        (status = 404, description = "No such post", body = crate::dto::ErrorResponse),
    ),
    security(("cookie" = []), ("bearer" = [])),
    tag = "my-posts"
)]
pub async fn restore(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post = find_owned(&state, current.id, &slug).await?;
    let repo = state.db.post_repo();
    if !repo.restore(post.id).await? {
        return Err(AppError::BadRequest("Only deleted posts can be restored".into()).into());
    }
    tracing::info!(post_id = post.id, "Post restored");

    let post = repo
        .find_by_id(post.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post '{slug}' not found")))?;
    Ok(Json(PostDetailResponse::new(post, vec![], &state.storage)))
}
