use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;

use folio_core::post::PostFilter;
use folio_core::{AppError, PageRequest};

use crate::dto::{
    AutocompleteQuery, PageQuery, PostDetailResponse, PostPageResponse, PostSearchQuery,
    SuggestionResponse,
};
use crate::error::ApiError;
use crate::routes::my_posts::filter_from;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/posts",
    params(PostSearchQuery),
    responses(
        (status = 200, description = "Published posts, newest first", body = PostPageResponse),
        (status = 400, description = "Unknown post type", body = crate::dto::ErrorResponse),
    ),
    tag = "posts"
)]
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PostSearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = filter_from(&query)?;
    let page = state
        .db
        .post_repo()
        .search_published(&filter, PageRequest::new(query.page, query.size))
        .await?;
    Ok(Json(PostPageResponse::new(page, &state.storage)))
}

#[utoipa::path(
    get,
    path = "/api/posts/autocomplete",
    params(AutocompleteQuery),
    responses((status = 200, description = "Title matches, then excerpt matches", body = [SuggestionResponse])),
    tag = "posts"
)]
pub async fn autocomplete(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AutocompleteQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let keyword = query.keyword.unwrap_or_default();
    let suggestions = state.db.post_repo().autocomplete(&keyword).await?;
    let response: Vec<SuggestionResponse> = suggestions.into_iter().map(Into::into).collect();
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/posts/user/{nickname}",
    params(("nickname" = String, Path, description = "Author nickname"), PageQuery),
    responses(
        (status = 200, description = "The author's published posts", body = PostPageResponse),
        (status = 404, description = "No such user", body = crate::dto::ErrorResponse),
    ),
    tag = "posts"
)]
pub async fn list_by_user(
    State(state): State<Arc<AppState>>,
    Path(nickname): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if state
        .db
        .user_repo()
        .find_by_nickname(&nickname)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound(format!("User '{nickname}' not found")).into());
    }

    let filter = PostFilter {
        nickname: Some(nickname),
        ..Default::default()
    };
    let page = state
        .db
        .post_repo()
        .search_published(&filter, PageRequest::new(query.page, query.size))
        .await?;
    Ok(Json(PostPageResponse::new(page, &state.storage)))
}

#[utoipa::path(
    get,
    path = "/api/posts/{nickname}/{slug}",
    params(
        ("nickname" = String, Path, description = "Author nickname"),
        ("slug" = String, Path, description = "Post slug"),
    ),
    responses(
        (status = 200, description = "Post with related posts", body = PostDetailResponse),
        (status = 404, description = "No such published post", body = crate::dto::ErrorResponse),
    ),
    tag = "posts"
)]
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path((nickname, slug)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = state.db.post_repo();
    let post = repo
        .find_published(&nickname, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post '{nickname}/{slug}' not found")))?;

    let related = repo.related(&post).await?;
    Ok(Json(PostDetailResponse::new(post, related, &state.storage)))
}
