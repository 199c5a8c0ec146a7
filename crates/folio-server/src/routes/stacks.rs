use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use indexmap::IndexMap;

use folio_core::{AppError, StackGroup, StackWithCount};

use crate::dto::{
    PopularQuery, PopularStackResponse, StackCountResponse, StackRequest, StackResponse,
};
use crate::error::ApiError;
use crate::extract::ValidatedJson;
use crate::state::AppState;

const DEFAULT_POPULAR_LIMIT: i64 = 5;
const MAX_POPULAR_LIMIT: i64 = 50;

fn parse_group(raw: Option<&str>) -> Result<Option<StackGroup>, AppError> {
    raw.map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::parse::<StackGroup>)
        .transpose()
}

/// Every group in `StackGroup::ALL` order, including empty ones.
fn group_stacks(stacks: Vec<StackWithCount>) -> IndexMap<String, Vec<StackCountResponse>> {
    let mut groups: IndexMap<String, Vec<StackCountResponse>> = StackGroup::ALL
        .iter()
        .map(|g| (g.to_string(), Vec::new()))
        .collect();

    for stack in stacks {
        groups
            .entry(stack.group.to_string())
            .or_default()
            .push(stack.into());
    }
    groups
}

#[utoipa::path(
    get,
    path = "/api/stacks",
    responses((status = 200, description = "All stacks by name", body = [StackResponse])),
    tag = "stacks"
)]
pub async fn list(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let stacks = state.db.stack_repo().list_all().await?;
    let response: Vec<StackResponse> = stacks.into_iter().map(Into::into).collect();
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/stacks/group/{group}",
    params(("group" = String, Path, description = "Stack group key")),
    responses(
        (status = 200, description = "Stacks of one group", body = [StackResponse]),
        (status = 400, description = "Unknown group", body = crate::dto::ErrorResponse),
    ),
    tag = "stacks"
)]
pub async fn list_by_group(
    State(state): State<Arc<AppState>>,
    Path(group): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let group: StackGroup = group.parse()?;
    let stacks = state.db.stack_repo().list_by_group(group).await?;
    let response: Vec<StackResponse> = stacks.into_iter().map(Into::into).collect();
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/stacks/with-count",
    responses((status = 200, description = "Stacks with published post counts", body = [StackCountResponse])),
    tag = "stacks"
)]
pub async fn with_count(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let stacks = state.db.stack_repo().with_counts().await?;
    let response: Vec<StackCountResponse> = stacks.into_iter().map(Into::into).collect();
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/stacks/grouped",
    responses((status = 200, description = "Every group with its stacks and counts", body = IndexMap<String, Vec<StackCountResponse>>)),
    tag = "stacks"
)]
pub async fn grouped(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let stacks = state.db.stack_repo().with_counts().await?;
    Ok(Json(group_stacks(stacks)))
}

#[utoipa::path(
    get,
    path = "/api/stacks/popular",
    params(PopularQuery),
    responses((status = 200, description = "Most used stacks", body = [PopularStackResponse])),
    tag = "stacks"
)]
pub async fn popular(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PopularQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_POPULAR_LIMIT)
        .clamp(1, MAX_POPULAR_LIMIT);

    let stacks = state.db.stack_repo().popular(limit).await?;
    let response: Vec<PopularStackResponse> = stacks
        .into_iter()
        .zip(1u32..)
        .map(|(s, rank)| PopularStackResponse {
            rank,
            id: s.id,
            name: s.name,
            post_count: s.post_count,
        })
        .collect();
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/admin/stacks",
    request_body = StackRequest,
    responses(
        (status = 201, description = "Stack created", body = StackResponse),
        (status = 400, description = "Invalid input", body = crate::dto::ErrorResponse),
        (status = 403, description = "Not an administrator"),
        (status = 409, description = "Name already in use", body = crate::dto::ErrorResponse),
    ),
    security(("cookie" = []), ("bearer" = [])),
    tag = "stacks"
)]
pub async fn create(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<StackRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let group = parse_group(body.group.as_deref())?.unwrap_or_default();
    let name = body.name.trim();
    let repo = state.db.stack_repo();

    if repo.name_exists(name, None).await? {
        return Err(AppError::Conflict(format!("Stack '{name}' already exists")).into());
    }
    let stack = repo.create(name, group).await?;
    tracing::info!(stack_id = stack.id, name = %stack.name, "Stack created");

    Ok((StatusCode::CREATED, Json(StackResponse::from(stack))))
}

#[utoipa::path(
    put,
    path = "/api/admin/stacks/{id}",
    params(("id" = i64, Path, description = "Stack id")),
    request_body = StackRequest,
    responses(
        (status = 200, description = "Stack updated", body = StackResponse),
        (status = 404, description = "No such stack", body = crate::dto::ErrorResponse),
        (status = 409, description = "Name already in use", body = crate::dto::ErrorResponse),
    ),
    security(("cookie" = []), ("bearer" = [])),
    tag = "stacks"
)]
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ValidatedJson(body): ValidatedJson<StackRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = state.db.stack_repo();
    let existing = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Stack {id} not found")))?;

    let name = body.name.trim();
    if name != existing.name && repo.name_exists(name, Some(id)).await? {
        return Err(AppError::Conflict(format!("Stack '{name}' already exists")).into());
    }
    let group = parse_group(body.group.as_deref())?.unwrap_or(existing.group);

    let stack = repo
        .update(id, name, group)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Stack {id} not found")))?;
    Ok(Json(StackResponse::from(stack)))
}

#[utoipa::path(
    delete,
    path = "/api/admin/stacks/{id}",
    params(("id" = i64, Path, description = "Stack id")),
    responses(
        (status = 204, description = "Stack deleted"),
        (status = 404, description = "No such stack", body = crate::dto::ErrorResponse),
    ),
    security(("cookie" = []), ("bearer" = [])),
    tag = "stacks"
)]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.db.stack_repo().delete(id).await? {
        return Err(AppError::NotFound(format!("Stack {id} not found")).into());
    }
    tracing::info!(stack_id = id, "Stack deleted");
    Ok(StatusCode::NO_CONTENT)
}
