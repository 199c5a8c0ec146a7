use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use folio_core::user::{ProfileChanges, ProfileImageChange};
use folio_core::{AppError, password};

use crate::auth::CurrentUser;
use crate::dto::{ChangePasswordRequest, MeResponse, PublicUserResponse, UpdateProfileRequest};
use crate::error::ApiError;
use crate::extract::ValidatedJson;
use crate::state::AppState;

async fn load_user(state: &AppState, user_id: i64) -> Result<folio_core::User, AppError> {
    state
        .db
        .user_repo()
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "The authenticated user", body = MeResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("cookie" = []), ("bearer" = [])),
    tag = "users"
)]
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let user = load_user(&state, current.id).await?;
    Ok(Json(MeResponse::new(user, &state.storage)))
}

#[utoipa::path(
    patch,
    path = "/api/me/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = MeResponse),
        (status = 400, description = "Invalid input", body = crate::dto::ErrorResponse),
        (status = 404, description = "Profile image file not found", body = crate::dto::ErrorResponse),
        (status = 409, description = "Nickname already in use", body = crate::dto::ErrorResponse),
    ),
    security(("cookie" = []), ("bearer" = [])),
    tag = "users"
)]
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ValidatedJson(body): ValidatedJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = load_user(&state, current.id).await?;
    let repo = state.db.user_repo();

    let nickname = body
        .nickname
        .map(|n| n.trim().to_string())
        .filter(|n| *n != user.nickname);
    if let Some(nickname) = &nickname {
        if repo.nickname_exists(nickname).await? {
            return Err(AppError::Conflict("Nickname is already in use".into()).into());
        }
    }

    // Removal wins when both are sent.
    let image = if body.remove_profile_image {
        ProfileImageChange::Remove
    } else if let Some(file_id) = body.profile_image_file_id {
        let file = state
            .db
            .file_repo()
            .find_by_id(file_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("File {file_id} not found")))?;
        ProfileImageChange::Replace {
            file_id,
            path: file.storage_key,
        }
    } else {
        ProfileImageChange::Keep
    };

    let changes = ProfileChanges {
        nickname,
        position: body.position,
        about: body.about,
    };
    let updated = repo.update_profile(current.id, &changes, &image).await?;
    tracing::info!(user_id = current.id, "Profile updated");

    Ok(Json(MeResponse::new(updated, &state.storage)))
}

#[utoipa::path(
    patch,
    path = "/api/me/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Password rules not met", body = crate::dto::ErrorResponse),
    ),
    security(("cookie" = []), ("bearer" = [])),
    tag = "users"
)]
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ValidatedJson(body): ValidatedJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = load_user(&state, current.id).await?;

    let new_hash = password::change(
        &user.password_hash,
        &body.current_password,
        &body.new_password,
        &body.confirm_password,
    )?;
    state
        .db
        .user_repo()
        .update_password(user.id, &new_hash)
        .await?;
    tracing::info!(user_id = user.id, "Password changed");

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/users/{nickname}",
    params(("nickname" = String, Path, description = "Author nickname")),
    responses(
        (status = 200, description = "Public profile", body = PublicUserResponse),
        (status = 404, description = "No such user", body = crate::dto::ErrorResponse),
    ),
    tag = "users"
)]
pub async fn get_public_user(
    State(state): State<Arc<AppState>>,
    Path(nickname): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .user_repo()
        .find_by_nickname(&nickname)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User '{nickname}' not found")))?;

    Ok(Json(PublicUserResponse::new(user, &state.storage)))
}
