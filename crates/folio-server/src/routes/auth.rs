use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;

use folio_core::{AppError, Role, User, password};

use crate::auth::TokenKind;
use crate::auth::cookies::REFRESH_COOKIE;
use crate::dto::{AuthResponse, LoginRequest, MeResponse, SignupRequest};
use crate::error::ApiError;
use crate::extract::ValidatedJson;
use crate::state::AppState;

/// Put a fresh access/refresh pair for `user` into the jar.
fn issue_cookies(state: &AppState, jar: CookieJar, user: &User) -> Result<CookieJar, AppError> {
    let access = state.tokens.issue(user, TokenKind::Access)?;
    let refresh = state.tokens.issue(user, TokenKind::Refresh)?;
    let jar = state.cookies.set(
        jar,
        TokenKind::Access,
        access,
        state.tokens.ttl_secs(TokenKind::Access),
    );
    Ok(state.cookies.set(
        jar,
        TokenKind::Refresh,
        refresh,
        state.tokens.ttl_secs(TokenKind::Refresh),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; auth cookies set", body = AuthResponse),
        (status = 400, description = "Invalid input", body = crate::dto::ErrorResponse),
        (status = 401, description = "Invalid email or password", body = crate::dto::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let invalid = || AppError::Unauthorized("Invalid email or password".into());

    let user = state
        .db
        .user_repo()
        .find_by_email(body.email.trim())
        .await?
        .ok_or_else(invalid)?;

    if !password::verify(&body.password, &user.password_hash) {
        tracing::info!(user_id = user.id, "Login rejected");
        return Err(invalid().into());
    }

    let jar = issue_cookies(&state, jar, &user)?;
    tracing::info!(user_id = user.id, "User logged in");

    let response = AuthResponse {
        user: MeResponse::new(user, &state.storage),
    };
    Ok((jar, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    responses(
        (status = 200, description = "Tokens reissued", body = AuthResponse),
        (status = 401, description = "Missing or invalid refresh token; cookies cleared", body = crate::dto::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn refresh(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let claims = jar
        .get(REFRESH_COOKIE)
        .and_then(|cookie| state.tokens.verify(cookie.value(), TokenKind::Refresh));

    let user = match claims.as_ref().and_then(|c| c.user_id()) {
        Some(user_id) => match state.db.user_repo().find_by_id(user_id).await {
            Ok(user) => user,
            Err(e) => return ApiError(e).into_response(),
        },
        None => None,
    };

    let Some(user) = user else {
        let jar = state.cookies.clear(jar);
        let err = ApiError(AppError::Unauthorized("Refresh token is missing or invalid".into()));
        return (jar, err).into_response();
    };

    match issue_cookies(&state, jar, &user) {
        Ok(jar) => {
            let response = AuthResponse {
                user: MeResponse::new(user, &state.storage),
            };
            (jar, Json(response)).into_response()
        }
        Err(e) => ApiError(e).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 204, description = "Auth cookies cleared")),
    tag = "auth"
)]
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    (state.cookies.clear(jar), StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/admin/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created", body = AuthResponse),
        (status = 400, description = "Invalid input", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not an administrator"),
        (status = 409, description = "Email or nickname already in use", body = crate::dto::ErrorResponse),
    ),
    security(("cookie" = []), ("bearer" = [])),
    tag = "auth"
)]
pub async fn signup(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = state.db.user_repo();
    let account = body.to_account();

    if repo.email_exists(&account.email).await? {
        return Err(AppError::Conflict("Email is already in use".into()).into());
    }
    if repo.nickname_exists(&account.nickname).await? {
        return Err(AppError::Conflict("Nickname is already in use".into()).into());
    }

    let user = repo.create(&account.into_new_user(Role::User)?).await?;
    tracing::info!(user_id = user.id, "User signed up");

    let response = AuthResponse {
        user: MeResponse::new(user, &state.storage),
    };
    Ok((StatusCode::CREATED, Json(response)))
}
