use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;

use folio_core::AppError;

use crate::auth::CurrentUser;
use crate::auth::cookies::ACCESS_COOKIE;
use crate::auth::jwt::TokenKind;
use crate::error::ApiError;
use crate::state::AppState;

/// The access token from the cookie, falling back to `Authorization: Bearer`.
fn access_token<'a>(jar: &'a CookieJar, request: &'a Request) -> Option<&'a str> {
    if let Some(cookie) = jar.get(ACCESS_COOKIE).filter(|c| !c.value().is_empty()) {
        return Some(cookie.value());
    }
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Middleware that turns a valid access token into a [`CurrentUser`] extension.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = access_token(&jar, &request)
        .and_then(|token| state.tokens.verify(token, TokenKind::Access))
        .and_then(|claims| CurrentUser::from_claims(&claims))
        .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Middleware for admin-only routes. Must run after [`require_auth`].
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))?;

    if !user.role.is_admin() {
        tracing::debug!(user_id = user.id, "Admin route refused");
        return Err(AppError::Forbidden("Administrator role required".into()).into());
    }
    Ok(next.run(request).await)
}
