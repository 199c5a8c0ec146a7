//! Authentication: JWT issuing and verification, auth cookies, and the
//! middleware guarding protected routes.

pub mod cookies;
pub mod jwt;
pub mod middleware;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use folio_core::{AppError, Role};

use crate::error::ApiError;

pub use cookies::CookieSettings;
pub use jwt::{Claims, TokenKind, TokenService};
pub use middleware::{require_admin, require_auth};

/// The authenticated caller, taken from access token claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn from_claims(claims: &Claims) -> Option<Self> {
        Some(Self {
            id: claims.user_id()?,
            email: claims.email.clone(),
            role: claims.role,
        })
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".into()).into())
    }
}
