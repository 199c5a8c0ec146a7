use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::auth::jwt::TokenKind;

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";

const ACCESS_PATH: &str = "/";
const REFRESH_PATH: &str = "/api/auth";

/// Attributes shared by both auth cookies.
#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    pub secure: bool,
}

impl CookieSettings {
    fn build(&self, kind: TokenKind, value: String, max_age_secs: i64) -> Cookie<'static> {
        let (name, path) = match kind {
            TokenKind::Access => (ACCESS_COOKIE, ACCESS_PATH),
            TokenKind::Refresh => (REFRESH_COOKIE, REFRESH_PATH),
        };
        Cookie::build((name, value))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path(path)
            .max_age(time::Duration::seconds(max_age_secs))
            .build()
    }

    /// Add a token cookie living as long as the token.
    pub fn set(&self, jar: CookieJar, kind: TokenKind, token: String, ttl_secs: i64) -> CookieJar {
        jar.add(self.build(kind, token, ttl_secs))
    }

    /// Expire both auth cookies.
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        jar.add(self.build(TokenKind::Access, String::new(), 0))
            .add(self.build(TokenKind::Refresh, String::new(), 0))
    }
}
