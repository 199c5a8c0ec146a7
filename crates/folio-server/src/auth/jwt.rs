use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use folio_core::{AppError, Role, User};

use crate::config::JwtConfig;

/// Distinguishes short-lived access tokens from refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub typ: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

/// Issues and verifies HS256 tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Result<Self, AppError> {
        let invalid_secret = |e: jsonwebtoken::errors::Error| {
            AppError::ConfigError(format!("FOLIO_JWT_SECRET is not valid base64: {e}"))
        };
        let encoding = EncodingKey::from_base64_secret(&config.secret).map_err(invalid_secret)?;
        let decoding = DecodingKey::from_base64_secret(&config.secret).map_err(invalid_secret)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(Self {
            encoding,
            decoding,
            validation,
            access_ttl_secs: config.access_ttl_secs,
            refresh_ttl_secs: config.refresh_ttl_secs,
        })
    }

    /// Lifetime of a token kind in seconds.
    pub fn ttl_secs(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::Access => self.access_ttl_secs,
            TokenKind::Refresh => self.refresh_ttl_secs,
        }
    }

    pub fn issue(&self, user: &User, kind: TokenKind) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            typ: kind,
            iat: now,
            exp: now + self.ttl_secs(kind),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Generic(format!("Failed to sign token: {e}")))
    }

    /// Decode a token of the expected kind. Anything unusable is `None`.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Option<Claims> {
        let claims = match jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => {
                match e.kind() {
                    ErrorKind::ExpiredSignature => tracing::debug!("Token expired"),
                    ErrorKind::InvalidSignature => tracing::debug!("Token signature mismatch"),
                    other => tracing::debug!(error = ?other, "Token rejected"),
                }
                return None;
            }
        };

        if claims.typ != expected {
            tracing::debug!(got = ?claims.typ, want = ?expected, "Token kind mismatch");
            return None;
        }
        Some(claims)
    }
}
