use folio_core::AppError;

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://localhost:3000";

/// Settings for signing and expiring JWTs.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Base64-encoded HMAC secret.
    pub secret: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub jwt: JwtConfig,
    pub cookie_secure: bool,
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    /// Read configuration from environment variables.
    ///
    /// - `FOLIO_SERVER_PORT` (defaults to 3000)
    /// - `FOLIO_JWT_SECRET` (required, base64)
    /// - `FOLIO_JWT_ACCESS_TTL_SECS` (defaults to one hour)
    /// - `FOLIO_JWT_REFRESH_TTL_SECS` (defaults to 14 days)
    /// - `FOLIO_COOKIE_SECURE` (defaults to true)
    /// - `FOLIO_CORS_ORIGINS` (comma separated)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let port = parse_or(get("FOLIO_SERVER_PORT"), "FOLIO_SERVER_PORT", 3000u16)?;

        let secret = get("FOLIO_JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::ConfigError("FOLIO_JWT_SECRET not set".into()))?;
        let access_ttl_secs =
            parse_or(get("FOLIO_JWT_ACCESS_TTL_SECS"), "FOLIO_JWT_ACCESS_TTL_SECS", 3600i64)?;
        let refresh_ttl_secs = parse_or(
            get("FOLIO_JWT_REFRESH_TTL_SECS"),
            "FOLIO_JWT_REFRESH_TTL_SECS",
            14 * 24 * 3600i64,
        )?;
        if access_ttl_secs <= 0 || refresh_ttl_secs <= 0 {
            return Err(AppError::ConfigError(
                "JWT lifetimes must be positive".into(),
            ));
        }

        let cookie_secure = parse_or(get("FOLIO_COOKIE_SECURE"), "FOLIO_COOKIE_SECURE", true)?;

        let cors_origins = get("FOLIO_CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            port,
            jwt: JwtConfig {
                secret: secret.trim().to_string(),
                access_ttl_secs,
                refresh_ttl_secs,
            },
            cookie_secure,
            cors_origins,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    name: &str,
    default: T,
) -> Result<T, AppError> {
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::ConfigError(format!("Invalid {name} '{raw}'"))),
    }
}
