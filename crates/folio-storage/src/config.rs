use std::path::PathBuf;

use folio_core::AppError;

/// Where uploaded bytes are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Files under a local directory, served by the API under `/files`.
    Local { dir: PathBuf },
    /// An S3 bucket; credentials and region come from the standard `AWS_*` variables.
    S3 { bucket: String },
    /// Process memory, for tests and throwaway instances.
    Memory,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Prefix joined with an object key to form its public URL.
    pub public_base_url: String,
}

impl StorageConfig {
    /// Read configuration from environment variables.
    ///
    /// - `FOLIO_STORAGE_BACKEND` (`local`, `s3`, or `memory`; defaults to `local`)
    /// - `FOLIO_STORAGE_DIR` (local backend, defaults to `./uploads`)
    /// - `FOLIO_STORAGE_BUCKET` (required for `s3`)
    /// - `FOLIO_PUBLIC_BASE_URL` (defaults to `/files`)
    pub fn from_env() -> Result<Self, AppError> {
        let backend = match std::env::var("FOLIO_STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "local" => StorageBackend::Local {
                dir: std::env::var("FOLIO_STORAGE_DIR")
                    .unwrap_or_else(|_| "./uploads".to_string())
                    .into(),
            },
            "s3" => StorageBackend::S3 {
                bucket: std::env::var("FOLIO_STORAGE_BUCKET").map_err(|_| {
                    AppError::ConfigError(
                        "FOLIO_STORAGE_BUCKET must be set when FOLIO_STORAGE_BACKEND=s3".into(),
                    )
                })?,
            },
            "memory" => StorageBackend::Memory,
            other => {
                return Err(AppError::ConfigError(format!(
                    "Invalid FOLIO_STORAGE_BACKEND '{other}': expected local, s3, or memory"
                )));
            }
        };

        let public_base_url =
            std::env::var("FOLIO_PUBLIC_BASE_URL").unwrap_or_else(|_| "/files".to_string());

        Ok(Self {
            backend,
            public_base_url,
        })
    }
}
