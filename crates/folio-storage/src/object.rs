use std::path::{Path, PathBuf};
use std::sync::Arc;

use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};

use folio_core::AppError;
use folio_core::traits::FileStorage;

use crate::config::{StorageBackend, StorageConfig};

/// [`FileStorage`] backed by any `object_store` implementation.
#[derive(Clone, Debug)]
pub struct ObjectFileStorage {
    store: Arc<dyn ObjectStore>,
    public_base_url: String,
    local_dir: Option<PathBuf>,
}

impl ObjectFileStorage {
    /// Build the storage selected by `config`.
    pub fn from_config(config: &StorageConfig) -> Result<Self, AppError> {
        let (store, local_dir): (Arc<dyn ObjectStore>, Option<PathBuf>) = match &config.backend {
            StorageBackend::Local { dir } => {
                std::fs::create_dir_all(dir).map_err(|e| {
                    AppError::ConfigError(format!(
                        "Cannot create storage directory {}: {e}",
                        dir.display()
                    ))
                })?;
                let store = LocalFileSystem::new_with_prefix(dir)
                    .map_err(|e| AppError::ConfigError(format!("Invalid storage directory: {e}")))?;
                (Arc::new(store), Some(dir.clone()))
            }
            StorageBackend::S3 { bucket } => {
                let store = AmazonS3Builder::from_env()
                    .with_bucket_name(bucket)
                    .build()
                    .map_err(|e| AppError::ConfigError(format!("Invalid S3 configuration: {e}")))?;
                (Arc::new(store), None)
            }
            StorageBackend::Memory => (Arc::new(InMemory::new()), None),
        };

        tracing::info!(backend = %store, "File storage ready");

        Ok(Self {
            store,
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            local_dir,
        })
    }

    /// In-memory storage, mainly for tests.
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            public_base_url: "/files".to_string(),
            local_dir: None,
        }
    }

    /// Root directory when files live on the local filesystem.
    pub fn local_dir(&self) -> Option<&Path> {
        self.local_dir.as_deref()
    }
}

fn object_path(key: &str) -> Result<ObjectPath, AppError> {
    ObjectPath::parse(key)
        .map_err(|e| AppError::StorageError(format!("Invalid object key '{key}': {e}")))
}

impl FileStorage for ObjectFileStorage {
    async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), AppError> {
        let path = object_path(key)?;
        self.store
            .put(&path, PutPayload::from(data))
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to store {key}: {e}")))?;
        tracing::debug!(%key, "Stored object");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        let path = object_path(key)?;
        match self.store.delete(&path).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(AppError::StorageError(format!(
                "Failed to delete {key}: {e}"
            ))),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key.trim_start_matches('/'))
    }
}
