//! Test utilities: handwritten mocks of the core traits.
//!
//! Mocks use `Arc<Mutex<_>>` so clones share state and tests can assert
//! on recorded calls after handing a clone to the code under test.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::file::{FileCategory, StoredFile};
use crate::traits::{FileStorage, OrphanFileStore, PostPurgeStore};

pub fn stored_file(id: i64, key: &str) -> StoredFile {
    StoredFile {
        id,
        original_name: key.to_string(),
        storage_key: key.to_string(),
        content_type: "image/png".to_string(),
        size: 1024,
        category: FileCategory::Image,
        created_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// MockFileStorage
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct MockFileStorage {
    pub stored: Arc<Mutex<Vec<(String, usize)>>>,
    pub deleted: Arc<Mutex<Vec<String>>>,
    failing_keys: Arc<Mutex<Vec<String>>>,
}

impl MockFileStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `delete` fail for the given key.
    pub fn failing_delete(self, key: &str) -> Self {
        self.failing_keys.lock().unwrap().push(key.to_string());
        self
    }
}

impl FileStorage for MockFileStorage {
    async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), AppError> {
        self.stored.lock().unwrap().push((key.to_string(), data.len()));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        if self.failing_keys.lock().unwrap().iter().any(|k| k == key) {
            return Err(AppError::StorageError(format!("cannot delete {key}")));
        }
        self.deleted.lock().unwrap().push(key.to_string());
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("/files/{key}")
    }
}

// ---------------------------------------------------------------------------
// MockPurgeStore
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct MockPurgeStore {
    expired: Arc<Mutex<Vec<i64>>>,
    failing_id: Option<i64>,
    list_error: Arc<Mutex<Option<AppError>>>,
    pub purged: Arc<Mutex<Vec<i64>>>,
    pub last_cutoff: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl MockPurgeStore {
    pub fn new(expired: Vec<i64>) -> Self {
        Self {
            expired: Arc::new(Mutex::new(expired)),
            failing_id: None,
            list_error: Arc::new(Mutex::new(None)),
            purged: Arc::new(Mutex::new(Vec::new())),
            last_cutoff: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_list_error(error: AppError) -> Self {
        let store = Self::new(vec![]);
        *store.list_error.lock().unwrap() = Some(error);
        store
    }

    pub fn failing_on(mut self, id: i64) -> Self {
        self.failing_id = Some(id);
        self
    }
}

impl PostPurgeStore for MockPurgeStore {
    async fn expired_deleted(&self, cutoff: DateTime<Utc>) -> Result<Vec<i64>, AppError> {
        *self.last_cutoff.lock().unwrap() = Some(cutoff);
        if let Some(e) = self.list_error.lock().unwrap().take() {
            return Err(e);
        }
        Ok(self.expired.lock().unwrap().clone())
    }

    async fn purge(&self, post_id: i64) -> Result<(), AppError> {
        if self.failing_id == Some(post_id) {
            return Err(AppError::DatabaseError(format!("cannot purge {post_id}")));
        }
        self.purged.lock().unwrap().push(post_id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockOrphanStore
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct MockOrphanStore {
    orphans: Arc<Mutex<Vec<StoredFile>>>,
    pub deleted: Arc<Mutex<Vec<i64>>>,
}

impl MockOrphanStore {
    pub fn new(orphans: Vec<StoredFile>) -> Self {
        Self {
            orphans: Arc::new(Mutex::new(orphans)),
            deleted: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl OrphanFileStore for MockOrphanStore {
    async fn orphans_before(&self, _cutoff: DateTime<Utc>) -> Result<Vec<StoredFile>, AppError> {
        Ok(self.orphans.lock().unwrap().clone())
    }

    async fn delete_record(&self, file_id: i64) -> Result<(), AppError> {
        self.deleted.lock().unwrap().push(file_id);
        Ok(())
    }
}
