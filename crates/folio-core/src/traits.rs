use std::future::Future;

use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::file::StoredFile;

/// Stores and removes uploaded file bytes.
pub trait FileStorage: Send + Sync + Clone {
    /// Write `data` under `key`, replacing any existing object.
    fn put(
        &self,
        key: &str,
        data: Vec<u8>,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Delete the object at `key`. Deleting a missing object is not an error.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Public URL a browser can fetch the object from.
    fn public_url(&self, key: &str) -> String;
}

/// Posts eligible for permanent removal.
pub trait PostPurgeStore: Send + Sync + Clone {
    /// Ids of posts soft-deleted before `cutoff`.
    fn expired_deleted(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<i64>, AppError>> + Send;

    /// Permanently delete a post together with its tag, stack, and file mappings.
    fn purge(&self, post_id: i64) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Uploaded files no longer referenced by any post or user.
pub trait OrphanFileStore: Send + Sync + Clone {
    fn orphans_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<StoredFile>, AppError>> + Send;

    fn delete_record(&self, file_id: i64) -> impl Future<Output = Result<(), AppError>> + Send;
}
