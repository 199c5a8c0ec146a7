pub mod account;
pub mod cleanup;
pub mod error;
pub mod file;
pub mod markdown;
pub mod page;
pub mod password;
pub mod post;
pub mod related;
pub mod slug;
pub mod stack;
pub mod traits;
pub mod upload;
pub mod user;

#[cfg(test)]
mod testutil;

pub use error::AppError;
pub use file::{FileCategory, NewStoredFile, StoredFile};
pub use page::{Page, PageRequest};
pub use post::{Post, PostFilter, PostStatus, PostType};
pub use stack::{Stack, StackGroup, StackWithCount};
pub use traits::{FileStorage, OrphanFileStore, PostPurgeStore};
pub use user::{Role, User};
