pub mod config;
pub mod database;
pub mod file_repository;
pub mod post_repository;
pub mod stack_repository;
pub mod user_repository;

pub use config::DatabaseConfig;
pub use database::Database;
pub use file_repository::FileRepository;
pub use post_repository::PostRepository;
pub use stack_repository::StackRepository;
pub use user_repository::UserRepository;

use folio_core::AppError;

/// Map a sqlx error, turning unique violations into `Conflict(conflict_message)`.
pub(crate) fn map_unique(e: sqlx::Error, conflict_message: &str) -> AppError {
    if e
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation())
    {
        AppError::Conflict(conflict_message.to_string())
    } else {
        AppError::DatabaseError(e.to_string())
    }
}
