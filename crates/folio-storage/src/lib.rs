pub mod config;
pub mod object;

pub use config::{StorageBackend, StorageConfig};
pub use object::ObjectFileStorage;
