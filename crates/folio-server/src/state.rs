use folio_db::Database;
use folio_storage::ObjectFileStorage;

use crate::auth::{CookieSettings, TokenService};

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    pub db: Database,
    pub storage: ObjectFileStorage,
    pub tokens: TokenService,
    pub cookies: CookieSettings,
}
