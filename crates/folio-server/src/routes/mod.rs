use std::sync::Arc;

use axum::Router;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post, put};
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use folio_core::upload::MAX_UPLOAD_BYTES;

use crate::auth::{require_admin, require_auth};
use crate::dto::HealthResponse;
use crate::openapi::ApiDoc;
use crate::state::AppState;

pub mod auth;
pub mod files;
pub mod me;
pub mod my_posts;
pub mod posts;
pub mod stacks;

/// Largest accepted upload plus room for the multipart framing.
const UPLOAD_BODY_LIMIT: usize = (MAX_UPLOAD_BYTES + 1024 * 1024) as usize;

/// Build the full router with all routes and middleware.
pub fn router(state: Arc<AppState>) -> Router {
    let authenticated = Router::new()
        .route("/api/me", get(me::get_me))
        .route("/api/me/profile", patch(me::update_profile))
        .route("/api/me/password", patch(me::change_password))
        .route("/api/my/posts", get(my_posts::list).post(my_posts::create))
        .route("/api/my/posts/deleted", get(my_posts::list_deleted))
        .route(
            "/api/my/posts/{slug}",
            put(my_posts::update).delete(my_posts::delete),
        )
        .route("/api/my/posts/{slug}/edit", get(my_posts::edit_view))
        .route("/api/my/posts/{slug}/restore", post(my_posts::restore))
        .route(
            "/api/files/upload",
            post(files::upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let admin = Router::new()
        .route("/api/admin/auth/signup", post(auth::signup))
        .route("/api/admin/stacks", post(stacks::create))
        .route(
            "/api/admin/stacks/{id}",
            put(stacks::update).delete(stacks::delete),
        )
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let public = Router::new()
        .route("/health", get(health))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/users/{nickname}", get(me::get_public_user))
        .route("/api/posts", get(posts::search))
        .route("/api/posts/autocomplete", get(posts::autocomplete))
        .route("/api/posts/user/{nickname}", get(posts::list_by_user))
        .route("/api/posts/{nickname}/{slug}", get(posts::get_post))
        .route("/api/stacks", get(stacks::list))
        .route("/api/stacks/group/{group}", get(stacks::list_by_group))
        .route("/api/stacks/with-count", get(stacks::with_count))
        .route("/api/stacks/grouped", get(stacks::grouped))
        .route("/api/stacks/popular", get(stacks::popular))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let app = public
        .merge(authenticated)
        .merge(admin)
        .with_state(state.clone());

    // Only the local backend needs the API to serve stored files.
    match state.storage.local_dir() {
        Some(dir) => app.nest_service("/files", ServeDir::new(dir)),
        None => app,
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let db_status = match state.db.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            "error"
        }
    };

    let status = if db_status == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if db_status == "ok" {
            "healthy"
        } else {
            "unhealthy"
        },
        database: db_status,
    };

    (status, axum::Json(response))
}
