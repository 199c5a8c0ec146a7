use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use folio_core::cleanup::{
    CleanupConfig, CleanupScheduler, OrphanFileCleanup, PostCleanup, TracingCleanupReporter,
};
use folio_db::{Database, DatabaseConfig};
use folio_server::auth::{CookieSettings, TokenService};
use folio_server::config::ServerConfig;
use folio_server::routes;
use folio_server::state::AppState;
use folio_storage::{ObjectFileStorage, StorageConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("folio=info".parse()?))
        .with_target(false)
        .init();

    let config = ServerConfig::from_env()?;
    let cleanup = CleanupConfig::from_env()?;
    let addr = format!("0.0.0.0:{}", config.port);

    let db = Database::connect(&DatabaseConfig::from_env()?).await?;
    db.migrate().await?;

    let storage = ObjectFileStorage::from_config(&StorageConfig::from_env()?)?;
    let tokens = TokenService::new(&config.jwt)?;

    let state = Arc::new(AppState {
        db: db.clone(),
        storage: storage.clone(),
        tokens,
        cookies: CookieSettings {
            secure: config.cookie_secure,
        },
    });

    let cancel = CancellationToken::new();
    let post_scheduler = CleanupScheduler::new(
        PostCleanup::new(db.post_repo(), cleanup.post_retention),
        cleanup.post_schedule,
    );
    let file_scheduler = CleanupScheduler::new(
        OrphanFileCleanup::new(db.file_repo(), storage, cleanup.orphan_grace),
        cleanup.file_schedule,
    );
    let post_task = tokio::spawn({
        let cancel = cancel.clone();
        async move { post_scheduler.run(cancel, &TracingCleanupReporter).await }
    });
    let file_task = tokio::spawn({
        let cancel = cancel.clone();
        async move { file_scheduler.run(cancel, &TracingCleanupReporter).await }
    });

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_origins));

    tracing::info!("Starting server on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await?;

    cancel.cancel();
    let _ = tokio::join!(post_task, file_task);
    Ok(())
}

/// Credentialed CORS for the configured front-end origins.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

async fn shutdown_signal(cancel: CancellationToken) {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    tracing::info!("Shutdown signal received");
    cancel.cancel();
}
