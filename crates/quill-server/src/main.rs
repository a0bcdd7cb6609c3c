use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use quill_api::auth::{AppState, AppStateInner};
use quill_core::{Config, Core, DiskStore, SystemClock};

/// Values that must never be used as the signing key.
const PLACEHOLDER_SECRETS: &[&str] =
    &["", "changeme", "change-me", "secret", "dev-secret-change-me"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quill=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret = std::env::var("QUILL_JWT_SECRET").unwrap_or_default();
    if PLACEHOLDER_SECRETS.contains(&jwt_secret.trim()) {
        bail!("QUILL_JWT_SECRET must be set to a real secret");
    }
    let db_path = std::env::var("QUILL_DB_PATH").unwrap_or_else(|_| "quill.db".into());
    let upload_dir = std::env::var("QUILL_UPLOAD_DIR").unwrap_or_else(|_| "./uploads".into());
    let host = std::env::var("QUILL_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("QUILL_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let session_hours: i64 = std::env::var("QUILL_SESSION_HOURS")
        .unwrap_or_else(|_| "2".into())
        .parse()?;

    // Init database and uploads
    let db = quill_db::Database::open(&PathBuf::from(&db_path))?;
    let files = DiskStore::new(PathBuf::from(&upload_dir))?;

    let core = Core::new(
        Arc::new(db),
        Arc::new(SystemClock),
        Arc::new(files),
        Config::from_env(),
    )?;
    let state: AppState = Arc::new(AppStateInner {
        core,
        jwt_secret,
        session_hours,
    });

    let app = quill_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Quill server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Quill server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let interrupt = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = interrupt => info!("Interrupted, draining connections"),
                    _ = terminate.recv() => info!("Terminated, draining connections"),
                }
            }
            Err(e) => {
                warn!("SIGTERM handler unavailable ({}), waiting for Ctrl+C only", e);
                interrupt.await.ok();
                info!("Interrupted, draining connections");
            }
        }
    }

    #[cfg(not(unix))]
    {
        interrupt.await.ok();
        info!("Interrupted, draining connections");
    }
}
