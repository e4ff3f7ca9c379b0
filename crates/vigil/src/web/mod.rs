//! Web layer: axum HTTP JSON API with cookie sessions
//!
//! - `POST /api/login`, `POST /api/logout` — session management
//! - `POST /api/camera/connect`, `POST /api/camera/disconnect`,
//!   `GET /api/camera/frame`, `GET /api/camera/status`
//! - `POST /api/zones/save`, `GET /api/zones/load`
//! - `POST /api/training/start`, `GET /api/training/status`,
//!   `POST /api/training/stop` (admin only)
//!
//! Every route except login requires an authenticated session; training
//! routes require the admin identity. Component failures surface as
//! `{success: false, message}` bodies, never a crash or a stack trace.

mod camera;
mod session;
mod training;
mod zones;

pub use session::{AdminUser, AuthUser};

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::auth::{SessionStore, SharedCredentials};
use crate::camera::CameraSession;
use crate::training::TrainingManager;
use crate::zones::ZoneStore;

/// Shared state for request handlers: owned component instances built in
/// `main` and passed through axum state. No process-wide globals.
#[derive(Clone)]
pub struct AppState {
    pub camera: CameraSession,
    pub training: TrainingManager,
    pub zones: Arc<ZoneStore>,
    pub sessions: Arc<SessionStore>,
    pub credentials: SharedCredentials,
}

/// The `{success, message}` envelope returned by mutation endpoints.
#[derive(Debug, Serialize)]
pub struct ApiMessage {
    pub success: bool,
    pub message: String,
}

impl ApiMessage {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Build the API router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/login", post(session::login))
        .route("/api/logout", post(session::logout))
        .route("/api/camera/connect", post(camera::connect))
        .route("/api/camera/disconnect", post(camera::disconnect))
        .route("/api/camera/frame", get(camera::frame))
        .route("/api/camera/status", get(camera::status))
        .route("/api/zones/save", post(zones::save))
        .route("/api/zones/load", get(zones::load))
        .route("/api/training/start", post(training::start))
        .route("/api/training/status", get(training::status))
        .route("/api/training/stop", post(training::stop))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the web server.
///
/// `ui_path` — directory with the built control-panel UI; if `None` (or
/// missing on disk) only the JSON API is served. Returns after `shutdown`
/// fires and in-flight requests drain.
pub async fn start(
    state: AppState,
    bind: SocketAddr,
    ui_path: Option<PathBuf>,
    shutdown: CancellationToken,
) -> Result<()> {
    let mut app = router(state);

    if let Some(ref path) = ui_path {
        if path.exists() {
            info!("Serving UI from {:?}", path);
            app = app.fallback_service(ServeDir::new(path).append_index_html_on_directories(true));
        } else {
            warn!("UI path {:?} does not exist, skipping static file serving", path);
        }
    }

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind to {bind}"))?;

    info!("Web server listening on http://{}", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("Web server error")?;

    Ok(())
}
