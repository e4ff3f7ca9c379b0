//! Vigil Server — headless control panel with web UI
//!
//! Serves the session-authenticated JSON API (camera, zones, training)
//! and, when configured, the static control-panel UI.
//!
//! ## Usage
//!
//! ```bash
//! # Start server (API on port 5000)
//! vigil-server
//!
//! # Custom port, persistent zone file location
//! VIGIL_WEB_PORT=8080 VIGIL_ZONES_PATH=/var/lib/vigil/zones.json vigil-server
//!
//! # Develop without camera hardware
//! VIGIL_TEST_SOURCE=1 vigil-server
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use vigil::auth::{SessionStore, SharedCredentials, StaticCredentials};
use vigil::camera::TestPatternOpener;
use vigil::web::AppState;
use vigil::{CameraSession, SourceOpener, TrainingManager, ZoneStore};

const DEFAULT_ADMIN: &str = "admin";

/// Server configuration from environment
struct Config {
    web_port: u16,
    zones_path: PathBuf,
    admin_user: String,
    admin_pass: String,
    ui_path: Option<PathBuf>,
    test_source: bool,
}

impl Config {
    fn from_env() -> Self {
        let web_port: u16 = std::env::var("VIGIL_WEB_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5000);

        let zones_path = std::env::var("VIGIL_ZONES_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("zones_config.json"));

        let admin_user =
            std::env::var("VIGIL_ADMIN_USER").unwrap_or_else(|_| DEFAULT_ADMIN.to_string());
        let admin_pass =
            std::env::var("VIGIL_ADMIN_PASS").unwrap_or_else(|_| DEFAULT_ADMIN.to_string());

        let ui_path = std::env::var("VIGIL_UI_PATH")
            .map(PathBuf::from)
            .ok()
            .or_else(|| {
                // Auto-detect: check common locations relative to the binary
                let candidates = ["./ui/build", "./static", "./build"];
                candidates.iter().map(PathBuf::from).find(|p| p.exists())
            });

        let test_source = std::env::var("VIGIL_TEST_SOURCE")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        Self {
            web_port,
            zones_path,
            admin_user,
            admin_pass,
            ui_path,
            test_source,
        }
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vigil=info".parse().unwrap()),
        )
        .init();
}

fn build_opener(test_source: bool) -> Arc<dyn SourceOpener> {
    if test_source {
        info!("Using synthetic test-pattern video source");
        return Arc::new(TestPatternOpener::default());
    }

    #[cfg(feature = "opencv")]
    {
        Arc::new(vigil::camera::HardwareOpener)
    }
    #[cfg(not(feature = "opencv"))]
    {
        warn!(
            "Built without the opencv feature; camera connects will fail \
             (set VIGIL_TEST_SOURCE=1 for a synthetic source)"
        );
        Arc::new(vigil::camera::DisabledOpener)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let config = Config::from_env();

    info!("Vigil Server starting");
    info!("  Web port: {}", config.web_port);
    info!("  Zones path: {:?}", config.zones_path);
    if let Some(ref ui_path) = config.ui_path {
        info!("  UI path: {:?}", ui_path);
    }
    if config.admin_pass == DEFAULT_ADMIN {
        warn!("Using default admin credentials; set VIGIL_ADMIN_USER / VIGIL_ADMIN_PASS");
    }

    let credentials: SharedCredentials = Arc::new(StaticCredentials::new(
        config.admin_user.clone(),
        config.admin_pass.clone(),
    ));
    let camera = CameraSession::new(build_opener(config.test_source));
    let training = TrainingManager::new();
    let state = AppState {
        camera: camera.clone(),
        training: training.clone(),
        zones: Arc::new(ZoneStore::new(&config.zones_path)),
        sessions: Arc::new(SessionStore::new()),
        credentials,
    };

    // Graceful shutdown
    let cancel = CancellationToken::new();
    let tracker = TaskTracker::new();

    let web_bind = SocketAddr::from(([0, 0, 0, 0], config.web_port));
    let web_cancel = cancel.clone();
    let web_ui_path = config.ui_path.clone();
    tracker.spawn(async move {
        if let Err(e) = vigil::web::start(state, web_bind, web_ui_path, web_cancel).await {
            error!("Web server error: {}", e);
        }
    });
    tracker.close();

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    cancel.cancel();
    tracker.wait().await;

    // Stop background work deterministically before exit.
    camera.disconnect().await;
    training.stop().await;

    info!("Shutdown complete");
    Ok(())
}
