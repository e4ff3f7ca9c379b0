//! Vigil - session-authenticated camera control panel
//!
//! A small web control panel for connecting a camera (USB or IP/RTSP),
//! streaming frames to a browser, persisting polygonal calibration zones,
//! and running a simulated training job with progress reporting.
//!
//! Feature flags control which modules are compiled:
//!
//! - **Core** (always available): camera session + capture loop + frame
//!   buffer, zone persistence, training simulator, credentials/sessions
//! - **`web`**: axum HTTP layer (JSON API, session cookies, static UI)
//! - **`test-source`**: synthetic video source without hardware
//! - **`opencv`**: hardware capture via OpenCV VideoCapture

pub mod auth;
pub mod camera;
pub mod error;
pub mod training;
pub mod zones;

// Web: axum router, session extractors, JSON handlers
#[cfg(feature = "web")]
pub mod web;

pub use camera::{CameraSession, CameraStatus, Frame, FrameBuffer, SourceOpener, SourceTarget};
pub use error::{CameraError, TrainingError};
pub use training::{TrainingManager, TrainingStatus};
pub use zones::{ZoneSet, ZoneStore};
