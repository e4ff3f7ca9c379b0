//! Error taxonomy for the camera and training subsystems
//!
//! These are the errors that surface to API callers as
//! `{success: false, message}` responses. Internal plumbing (listener
//! binding, filesystem setup) uses `anyhow` with context instead.

use thiserror::Error;

use crate::camera::SourceTarget;

/// Failures when connecting a camera source.
#[derive(Debug, Error)]
pub enum CameraError {
    /// The source could not be opened at all (missing device, bad URL,
    /// or no capture backend in this build).
    #[error("cannot open {target}: {detail}")]
    OpenFailed { target: SourceTarget, detail: String },

    /// The source opened but the initial test read produced no frame.
    /// Distinguishes "device exists but gives no data" from "device missing".
    #[error("{target} opened but produced no frame")]
    ReadFailed { target: SourceTarget },
}

impl CameraError {
    pub fn open_failed(target: SourceTarget, detail: impl Into<String>) -> Self {
        Self::OpenFailed {
            target,
            detail: detail.into(),
        }
    }
}

/// Failures when managing the training simulator.
#[derive(Debug, Error)]
pub enum TrainingError {
    /// A job is already active; progress of the running job is untouched.
    #[error("training already in progress")]
    AlreadyRunning,
}
