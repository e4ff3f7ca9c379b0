//! Source identity and the capture backend seam
//!
//! `SourceTarget` says how to open a source; `FrameSource` is the blocking
//! read side; `SourceOpener` is the injectable factory that turns one into
//! the other. Backends live behind cargo features so builds without camera
//! hardware (or without OpenCV installed) still compile and serve.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Frame;
use crate::error::CameraError;

/// Identifies a video source: a local capture device by index or a remote
/// stream by URL. Identity is opaque beyond "how to open it".
///
/// Serialized untagged, so a device shows up as a plain integer and a
/// stream as a plain string, the shape the `camera_id` API field expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceTarget {
    Device(u32),
    Url(String),
}

impl fmt::Display for SourceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceTarget::Device(index) => write!(f, "device {index}"),
            SourceTarget::Url(url) => f.write_str(url),
        }
    }
}

/// Blocking frame producer owned by the capture loop.
///
/// `read_frame` returns `None` for a failed read; the loop skips those
/// silently and tries again on the next tick. Dropping the source releases
/// the underlying handle.
pub trait FrameSource: Send {
    fn read_frame(&mut self) -> Option<Frame>;
}

/// Opens sources on demand.
///
/// Injected into `CameraSession` so the binary can pick the hardware
/// backend while tests substitute synthetic ones. `open` may block; the
/// session runs it on the blocking thread pool.
pub trait SourceOpener: Send + Sync {
    fn open(&self, target: &SourceTarget) -> Result<Box<dyn FrameSource>, CameraError>;
}

/// Opener for builds with no capture backend compiled in. Every connect
/// attempt fails with `OpenFailed`; the rest of the panel (zones,
/// training) keeps working.
pub struct DisabledOpener;

impl SourceOpener for DisabledOpener {
    fn open(&self, target: &SourceTarget) -> Result<Box<dyn FrameSource>, CameraError> {
        Err(CameraError::open_failed(
            target.clone(),
            "no capture backend in this build",
        ))
    }
}
