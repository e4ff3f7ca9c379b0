//! Camera subsystem: session lifecycle, capture loop, frame buffer
//!
//! - `CameraSession` — connect (device index or stream URL), disconnect,
//!   frame snapshot + status accessors; owns at most one capture loop
//! - capture loop — fixed ~30 Hz reads into the shared buffer
//! - `FrameBuffer` — single-slot overwrite-always store behind one lock
//! - source backends — OpenCV hardware (feature `opencv`) and a synthetic
//!   test pattern (feature `test-source`)

mod capture;
mod frame;
mod session;
mod source;

#[cfg(feature = "opencv")]
mod hw;
#[cfg(feature = "test-source")]
mod test_source;

pub use frame::{Frame, FrameBuffer};
pub use session::{CameraSession, CameraStatus};
pub use source::{DisabledOpener, FrameSource, SourceOpener, SourceTarget};

#[cfg(feature = "opencv")]
pub use hw::HardwareOpener;
#[cfg(feature = "test-source")]
pub use test_source::{TestPatternOpener, TestPatternSource};
