//! Camera session lifecycle
//!
//! `CameraSession` owns at most one capture loop + frame buffer pair at a
//! time. Connect tears down any prior source before opening the new one;
//! disconnect cancels the loop and joins it, so teardown is deterministic
//! and no source handle leaks. All lifecycle mutations are serialized by
//! one async mutex; frame reads bypass it entirely.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::source::{SourceOpener, SourceTarget};
use super::{capture, FrameBuffer};
use crate::error::CameraError;

/// Snapshot of the session state for the status endpoint.
#[derive(Debug, Clone)]
pub struct CameraStatus {
    pub connected: bool,
    pub source: Option<SourceTarget>,
}

/// A live capture loop and the token that stops it.
struct ActiveCapture {
    target: SourceTarget,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

struct SessionInner {
    opener: Arc<dyn SourceOpener>,
    buffer: Arc<FrameBuffer>,
    /// `Some` while a capture loop is alive. Guarded by an async mutex so
    /// concurrent connect/disconnect calls serialize and the at-most-one-
    /// loop invariant holds across teardown + reopen.
    active: Mutex<Option<ActiveCapture>>,
}

/// Handle to the camera session. Clones share the same state.
#[derive(Clone)]
pub struct CameraSession {
    inner: Arc<SessionInner>,
}

impl CameraSession {
    pub fn new(opener: Arc<dyn SourceOpener>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                opener,
                buffer: Arc::new(FrameBuffer::new()),
                active: Mutex::new(None),
            }),
        }
    }

    /// Connect to a local capture device by index.
    pub async fn connect_local(&self, device_index: u32) -> Result<(), CameraError> {
        self.connect(SourceTarget::Device(device_index)).await
    }

    /// Connect to a network/stream URL (RTSP, HTTP, ...).
    pub async fn connect_remote(&self, url: impl Into<String>) -> Result<(), CameraError> {
        self.connect(SourceTarget::Url(url.into())).await
    }

    async fn connect(&self, target: SourceTarget) -> Result<(), CameraError> {
        let mut active = self.inner.active.lock().await;

        // Fully release any prior loop/source before opening the new one.
        if let Some(prev) = active.take() {
            teardown(prev, &self.inner.buffer).await;
        }

        // Open and probe on the blocking pool: device opens and reads can
        // stall, and must not do so on an async worker thread.
        let opener = Arc::clone(&self.inner.opener);
        let probe_target = target.clone();
        let opened = tokio::task::spawn_blocking(move || {
            let mut source = opener.open(&probe_target)?;
            // Initial test read: an openable source that yields nothing is
            // ReadFailed, not OpenFailed. The probe frame is discarded.
            if source.read_frame().is_none() {
                return Err(CameraError::ReadFailed {
                    target: probe_target,
                });
            }
            Ok(source)
        })
        .await;

        let source = match opened {
            Ok(result) => result?,
            Err(join_error) => {
                error!(error = %join_error, "source open task failed");
                return Err(CameraError::open_failed(target, "capture backend panicked"));
            }
        };

        let cancel = CancellationToken::new();
        let buffer = Arc::clone(&self.inner.buffer);
        let loop_cancel = cancel.clone();
        let task = tokio::task::spawn_blocking(move || capture::run(source, buffer, loop_cancel));

        info!(source = %target, "camera connected");
        *active = Some(ActiveCapture {
            target,
            cancel,
            task,
        });
        Ok(())
    }

    /// Stop the capture loop, release the source, and clear the last
    /// frame. Idempotent: safe to call when already disconnected.
    pub async fn disconnect(&self) {
        let mut active = self.inner.active.lock().await;
        if let Some(prev) = active.take() {
            info!(source = %prev.target, "camera disconnected");
            teardown(prev, &self.inner.buffer).await;
        }
    }

    /// The most recent frame as JPEG, or `None` if nothing has been
    /// captured yet. Reads only the frame buffer; never waits on the
    /// capture cadence or the session mutex.
    pub fn current_frame_jpeg(&self) -> Option<Bytes> {
        let frame = self.inner.buffer.get()?;
        match frame.encode_jpeg() {
            Ok(jpeg) => Some(Bytes::from(jpeg)),
            Err(e) => {
                warn!(error = %e, "frame encode failed");
                None
            }
        }
    }

    pub async fn status(&self) -> CameraStatus {
        let active = self.inner.active.lock().await;
        CameraStatus {
            connected: active.is_some(),
            source: active.as_ref().map(|a| a.target.clone()),
        }
    }
}

/// Cancel the loop, wait for it to exit, and drop the buffered frame.
/// Joining bounds teardown at one capture tick plus the in-flight read.
async fn teardown(capture: ActiveCapture, buffer: &FrameBuffer) {
    capture.cancel.cancel();
    if let Err(e) = capture.task.await {
        warn!(error = %e, "capture loop did not exit cleanly");
    }
    buffer.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::source::FrameSource;
    use crate::camera::Frame;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Source that yields solid frames and records when it is dropped
    /// (i.e. when the underlying handle would be released).
    struct TrackedSource {
        dropped: Arc<AtomicUsize>,
    }

    impl FrameSource for TrackedSource {
        fn read_frame(&mut self) -> Option<Frame> {
            Some(Frame::rgb(2, 2, vec![9u8; 2 * 2 * 3]))
        }
    }

    impl Drop for TrackedSource {
        fn drop(&mut self) {
            self.dropped.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct TrackedOpener {
        dropped: Arc<AtomicUsize>,
    }

    impl SourceOpener for TrackedOpener {
        fn open(&self, _target: &SourceTarget) -> Result<Box<dyn FrameSource>, CameraError> {
            Ok(Box::new(TrackedSource {
                dropped: Arc::clone(&self.dropped),
            }))
        }
    }

    /// Opens fine but never produces a frame.
    struct BarrenSource;

    impl FrameSource for BarrenSource {
        fn read_frame(&mut self) -> Option<Frame> {
            None
        }
    }

    struct BarrenOpener;

    impl SourceOpener for BarrenOpener {
        fn open(&self, _target: &SourceTarget) -> Result<Box<dyn FrameSource>, CameraError> {
            Ok(Box::new(BarrenSource))
        }
    }

    struct RefusingOpener;

    impl SourceOpener for RefusingOpener {
        fn open(&self, target: &SourceTarget) -> Result<Box<dyn FrameSource>, CameraError> {
            Err(CameraError::open_failed(target.clone(), "no such device"))
        }
    }

    fn tracked_session() -> (CameraSession, Arc<AtomicUsize>) {
        let dropped = Arc::new(AtomicUsize::new(0));
        let session = CameraSession::new(Arc::new(TrackedOpener {
            dropped: Arc::clone(&dropped),
        }));
        (session, dropped)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn connect_then_frames_flow() {
        let (session, _) = tracked_session();
        session.connect_local(0).await.unwrap();

        // The loop writes within one capture tick.
        tokio::time::sleep(Duration::from_millis(150)).await;
        let jpeg = session.current_frame_jpeg().expect("frame after connect");
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let status = session.status().await;
        assert!(status.connected);
        assert_eq!(status.source, Some(SourceTarget::Device(0)));

        session.disconnect().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn disconnect_clears_frame_and_is_idempotent() {
        let (session, dropped) = tracked_session();
        session.connect_local(0).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        session.disconnect().await;
        assert!(session.current_frame_jpeg().is_none());
        assert_eq!(dropped.load(Ordering::SeqCst), 1, "source handle released");

        // Second disconnect is a no-op.
        session.disconnect().await;
        let status = session.status().await;
        assert!(!status.connected);
        assert!(status.source.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reconnect_releases_prior_source_first() {
        let (session, dropped) = tracked_session();
        session.connect_local(0).await.unwrap();
        session
            .connect_remote("rtsp://cam.local/stream")
            .await
            .unwrap();

        assert_eq!(
            dropped.load(Ordering::SeqCst),
            1,
            "prior source must be released before the new one opens"
        );
        let status = session.status().await;
        assert_eq!(
            status.source,
            Some(SourceTarget::Url("rtsp://cam.local/stream".into()))
        );

        session.disconnect().await;
        assert_eq!(dropped.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn open_failure_leaves_session_disconnected() {
        let session = CameraSession::new(Arc::new(RefusingOpener));
        let err = session.connect_local(3).await.unwrap_err();
        assert!(matches!(err, CameraError::OpenFailed { .. }));
        assert!(!session.status().await.connected);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn source_without_frames_is_read_failed() {
        let session = CameraSession::new(Arc::new(BarrenOpener));
        let err = session.connect_local(0).await.unwrap_err();
        assert!(matches!(err, CameraError::ReadFailed { .. }));
        assert!(!session.status().await.connected);
        assert!(session.current_frame_jpeg().is_none());
    }
}
