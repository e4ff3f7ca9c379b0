//! Capture loop: pulls frames from a source into the shared buffer
//!
//! Runs as a plain blocking loop (the session spawns it on the blocking
//! thread pool) so slow device reads never tie up async workers.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::source::FrameSource;
use super::FrameBuffer;

/// Inter-read delay for the ~30 reads/second cadence. Fixed, not adaptive.
pub(crate) const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// Read frames until cancelled, overwriting the buffer on each success.
///
/// A failed read is skipped silently (no frame update, no error surfaced,
/// no backoff) so a transient failure on an IP stream never kills the
/// stream. The source handle is released when the loop returns.
pub(crate) fn run(
    mut source: Box<dyn FrameSource>,
    buffer: Arc<FrameBuffer>,
    cancel: CancellationToken,
) {
    debug!("capture loop running");
    while !cancel.is_cancelled() {
        if let Some(frame) = source.read_frame() {
            buffer.set(frame);
        }
        std::thread::sleep(FRAME_INTERVAL);
    }
    debug!("capture loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Frame;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    /// Counts reads; fails every other one.
    struct FlakySource {
        reads: Arc<AtomicUsize>,
    }

    impl FrameSource for FlakySource {
        fn read_frame(&mut self) -> Option<Frame> {
            let n = self.reads.fetch_add(1, Ordering::SeqCst);
            if n % 2 == 0 {
                Some(Frame::rgb(2, 2, vec![n as u8; 2 * 2 * 3]))
            } else {
                None
            }
        }
    }

    #[test]
    fn loop_stops_on_cancel_and_survives_failed_reads() {
        let reads = Arc::new(AtomicUsize::new(0));
        let buffer = Arc::new(FrameBuffer::new());
        let cancel = CancellationToken::new();

        let source = Box::new(FlakySource {
            reads: Arc::clone(&reads),
        });
        let loop_buffer = Arc::clone(&buffer);
        let loop_cancel = cancel.clone();
        let handle = std::thread::spawn(move || run(source, loop_buffer, loop_cancel));

        // Let a handful of ticks elapse, half of which fail.
        std::thread::sleep(FRAME_INTERVAL * 5);
        cancel.cancel();
        handle.join().unwrap();

        let total = reads.load(Ordering::SeqCst);
        assert!(total >= 2, "expected several read attempts, got {total}");
        assert!(
            buffer.get().is_some(),
            "successful reads must land in the buffer"
        );

        // No further reads once the loop has exited.
        std::thread::sleep(FRAME_INTERVAL * 2);
        assert_eq!(reads.load(Ordering::SeqCst), total);
    }

    #[test]
    fn cancelled_token_stops_loop_promptly() {
        let buffer = Arc::new(FrameBuffer::new());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let source = Box::new(FlakySource {
            reads: Arc::new(AtomicUsize::new(0)),
        });
        let start = Instant::now();
        run(source, buffer, cancel);
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
