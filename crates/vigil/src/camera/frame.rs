//! Frame type and the single-slot frame buffer

use std::sync::{Mutex, MutexGuard};

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

/// JPEG quality for frame snapshots sent to the browser.
const JPEG_QUALITY: u8 = 80;

/// One decoded raster image pulled from a source.
///
/// Pixel data is tightly packed RGB24 (`width * height * 3` bytes) in a
/// `Bytes` payload, so clones are cheap and frames can cross threads
/// without copying.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Bytes,
}

impl Frame {
    /// Create a frame from packed RGB24 pixel data.
    pub fn rgb(width: u32, height: u32, data: impl Into<Bytes>) -> Self {
        Self {
            width,
            height,
            data: data.into(),
        }
    }

    /// Encode the frame as a JPEG still image.
    pub fn encode_jpeg(&self) -> anyhow::Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
        encoder.encode(&self.data, self.width, self.height, ExtendedColorType::Rgb8)?;
        Ok(out)
    }
}

/// Single-slot, overwrite-always frame store.
///
/// `set` replaces the stored frame wholesale and `get` returns a snapshot
/// of the latest completed write (`None` before the first one). Both hold
/// one short-lived lock, so a reader never observes a partially written
/// frame and never waits for a full capture cycle. No queuing, no backlog.
#[derive(Default)]
pub struct FrameBuffer {
    slot: Mutex<Option<Frame>>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored frame with a newer one.
    pub fn set(&self, frame: Frame) {
        *self.lock() = Some(frame);
    }

    /// Snapshot the latest frame, if any has been captured yet.
    pub fn get(&self) -> Option<Frame> {
        self.lock().clone()
    }

    /// Drop the stored frame (used on disconnect).
    pub fn clear(&self) {
        *self.lock() = None;
    }

    fn lock(&self) -> MutexGuard<'_, Option<Frame>> {
        // The slot is replaced wholesale under the lock, so even a poisoned
        // mutex still holds a complete frame; recover instead of unwinding.
        match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(byte: u8) -> Frame {
        Frame::rgb(4, 4, vec![byte; 4 * 4 * 3])
    }

    #[test]
    fn buffer_empty_before_first_write() {
        let buffer = FrameBuffer::new();
        assert!(buffer.get().is_none());
    }

    #[test]
    fn buffer_returns_latest_write() {
        let buffer = FrameBuffer::new();
        buffer.set(solid_frame(1));
        buffer.set(solid_frame(2));

        let frame = buffer.get().unwrap();
        assert_eq!(frame.data[0], 2, "old frame must be overwritten");
    }

    #[test]
    fn buffer_clear_drops_frame() {
        let buffer = FrameBuffer::new();
        buffer.set(solid_frame(7));
        buffer.clear();
        assert!(buffer.get().is_none());
    }

    #[test]
    fn encode_jpeg_produces_jpeg_markers() {
        let jpeg = solid_frame(128).encode_jpeg().unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "missing SOI marker");
        assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9], "missing EOI marker");
    }

    #[test]
    fn frame_clones_share_pixel_data() {
        let frame = solid_frame(3);
        let clone = frame.clone();
        // Bytes clones are reference-counted views, not copies.
        assert_eq!(frame.data.as_ptr(), clone.data.as_ptr());
    }
}
