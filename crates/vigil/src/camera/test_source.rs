//! Synthetic video source for development and tests
//!
//! Generates a moving color gradient so the whole capture pipeline can be
//! exercised without any camera hardware attached.

use super::source::{FrameSource, SourceOpener, SourceTarget};
use super::Frame;
use crate::error::CameraError;

const DEFAULT_WIDTH: u32 = 64;
const DEFAULT_HEIGHT: u32 = 48;

/// Frame generator producing a gradient that shifts every read, so
/// consecutive frames are distinguishable.
pub struct TestPatternSource {
    width: u32,
    height: u32,
    tick: u64,
}

impl TestPatternSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tick: 0,
        }
    }
}

impl Default for TestPatternSource {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl FrameSource for TestPatternSource {
    fn read_frame(&mut self) -> Option<Frame> {
        self.tick = self.tick.wrapping_add(1);
        let shift = self.tick as u8;

        let mut data = Vec::with_capacity((self.width * self.height * 3) as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                data.push((x as u8).wrapping_add(shift));
                data.push((y as u8).wrapping_add(shift));
                data.push(shift);
            }
        }
        Some(Frame::rgb(self.width, self.height, data))
    }
}

/// Opener that hands out test-pattern sources for any target.
pub struct TestPatternOpener {
    pub width: u32,
    pub height: u32,
}

impl Default for TestPatternOpener {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl SourceOpener for TestPatternOpener {
    fn open(&self, _target: &SourceTarget) -> Result<Box<dyn FrameSource>, CameraError> {
        Ok(Box::new(TestPatternSource::new(self.width, self.height)))
    }
}
