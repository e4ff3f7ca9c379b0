//! Hardware capture via OpenCV `VideoCapture`
//!
//! One backend covers both source kinds: a local device index opens
//! through the default capture API, a URL (RTSP/HTTP) through the file
//! interface. Frames arrive as BGR mats and are converted to packed RGB.

use opencv::core::{AlgorithmHint, Mat};
use opencv::prelude::*;
use opencv::{imgproc, videoio};
use tracing::debug;

use super::source::{FrameSource, SourceOpener, SourceTarget};
use super::Frame;
use crate::error::CameraError;

/// Opener backed by OpenCV. The probe read in `CameraSession::connect`
/// covers the "opens but yields nothing" case, so this only checks that
/// the capture handle itself came up.
pub struct HardwareOpener;

impl SourceOpener for HardwareOpener {
    fn open(&self, target: &SourceTarget) -> Result<Box<dyn FrameSource>, CameraError> {
        let capture = match target {
            SourceTarget::Device(index) => {
                videoio::VideoCapture::new(*index as i32, videoio::CAP_ANY)
            }
            SourceTarget::Url(url) => videoio::VideoCapture::from_file(url, videoio::CAP_ANY),
        }
        .map_err(|e| CameraError::open_failed(target.clone(), e.to_string()))?;

        let opened = capture
            .is_opened()
            .map_err(|e| CameraError::open_failed(target.clone(), e.to_string()))?;
        if !opened {
            return Err(CameraError::open_failed(target.clone(), "device not available"));
        }

        Ok(Box::new(HardwareSource { capture }))
    }
}

struct HardwareSource {
    capture: videoio::VideoCapture,
}

impl FrameSource for HardwareSource {
    fn read_frame(&mut self) -> Option<Frame> {
        let mut bgr = Mat::default();
        match self.capture.read(&mut bgr) {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                debug!(error = %e, "camera read failed");
                return None;
            }
        }
        if bgr.cols() <= 0 || bgr.rows() <= 0 {
            return None;
        }

        let mut rgb = Mat::default();
        if let Err(e) = imgproc::cvt_color(
            &bgr,
            &mut rgb,
            imgproc::COLOR_BGR2RGB,
            0,
            AlgorithmHint::ALGO_HINT_DEFAULT,
        ) {
            debug!(error = %e, "color conversion failed");
            return None;
        }

        let width = rgb.cols() as u32;
        let height = rgb.rows() as u32;
        match rgb.data_bytes() {
            Ok(data) => Some(Frame::rgb(width, height, data.to_vec())),
            Err(e) => {
                debug!(error = %e, "frame data not contiguous");
                None
            }
        }
    }
}
