//! Camera capture
//!
//! Owns the webcam device. Frames are handed out as owned RGB buffers;
//! a failed read degrades to `None` so the vision loop can skip the cycle.

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};

use super::types::Frame;
use crate::{Error, Result};

/// Source of camera frames
///
/// The production implementation is [`Camera`]; tests drive the vision
/// loop with scripted sources.
pub trait FrameSource {
    /// Grab the next frame, or `None` if the device produced nothing
    fn read(&mut self) -> Option<Frame>;

    /// Release the device
    fn close(&mut self);
}

/// Webcam frame source backed by `nokhwa`
pub struct Camera {
    device: nokhwa::Camera,
}

impl Camera {
    /// Open a camera device by index with a requested resolution
    ///
    /// # Errors
    ///
    /// Returns error if the device cannot be opened or streaming fails
    pub fn open(index: u32, width: u32, height: u32) -> Result<Self> {
        let format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(Resolution::new(width, height), FrameFormat::MJPEG, 30),
        ));

        let mut device = nokhwa::Camera::new(CameraIndex::Index(index), format)
            .map_err(|e| Error::Camera(e.to_string()))?;

        device
            .open_stream()
            .map_err(|e| Error::Camera(e.to_string()))?;

        let resolution = device.resolution();
        tracing::info!(
            index,
            width = resolution.width(),
            height = resolution.height(),
            "camera opened"
        );

        Ok(Self { device })
    }

    /// Actual streaming resolution (may differ from the requested one)
    #[must_use]
    pub fn resolution(&self) -> (u32, u32) {
        let r = self.device.resolution();
        (r.width(), r.height())
    }
}

impl FrameSource for Camera {
    fn read(&mut self) -> Option<Frame> {
        let buffer = match self.device.frame() {
            Ok(buffer) => buffer,
            Err(e) => {
                tracing::trace!(error = %e, "frame grab failed");
                return None;
            }
        };

        match buffer.decode_image::<RgbFormat>() {
            Ok(img) => {
                let (width, height) = (img.width(), img.height());
                Frame::from_rgb8(width, height, img.into_raw())
            }
            Err(e) => {
                tracing::trace!(error = %e, "frame decode failed");
                None
            }
        }
    }

    fn close(&mut self) {
        if let Err(e) = self.device.stop_stream() {
            tracing::debug!(error = %e, "camera stop_stream failed");
        }
        tracing::info!("camera released");
    }
}
