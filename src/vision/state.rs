//! Shared vision snapshot
//!
//! The single cross-thread mutable resource: the latest `(frame, detections)`
//! pair published by the vision worker and read by the HUD and the dialogue
//! loop. Both fields are replaced together under one lock, so a reader never
//! observes a frame paired with detections from a different capture cycle.

use std::sync::Mutex;

use super::types::{Detection, Frame};

#[derive(Default)]
struct Snapshot {
    frame: Option<Frame>,
    detections: Vec<Detection>,
}

/// Latest published `(frame, detections)` pair, copy-on-read
#[derive(Default)]
pub struct VisionState {
    inner: Mutex<Snapshot>,
}

impl VisionState {
    /// Create an empty state (no frame published yet)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a new capture cycle, replacing both fields atomically
    pub fn publish(&self, frame: Frame, detections: Vec<Detection>) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.frame = Some(frame);
        inner.detections = detections;
    }

    /// Latest frame and detections as one consistent pair, or `None`
    /// before the first publish. Returns defensive copies.
    #[must_use]
    pub fn snapshot(&self) -> Option<(Frame, Vec<Detection>)> {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner
            .frame
            .as_ref()
            .map(|f| (f.clone(), inner.detections.clone()))
    }

    /// Copy of the latest frame, or `None` before the first publish
    #[must_use]
    pub fn frame(&self) -> Option<Frame> {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.frame.clone()
    }

    /// Copy of the latest detection list (empty before the first publish)
    #[must_use]
    pub fn detections(&self) -> Vec<Detection> {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.detections.clone()
    }

    /// Clear the snapshot (vision-system shutdown)
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.frame = None;
        inner.detections.clear();
    }
}
