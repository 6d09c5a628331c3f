//! Vision loop
//!
//! Background thread that pulls frames from the camera, runs detection,
//! and publishes the paired snapshot. A detection failure is demoted to
//! an empty detection list for that cycle; the loop only exits on its
//! stop flag. `stop()` joins the thread, so the camera device is free
//! once it returns.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use super::camera::FrameSource;
use super::detector::DetectionEngine;
use super::state::VisionState;

/// Handle to the running vision loop
pub struct VisionWorker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl VisionWorker {
    /// Start the vision loop on a dedicated thread
    ///
    /// The frame source is built inside the thread (device handles are
    /// not `Send` on every backend) and owned by the loop until exit;
    /// a factory returning `None` ends the loop before it begins. The
    /// engine runs every captured frame.
    ///
    /// # Errors
    ///
    /// Returns error if the thread cannot be spawned
    pub fn start<F, D>(
        source_factory: F,
        mut engine: D,
        state: Arc<VisionState>,
        interval: Duration,
    ) -> crate::Result<Self>
    where
        F: FnOnce() -> Option<Box<dyn FrameSource>>,
        F: Send + 'static,
        D: DetectionEngine + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = std::thread::Builder::new()
            .name("vision".to_string())
            .spawn(move || {
                let Some(mut source) = source_factory() else {
                    tracing::error!("frame source unavailable - vision loop not running");
                    return;
                };
                tracing::info!("vision loop started");

                while !stop_flag.load(Ordering::Relaxed) {
                    if let Some(frame) = source.read() {
                        let detections = match engine.infer(&frame) {
                            Ok(detections) => detections,
                            Err(e) => {
                                tracing::warn!(error = %e, "detection failed, publishing empty set");
                                Vec::new()
                            }
                        };
                        state.publish(frame, detections);
                    }

                    std::thread::sleep(interval);
                }

                source.close();
                state.clear();
                tracing::info!("vision loop stopped");
            })?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Signal the loop to stop and wait for it to exit
    ///
    /// At most one in-flight iteration completes before the thread
    /// exits and releases the camera.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("vision thread panicked");
            }
        }
    }
}

impl Drop for VisionWorker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
