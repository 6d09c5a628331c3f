//! Vision processing: camera capture, object detection, shared snapshots

mod camera;
mod detector;
mod state;
mod types;
mod worker;

pub use camera::{Camera, FrameSource};
pub use detector::{DetectionEngine, Detector};
pub use state::VisionState;
pub use types::{BoundingBox, Detection, Frame};
pub use worker::VisionWorker;
