//! Shared test helpers

use vigil_hud::vision::{BoundingBox, Detection};

/// Build a detection with a fixed box
#[allow(dead_code)]
pub fn detection(label: &str, confidence: f32) -> Detection {
    Detection {
        label: label.to_string(),
        confidence,
        bounds: BoundingBox {
            x: 10,
            y: 10,
            width: 50,
            height: 50,
        },
    }
}
