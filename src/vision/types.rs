//! Vision value types

/// One captured camera image, packed RGB8
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,

    /// Packed RGB8 pixel data, `width * height * 3` bytes
    pub data: Vec<u8>,
}

impl Frame {
    /// Number of color channels (packed RGB)
    pub const CHANNELS: u32 = 3;

    /// Create a frame from raw RGB8 data
    ///
    /// # Errors
    ///
    /// Returns `None` if `data` doesn't match `width * height * 3`
    #[must_use]
    pub fn from_rgb8(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() as u64 != u64::from(width) * u64::from(height) * u64::from(Self::CHANNELS) {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }
}

/// Axis-aligned bounding box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// One labeled detection from the object-detection model
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Detection {
    /// Class label (e.g. "person")
    pub label: String,

    /// Confidence in `[0, 1]`
    pub confidence: f32,

    /// Location in frame pixel coordinates
    pub bounds: BoundingBox,
}
