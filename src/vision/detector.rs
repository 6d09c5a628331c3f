//! Object detection
//!
//! Wraps a pre-trained YOLO-family ONNX model. The model file and the
//! class-names file must both exist at load time; inference letterboxes
//! the frame to the model's square input, filters by confidence, and
//! removes overlapping boxes with non-maximum suppression.

use ndarray::{Array4, Axis};
use ort::{GraphOptimizationLevel, Session};

use super::types::{BoundingBox, Detection, Frame};
use crate::config::DetectorConfig;
use crate::{Error, Result};

/// Pad color for letterboxed borders (neutral gray, as trained)
const PAD_VALUE: f32 = 114.0 / 255.0;

/// Runs object detection over single frames
///
/// The production implementation is [`Detector`]; tests drive the vision
/// loop with scripted engines.
pub trait DetectionEngine {
    /// Detect objects in one frame
    ///
    /// # Errors
    ///
    /// Returns error if inference fails for this frame
    fn infer(&mut self, frame: &Frame) -> Result<Vec<Detection>>;
}

/// ONNX-backed object detector
pub struct Detector {
    session: Session,
    classes: Vec<String>,
    confidence_threshold: f32,
    overlap_threshold: f32,
    input_size: u32,
}

impl Detector {
    /// Load the model and class names
    ///
    /// # Errors
    ///
    /// Returns error if the model or class-names file is missing, or the
    /// ONNX session cannot be created
    pub fn load(config: &DetectorConfig) -> Result<Self> {
        if !config.model_path.exists() {
            return Err(Error::Detector(format!(
                "model weights not found: {}",
                config.model_path.display()
            )));
        }
        if !config.classes_path.exists() {
            return Err(Error::Detector(format!(
                "class names not found: {}",
                config.classes_path.display()
            )));
        }

        let classes: Vec<String> = std::fs::read_to_string(&config.classes_path)?
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();

        let session = Session::builder()
            .map_err(|e| Error::Detector(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| Error::Detector(e.to_string()))?
            .with_intra_threads(2)
            .map_err(|e| Error::Detector(e.to_string()))?
            .commit_from_file(&config.model_path)
            .map_err(|e| Error::Detector(e.to_string()))?;

        if session.inputs.is_empty() || session.outputs.is_empty() {
            return Err(Error::Detector(
                "model declares no inputs or outputs".to_string(),
            ));
        }

        tracing::info!(
            model = %config.model_path.display(),
            classes = classes.len(),
            input_size = config.input_size,
            "object detector initialized"
        );

        Ok(Self {
            session,
            classes,
            confidence_threshold: config.confidence_threshold,
            overlap_threshold: config.overlap_threshold,
            input_size: config.input_size,
        })
    }

    /// Number of class labels loaded
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Letterbox the frame into a normalized NCHW tensor
    fn preprocess(&self, frame: &Frame) -> (Array4<f32>, LetterboxParams) {
        let size = self.input_size as usize;
        let params = letterbox_params(frame.width, frame.height, self.input_size);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (scaled_w, scaled_h) = (
            (f64::from(frame.width) * params.scale).round() as u32,
            (f64::from(frame.height) * params.scale).round() as u32,
        );

        let img = image::RgbImage::from_raw(frame.width, frame.height, frame.data.clone())
            .unwrap_or_else(|| image::RgbImage::new(frame.width, frame.height));
        let resized = image::imageops::resize(
            &img,
            scaled_w.max(1),
            scaled_h.max(1),
            image::imageops::FilterType::Triangle,
        );

        let mut input = Array4::<f32>::from_elem((1, 3, size, size), PAD_VALUE);
        for (x, y, pixel) in resized.enumerate_pixels() {
            let (tx, ty) = ((x + params.pad_x) as usize, (y + params.pad_y) as usize);
            if tx < size && ty < size {
                for c in 0..3 {
                    input[[0, c, ty, tx]] = f32::from(pixel.0[c]) / 255.0;
                }
            }
        }

        (input, params)
    }

    /// Decode raw model output into confidence-filtered candidates
    fn decode(
        &self,
        output: &ndarray::ArrayViewD<'_, f32>,
        params: LetterboxParams,
        frame: &Frame,
    ) -> Vec<Candidate> {
        if output.ndim() != 3 {
            tracing::warn!(shape = ?output.shape(), "unexpected model output shape");
            return Vec::new();
        }

        let view = output.index_axis(Axis(0), 0);
        let rows = view.shape()[0];
        let anchors = view.shape()[1];
        if rows < 5 {
            return Vec::new();
        }

        let mut candidates = Vec::new();
        for i in 0..anchors {
            let mut class_id = 0usize;
            let mut score = 0.0f32;
            for j in 4..rows {
                let s = view[[j, i]];
                if s > score {
                    score = s;
                    class_id = j - 4;
                }
            }

            if score < self.confidence_threshold {
                continue;
            }

            // Model coordinates are centers in letterbox space
            let cx = f64::from(view[[0, i]]);
            let cy = f64::from(view[[1, i]]);
            let w = f64::from(view[[2, i]]);
            let h = f64::from(view[[3, i]]);

            #[allow(clippy::cast_possible_truncation)]
            let bounds = BoundingBox {
                x: ((cx - w / 2.0 - f64::from(params.pad_x)) / params.scale).round() as i32,
                y: ((cy - h / 2.0 - f64::from(params.pad_y)) / params.scale).round() as i32,
                width: (w / params.scale).round() as i32,
                height: (h / params.scale).round() as i32,
            };

            candidates.push(Candidate {
                bounds: clamp_to_frame(bounds, frame.width, frame.height),
                confidence: score,
                class_id,
            });
        }

        candidates
    }
}

impl DetectionEngine for Detector {
    fn infer(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        let (input, params) = self.preprocess(frame);

        let input_name = self.session.inputs[0].name.clone();
        let output_name = self.session.outputs[0].name.clone();

        let outputs = self
            .session
            .run(
                ort::inputs![input_name.as_str() => input.view()]
                    .map_err(|e| Error::Detector(e.to_string()))?,
            )
            .map_err(|e| Error::Detector(e.to_string()))?;
        let output = outputs[output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::Detector(e.to_string()))?;

        let candidates = self.decode(&output, params, frame);
        let kept = non_max_suppression(candidates, self.overlap_threshold);

        Ok(kept
            .into_iter()
            .map(|c| Detection {
                label: self
                    .classes
                    .get(c.class_id)
                    .cloned()
                    .unwrap_or_else(|| format!("class_{}", c.class_id)),
                confidence: c.confidence,
                bounds: c.bounds,
            })
            .collect())
    }
}

/// A confidence-filtered box before suppression
#[derive(Debug, Clone, Copy)]
struct Candidate {
    bounds: BoundingBox,
    confidence: f32,
    class_id: usize,
}

/// Scale and padding used to letterbox a frame
#[derive(Debug, Clone, Copy)]
struct LetterboxParams {
    scale: f64,
    pad_x: u32,
    pad_y: u32,
}

/// Compute the letterbox scale and border offsets for a frame
fn letterbox_params(width: u32, height: u32, input_size: u32) -> LetterboxParams {
    let size = f64::from(input_size);
    let scale = (size / f64::from(width.max(1))).min(size / f64::from(height.max(1)));

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (scaled_w, scaled_h) = (
        (f64::from(width) * scale).round() as u32,
        (f64::from(height) * scale).round() as u32,
    );

    LetterboxParams {
        scale,
        pad_x: (input_size.saturating_sub(scaled_w)) / 2,
        pad_y: (input_size.saturating_sub(scaled_h)) / 2,
    }
}

/// Clamp a box to frame bounds
fn clamp_to_frame(bounds: BoundingBox, width: u32, height: u32) -> BoundingBox {
    #[allow(clippy::cast_possible_wrap)]
    let (fw, fh) = (width as i32, height as i32);
    let x = bounds.x.clamp(0, fw);
    let y = bounds.y.clamp(0, fh);
    BoundingBox {
        x,
        y,
        width: bounds.width.min(fw - x).max(0),
        height: bounds.height.min(fh - y).max(0),
    }
}

/// Intersection-over-union of two boxes
fn iou(a: BoundingBox, b: BoundingBox) -> f32 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = (a.x + a.width).min(b.x + b.width);
    let y2 = (a.y + a.height).min(b.y + b.height);

    let intersection = f64::from((x2 - x1).max(0)) * f64::from((y2 - y1).max(0));
    let union = f64::from(a.width) * f64::from(a.height) + f64::from(b.width) * f64::from(b.height)
        - intersection;

    if union <= 0.0 {
        return 0.0;
    }

    #[allow(clippy::cast_possible_truncation)]
    {
        (intersection / union) as f32
    }
}

/// Greedy class-agnostic non-maximum suppression
fn non_max_suppression(mut candidates: Vec<Candidate>, overlap_threshold: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        if kept
            .iter()
            .all(|k| iou(k.bounds, candidate.bounds) <= overlap_threshold)
        {
            kept.push(candidate);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(x: i32, y: i32, w: i32, h: i32) -> BoundingBox {
        BoundingBox {
            x,
            y,
            width: w,
            height: h,
        }
    }

    #[test]
    fn test_iou_disjoint_and_identical() {
        assert!(iou(bbox(0, 0, 10, 10), bbox(20, 20, 10, 10)) < f32::EPSILON);
        assert!((iou(bbox(0, 0, 10, 10), bbox(0, 0, 10, 10)) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_partial_overlap() {
        // 5x10 overlap out of 150 union
        let value = iou(bbox(0, 0, 10, 10), bbox(5, 0, 10, 10));
        assert!((value - 50.0 / 150.0).abs() < 1e-6);
    }

    #[test]
    fn test_nms_suppresses_overlapping_lower_confidence() {
        let candidates = vec![
            Candidate {
                bounds: bbox(0, 0, 10, 10),
                confidence: 0.9,
                class_id: 0,
            },
            Candidate {
                bounds: bbox(1, 1, 10, 10),
                confidence: 0.8,
                class_id: 0,
            },
            Candidate {
                bounds: bbox(50, 50, 10, 10),
                confidence: 0.7,
                class_id: 1,
            },
        ];

        let kept = non_max_suppression(candidates, 0.4);
        assert_eq!(kept.len(), 2);
        assert!((kept[0].confidence - 0.9).abs() < f32::EPSILON);
        assert_eq!(kept[1].class_id, 1);
    }

    #[test]
    fn test_letterbox_params_wide_frame() {
        let params = letterbox_params(640, 480, 416);
        assert!((params.scale - 416.0 / 640.0).abs() < 1e-9);
        assert_eq!(params.pad_x, 0);
        // 480 * 0.65 = 312, (416 - 312) / 2 = 52
        assert_eq!(params.pad_y, 52);
    }

    #[test]
    fn test_clamp_to_frame() {
        let clamped = clamp_to_frame(bbox(-5, -5, 20, 20), 10, 10);
        assert_eq!(clamped.x, 0);
        assert_eq!(clamped.y, 0);
        assert_eq!(clamped.width, 10);
        assert_eq!(clamped.height, 10);
    }

    #[test]
    fn test_load_fails_on_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = DetectorConfig {
            model_path: dir.path().join("missing.onnx"),
            classes_path: dir.path().join("missing.names"),
            ..DetectorConfig::default()
        };

        let err = Detector::load(&config).unwrap_err();
        assert!(matches!(err, Error::Detector(_)));
    }
}
