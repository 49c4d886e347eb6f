#![cfg(feature = "backend-tract")]

//! Tract-based ONNX engine.
//!
//! Loads a local YOLOv8-style detection model and performs inference on
//! RGB frames. The backend owns only the wrapping glue: tensor layout,
//! score decode, and suppression of duplicate boxes. It performs no
//! network I/O and is inference-only (training and export report
//! themselves unsupported).

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use image::imageops::FilterType;
use image::RgbImage;
use tract_onnx::prelude::*;

use crate::detect::engine::{Detection, DetectionEngine, EngineCapability};
use crate::detect::labels::Labels;
use crate::frame::Frame;

/// IoU above which two boxes of the same class count as duplicates.
const IOU_THRESHOLD: f32 = 0.45;

pub struct TractEngine {
    model: TypedRunnableModel<TypedModel>,
    labels: Labels,
    input_size: u32,
    confidence_floor: f32,
}

impl TractEngine {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn load<P: AsRef<Path>>(model_path: P, labels: Labels, input_size: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let side = input_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, side, side)),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            labels,
            input_size,
            confidence_floor: 0.25,
        })
    }

    /// Override the default confidence floor applied during decode.
    pub fn with_confidence_floor(mut self, floor: f32) -> Self {
        self.confidence_floor = floor;
        self
    }

    /// Resize the frame to the model input square and build the NCHW
    /// f32/255 tensor. Returns the tensor and the factors that map model
    /// coordinates back to source pixels.
    fn build_input(&self, frame: &Frame) -> Result<(Tensor, f32, f32)> {
        let image = RgbImage::from_raw(frame.width, frame.height, frame.pixels.clone())
            .ok_or_else(|| {
                anyhow!(
                    "frame buffer does not match {}x{} RGB",
                    frame.width,
                    frame.height
                )
            })?;
        let side = self.input_size;
        let resized = image::imageops::resize(&image, side, side, FilterType::Triangle);
        let scale_x = frame.width as f32 / side as f32;
        let scale_y = frame.height as f32 / side as f32;

        let side = side as usize;
        let input =
            tract_ndarray::Array4::from_shape_fn((1, 3, side, side), |(_, channel, y, x)| {
                resized.get_pixel(x as u32, y as u32)[channel] as f32 / 255.0
            });

        Ok((input.into_tensor(), scale_x, scale_y))
    }
}

impl DetectionEngine for TractEngine {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn supports(&self, capability: EngineCapability) -> bool {
        matches!(capability, EngineCapability::Detect)
    }

    fn infer(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        let (input, scale_x, scale_y) = self.build_input(frame)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;

        decode_output(&view, &self.labels, self.confidence_floor, scale_x, scale_y)
    }
}

/// Decode a YOLOv8 detection head.
///
/// Accepts both `[1, 4+nc, anchors]` and `[1, anchors, 4+nc]` layouts.
/// Per anchor: the best class score is the confidence, the first four
/// attributes are center-x/center-y/width/height in model coordinates.
fn decode_output(
    view: &tract_ndarray::ArrayViewD<'_, f32>,
    labels: &Labels,
    confidence_floor: f32,
    scale_x: f32,
    scale_y: f32,
) -> Result<Vec<Detection>> {
    let shape = view.shape();
    if shape.len() != 3 || shape[0] != 1 {
        bail!("unexpected detection head shape {:?}", shape);
    }
    // The attribute axis (4 box values + class scores) is the short one.
    let (attrs, anchors, attr_major) = if shape[1] <= shape[2] {
        (shape[1], shape[2], true)
    } else {
        (shape[2], shape[1], false)
    };
    if attrs < 5 {
        bail!("detection head reports {} attributes, need at least 5", attrs);
    }
    let classes = attrs - 4;

    let at = |attr: usize, anchor: usize| {
        if attr_major {
            view[[0, attr, anchor]]
        } else {
            view[[0, anchor, attr]]
        }
    };

    let mut candidates = Vec::new();
    for anchor in 0..anchors {
        let mut best_class = 0usize;
        let mut best_score = f32::NEG_INFINITY;
        for class in 0..classes {
            let score = at(4 + class, anchor);
            if score > best_score {
                best_score = score;
                best_class = class;
            }
        }
        if !best_score.is_finite() || best_score < confidence_floor {
            continue;
        }

        let cx = at(0, anchor);
        let cy = at(1, anchor);
        let w = at(2, anchor);
        let h = at(3, anchor);
        candidates.push(Detection {
            class_name: labels.name(best_class),
            confidence: best_score,
            bbox: [
                (cx - w / 2.0) * scale_x,
                (cy - h / 2.0) * scale_y,
                (cx + w / 2.0) * scale_x,
                (cy + h / 2.0) * scale_y,
            ],
        });
    }

    Ok(suppress_duplicates(candidates))
}

/// Greedy same-class suppression: keep the highest-confidence box of each
/// overlapping cluster.
fn suppress_duplicates(mut candidates: Vec<Detection>) -> Vec<Detection> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    let mut kept: Vec<Detection> = Vec::new();
    for candidate in candidates {
        let duplicate = kept.iter().any(|winner| {
            winner.class_name == candidate.class_name
                && iou(&winner.bbox, &candidate.bbox) > IOU_THRESHOLD
        });
        if !duplicate {
            kept.push(candidate);
        }
    }
    kept
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);
    let overlap = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);

    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
    let union = area_a + area_b - overlap;
    if union <= 0.0 {
        0.0
    } else {
        overlap / union
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(class_name: &str, confidence: f32, bbox: [f32; 4]) -> Detection {
        Detection {
            class_name: class_name.to_string(),
            confidence,
            bbox,
        }
    }

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let bbox = [0.0, 0.0, 10.0, 10.0];
        assert!((iou(&bbox, &bbox) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        assert_eq!(iou(&[0.0, 0.0, 10.0, 10.0], &[20.0, 20.0, 30.0, 30.0]), 0.0);
    }

    #[test]
    fn suppression_keeps_best_of_overlapping_cluster() {
        let kept = suppress_duplicates(vec![
            detection("trash", 0.6, [0.0, 0.0, 10.0, 10.0]),
            detection("trash", 0.9, [1.0, 1.0, 11.0, 11.0]),
            detection("trash", 0.8, [50.0, 50.0, 60.0, 60.0]),
        ]);

        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].confidence, 0.9);
        assert_eq!(kept[1].confidence, 0.8);
    }

    #[test]
    fn suppression_is_per_class() {
        let kept = suppress_duplicates(vec![
            detection("bottle", 0.9, [0.0, 0.0, 10.0, 10.0]),
            detection("can", 0.8, [0.0, 0.0, 10.0, 10.0]),
        ]);
        assert_eq!(kept.len(), 2);
    }

    /// Attribute-major head `[1, 4+nc, anchors]`: six attributes (two
    /// classes) over seven anchors, only anchor 0 scores above the floor.
    #[test]
    fn decode_handles_attribute_major_layout() -> Result<()> {
        let anchors = 7;
        let mut data = vec![0.0f32; 6 * anchors];
        data[anchors] = 8.0; // cy, anchor 0
        data[0] = 8.0; // cx, anchor 0
        data[2 * anchors] = 4.0; // w, anchor 0
        data[3 * anchors] = 4.0; // h, anchor 0
        data[4 * anchors] = 0.1; // class 0 score, anchor 0
        data[5 * anchors] = 0.7; // class 1 score, anchor 0
        let array = tract_ndarray::Array3::from_shape_vec((1, 6, anchors), data)?.into_dyn();
        let labels = Labels::new(vec!["bottle".to_string(), "can".to_string()]);

        let detections = decode_output(&array.view(), &labels, 0.25, 2.0, 2.0)?;

        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].class_name, "can");
        assert_eq!(detections[0].confidence, 0.7);
        assert_eq!(detections[0].bbox, [12.0, 12.0, 20.0, 20.0]);
        Ok(())
    }

    /// Anchor-major head `[1, anchors, 4+nc]` decodes to the same result.
    #[test]
    fn decode_handles_anchor_major_layout() -> Result<()> {
        let anchors = 7;
        let mut data = vec![0.0f32; anchors * 6];
        data[0] = 8.0; // cx, anchor 0
        data[1] = 8.0; // cy, anchor 0
        data[2] = 4.0; // w, anchor 0
        data[3] = 4.0; // h, anchor 0
        data[4] = 0.1; // class 0 score, anchor 0
        data[5] = 0.7; // class 1 score, anchor 0
        let array = tract_ndarray::Array3::from_shape_vec((1, anchors, 6), data)?.into_dyn();
        let labels = Labels::new(vec!["bottle".to_string(), "can".to_string()]);

        let detections = decode_output(&array.view(), &labels, 0.25, 2.0, 2.0)?;

        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].class_name, "can");
        assert_eq!(detections[0].bbox, [12.0, 12.0, 20.0, 20.0]);
        Ok(())
    }

    #[test]
    fn decode_respects_confidence_floor() -> Result<()> {
        let anchors = 6;
        let mut data = vec![0.0f32; 5 * anchors];
        for anchor in 0..anchors {
            data[4 * anchors + anchor] = 0.1; // single class, all below floor
        }
        let array = tract_ndarray::Array3::from_shape_vec((1, 5, anchors), data)?.into_dyn();

        let detections = decode_output(&array.view(), &Labels::single_class(), 0.25, 1.0, 1.0)?;
        assert!(detections.is_empty());
        Ok(())
    }

    #[test]
    fn decode_rejects_unexpected_shapes() {
        let array = tract_ndarray::Array2::<f32>::zeros((6, 1)).into_dyn();
        assert!(decode_output(&array.view(), &Labels::single_class(), 0.25, 1.0, 1.0).is_err());
    }
}
