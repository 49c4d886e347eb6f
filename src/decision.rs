//! Detection-to-decision reduction.
//!
//! This module folds one frame's raw detections into the answers the CLI
//! reports:
//!
//! - [`evaluate`]: a single boolean, "does this frame contain trash?"
//! - [`evaluate_detailed`]: the JSON report emitted for still images.
//!
//! Both share the same qualifying predicate: a detection counts iff its
//! confidence clears the threshold AND its class is in the filter (an empty
//! filter means every class counts). The detailed report additionally keeps
//! every detection over the confidence threshold regardless of class, and
//! its `confidence` field is the maximum over *all* of those, not only the
//! class-filtered ones.

use serde::{Deserialize, Serialize};

use crate::detect::Detection;

/// Class names counted as "trash".
///
/// An empty filter is the single-class sentinel: every detected class
/// qualifies. The filter is an immutable value built once at startup and
/// passed into the reducer and scanner explicitly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassFilter {
    names: Vec<String>,
}

impl ClassFilter {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// The single-class sentinel: every detected class counts as trash.
    pub fn everything() -> Self {
        Self { names: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// True when the class qualifies as trash under this filter.
    pub fn matches(&self, class_name: &str) -> bool {
        self.names.is_empty() || self.names.iter().any(|name| name == class_name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// A detection with a malformed confidence (NaN, infinite, outside [0, 1])
/// never qualifies; it is treated as "no detection", not as an error.
fn passes_threshold(detection: &Detection, threshold: f32) -> bool {
    detection.confidence.is_finite()
        && (0.0..=1.0).contains(&detection.confidence)
        && detection.confidence >= threshold
}

/// Existential boolean reduction over one frame's detections.
///
/// Returns true iff any detection clears the threshold and matches the
/// filter. Pure; iteration order cannot affect the result.
pub fn evaluate(detections: &[Detection], filter: &ClassFilter, threshold: f32) -> bool {
    detections
        .iter()
        .any(|detection| passes_threshold(detection, threshold) && filter.matches(&detection.class_name))
}

/// Detailed reduction for the still-image JSON report.
///
/// Keeps every threshold-passing detection (class-filtered or not),
/// computes `trash_detected` with the filter predicate, and reports the
/// maximum confidence among all kept detections (`0.0` when none pass).
/// The confidence is deliberately not scoped to trash-qualifying boxes.
pub fn evaluate_detailed(
    detections: &[Detection],
    filter: &ClassFilter,
    threshold: f32,
) -> DetectionReport {
    let mut trash_detected = false;
    let mut reported = Vec::new();

    for detection in detections {
        if !passes_threshold(detection, threshold) {
            continue;
        }
        if filter.matches(&detection.class_name) {
            trash_detected = true;
        }
        reported.push(ReportedDetection {
            class_name: detection.class_name.clone(),
            confidence: detection.confidence,
            bbox: detection.bbox,
        });
    }

    let confidence = reported
        .iter()
        .map(|detection| detection.confidence)
        .fold(0.0f32, f32::max);

    DetectionReport {
        trash_detected,
        confidence,
        detections: reported,
    }
}

/// Wire-format report for a single still image.
///
/// Serializes to `{"trashDetected": ..., "confidence": ..., "detections":
/// [...]}`; the shape is consumed downstream and must not drift.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionReport {
    pub trash_detected: bool,
    pub confidence: f32,
    pub detections: Vec<ReportedDetection>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportedDetection {
    #[serde(rename = "class")]
    pub class_name: String,
    pub confidence: f32,
    /// Pixel-space corners `[x1, y1, x2, y2]`.
    pub bbox: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(class_name: &str, confidence: f32) -> Detection {
        Detection {
            class_name: class_name.to_string(),
            confidence,
            bbox: [0.0, 0.0, 10.0, 10.0],
        }
    }

    #[test]
    fn empty_filter_counts_every_class() {
        let filter = ClassFilter::everything();
        assert!(evaluate(&[detection("anything", 0.9)], &filter, 0.5));
        assert!(!evaluate(&[detection("anything", 0.4)], &filter, 0.5));
    }

    #[test]
    fn threshold_is_inclusive() {
        let filter = ClassFilter::everything();
        assert!(evaluate(&[detection("trash", 0.5)], &filter, 0.5));
    }

    #[test]
    fn class_outside_filter_never_counts() {
        let filter = ClassFilter::new(vec!["bottle".to_string(), "can".to_string()]);
        assert!(!evaluate(&[detection("person", 0.99)], &filter, 0.4));
        assert!(evaluate(&[detection("can", 0.41)], &filter, 0.4));
    }

    #[test]
    fn empty_detections_are_negative() {
        assert!(!evaluate(&[], &ClassFilter::everything(), 0.0));
    }

    #[test]
    fn malformed_confidence_is_non_matching() {
        let filter = ClassFilter::everything();
        assert!(!evaluate(&[detection("trash", f32::NAN)], &filter, 0.1));
        assert!(!evaluate(&[detection("trash", 1.5)], &filter, 0.1));
        assert!(!evaluate(&[detection("trash", -0.2)], &filter, 0.1));
    }

    #[test]
    fn detailed_keeps_non_trash_classes_over_threshold() {
        let filter = ClassFilter::new(vec!["bottle".to_string()]);
        let detections = [detection("person", 0.9), detection("bottle", 0.6)];
        let report = evaluate_detailed(&detections, &filter, 0.4);

        assert!(report.trash_detected);
        assert_eq!(report.detections.len(), 2);
        // Max confidence spans every kept detection, not only trash classes.
        assert_eq!(report.confidence, 0.9);
    }

    #[test]
    fn detailed_confidence_ignores_filter_membership() {
        let filter = ClassFilter::new(vec!["bottle".to_string()]);
        let detections = [detection("person", 0.9)];
        let report = evaluate_detailed(&detections, &filter, 0.4);

        assert!(!report.trash_detected);
        assert_eq!(report.confidence, 0.9);
        assert_eq!(report.detections.len(), 1);
    }

    #[test]
    fn detailed_empty_input_reports_zero_confidence() {
        let report = evaluate_detailed(&[], &ClassFilter::everything(), 0.4);
        assert!(!report.trash_detected);
        assert_eq!(report.confidence, 0.0);
        assert!(report.detections.is_empty());
    }

    #[test]
    fn detailed_drops_detections_below_threshold() {
        let filter = ClassFilter::everything();
        let detections = [detection("trash", 0.3), detection("trash", 0.7)];
        let report = evaluate_detailed(&detections, &filter, 0.4);

        assert!(report.trash_detected);
        assert_eq!(report.detections.len(), 1);
        assert_eq!(report.confidence, 0.7);
    }

    #[test]
    fn worked_example_bottle_filter() {
        let filter = ClassFilter::new(vec!["bottle".to_string(), "can".to_string()]);
        let detections = [detection("bottle", 0.62)];

        assert!(evaluate(&detections, &filter, 0.4));

        let report = evaluate_detailed(&detections, &filter, 0.4);
        assert!(report.trash_detected);
        assert_eq!(report.confidence, 0.62);
        assert_eq!(report.detections[0].class_name, "bottle");
        assert_eq!(report.detections[0].bbox, [0.0, 0.0, 10.0, 10.0]);
    }
}
