//! Trash detection over an injected object-detection engine.
//!
//! The engine (model loading, tensors, weight formats) is an external
//! capability behind the [`detect::DetectionEngine`] trait; this crate
//! contributes the decision layer on top of it:
//!
//! - `decision`: reduce one frame's detections to a boolean or to the
//!   detailed JSON report, under a confidence threshold and a class filter
//! - `scan`: early-exit boolean scanning of frame streams with
//!   cooperative cancellation
//! - `ingest`: frame sources (still images, video files, V4L2 cameras,
//!   synthetic `stub://` streams)
//! - `detect`: the engine boundary, weight fallback, labels, and the
//!   bundled backends (tract ONNX, scripted stub)
//! - `config`: the class-filter list and defaults, from file and
//!   environment
//!
//! Execution is single-threaded and blocking throughout: each frame is
//! fetched and fully processed before the next is requested.

pub mod annotate;
pub mod config;
pub mod decision;
pub mod detect;
pub mod frame;
pub mod ingest;
pub mod scan;

use std::path::Path;

use anyhow::{anyhow, Result};

pub use config::TrashwatchConfig;
pub use decision::{evaluate, evaluate_detailed, ClassFilter, DetectionReport, ReportedDetection};
pub use detect::{
    create_engine, resolve_weights, Detection, DetectionEngine, EngineCapability, EngineKind,
    Labels, StubEngine,
};
pub use frame::Frame;
pub use ingest::{FrameSource, StillImageSource, VideoFileSource};
pub use scan::{scan, CancelToken};

/// Convenience single-image boolean check with the default engine and the
/// single-class filter.
pub fn is_trash(image_path: &Path, weights: &Path, confidence: f32) -> Result<bool> {
    let resolved = resolve_weights(weights);
    let mut engine = create_engine(
        EngineKind::Auto,
        &resolved,
        Labels::single_class(),
        config::DEFAULT_INPUT_SIZE,
        confidence,
    )?;

    let mut source = StillImageSource::new(image_path);
    source.connect()?;
    let frame = source
        .next_frame()?
        .ok_or_else(|| anyhow!("no frame decoded from {}", image_path.display()))?;

    let detections = engine.infer(&frame)?;
    Ok(evaluate(&detections, &ClassFilter::everything(), confidence))
}
