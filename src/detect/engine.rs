//! Detection engine boundary.
//!
//! The model runtime is an injected capability: "given a frame, produce a
//! set of scored, labeled bounding boxes". Everything behind that line
//! (architecture, tensors, weight formats) belongs to the engine; the rest
//! of the crate only consumes `Detection` values.
//!
//! Engines advertise what they can do through [`EngineCapability`]. The
//! bundled ONNX backend is inference-only; training and export surface as
//! clear "unsupported" errors rather than half-implementations.

use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::frame::Frame;

/// Operations an engine may support.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineCapability {
    Detect,
    Train,
    Export,
}

/// One scored, labeled bounding box for a single frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub class_name: String,
    /// Score in [0, 1]. Out-of-range values are treated downstream as
    /// malformed and never qualify.
    pub confidence: f32,
    /// Pixel-space corners `[x1, y1, x2, y2]`.
    pub bbox: [f32; 4],
}

/// Parameters for a delegated training run.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainRequest {
    /// Dataset description file (the `data.yaml` of the training corpus).
    pub data: PathBuf,
    /// Base weights to start from.
    pub base_model: PathBuf,
    pub epochs: u32,
    pub image_size: u32,
    pub batch_size: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrainSummary {
    /// Where the engine wrote its best weights.
    pub best_weights: PathBuf,
}

/// Parameters for a delegated weight export.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportRequest {
    pub weights: PathBuf,
    /// Target format string, e.g. "onnx".
    pub format: String,
}

/// Injected detection engine.
pub trait DetectionEngine {
    /// Engine identifier, used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Returns true when the engine supports a capability.
    fn supports(&self, capability: EngineCapability) -> bool;

    /// Run detection on one frame.
    ///
    /// An empty vector is a valid answer ("nothing found"); errors are
    /// reserved for engine failures and propagate unrecovered.
    fn infer(&mut self, frame: &Frame) -> Result<Vec<Detection>>;

    /// Delegate a training run to the engine.
    fn train(&mut self, request: &TrainRequest) -> Result<TrainSummary> {
        let _ = request;
        bail!("engine '{}' does not support training", self.name())
    }

    /// Delegate a weight export to the engine. Returns the output path.
    fn export(&mut self, request: &ExportRequest) -> Result<PathBuf> {
        let _ = request;
        bail!("engine '{}' does not support model export", self.name())
    }
}
