//! Detection engine boundary and backends.

mod backends;
mod engine;
mod labels;
mod weights;

use std::path::Path;

use anyhow::{bail, Result};

pub use backends::StubEngine;
#[cfg(feature = "backend-tract")]
pub use backends::TractEngine;
pub use engine::{
    Detection, DetectionEngine, EngineCapability, ExportRequest, TrainRequest, TrainSummary,
};
pub use labels::Labels;
pub use weights::{resolve_weights, DEFAULT_WEIGHTS, PRETRAINED_FALLBACK};

/// Which engine backend to construct.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineKind {
    /// The best real backend compiled into this build.
    Auto,
    /// The tract ONNX backend (feature `backend-tract`).
    Tract,
    /// The scripted stub engine (never detects anything from the CLI).
    Stub,
}

impl EngineKind {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "auto" => Ok(Self::Auto),
            "tract" => Ok(Self::Tract),
            "stub" => Ok(Self::Stub),
            other => bail!("unknown engine '{}', expected auto, tract or stub", other),
        }
    }
}

/// Construct an engine.
///
/// Asking for an ONNX engine in a build compiled without one is fatal:
/// the process cannot do anything useful, so the error carries rebuild
/// guidance for the operator.
pub fn create_engine(
    kind: EngineKind,
    weights: &Path,
    labels: Labels,
    input_size: u32,
    confidence: f32,
) -> Result<Box<dyn DetectionEngine>> {
    match kind {
        EngineKind::Stub => Ok(Box::new(StubEngine::empty())),
        EngineKind::Auto | EngineKind::Tract => tract_engine(weights, labels, input_size, confidence),
    }
}

#[cfg(feature = "backend-tract")]
fn tract_engine(
    weights: &Path,
    labels: Labels,
    input_size: u32,
    confidence: f32,
) -> Result<Box<dyn DetectionEngine>> {
    let engine = TractEngine::load(weights, labels, input_size)?.with_confidence_floor(confidence);
    log::info!("loaded ONNX engine from {}", weights.display());
    Ok(Box::new(engine))
}

#[cfg(not(feature = "backend-tract"))]
fn tract_engine(
    weights: &Path,
    _labels: Labels,
    _input_size: u32,
    _confidence: f32,
) -> Result<Box<dyn DetectionEngine>> {
    bail!(
        "no ONNX engine in this build (wanted for {}): rebuild with `cargo build --release --features backend-tract`",
        weights.display()
    )
}
