//! Stub engine for tests and pipeline smoke runs.

use std::collections::VecDeque;
use std::path::PathBuf;

use anyhow::Result;

use crate::detect::engine::{
    Detection, DetectionEngine, EngineCapability, ExportRequest, TrainRequest, TrainSummary,
};
use crate::detect::weights::DEFAULT_WEIGHTS;
use crate::frame::Frame;

/// Scripted engine: answers each `infer` call with the next queued
/// detection list (empty once the script runs out) and counts calls, so
/// tests can assert the scanner's early exit. Train and export succeed and
/// record their requests.
pub struct StubEngine {
    scripted: VecDeque<Vec<Detection>>,
    infer_calls: usize,
    train_requests: Vec<TrainRequest>,
    export_requests: Vec<ExportRequest>,
}

impl StubEngine {
    /// Engine that never detects anything.
    pub fn empty() -> Self {
        Self::scripted(Vec::new())
    }

    /// Engine that replays one detection list per `infer` call.
    pub fn scripted(frames: Vec<Vec<Detection>>) -> Self {
        Self {
            scripted: frames.into(),
            infer_calls: 0,
            train_requests: Vec::new(),
            export_requests: Vec::new(),
        }
    }

    pub fn infer_calls(&self) -> usize {
        self.infer_calls
    }

    pub fn train_requests(&self) -> &[TrainRequest] {
        &self.train_requests
    }

    pub fn export_requests(&self) -> &[ExportRequest] {
        &self.export_requests
    }
}

impl DetectionEngine for StubEngine {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn supports(&self, _capability: EngineCapability) -> bool {
        true
    }

    fn infer(&mut self, _frame: &Frame) -> Result<Vec<Detection>> {
        self.infer_calls += 1;
        Ok(self.scripted.pop_front().unwrap_or_default())
    }

    fn train(&mut self, request: &TrainRequest) -> Result<TrainSummary> {
        self.train_requests.push(request.clone());
        Ok(TrainSummary {
            best_weights: PathBuf::from(DEFAULT_WEIGHTS),
        })
    }

    fn export(&mut self, request: &ExportRequest) -> Result<PathBuf> {
        self.export_requests.push(request.clone());
        Ok(request.weights.with_extension(&request.format))
    }
}
