//! Model weight path resolution.
//!
//! A missing custom weights file is recoverable: inference falls back to
//! the known-good pretrained weights and keeps going. Only the engine
//! interprets the bytes; this module never opens the file.

use std::path::{Path, PathBuf};

/// Where a training run leaves its best weights.
pub const DEFAULT_WEIGHTS: &str = "runs/detect/trash/weights/best.onnx";

/// Pretrained fallback used when the custom weights are absent.
pub const PRETRAINED_FALLBACK: &str = "yolov8n.onnx";

/// Resolve the weights path, falling back to the pretrained model when the
/// custom file does not exist.
pub fn resolve_weights(path: &Path) -> PathBuf {
    if path.is_file() {
        return path.to_path_buf();
    }
    log::info!(
        "custom model '{}' not found, falling back to pretrained weights '{}'",
        path.display(),
        PRETRAINED_FALLBACK
    );
    PathBuf::from(PRETRAINED_FALLBACK)
}
