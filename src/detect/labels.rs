//! Class-id to class-name mapping.
//!
//! ONNX detection heads report numeric class ids; the names live in a
//! sidecar labels file (one name per line, `#` comments allowed). Without
//! a labels file the model is assumed to be the single-class trash
//! detector.

use std::path::Path;

use anyhow::{Context, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Labels {
    names: Vec<String>,
}

impl Labels {
    /// Single-class table for models trained on one "trash" class.
    pub fn single_class() -> Self {
        Self {
            names: vec!["trash".to_string()],
        }
    }

    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Load a labels file: one class name per line, blank lines and `#`
    /// comments skipped.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read labels file {}", path.display()))?;
        let names = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();
        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name for a class id; ids outside the table render as the decimal id.
    pub fn name(&self, class_id: usize) -> String {
        self.names
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| class_id.to_string())
    }
}
