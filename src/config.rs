//! Runtime configuration.
//!
//! The only domain configuration is the trash class-filter list (empty =
//! single-class mode) plus default paths and the confidence threshold.
//! Values come from an optional JSON config file named by
//! `TRASHWATCH_CONFIG`, overridden by environment variables, overridden
//! again by CLI flags. The loaded value is immutable; the reducer and
//! scanner receive it explicitly.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::OnceLock;

use crate::detect::DEFAULT_WEIGHTS;

pub const DEFAULT_CONFIDENCE: f32 = 0.4;
pub const DEFAULT_INPUT_SIZE: u32 = 640;

#[derive(Debug, Deserialize, Default)]
struct TrashwatchConfigFile {
    weights: Option<String>,
    labels: Option<String>,
    confidence: Option<f32>,
    input_size: Option<u32>,
    trash_classes: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct TrashwatchConfig {
    /// Custom weights path; resolution falls back to the pretrained model.
    pub weights: String,
    /// Optional labels file (one class name per line).
    pub labels: Option<String>,
    /// Confidence threshold in [0, 1].
    pub confidence: f32,
    /// Square model input size.
    pub input_size: u32,
    /// Class names counted as trash; empty = every class (single-class mode).
    pub trash_classes: Vec<String>,
}

impl TrashwatchConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("TRASHWATCH_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: TrashwatchConfigFile) -> Self {
        Self {
            weights: file.weights.unwrap_or_else(|| DEFAULT_WEIGHTS.to_string()),
            labels: file.labels,
            confidence: file.confidence.unwrap_or(DEFAULT_CONFIDENCE),
            input_size: file.input_size.unwrap_or(DEFAULT_INPUT_SIZE),
            trash_classes: file.trash_classes.unwrap_or_default(),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(weights) = std::env::var("TRASHWATCH_WEIGHTS") {
            if !weights.trim().is_empty() {
                self.weights = weights;
            }
        }
        if let Ok(labels) = std::env::var("TRASHWATCH_LABELS") {
            if !labels.trim().is_empty() {
                self.labels = Some(labels);
            }
        }
        if let Ok(confidence) = std::env::var("TRASHWATCH_CONFIDENCE") {
            let parsed: f32 = confidence
                .trim()
                .parse()
                .map_err(|_| anyhow!("TRASHWATCH_CONFIDENCE must be a number in [0, 1]"))?;
            self.confidence = parsed;
        }
        if let Ok(classes) = std::env::var("TRASHWATCH_TRASH_CLASSES") {
            let parsed = split_csv(&classes);
            if !parsed.is_empty() {
                self.trash_classes = parsed;
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(anyhow!(
                "confidence threshold must be in [0, 1], got {}",
                self.confidence
            ));
        }
        if self.input_size == 0 {
            return Err(anyhow!("input size must be greater than zero"));
        }
        for class in &self.trash_classes {
            validate_class_name(class)?;
        }
        Ok(())
    }
}

/// A conforming class name is a short token like "bottle" or
/// "plastic_bag". A positive allowlist keeps stray shell quoting and
/// separators out of the filter.
pub fn validate_class_name(name: &str) -> Result<()> {
    static CLASS_NAME_RE: OnceLock<regex::Regex> = OnceLock::new();
    let re = CLASS_NAME_RE
        .get_or_init(|| regex::Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 _-]{0,63}$").unwrap());

    if !re.is_match(name) {
        return Err(anyhow!(
            "class name '{}' must match ^[A-Za-z0-9][A-Za-z0-9 _-]{{0,63}}$",
            name
        ));
    }
    Ok(())
}

fn read_config_file(path: &Path) -> Result<TrashwatchConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}
