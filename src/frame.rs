//! RGB frame container shared by sources and engines.
//!
//! A `Frame` is one decoded still image or one sampled instant of a
//! video/camera stream. Frames are plain values: produced by an ingest
//! source, handed to the detection engine, and discarded once reduced
//! to a decision.

use anyhow::{anyhow, Result};

const RGB_CHANNELS: usize = 3;

/// One decoded RGB24 frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Tightly packed RGB24 pixel data, row major.
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// 1-based position within the source stream. Still images use 1.
    pub index: u64,
}

impl Frame {
    /// Build a frame, rejecting buffers that do not match the dimensions.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, index: u64) -> Result<Self> {
        let expected = RGB_CHANNELS
            .checked_mul(width as usize)
            .and_then(|v| v.checked_mul(height as usize))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if pixels.len() != expected {
            return Err(anyhow!(
                "frame buffer holds {} bytes but {}x{} RGB needs {}",
                pixels.len(),
                width,
                height,
                expected
            ));
        }
        Ok(Self {
            pixels,
            width,
            height,
            index,
        })
    }
}
