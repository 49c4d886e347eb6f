//! Single still image source.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::FrameSource;
use crate::frame::Frame;

/// Serves exactly one frame decoded from a local image file, then reports
/// the stream as exhausted.
pub struct StillImageSource {
    path: PathBuf,
    served: bool,
}

impl StillImageSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            served: false,
        }
    }
}

impl FrameSource for StillImageSource {
    fn connect(&mut self) -> Result<()> {
        log::info!("StillImageSource: reading {}", self.path.display());
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.served {
            return Ok(None);
        }
        self.served = true;

        let image = image::open(&self.path)
            .with_context(|| format!("failed to decode image {}", self.path.display()))?
            .to_rgb8();
        let (width, height) = image.dimensions();
        let frame = Frame::new(image.into_raw(), width, height, 1)?;
        Ok(Some(frame))
    }
}
