//! Local video file frame source.
//!
//! `VideoFileSource` decodes frames from a local video file, in order,
//! one per call. `stub://N` paths select a synthetic backend that serves
//! `N` deterministic frames, used by tests and smoke runs. Real files
//! need the `ingest-file-ffmpeg` feature.

use anyhow::{anyhow, Result};

use super::FrameSource;
#[cfg(feature = "ingest-file-ffmpeg")]
use super::file_ffmpeg::FfmpegVideoSource;
use crate::frame::Frame;

/// Configuration for a local video file source.
#[derive(Clone, Debug)]
pub struct VideoFileConfig {
    /// Local file path, or `stub://N` for a synthetic stream of N frames.
    pub path: String,
    /// Target frame rate hint (frames per second).
    pub target_fps: u32,
}

impl Default for VideoFileConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            target_fps: 10,
        }
    }
}

pub struct VideoFileSource {
    backend: VideoBackend,
}

enum VideoBackend {
    Synthetic(SyntheticVideoSource),
    #[cfg(feature = "ingest-file-ffmpeg")]
    Ffmpeg(FfmpegVideoSource),
}

impl VideoFileSource {
    pub fn new(config: VideoFileConfig) -> Result<Self> {
        if !is_local_file_path(&config.path) {
            return Err(anyhow!(
                "video ingestion only supports local paths (no URL schemes)"
            ));
        }
        if config.path.starts_with("stub://") {
            Ok(Self {
                backend: VideoBackend::Synthetic(SyntheticVideoSource::new(&config)?),
            })
        } else {
            #[cfg(feature = "ingest-file-ffmpeg")]
            {
                Ok(Self {
                    backend: VideoBackend::Ffmpeg(FfmpegVideoSource::new(config)?),
                })
            }
            #[cfg(not(feature = "ingest-file-ffmpeg"))]
            {
                Err(anyhow!(
                    "video file ingestion requires the ingest-file-ffmpeg feature; rebuild with `--features ingest-file-ffmpeg`"
                ))
            }
        }
    }
}

impl FrameSource for VideoFileSource {
    fn connect(&mut self) -> Result<()> {
        match &mut self.backend {
            VideoBackend::Synthetic(source) => source.connect(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            VideoBackend::Ffmpeg(source) => source.connect(),
        }
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        match &mut self.backend {
            VideoBackend::Synthetic(source) => source.next_frame(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            VideoBackend::Ffmpeg(source) => source.next_frame(),
        }
    }

    fn is_healthy(&self) -> bool {
        match &self.backend {
            VideoBackend::Synthetic(_) => true,
            #[cfg(feature = "ingest-file-ffmpeg")]
            VideoBackend::Ffmpeg(source) => source.is_healthy(),
        }
    }
}

// ----------------------------------------------------------------------------
// Synthetic source (stub://) for tests
// ----------------------------------------------------------------------------

const SYNTHETIC_WIDTH: u32 = 64;
const SYNTHETIC_HEIGHT: u32 = 48;
const DEFAULT_SYNTHETIC_FRAMES: u64 = 30;

struct SyntheticVideoSource {
    path: String,
    total_frames: u64,
    frame_count: u64,
}

impl SyntheticVideoSource {
    fn new(config: &VideoFileConfig) -> Result<Self> {
        let count = config.path.trim_start_matches("stub://");
        let total_frames = if count.is_empty() {
            DEFAULT_SYNTHETIC_FRAMES
        } else {
            count
                .parse()
                .map_err(|_| anyhow!("stub:// frame count must be an integer, got '{}'", count))?
        };
        Ok(Self {
            path: config.path.clone(),
            total_frames,
            frame_count: 0,
        })
    }

    fn connect(&mut self) -> Result<()> {
        log::info!(
            "VideoFileSource: connected to {} (synthetic, {} frames)",
            self.path,
            self.total_frames
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.frame_count >= self.total_frames {
            return Ok(None);
        }
        self.frame_count += 1;

        let pixel_count = (SYNTHETIC_WIDTH * SYNTHETIC_HEIGHT * 3) as usize;
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count) % 256) as u8;
        }

        Ok(Some(Frame::new(
            pixels,
            SYNTHETIC_WIDTH,
            SYNTHETIC_HEIGHT,
            self.frame_count,
        )?))
    }
}

fn is_local_file_path(path: &str) -> bool {
    if path.trim().is_empty() {
        return false;
    }
    if path.starts_with("stub://") {
        return true;
    }
    !path.contains("://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_source_is_finite() -> Result<()> {
        let mut source = VideoFileSource::new(VideoFileConfig {
            path: "stub://3".to_string(),
            ..VideoFileConfig::default()
        })?;
        source.connect()?;

        for expected_index in 1..=3 {
            let frame = source.next_frame()?.expect("frame");
            assert_eq!(frame.index, expected_index);
            assert_eq!(frame.width, SYNTHETIC_WIDTH);
        }
        assert!(source.next_frame()?.is_none());
        assert!(source.next_frame()?.is_none());
        Ok(())
    }

    #[test]
    fn url_schemes_are_rejected() {
        let result = VideoFileSource::new(VideoFileConfig {
            path: "rtsp://camera-1/stream".to_string(),
            ..VideoFileConfig::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn bad_stub_counts_are_rejected() {
        let result = VideoFileSource::new(VideoFileConfig {
            path: "stub://lots".to_string(),
            ..VideoFileConfig::default()
        });
        assert!(result.is_err());
    }
}
