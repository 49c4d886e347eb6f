//! Frame sources.
//!
//! This module supplies the frames the scanner consumes:
//! - Still images (`StillImageSource`)
//! - Local video files (`VideoFileSource`, FFmpeg behind `ingest-file-ffmpeg`)
//! - V4L2 cameras (`V4l2Source`, feature `ingest-v4l2`)
//! - Synthetic `stub://` backends for tests and smoke runs
//!
//! Sources produce [`Frame`] values one at a time; finite sources report
//! exhaustion with `Ok(None)`. Fetching blocks the caller; there is no
//! read-ahead or buffering.

pub mod file;
#[cfg(feature = "ingest-file-ffmpeg")]
pub(crate) mod file_ffmpeg;
pub mod still;
#[cfg(feature = "ingest-v4l2")]
pub mod v4l2;

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::frame::Frame;

pub use file::{VideoFileConfig, VideoFileSource};
pub use still::StillImageSource;
#[cfg(feature = "ingest-v4l2")]
pub use v4l2::{V4l2Config, V4l2Source};

/// Injected frame source, one frame per call.
pub trait FrameSource {
    /// Prepare the source. Must be called before the first `next_frame`.
    fn connect(&mut self) -> Result<()>;

    /// Fetch the next frame, or `None` when the stream is exhausted.
    /// Blocks until a frame is available.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// True while the source expects to keep producing frames.
    fn is_healthy(&self) -> bool {
        true
    }
}

/// How a raw CLI source string should be consumed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// A single still image: detailed JSON output.
    Still(PathBuf),
    /// A video file or `stub://` stream: boolean scan.
    VideoFile(String),
    /// A live camera device: boolean scan until cancelled.
    Camera(String),
}

const STILL_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Classify a CLI source string the way the operator means it: a single
/// digit is a camera index, a known image extension is a still, anything
/// else is a video stream.
pub fn classify_source(raw: &str) -> SourceKind {
    if raw.len() == 1 && raw.chars().all(|c| c.is_ascii_digit()) {
        return SourceKind::Camera(format!("/dev/video{}", raw));
    }
    if raw.starts_with("/dev/video") {
        return SourceKind::Camera(raw.to_string());
    }
    let extension = Path::new(raw)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    if let Some(extension) = extension {
        if STILL_EXTENSIONS.contains(&extension.as_str()) {
            return SourceKind::Still(PathBuf::from(raw));
        }
    }
    SourceKind::VideoFile(raw.to_string())
}

/// Open a source for scanning.
pub fn open_stream_source(kind: &SourceKind) -> Result<Box<dyn FrameSource>> {
    match kind {
        SourceKind::Still(path) => Ok(Box::new(StillImageSource::new(path))),
        SourceKind::VideoFile(path) => {
            let config = VideoFileConfig {
                path: path.clone(),
                ..VideoFileConfig::default()
            };
            Ok(Box::new(VideoFileSource::new(config)?))
        }
        SourceKind::Camera(device) => open_camera(device),
    }
}

#[cfg(feature = "ingest-v4l2")]
fn open_camera(device: &str) -> Result<Box<dyn FrameSource>> {
    let config = v4l2::V4l2Config {
        device: device.to_string(),
        ..v4l2::V4l2Config::default()
    };
    Ok(Box::new(v4l2::V4l2Source::new(config)?))
}

#[cfg(not(feature = "ingest-v4l2"))]
fn open_camera(device: &str) -> Result<Box<dyn FrameSource>> {
    anyhow::bail!(
        "camera capture for {} requires the ingest-v4l2 feature; rebuild with `--features ingest-v4l2`",
        device
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_map_to_camera_devices() {
        assert_eq!(
            classify_source("0"),
            SourceKind::Camera("/dev/video0".to_string())
        );
        assert_eq!(
            classify_source("/dev/video2"),
            SourceKind::Camera("/dev/video2".to_string())
        );
    }

    #[test]
    fn image_extensions_are_stills() {
        assert_eq!(
            classify_source("shots/bin.JPG"),
            SourceKind::Still(PathBuf::from("shots/bin.JPG"))
        );
        assert_eq!(
            classify_source("pile.png"),
            SourceKind::Still(PathBuf::from("pile.png"))
        );
    }

    #[test]
    fn everything_else_is_a_video_stream() {
        assert_eq!(
            classify_source("clip.mp4"),
            SourceKind::VideoFile("clip.mp4".to_string())
        );
        assert_eq!(
            classify_source("stub://12"),
            SourceKind::VideoFile("stub://12".to_string())
        );
        // Multi-digit strings are paths, not camera indexes.
        assert_eq!(
            classify_source("42"),
            SourceKind::VideoFile("42".to_string())
        );
    }
}
