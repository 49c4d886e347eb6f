#![cfg(feature = "ingest-v4l2")]

//! V4L2 camera frame source.
//!
//! Streams frames from a local device node (e.g. `/dev/video0`). Camera
//! streams are unbounded; the scanner's cancellation token is the way
//! out. `stub://` device paths select a synthetic backend for tests.

use anyhow::{Context, Result};
use ouroboros::self_referencing;
use std::time::{Duration, Instant};

use super::FrameSource;
use crate::frame::Frame;

/// Configuration for a V4L2 source.
#[derive(Clone, Debug)]
pub struct V4l2Config {
    /// Device path (e.g. "/dev/video0").
    pub device: String,
    /// Target frame rate (frames per second).
    pub target_fps: u32,
    /// Preferred frame width.
    pub width: u32,
    /// Preferred frame height.
    pub height: u32,
}

impl Default for V4l2Config {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            target_fps: 10,
            width: 640,
            height: 480,
        }
    }
}

pub struct V4l2Source {
    backend: V4l2Backend,
}

enum V4l2Backend {
    Synthetic(SyntheticV4l2Source),
    Device(DeviceV4l2Source),
}

impl V4l2Source {
    pub fn new(config: V4l2Config) -> Result<Self> {
        if config.device.starts_with("stub://") {
            Ok(Self {
                backend: V4l2Backend::Synthetic(SyntheticV4l2Source::new(config)),
            })
        } else {
            Ok(Self {
                backend: V4l2Backend::Device(DeviceV4l2Source::new(config)?),
            })
        }
    }
}

impl FrameSource for V4l2Source {
    fn connect(&mut self) -> Result<()> {
        match &mut self.backend {
            V4l2Backend::Synthetic(source) => source.connect(),
            V4l2Backend::Device(source) => source.connect(),
        }
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        match &mut self.backend {
            V4l2Backend::Synthetic(source) => source.next_frame(),
            V4l2Backend::Device(source) => source.next_frame(),
        }
    }

    fn is_healthy(&self) -> bool {
        match &self.backend {
            V4l2Backend::Synthetic(_) => true,
            V4l2Backend::Device(source) => source.is_healthy(),
        }
    }
}

// ----------------------------------------------------------------------------
// Synthetic source (stub://) for tests
// ----------------------------------------------------------------------------

struct SyntheticV4l2Source {
    config: V4l2Config,
    frame_count: u64,
}

impl SyntheticV4l2Source {
    fn new(config: V4l2Config) -> Self {
        Self {
            config,
            frame_count: 0,
        }
    }

    fn connect(&mut self) -> Result<()> {
        log::info!("V4l2Source: connected to {} (synthetic)", self.config.device);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        self.frame_count += 1;

        let pixel_count = (self.config.width * self.config.height * 3) as usize;
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count) % 256) as u8;
        }

        Ok(Some(Frame::new(
            pixels,
            self.config.width,
            self.config.height,
            self.frame_count,
        )?))
    }
}

// ----------------------------------------------------------------------------
// Production V4L2 source using libv4l
// ----------------------------------------------------------------------------

struct DeviceV4l2Source {
    config: V4l2Config,
    state: Option<DeviceV4l2State>,
    frame_count: u64,
    last_frame_at: Option<Instant>,
    last_error: Option<String>,
    active_width: u32,
    active_height: u32,
}

#[self_referencing]
struct DeviceV4l2State {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

impl DeviceV4l2Source {
    fn new(config: V4l2Config) -> Result<Self> {
        Ok(Self {
            active_width: config.width,
            active_height: config.height,
            config,
            state: None,
            frame_count: 0,
            last_frame_at: None,
            last_error: None,
        })
    }

    fn connect(&mut self) -> Result<()> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let mut device = v4l::Device::with_path(&self.config.device)
            .with_context(|| format!("open v4l2 device {}", self.config.device))?;
        let mut format = device.format().context("read v4l2 format")?;
        format.width = self.config.width;
        format.height = self.config.height;
        format.fourcc = v4l::FourCC::new(b"RGB3");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!(
                    "V4l2Source: failed to set format on {}: {}",
                    self.config.device,
                    err
                );
                device
                    .format()
                    .context("read v4l2 format after set failure")?
            }
        };

        if self.config.target_fps > 0 {
            let params = v4l::video::capture::Parameters::with_fps(self.config.target_fps);
            if let Err(err) = device.set_params(&params) {
                log::warn!(
                    "V4l2Source: failed to set fps on {}: {}",
                    self.config.device,
                    err
                );
            }
        }

        self.active_width = format.width;
        self.active_height = format.height;
        self.last_error = None;

        let state = DeviceV4l2StateBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                    .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
            },
        }
        .try_build()
        .map_err(|err| {
            self.last_error = Some(err.to_string());
            err
        })?;
        self.state = Some(state);

        log::info!(
            "V4l2Source: connected to {} ({}x{})",
            self.config.device,
            self.active_width,
            self.active_height
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        use v4l::io::traits::CaptureStream;

        let state = self.state.as_mut().context("v4l2 device not connected")?;
        let buf = {
            let (buf, _meta) = state
                .with_mut(|fields| fields.stream.next())
                .map_err(|err| {
                    self.last_error = Some(err.to_string());
                    anyhow::Error::new(err).context("capture v4l2 frame")
                })?;
            buf.to_vec()
        };

        self.frame_count += 1;
        self.last_frame_at = Some(Instant::now());

        Ok(Some(Frame::new(
            buf,
            self.active_width,
            self.active_height,
            self.frame_count,
        )?))
    }

    fn is_healthy(&self) -> bool {
        if self.last_error.is_some() {
            return false;
        }
        let Some(last_frame_at) = self.last_frame_at else {
            return true;
        };
        last_frame_at.elapsed() <= self.health_grace()
    }

    fn health_grace(&self) -> Duration {
        let base_ms = if self.config.target_fps == 0 {
            2_000
        } else {
            (1000 / self.config.target_fps).saturating_mul(6)
        };
        Duration::from_millis(base_ms.max(2_000) as u64)
    }
}
