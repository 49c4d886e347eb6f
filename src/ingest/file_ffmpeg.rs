//! FFmpeg-backed local video file decoder.
//!
//! Frames are decoded in-memory and converted to tightly packed RGB24.
//! The decoder is drained before new packets are fed, and flushed at end
//! of file so trailing frames are not lost.

use anyhow::{Context, Result};
use ffmpeg_next as ffmpeg;

use super::file::VideoFileConfig;
use crate::frame::Frame;

pub(crate) struct FfmpegVideoSource {
    config: VideoFileConfig,
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    frame_count: u64,
    finished: bool,
}

impl FfmpegVideoSource {
    pub(crate) fn new(config: VideoFileConfig) -> Result<Self> {
        ffmpeg::init().context("initialize ffmpeg")?;
        let input = ffmpeg::format::input(&config.path)
            .with_context(|| format!("failed to open video file '{}' with ffmpeg", config.path))?;
        let input_stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| anyhow::anyhow!("file has no video track"))?;
        let stream_index = input_stream.index();
        let context = ffmpeg::codec::context::Context::from_parameters(input_stream.parameters())
            .context("load video decoder parameters")?;
        let decoder = context
            .decoder()
            .video()
            .context("open ffmpeg video decoder")?;

        let scaler = ffmpeg::software::scaling::context::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg::util::format::pixel::Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ffmpeg::software::scaling::flag::Flags::BILINEAR,
        )
        .context("create ffmpeg scaler")?;

        Ok(Self {
            config,
            input,
            stream_index,
            decoder,
            scaler,
            frame_count: 0,
            finished: false,
        })
    }

    pub(crate) fn connect(&mut self) -> Result<()> {
        log::info!("VideoFileSource: connected to {} (ffmpeg)", self.config.path);
        Ok(())
    }

    pub(crate) fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.finished {
            return Ok(None);
        }

        let mut decoded = ffmpeg::frame::Video::empty();
        let mut rgb_frame = ffmpeg::frame::Video::empty();

        // Frames may already be buffered in the decoder from the last packet.
        if self.decoder.receive_frame(&mut decoded).is_ok() {
            self.scaler
                .run(&decoded, &mut rgb_frame)
                .context("scale frame to RGB")?;
            let (pixels, width, height) = frame_to_pixels(&rgb_frame)?;
            self.frame_count += 1;
            return Ok(Some(Frame::new(pixels, width, height, self.frame_count)?));
        }

        for (stream, packet) in self.input.packets() {
            if stream.index() != self.stream_index {
                continue;
            }

            self.decoder
                .send_packet(&packet)
                .context("send packet to ffmpeg decoder")?;

            if self.decoder.receive_frame(&mut decoded).is_ok() {
                self.scaler
                    .run(&decoded, &mut rgb_frame)
                    .context("scale frame to RGB")?;
                let (pixels, width, height) = frame_to_pixels(&rgb_frame)?;
                self.frame_count += 1;
                return Ok(Some(Frame::new(pixels, width, height, self.frame_count)?));
            }
        }

        // End of file: flush the decoder for trailing frames.
        let _ = self.decoder.send_eof();
        if self.decoder.receive_frame(&mut decoded).is_ok() {
            self.scaler
                .run(&decoded, &mut rgb_frame)
                .context("scale frame to RGB")?;
            let (pixels, width, height) = frame_to_pixels(&rgb_frame)?;
            self.frame_count += 1;
            return Ok(Some(Frame::new(pixels, width, height, self.frame_count)?));
        }

        self.finished = true;
        log::info!(
            "VideoFileSource: {} exhausted after {} frames",
            self.config.path,
            self.frame_count
        );
        Ok(None)
    }

    pub(crate) fn is_healthy(&self) -> bool {
        !self.finished
    }
}

fn frame_to_pixels(frame: &ffmpeg::frame::Video) -> Result<(Vec<u8>, u32, u32)> {
    let width = frame.width();
    let height = frame.height();
    let row_bytes = (width as usize) * 3;
    let stride = frame.stride(0);
    let data = frame.data(0);

    if stride == row_bytes {
        return Ok((data.to_vec(), width, height));
    }

    // Scanlines can be padded; repack them tightly.
    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        let end = start + row_bytes;
        pixels.extend_from_slice(
            data.get(start..end)
                .context("ffmpeg frame row is out of bounds")?,
        );
    }

    Ok((pixels, width, height))
}
