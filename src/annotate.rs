#![cfg(feature = "annotate")]

//! Annotated frame output.
//!
//! Draws detection boxes onto a frame and writes the result as a PNG, so
//! an operator can review what the detector saw without a display
//! attached.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::detect::Detection;
use crate::frame::Frame;

const BOX_COLOR: Rgb<u8> = Rgb([255, 56, 56]);

/// Render the frame with one hollow rectangle per detection. Boxes are
/// clamped to the frame; degenerate boxes are skipped.
pub fn annotate_frame(frame: &Frame, detections: &[Detection]) -> Result<RgbImage> {
    let mut image = RgbImage::from_raw(frame.width, frame.height, frame.pixels.clone())
        .ok_or_else(|| {
            anyhow!(
                "frame buffer does not match {}x{} RGB",
                frame.width,
                frame.height
            )
        })?;

    for detection in detections {
        let [x1, y1, x2, y2] = detection.bbox;
        let x1 = x1.max(0.0).min(frame.width as f32 - 1.0);
        let y1 = y1.max(0.0).min(frame.height as f32 - 1.0);
        let x2 = x2.max(0.0).min(frame.width as f32);
        let y2 = y2.max(0.0).min(frame.height as f32);
        let width = (x2 - x1) as u32;
        let height = (y2 - y1) as u32;
        if width == 0 || height == 0 {
            continue;
        }
        draw_hollow_rect_mut(
            &mut image,
            Rect::at(x1 as i32, y1 as i32).of_size(width, height),
            BOX_COLOR,
        );
    }

    Ok(image)
}

/// Write the annotated frame to `dir/frame_NNNNNN.png`.
pub fn save_annotated(dir: &Path, frame: &Frame, detections: &[Detection]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create annotation directory {}", dir.display()))?;
    let image = annotate_frame(frame, detections)?;
    let path = dir.join(format!("frame_{:06}.png", frame.index));
    image
        .save(&path)
        .with_context(|| format!("failed to write annotated frame {}", path.display()))?;
    log::info!("annotated frame written to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(width: u32, height: u32) -> Frame {
        Frame::new(vec![0u8; (width * height * 3) as usize], width, height, 1).unwrap()
    }

    fn detection(bbox: [f32; 4]) -> Detection {
        Detection {
            class_name: "trash".to_string(),
            confidence: 0.9,
            bbox,
        }
    }

    #[test]
    fn boxes_are_drawn_on_the_frame() -> Result<()> {
        let frame = solid_frame(32, 32);
        let image = annotate_frame(&frame, &[detection([4.0, 4.0, 12.0, 12.0])])?;

        assert_eq!(*image.get_pixel(4, 4), BOX_COLOR);
        assert_eq!(*image.get_pixel(0, 0), Rgb([0, 0, 0]));
        Ok(())
    }

    #[test]
    fn out_of_bounds_boxes_are_clamped() -> Result<()> {
        let frame = solid_frame(16, 16);
        // Must not panic on boxes that leave the frame.
        annotate_frame(&frame, &[detection([-10.0, -10.0, 100.0, 100.0])])?;
        annotate_frame(&frame, &[detection([8.0, 8.0, 8.0, 8.0])])?;
        Ok(())
    }

    #[test]
    fn annotated_frames_are_saved_as_png() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let frame = solid_frame(16, 16);

        let path = save_annotated(dir.path(), &frame, &[detection([2.0, 2.0, 10.0, 10.0])])?;

        assert!(path.ends_with("frame_000001.png"));
        assert!(path.is_file());
        Ok(())
    }
}
