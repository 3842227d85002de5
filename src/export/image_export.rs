//! Image and animation export functionality

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, DynamicImage, RgbImage};

use crate::render::Frame;

/// Errors that can occur during export
#[derive(Debug)]
pub enum ExportError {
    /// Failed to create image buffer
    BufferCreation(String),
    /// Failed to save image file
    SaveError(String),
    /// Invalid dimensions
    InvalidDimensions { width: u32, height: u32 },
    /// Animation has no frames
    NoFrames,
    /// Frames of one animation differ in size
    FrameSizeMismatch {
        index: usize,
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::BufferCreation(msg) => write!(f, "Failed to create image buffer: {}", msg),
            ExportError::SaveError(msg) => write!(f, "Failed to save image: {}", msg),
            ExportError::InvalidDimensions { width, height } => {
                write!(f, "Invalid dimensions: {}x{}", width, height)
            }
            ExportError::NoFrames => write!(f, "Animation has no frames"),
            ExportError::FrameSizeMismatch {
                index,
                expected,
                actual,
            } => write!(
                f,
                "Frame {} is {}x{}, expected {}x{}",
                index, actual.0, actual.1, expected.0, expected.1
            ),
        }
    }
}

impl std::error::Error for ExportError {}

fn to_image(frame: &Frame) -> Result<RgbImage, ExportError> {
    if frame.width() == 0 || frame.height() == 0 {
        return Err(ExportError::InvalidDimensions {
            width: frame.width(),
            height: frame.height(),
        });
    }
    RgbImage::from_raw(frame.width(), frame.height(), frame.as_raw().to_vec()).ok_or_else(|| {
        ExportError::BufferCreation("Failed to create image buffer from raw data".to_string())
    })
}

/// Export a rendered frame to a PNG file
///
/// # Arguments
/// * `path` - Output file path
/// * `frame` - Rendered RGB frame
///
/// # Returns
/// * `Ok(())` on success
/// * `Err(ExportError)` on failure
pub fn export_frame<P: AsRef<Path>>(path: P, frame: &Frame) -> Result<(), ExportError> {
    to_image(frame)?
        .save_with_format(path.as_ref(), image::ImageFormat::Png)
        .map_err(|e| ExportError::SaveError(e.to_string()))
}

/// Export frames as a GIF that loops forever
///
/// # Arguments
/// * `path` - Output file path
/// * `frames` - Frames in display order, all of the same size
/// * `fps` - Playback rate; each frame lasts `1000 / fps` milliseconds
pub fn export_animation<P: AsRef<Path>>(path: P, frames: &[Frame], fps: u32) -> Result<(), ExportError> {
    let first = frames.first().ok_or(ExportError::NoFrames)?;
    let expected = (first.width(), first.height());
    let delay = Delay::from_numer_denom_ms(1000 / fps.max(1), 1);

    let mut encoded = Vec::with_capacity(frames.len());
    for (index, frame) in frames.iter().enumerate() {
        let actual = (frame.width(), frame.height());
        if actual != expected {
            return Err(ExportError::FrameSizeMismatch {
                index,
                expected,
                actual,
            });
        }
        let rgba = DynamicImage::ImageRgb8(to_image(frame)?).into_rgba8();
        encoded.push(image::Frame::from_parts(rgba, 0, 0, delay));
    }

    let file = File::create(path.as_ref()).map_err(|e| ExportError::SaveError(e.to_string()))?;
    let mut encoder = GifEncoder::new(BufWriter::new(file));
    encoder
        .set_repeat(Repeat::Infinite)
        .map_err(|e| ExportError::SaveError(e.to_string()))?;
    encoder
        .encode_frames(encoded)
        .map_err(|e| ExportError::SaveError(e.to_string()))?;

    log::info!(
        "Wrote {} frames ({}x{}) to {}",
        frames.len(),
        expected.0,
        expected.1,
        path.as_ref().display()
    );
    Ok(())
}
