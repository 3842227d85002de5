//! CPU rasterizer for blob density fields.
//!
//! Every blob is sampled into its own density layer. Layers are then
//! composited in blob order:
//!
//! - `rendered = Σ round(density · color)` per channel
//! - `weight = Σ density`
//! - `pixel = clamp(rendered + round(background · (1 - clamp(weight, 0, 1))), 0, 255)`
//!
//! Blob colors add up and saturate instead of cross-fading, and the
//! background only shows where the blobs leave coverage.

use glam::DVec2;
use rayon::prelude::*;

use super::frame::Frame;
use crate::color::Rgb;
use crate::physics::overlap::DensityField;
use crate::physics::{Blob, Bounds};

/// Errors raised before rendering starts.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// Pixel spacing must be positive and finite
    InvalidResolution(f64),
    /// Image would not fit in `u32` dimensions
    TooLarge { width: f64, height: f64 },
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::InvalidResolution(resolution) => {
                write!(f, "Resolution must be positive, got {}", resolution)
            }
            RenderError::TooLarge { width, height } => {
                write!(f, "Render target {}x{} pixels is too large", width, height)
            }
        }
    }
}

impl std::error::Error for RenderError {}

/// Pixel-centre coordinates covering a rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    resolution: f64,
    left: f64,
    bottom: f64,
}

impl PixelGrid {
    pub fn new(bounds: Bounds, resolution: f64) -> Result<Self, RenderError> {
        if !(resolution > 0.0 && resolution.is_finite()) {
            return Err(RenderError::InvalidResolution(resolution));
        }
        let width = pixel_count(bounds.width(), resolution);
        let height = pixel_count(bounds.height(), resolution);
        if width > u32::MAX as f64 || height > u32::MAX as f64 {
            return Err(RenderError::TooLarge { width, height });
        }
        Ok(Self {
            width: width as u32,
            height: height as u32,
            resolution,
            left: bounds.left(),
            bottom: bounds.bottom(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Plane coordinates of the centre of pixel (`column`, `row`); row 0 is
    /// the top. `None` outside the grid.
    pub fn center(&self, column: u32, row: u32) -> Option<DVec2> {
        (column < self.width && row < self.height).then(|| self.center_unchecked(column, row))
    }

    /// Centres in row-major order.
    pub fn centers(&self) -> impl Iterator<Item = DVec2> + '_ {
        (0..self.height)
            .flat_map(move |row| (0..self.width).map(move |column| self.center_unchecked(column, row)))
    }

    fn center_unchecked(&self, column: u32, row: u32) -> DVec2 {
        let flipped = (self.height - 1 - row) as f64;
        DVec2::new(
            self.left + (column as f64 + 0.5) * self.resolution,
            self.bottom + (flipped + 0.5) * self.resolution,
        )
    }
}

/// Whole pixels of size `resolution` that fit in `extent`.
///
/// Ratios within rounding noise of an integer snap to it, so a box built as
/// `n * resolution` yields exactly `n` pixels.
fn pixel_count(extent: f64, resolution: f64) -> f64 {
    let ratio = extent / resolution;
    let nearest = ratio.round();
    if (ratio - nearest).abs() <= 1e-9 * nearest.max(1.0) {
        nearest
    } else {
        ratio.floor()
    }
}

/// Density of one blob at every pixel.
struct Layer {
    density: Vec<f64>,
    color: [f64; 3],
}

impl Layer {
    fn sample(grid: &PixelGrid, blob: &Blob) -> Self {
        Self {
            density: grid.centers().map(|point| blob.density(point)).collect(),
            color: blob.color().to_f64_array(),
        }
    }

    fn accumulate(&self, rendered: &mut [[f64; 3]], weight: &mut [f64]) {
        for ((sum, coverage), &density) in rendered.iter_mut().zip(weight.iter_mut()).zip(&self.density) {
            for (channel, &color) in sum.iter_mut().zip(&self.color) {
                *channel += (density * color).round();
            }
            *coverage += density;
        }
    }
}

/// Renders blobs over a fixed grid and background.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    grid: PixelGrid,
    background: Rgb,
}

impl Renderer {
    pub fn new(bounds: Bounds, resolution: f64, background: Rgb) -> Result<Self, RenderError> {
        Ok(Self {
            grid: PixelGrid::new(bounds, resolution)?,
            background,
        })
    }

    pub fn grid(&self) -> &PixelGrid {
        &self.grid
    }

    /// Composite `blobs` in the given order.
    ///
    /// Layers are sampled in parallel on the current rayon pool, one task per
    /// blob, in batches of the pool size to bound memory; accumulation always
    /// follows slice order so the output is reproducible.
    pub fn render(&self, blobs: &[&Blob]) -> Frame {
        let count = self.grid.len();
        let mut rendered = vec![[0.0_f64; 3]; count];
        let mut weight = vec![0.0_f64; count];

        let batch = rayon::current_num_threads().max(1);
        for chunk in blobs.chunks(batch) {
            let layers: Vec<Layer> = chunk
                .par_iter()
                .map(|blob| Layer::sample(&self.grid, blob))
                .collect();
            for layer in &layers {
                layer.accumulate(&mut rendered, &mut weight);
            }
        }

        let background = self.background.to_f64_array();
        let mut pixels = Vec::with_capacity(count * 3);
        for (sum, coverage) in rendered.iter().zip(&weight) {
            let residual = 1.0 - coverage.clamp(0.0, 1.0);
            for (channel, &back) in sum.iter().zip(&background) {
                pixels.push((channel + (back * residual).round()).clamp(0.0, 255.0) as u8);
            }
        }

        log::debug!(
            "Rendered {} blobs into {}x{} frame",
            blobs.len(),
            self.grid.width,
            self.grid.height
        );
        Frame::from_composite(self.grid.width, self.grid.height, pixels)
    }
}
