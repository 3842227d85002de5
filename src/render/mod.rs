//! CPU rendering of the simulation state
//!
//! - Frame: owned RGB8 pixel buffer
//! - Raster: pixel grid, per-blob density layers and compositing

pub mod frame;
pub mod raster;

pub use frame::Frame;
pub use raster::{PixelGrid, RenderError, Renderer};
