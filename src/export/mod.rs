//! Export modules
//!
//! Handles image and animation export:
//! - Image: PNG export of single frames, looping GIF for animations

pub mod image_export;

pub use image_export::{export_animation, export_frame, ExportError};
