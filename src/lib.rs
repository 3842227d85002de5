//! Blob Bounce Library
//!
//! Soft Gaussian blobs confined in a box, with:
//! - Repulsion proportional to the integrated overlap of density fields
//! - Walls modelled as hard half-plane densities
//! - Parallel pairwise force evaluation on a domain-owned worker pool
//! - CPU rasterization with additive color compositing

pub mod color;
pub mod config;
pub mod export;
pub mod physics;
pub mod render;
pub mod scenario;

pub use color::Rgb;
pub use config::SimulationConfig;
pub use physics::{Blob, Bounds, Domain, DomainSettings, PhysicsError};
pub use render::{Frame, RenderError};
