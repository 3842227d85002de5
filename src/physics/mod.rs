//! Physics of soft blobs in a box
//!
//! - Overlap: adaptive quadrature of the shared volume of two density fields
//! - Entity: Gaussian blobs, walls and semi-implicit Euler integration
//! - Force: exponential repulsion driven by overlap volume
//! - Domain: the box, its walls and the parallel pairwise solver

pub mod domain;
pub mod entity;
pub mod error;
pub mod force;
pub mod overlap;

pub use domain::{Bounds, Domain, DomainSettings};
pub use entity::{Blob, Entity, Motion, Wall, WallSide};
pub use error::PhysicsError;
pub use force::{PairAcceleration, RepulsionModel};
pub use overlap::{Axis, DensityField, QuadratureError, QuadratureSettings, overlap};
