//! Errors raised by entity construction and domain stepping.

use glam::DVec2;

use super::overlap::QuadratureError;

/// Error types for building and advancing a simulation.
#[derive(Debug)]
pub enum PhysicsError {
    /// Kernel width must be positive and finite
    InvalidStd(f64),
    /// Position or velocity contains NaN or infinity
    NonFiniteState { position: DVec2, velocity: DVec2 },
    /// Wall side tag did not name one of the four sides
    UnknownWallSide(String),
    /// A wall was handed to the domain; walls are derived from the bounds
    WallSupplied { index: usize },
    /// Top-left corner is not strictly above and left of bottom-right
    InvertedBounds { top_left: DVec2, bottom_right: DVec2 },
    /// Time step must be positive and finite
    InvalidTimeStep(f64),
    /// Overlap between two entities failed to converge
    Integration {
        first: usize,
        second: usize,
        source: QuadratureError,
    },
    /// Worker pool could not be started
    ThreadPool(rayon::ThreadPoolBuildError),
}

impl std::fmt::Display for PhysicsError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhysicsError::InvalidStd(std) => {
                write!(formatter, "Standard deviation must be positive, got {}", std)
            }
            PhysicsError::NonFiniteState { position, velocity } => write!(
                formatter,
                "Blob state must be finite, got position {} and velocity {}",
                position, velocity
            ),
            PhysicsError::UnknownWallSide(tag) => write!(
                formatter,
                "Wall side must be one of top, bottom, left or right, instead got '{}'",
                tag
            ),
            PhysicsError::WallSupplied { index } => write!(
                formatter,
                "Entity {} is a wall; walls are created by the domain from its bounds",
                index
            ),
            PhysicsError::InvertedBounds {
                top_left,
                bottom_right,
            } => write!(
                formatter,
                "Top-left corner {} must lie above and left of bottom-right corner {}",
                top_left, bottom_right
            ),
            PhysicsError::InvalidTimeStep(dt) => {
                write!(formatter, "Time step must be positive, got {}", dt)
            }
            PhysicsError::Integration {
                first,
                second,
                source,
            } => write!(
                formatter,
                "Overlap between entities {} and {} failed: {}",
                first, second, source
            ),
            PhysicsError::ThreadPool(error) => {
                write!(formatter, "Failed to start worker pool: {}", error)
            }
        }
    }
}

impl std::error::Error for PhysicsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PhysicsError::Integration { source, .. } => Some(source),
            PhysicsError::ThreadPool(error) => Some(error),
            _ => None,
        }
    }
}
