//! Overlap-driven repulsion between entities.
//!
//! Two entities push each other apart with an acceleration of magnitude
//! `exp(gain * overlap) - 1`, where `overlap` is the integral of the
//! pointwise minimum of their density fields. The response is negligible for
//! light contact and grows quickly once the fields overlap substantially.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::entity::Entity;
use super::overlap::{overlap, QuadratureError, QuadratureSettings};

/// Accelerations produced by one pair: `(on first, on second)`.
pub type PairAcceleration = (Option<DVec2>, Option<DVec2>);

/// Parameters of the repulsion response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepulsionModel {
    /// Multiplier on the overlap inside the exponential
    pub gain: f64,
    /// Quadrature used for the overlap integral
    pub quadrature: QuadratureSettings,
}

impl Default for RepulsionModel {
    fn default() -> Self {
        Self {
            gain: 2.0,
            quadrature: QuadratureSettings::default(),
        }
    }
}

impl RepulsionModel {
    pub fn new(gain: f64, quadrature: QuadratureSettings) -> Self {
        Self { gain, quadrature }
    }

    /// Acceleration magnitude for a given overlap volume.
    pub fn magnitude(&self, overlap: f64) -> f64 {
        (self.gain * overlap).exp_m1()
    }

    /// Accelerations that `first` and `second` impart on each other.
    ///
    /// Frozen entities get `None`. When both are frozen the overlap is not
    /// computed at all.
    pub fn mutual_acceleration(&self, first: &Entity, second: &Entity) -> Result<PairAcceleration, QuadratureError> {
        let first_moves = !first.is_frozen();
        let second_moves = !second.is_frozen();
        if !first_moves && !second_moves {
            return Ok((None, None));
        }

        let scale = self.magnitude(overlap(first, second, &self.quadrature)?);
        let on_first = first_moves.then(|| first.direction_from(second) * scale);
        let on_second = second_moves.then(|| second.direction_from(first) * scale);
        Ok((on_first, on_second))
    }
}
