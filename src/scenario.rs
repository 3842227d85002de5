//! Random scene generation.
//!
//! Blobs are scattered uniformly over the box with a fixed speed in a random
//! direction. Kernel widths are jittered around the configured mean and
//! colors are either a single foreground color or random rainbow hues.

use glam::DVec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;

use crate::color::Rgb;
use crate::config::SceneParameters;
use crate::physics::{Blob, Bounds, PhysicsError};

/// Produces the initial blobs of a run.
pub struct ScenarioGenerator {
    params: SceneParameters,
    rng: StdRng,
}

impl ScenarioGenerator {
    /// Seeded from `params.seed`, or from OS entropy when unset.
    pub fn new(params: SceneParameters) -> Self {
        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { params, rng }
    }

    /// Box covering `width × height` pixels at the configured resolution.
    pub fn bounds(&self) -> Result<Bounds, PhysicsError> {
        Bounds::centered(
            self.params.width as f64 * self.params.resolution,
            self.params.height as f64 * self.params.resolution,
        )
    }

    /// Generate `n_objects` movable blobs inside [`Self::bounds`].
    pub fn generate(&mut self) -> Result<Vec<Blob>, PhysicsError> {
        let bounds = self.bounds()?;
        (0..self.params.n_objects)
            .map(|_| self.next_blob(&bounds))
            .collect()
    }

    fn next_blob(&mut self, bounds: &Bounds) -> Result<Blob, PhysicsError> {
        let position = DVec2::new(
            self.rng.gen_range(bounds.left()..bounds.right()),
            self.rng.gen_range(bounds.bottom()..bounds.top()),
        );
        let heading = self.rng.gen_range(0.0..TAU);
        let velocity = DVec2::from_angle(heading) * self.params.velocity;
        let std = self.params.std + self.jitter(self.params.std_range);
        let color = if self.params.rainbow {
            Rgb::from_hls(
                self.rng.gen_range(0.0..1.0),
                0.4 + self.rng.gen_range(0.0..1.0) / 5.0,
                0.5 + self.rng.gen_range(0.0..1.0) / 2.0,
            )
        } else {
            self.params.foreground
        };
        Blob::new(position, velocity, std, color)
    }

    fn jitter(&mut self, range: f64) -> f64 {
        if range > 0.0 {
            self.rng.gen_range(-range..range)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> SceneParameters {
        SceneParameters {
            n_objects: 16,
            seed: Some(seed),
            width: 200,
            height: 100,
            resolution: 0.01,
            ..Default::default()
        }
    }

    #[test]
    fn test_bounds_from_image_size() {
        let bounds = ScenarioGenerator::new(seeded(1)).bounds().unwrap();
        assert!((bounds.left() + 1.0).abs() < 1e-12);
        assert!((bounds.right() - 1.0).abs() < 1e-12);
        assert!((bounds.top() - 0.5).abs() < 1e-12);
        assert!((bounds.bottom() + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_blobs_respect_parameters() {
        let params = seeded(3);
        let mut generator = ScenarioGenerator::new(params.clone());
        let bounds = generator.bounds().unwrap();
        let blobs = generator.generate().unwrap();

        assert_eq!(blobs.len(), 16);
        for blob in &blobs {
            assert!(bounds.contains(blob.position()));
            let speed = blob.velocity().unwrap().length();
            assert!((speed - params.velocity).abs() < 1e-12);
            assert!((blob.std() - params.std).abs() <= params.std_range);
            assert_eq!(blob.color(), params.foreground);
        }
    }

    #[test]
    fn test_same_seed_same_scene() {
        let first = ScenarioGenerator::new(seeded(42)).generate().unwrap();
        let second = ScenarioGenerator::new(seeded(42)).generate().unwrap();
        let other = ScenarioGenerator::new(seeded(43)).generate().unwrap();
        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[test]
    fn test_rainbow_colors_vary() {
        let params = SceneParameters {
            rainbow: true,
            ..seeded(9)
        };
        let blobs = ScenarioGenerator::new(params).generate().unwrap();
        let first = blobs[0].color();
        assert!(blobs.iter().any(|blob| blob.color() != first));
    }

    #[test]
    fn test_zero_range_keeps_std() {
        let params = SceneParameters {
            std_range: 0.0,
            ..seeded(5)
        };
        let blobs = ScenarioGenerator::new(params).generate().unwrap();
        assert!(blobs.iter().all(|blob| blob.std() == 0.15));
    }
}
