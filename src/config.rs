//! Configuration module for the blob simulation.
//!
//! This module defines the parameter structures for a run: how the scene is
//! populated, how long it is simulated and rendered, and how the repulsion
//! force is evaluated.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::color::Rgb;
use crate::physics::{QuadratureSettings, RepulsionModel};

/// Parameters describing the initial scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneParameters {
    /// Number of blobs placed in the box
    pub n_objects: u32,

    /// Initial speed of every blob (plane units per second)
    pub velocity: f64,

    /// Mean kernel width of the blobs
    pub std: f64,

    /// Half-width of the uniform jitter applied to `std`
    pub std_range: f64,

    /// Seed for placement and colors; random when absent
    pub seed: Option<u64>,

    /// Output width in pixels
    pub width: u32,

    /// Output height in pixels
    pub height: u32,

    /// Distance on the plane between neighbouring pixels
    pub resolution: f64,

    /// Blob color when `rainbow` is off
    pub foreground: Rgb,

    /// Color shown where no blob covers the plane
    pub background: Rgb,

    /// Give each blob its own random hue
    pub rainbow: bool,
}

impl Default for SceneParameters {
    fn default() -> Self {
        Self {
            n_objects: 32,
            velocity: 0.3,
            std: 0.15,
            std_range: 0.05,
            seed: None,
            width: 1024,
            height: 1024,
            resolution: 0.0025,
            foreground: Rgb::WHITE,
            background: Rgb::BLACK,
            rainbow: false,
        }
    }
}

/// Parameters controlling the time loop and frame output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunParameters {
    /// Frames per second of the output animation
    pub fps: u32,

    /// Simulated seconds per step
    pub time_step: f64,

    /// Number of steps to run
    pub total_steps: u32,

    /// Render every n-th step
    pub render_steps: u32,
}

impl Default for RunParameters {
    fn default() -> Self {
        Self {
            fps: 30,
            time_step: 0.025,
            total_steps: 128,
            render_steps: 1,
        }
    }
}

/// Parameters of the force model and worker pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsParameters {
    /// Multiplier on the overlap inside `exp(gain * overlap) - 1`
    pub repulsion_gain: f64,

    /// Overlap integration tolerances and budget
    pub quadrature: QuadratureSettings,

    /// Worker threads; all available cores when absent
    pub threads: Option<usize>,
}

impl Default for PhysicsParameters {
    fn default() -> Self {
        Self {
            repulsion_gain: RepulsionModel::default().gain,
            quadrature: QuadratureSettings::default(),
            threads: None,
        }
    }
}

impl PhysicsParameters {
    pub fn repulsion_model(&self) -> RepulsionModel {
        RepulsionModel::new(self.repulsion_gain, self.quadrature)
    }
}

/// Complete configuration combining all parameter groups.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Initial blob placement and image geometry
    #[serde(default)]
    pub scene: SceneParameters,

    /// Time loop and output cadence
    #[serde(default)]
    pub run: RunParameters,

    /// Force model
    #[serde(default)]
    pub physics: PhysicsParameters,
}

impl SimulationConfig {
    /// Load configuration from a JSON file.
    ///
    /// # Arguments
    /// * `path` - Path to the JSON configuration file
    ///
    /// # Returns
    /// * `Ok(SimulationConfig)` - Parsed configuration
    /// * `Err` - If file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|error| ConfigError::Io {
            path: path.as_ref().to_path_buf(),
            error,
        })?;
        serde_json::from_str(&contents).map_err(|error| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            error,
        })
    }

    /// Save configuration to a JSON file.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents =
            serde_json::to_string_pretty(self).map_err(|error| ConfigError::Serialize { error })?;
        fs::write(path.as_ref(), contents).map_err(|error| ConfigError::Io {
            path: path.as_ref().to_path_buf(),
            error,
        })
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scene = &self.scene;
        let run = &self.run;
        let physics = &self.physics;

        check(scene.velocity >= 0.0, "velocity", "must be non-negative")?;
        check(scene.std > 0.0, "std", "must be positive")?;
        check(scene.std_range >= 0.0, "std_range", "must be non-negative")?;
        check(
            scene.std_range < scene.std,
            "std_range",
            "must be less than std",
        )?;
        check(scene.width >= 1, "width", "must be positive")?;
        check(scene.height >= 1, "height", "must be positive")?;
        check(
            scene.resolution > 0.0 && scene.resolution.is_finite(),
            "resolution",
            "must be positive",
        )?;
        check(run.fps >= 1, "fps", "must be positive")?;
        check(
            run.time_step > 0.0 && run.time_step.is_finite(),
            "time_step",
            "must be positive",
        )?;
        check(run.total_steps >= 1, "total_steps", "must be positive")?;
        check(run.render_steps >= 1, "render_steps", "must be positive")?;
        check(
            run.render_steps <= run.total_steps,
            "render_steps",
            "must be less than or equal to total_steps",
        )?;
        check(
            physics.repulsion_gain >= 0.0 && physics.repulsion_gain.is_finite(),
            "repulsion_gain",
            "must be non-negative",
        )?;
        check(
            physics.quadrature.absolute_tolerance > 0.0
                || physics.quadrature.relative_tolerance > 0.0,
            "quadrature",
            "needs a positive absolute or relative tolerance",
        )?;
        check(
            physics.threads != Some(0),
            "threads",
            "must be positive when given",
        )?;
        Ok(())
    }

    /// Half extents of the box on the plane, derived from the image size.
    pub fn half_extents(&self) -> (f64, f64) {
        (
            self.scene.width as f64 / 2.0 * self.scene.resolution,
            self.scene.height as f64 / 2.0 * self.scene.resolution,
        )
    }
}

fn check(condition: bool, field: &'static str, reason: &'static str) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::Invalid { field, reason })
    }
}

/// Error types for configuration operations.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error when reading or writing configuration files
    Io {
        path: std::path::PathBuf,
        error: std::io::Error,
    },
    /// JSON parsing error
    Parse {
        path: std::path::PathBuf,
        error: serde_json::Error,
    },
    /// JSON serialization error
    Serialize { error: serde_json::Error },
    /// A parameter is outside its valid range
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, error } => {
                write!(
                    formatter,
                    "Failed to read/write config file '{}': {}",
                    path.display(),
                    error
                )
            }
            ConfigError::Parse { path, error } => {
                write!(
                    formatter,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    error
                )
            }
            ConfigError::Serialize { error } => {
                write!(formatter, "Failed to serialize config: {}", error)
            }
            ConfigError::Invalid { field, reason } => {
                write!(formatter, "Invalid config: {} {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { error, .. } => Some(error),
            ConfigError::Parse { error, .. } => Some(error),
            ConfigError::Serialize { error } => Some(error),
            ConfigError::Invalid { .. } => None,
        }
    }
}
