//! Simulated entities: soft Gaussian blobs and the hard walls of the box.
//!
//! Every entity exposes a [`DensityField`]. Movable entities additionally
//! carry [`Motion`] (velocity plus a per-step acceleration accumulator) and
//! are advanced with semi-implicit Euler integration. Frozen entities carry
//! no motion at all, so nothing can move them.

use glam::DVec2;
use std::str::FromStr;

use super::error::PhysicsError;
use super::overlap::{Axis, DensityField};
use crate::color::Rgb;

/// Velocity and accumulated acceleration of a movable entity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Motion {
    pub velocity: DVec2,
    /// Sum of contributions since the last integration step
    pub acceleration: DVec2,
}

impl Motion {
    pub fn new(velocity: DVec2) -> Self {
        Self {
            velocity,
            acceleration: DVec2::ZERO,
        }
    }

    /// Semi-implicit Euler: velocity first, then position with the new velocity.
    fn integrate(&mut self, position: &mut DVec2, dt: f64) {
        self.velocity += self.acceleration * dt;
        *position += self.velocity * dt;
        self.acceleration = DVec2::ZERO;
    }
}

/// Radially symmetric Gaussian density with peak 1 at its position.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    position: DVec2,
    motion: Option<Motion>,
    std: f64,
    color: Rgb,
}

impl Blob {
    /// Create a movable blob.
    pub fn new(position: DVec2, velocity: DVec2, std: f64, color: Rgb) -> Result<Self, PhysicsError> {
        Self::build(position, Some(Motion::new(velocity)), std, color)
    }

    /// Create a blob that never moves and never accumulates force.
    pub fn frozen(position: DVec2, std: f64, color: Rgb) -> Result<Self, PhysicsError> {
        Self::build(position, None, std, color)
    }

    fn build(position: DVec2, motion: Option<Motion>, std: f64, color: Rgb) -> Result<Self, PhysicsError> {
        if !(std > 0.0 && std.is_finite()) {
            return Err(PhysicsError::InvalidStd(std));
        }
        let velocity = motion.map(|m| m.velocity).unwrap_or(DVec2::ZERO);
        if !position.is_finite() || !velocity.is_finite() {
            return Err(PhysicsError::NonFiniteState { position, velocity });
        }
        Ok(Self {
            position,
            motion,
            std,
            color,
        })
    }

    pub fn position(&self) -> DVec2 {
        self.position
    }

    /// Current velocity, `None` for frozen blobs.
    pub fn velocity(&self) -> Option<DVec2> {
        self.motion.map(|m| m.velocity)
    }

    /// Pending acceleration, `None` for frozen blobs.
    pub fn acceleration(&self) -> Option<DVec2> {
        self.motion.map(|m| m.acceleration)
    }

    pub fn std(&self) -> f64 {
        self.std
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn is_frozen(&self) -> bool {
        self.motion.is_none()
    }
}

/// Distance from a blob's centre, in standard deviations, of its flank breakpoints.
const FLANK_SPREAD: f64 = 4.0;

impl DensityField for Blob {
    fn density(&self, point: DVec2) -> f64 {
        (-(point - self.position).length_squared() / (2.0 * self.std * self.std)).exp()
    }

    fn breakpoints(&self, axis: Axis, out: &mut Vec<f64>) {
        let center = axis.of(self.position);
        let flank = FLANK_SPREAD * self.std;
        out.extend([center - flank, center, center + flank]);
    }
}

/// Which edge of the box a wall bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WallSide {
    Top,
    Bottom,
    Left,
    Right,
}

impl WallSide {
    pub const ALL: [WallSide; 4] = [WallSide::Top, WallSide::Bottom, WallSide::Left, WallSide::Right];

    /// Unit vector pointing from this wall into the box.
    pub fn inward_normal(self) -> DVec2 {
        match self {
            WallSide::Top => DVec2::new(0.0, -1.0),
            WallSide::Bottom => DVec2::new(0.0, 1.0),
            WallSide::Left => DVec2::new(1.0, 0.0),
            WallSide::Right => DVec2::new(-1.0, 0.0),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            WallSide::Top => "top",
            WallSide::Bottom => "bottom",
            WallSide::Left => "left",
            WallSide::Right => "right",
        }
    }
}

impl FromStr for WallSide {
    type Err = PhysicsError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(WallSide::Top),
            "bottom" => Ok(WallSide::Bottom),
            "left" => Ok(WallSide::Left),
            "right" => Ok(WallSide::Right),
            _ => Err(PhysicsError::UnknownWallSide(tag.to_string())),
        }
    }
}

impl std::fmt::Display for WallSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Immovable half-plane occupying everything beyond `line` on its side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wall {
    side: WallSide,
    line: f64,
}

impl Wall {
    pub fn new(side: WallSide, line: f64) -> Self {
        Self { side, line }
    }

    pub fn side(&self) -> WallSide {
        self.side
    }

    /// Boundary coordinate: `y` for top/bottom, `x` for left/right.
    pub fn line(&self) -> f64 {
        self.line
    }

    pub fn inward_normal(&self) -> DVec2 {
        self.side.inward_normal()
    }
}

impl DensityField for Wall {
    fn density(&self, point: DVec2) -> f64 {
        let solid = match self.side {
            WallSide::Top => point.y >= self.line,
            WallSide::Bottom => point.y <= self.line,
            WallSide::Left => point.x <= self.line,
            WallSide::Right => point.x >= self.line,
        };
        if solid { 1.0 } else { 0.0 }
    }

    fn breakpoints(&self, axis: Axis, out: &mut Vec<f64>) {
        let across = match self.side {
            WallSide::Top | WallSide::Bottom => Axis::Y,
            WallSide::Left | WallSide::Right => Axis::X,
        };
        if axis == across {
            out.push(self.line);
        }
    }
}

/// Anything the domain simulates.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Blob(Blob),
    Wall(Wall),
}

impl Entity {
    /// Frozen entities never move and ignore accelerations.
    pub fn is_frozen(&self) -> bool {
        match self {
            Entity::Blob(blob) => blob.is_frozen(),
            Entity::Wall(_) => true,
        }
    }

    pub fn as_blob(&self) -> Option<&Blob> {
        match self {
            Entity::Blob(blob) => Some(blob),
            Entity::Wall(_) => None,
        }
    }

    pub fn as_wall(&self) -> Option<&Wall> {
        match self {
            Entity::Wall(wall) => Some(wall),
            Entity::Blob(_) => None,
        }
    }

    /// Unit direction in which `other` pushes `self`.
    ///
    /// A wall always pushes along its inward normal. Between two blobs the
    /// push points from `other` toward `self`, and is zero when both sit at
    /// exactly the same position. A wall being pushed has no meaningful
    /// direction; its own inward normal is returned.
    pub fn direction_from(&self, other: &Entity) -> DVec2 {
        match (self, other) {
            (_, Entity::Wall(wall)) => wall.inward_normal(),
            (Entity::Blob(this), Entity::Blob(that)) => {
                (this.position - that.position).normalize_or_zero()
            }
            (Entity::Wall(wall), Entity::Blob(_)) => wall.inward_normal(),
        }
    }

    /// Add `acceleration` to the accumulator; no-op when frozen or `None`.
    pub fn accelerate(&mut self, acceleration: Option<DVec2>) {
        let (Entity::Blob(blob), Some(acceleration)) = (self, acceleration) else {
            return;
        };
        if let Some(motion) = blob.motion.as_mut() {
            motion.acceleration += acceleration;
        }
    }

    /// Advance by `dt` and clear the accumulator; no-op when frozen.
    pub fn step(&mut self, dt: f64) {
        if let Entity::Blob(blob) = self
            && let Some(motion) = blob.motion.as_mut()
        {
            motion.integrate(&mut blob.position, dt);
        }
    }
}

impl DensityField for Entity {
    fn density(&self, point: DVec2) -> f64 {
        match self {
            Entity::Blob(blob) => blob.density(point),
            Entity::Wall(wall) => wall.density(point),
        }
    }

    fn breakpoints(&self, axis: Axis, out: &mut Vec<f64>) {
        match self {
            Entity::Blob(blob) => blob.breakpoints(axis, out),
            Entity::Wall(wall) => wall.breakpoints(axis, out),
        }
    }
}

impl From<Blob> for Entity {
    fn from(blob: Blob) -> Self {
        Entity::Blob(blob)
    }
}

impl From<Wall> for Entity {
    fn from(wall: Wall) -> Self {
        Entity::Wall(wall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob_at(x: f64, y: f64) -> Blob {
        Blob::new(DVec2::new(x, y), DVec2::ZERO, 0.15, Rgb::WHITE).unwrap()
    }

    #[test]
    fn test_blob_rejects_bad_std() {
        for std in [0.0, -0.1, f64::NAN, f64::INFINITY] {
            let result = Blob::new(DVec2::ZERO, DVec2::ZERO, std, Rgb::WHITE);
            assert!(matches!(result, Err(PhysicsError::InvalidStd(_))));
        }
    }

    #[test]
    fn test_blob_rejects_non_finite_state() {
        let result = Blob::new(DVec2::new(f64::NAN, 0.0), DVec2::ZERO, 0.1, Rgb::WHITE);
        assert!(matches!(result, Err(PhysicsError::NonFiniteState { .. })));
    }

    #[test]
    fn test_blob_density_peak_and_falloff() {
        let blob = blob_at(1.0, -1.0);
        assert!((blob.density(DVec2::new(1.0, -1.0)) - 1.0).abs() < f64::EPSILON);
        let one_std = blob.density(DVec2::new(1.15, -1.0));
        assert!((one_std - (-0.5_f64).exp()).abs() < 1e-12);
        assert!(blob.density(DVec2::new(5.0, 5.0)) < 1e-100);
    }

    #[test]
    fn test_wall_density_sides() {
        let top = Wall::new(WallSide::Top, 1.0);
        assert_eq!(top.density(DVec2::new(0.0, 1.5)), 1.0);
        assert_eq!(top.density(DVec2::new(0.0, 0.5)), 0.0);

        let left = Wall::new(WallSide::Left, -1.0);
        assert_eq!(left.density(DVec2::new(-2.0, 0.0)), 1.0);
        assert_eq!(left.density(DVec2::new(0.0, 0.0)), 0.0);

        let bottom = Wall::new(WallSide::Bottom, -1.0);
        assert_eq!(bottom.density(DVec2::new(0.0, -1.0)), 1.0);

        let right = Wall::new(WallSide::Right, 1.0);
        assert_eq!(right.density(DVec2::new(0.99, 0.0)), 0.0);
    }

    #[test]
    fn test_wall_side_parsing() {
        assert_eq!("Top".parse::<WallSide>().unwrap(), WallSide::Top);
        assert_eq!(" right ".parse::<WallSide>().unwrap(), WallSide::Right);
        assert!(matches!(
            "diagonal".parse::<WallSide>(),
            Err(PhysicsError::UnknownWallSide(tag)) if tag == "diagonal"
        ));
    }

    #[test]
    fn test_direction_between_blobs() {
        let a = Entity::from(blob_at(0.0, 0.0));
        let b = Entity::from(blob_at(3.0, 4.0));
        let away = a.direction_from(&b);
        assert!((away - DVec2::new(-0.6, -0.8)).length() < 1e-12);
        assert!((b.direction_from(&a) + away).length() < 1e-12);
    }

    #[test]
    fn test_coincident_blobs_have_zero_direction() {
        let a = Entity::from(blob_at(0.5, 0.5));
        let b = Entity::from(blob_at(0.5, 0.5));
        assert_eq!(a.direction_from(&b), DVec2::ZERO);
    }

    #[test]
    fn test_wall_pushes_along_inward_normal() {
        let blob = Entity::from(blob_at(100.0, -3.0));
        for side in WallSide::ALL {
            let wall = Entity::from(Wall::new(side, 0.0));
            assert_eq!(blob.direction_from(&wall), side.inward_normal());
        }
    }

    #[test]
    fn test_step_applies_velocity_then_position() {
        let mut entity = Entity::from(blob_at(0.0, 0.0));
        entity.accelerate(Some(DVec2::new(2.0, 0.0)));
        entity.accelerate(Some(DVec2::new(0.0, -1.0)));
        entity.accelerate(None);
        entity.step(0.5);

        let blob = entity.as_blob().unwrap();
        assert_eq!(blob.velocity(), Some(DVec2::new(1.0, -0.5)));
        assert_eq!(blob.position(), DVec2::new(0.5, -0.25));
        assert_eq!(blob.acceleration(), Some(DVec2::ZERO));
    }

    #[test]
    fn test_frozen_blob_ignores_acceleration() {
        let mut entity =
            Entity::from(Blob::frozen(DVec2::new(0.2, 0.3), 0.1, Rgb::WHITE).unwrap());
        entity.accelerate(Some(DVec2::new(10.0, 10.0)));
        entity.step(1.0);

        let blob = entity.as_blob().unwrap();
        assert!(blob.is_frozen());
        assert_eq!(blob.position(), DVec2::new(0.2, 0.3));
        assert_eq!(blob.velocity(), None);
        assert_eq!(blob.acceleration(), None);
    }

    #[test]
    fn test_walls_are_frozen() {
        let mut wall = Entity::from(Wall::new(WallSide::Bottom, -1.0));
        assert!(wall.is_frozen());
        wall.accelerate(Some(DVec2::ONE));
        wall.step(1.0);
        assert_eq!(wall.as_wall().unwrap().line(), -1.0);
    }

    #[test]
    fn test_breakpoints_mark_features() {
        let blob = Blob::new(DVec2::new(6.0, -2.0), DVec2::ZERO, 0.25, Rgb::WHITE).unwrap();
        let mut xs = Vec::new();
        Entity::from(blob).breakpoints(Axis::X, &mut xs);
        assert_eq!(xs, vec![5.0, 6.0, 7.0]);

        let wall = Wall::new(WallSide::Top, 5.12);
        let (mut xs, mut ys) = (Vec::new(), Vec::new());
        wall.breakpoints(Axis::X, &mut xs);
        wall.breakpoints(Axis::Y, &mut ys);
        assert!(xs.is_empty());
        assert_eq!(ys, vec![5.12]);
    }
}
