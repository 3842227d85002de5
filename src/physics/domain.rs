//! The box: movable blobs enclosed by four walls.
//!
//! Each [`Domain::step`] runs in three phases:
//!
//! 1. every unordered entity pair computes its mutual accelerations on the
//!    domain's worker pool, reading a shared snapshot of the entities;
//! 2. once all pairs are done, the contributions are added to their targets
//!    in pair order on the calling thread;
//! 3. every entity integrates its accumulated acceleration.
//!
//! Nothing is written until phase 1 has succeeded for every pair, so a failed
//! overlap integral leaves the domain exactly as it was.

use glam::DVec2;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::entity::{Blob, Entity, Wall, WallSide};
use super::error::PhysicsError;
use super::force::RepulsionModel;
use crate::color::Rgb;
use crate::render::{Frame, RenderError, Renderer};

/// Axis-aligned rectangle with `y` pointing up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    top_left: DVec2,
    bottom_right: DVec2,
}

impl Bounds {
    /// Both corners must be finite with `left < right` and `bottom < top`.
    pub fn new(top_left: DVec2, bottom_right: DVec2) -> Result<Self, PhysicsError> {
        let ordered = top_left.x < bottom_right.x && bottom_right.y < top_left.y;
        if !ordered || !top_left.is_finite() || !bottom_right.is_finite() {
            return Err(PhysicsError::InvertedBounds {
                top_left,
                bottom_right,
            });
        }
        Ok(Self {
            top_left,
            bottom_right,
        })
    }

    /// Rectangle centred on the origin.
    pub fn centered(width: f64, height: f64) -> Result<Self, PhysicsError> {
        Self::new(
            DVec2::new(-width / 2.0, height / 2.0),
            DVec2::new(width / 2.0, -height / 2.0),
        )
    }

    pub fn top_left(&self) -> DVec2 {
        self.top_left
    }

    pub fn bottom_right(&self) -> DVec2 {
        self.bottom_right
    }

    pub fn left(&self) -> f64 {
        self.top_left.x
    }

    pub fn right(&self) -> f64 {
        self.bottom_right.x
    }

    pub fn top(&self) -> f64 {
        self.top_left.y
    }

    pub fn bottom(&self) -> f64 {
        self.bottom_right.y
    }

    pub fn width(&self) -> f64 {
        self.right() - self.left()
    }

    pub fn height(&self) -> f64 {
        self.top() - self.bottom()
    }

    pub fn contains(&self, point: DVec2) -> bool {
        (self.left()..=self.right()).contains(&point.x)
            && (self.bottom()..=self.top()).contains(&point.y)
    }

    /// One wall per side, in [`WallSide::ALL`] order.
    pub fn walls(&self) -> [Wall; 4] {
        WallSide::ALL.map(|side| {
            let line = match side {
                WallSide::Top => self.top(),
                WallSide::Bottom => self.bottom(),
                WallSide::Left => self.left(),
                WallSide::Right => self.right(),
            };
            Wall::new(side, line)
        })
    }
}

/// Optional knobs for [`Domain::with_settings`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DomainSettings {
    pub repulsion: RepulsionModel,
    /// Worker count; `None` uses the available hardware parallelism
    pub threads: Option<usize>,
}

/// Simulation box owning its entities and its worker pool.
pub struct Domain {
    /// Movable entities in insertion order, followed by the four walls
    entities: Vec<Entity>,
    wall_start: usize,
    bounds: Bounds,
    background: Rgb,
    repulsion: RepulsionModel,
    pool: ThreadPool,
    time: f64,
    steps: u64,
}

impl Domain {
    /// Create a domain with default repulsion and a pool sized to the machine.
    pub fn new<I, E>(entities: I, top_left: DVec2, bottom_right: DVec2, background: Rgb) -> Result<Self, PhysicsError>
    where
        I: IntoIterator<Item = E>,
        E: Into<Entity>,
    {
        Self::with_settings(
            entities,
            Bounds::new(top_left, bottom_right)?,
            background,
            DomainSettings::default(),
        )
    }

    /// Create a domain with explicit repulsion parameters and pool size.
    ///
    /// Walls are derived from `bounds`; supplying one yourself is an error.
    pub fn with_settings<I, E>(
        entities: I,
        bounds: Bounds,
        background: Rgb,
        settings: DomainSettings,
    ) -> Result<Self, PhysicsError>
    where
        I: IntoIterator<Item = E>,
        E: Into<Entity>,
    {
        let mut entities: Vec<Entity> = entities.into_iter().map(Into::into).collect();
        if let Some(index) = entities.iter().position(|e| matches!(e, Entity::Wall(_))) {
            return Err(PhysicsError::WallSupplied { index });
        }
        let wall_start = entities.len();
        entities.extend(bounds.walls().into_iter().map(Entity::Wall));

        let mut builder = ThreadPoolBuilder::new().thread_name(|index| format!("domain-worker-{}", index));
        if let Some(threads) = settings.threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder.build().map_err(PhysicsError::ThreadPool)?;

        log::debug!(
            "Domain created: {} entities + 4 walls, {} workers, bounds {:?}",
            wall_start,
            pool.current_num_threads(),
            bounds
        );

        Ok(Self {
            entities,
            wall_start,
            bounds,
            background,
            repulsion: settings.repulsion,
            pool,
            time: 0.0,
            steps: 0,
        })
    }

    /// Advance the simulation by `dt`.
    ///
    /// On error no entity has been modified.
    pub fn step(&mut self, dt: f64) -> Result<(), PhysicsError> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(PhysicsError::InvalidTimeStep(dt));
        }

        let contributions = self.pairwise_accelerations().inspect_err(|error| {
            log::warn!("Step {} aborted: {}", self.steps, error);
        })?;

        for (index, acceleration) in contributions {
            self.entities[index].accelerate(Some(acceleration));
        }
        for entity in &mut self.entities {
            entity.step(dt);
        }

        self.time += dt;
        self.steps += 1;
        log::debug!("Step {} done, t = {:.4}", self.steps, self.time);
        Ok(())
    }

    /// Evaluate every pair in parallel and flatten the results in pair order.
    fn pairwise_accelerations(&self) -> Result<Vec<(usize, DVec2)>, PhysicsError> {
        let entities = &self.entities;
        let repulsion = &self.repulsion;
        let pairs: Vec<(usize, usize)> = unordered_pairs(entities.len())
            .filter(|&(i, j)| !(entities[i].is_frozen() && entities[j].is_frozen()))
            .collect();

        let results = self.pool.install(|| {
            pairs
                .par_iter()
                .map(|&(i, j)| {
                    repulsion
                        .mutual_acceleration(&entities[i], &entities[j])
                        .map(|(on_i, on_j)| [(i, on_i), (j, on_j)])
                        .map_err(|source| PhysicsError::Integration {
                            first: i,
                            second: j,
                            source,
                        })
                })
                .collect::<Result<Vec<_>, _>>()
        })?;

        Ok(results
            .into_iter()
            .flatten()
            .filter_map(|(index, acceleration)| acceleration.map(|a| (index, a)))
            .collect())
    }

    /// Render the blobs at `resolution` plane units per pixel.
    pub fn render(&self, resolution: f64) -> Result<Frame, RenderError> {
        let renderer = Renderer::new(self.bounds, resolution, self.background)?;
        let blobs: Vec<&Blob> = self.blobs().collect();
        Ok(self.pool.install(|| renderer.render(&blobs)))
    }

    /// All entities, walls last.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Blobs in insertion order.
    pub fn blobs(&self) -> impl Iterator<Item = &Blob> {
        self.entities[..self.wall_start]
            .iter()
            .filter_map(Entity::as_blob)
    }

    pub fn walls(&self) -> impl Iterator<Item = &Wall> {
        self.entities[self.wall_start..]
            .iter()
            .filter_map(Entity::as_wall)
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn background(&self) -> Rgb {
        self.background
    }

    pub fn repulsion(&self) -> &RepulsionModel {
        &self.repulsion
    }

    /// Simulated time accumulated over all steps.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn thread_count(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl std::fmt::Debug for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Domain")
            .field("entities", &self.entities)
            .field("bounds", &self.bounds)
            .field("background", &self.background)
            .field("repulsion", &self.repulsion)
            .field("threads", &self.pool.current_num_threads())
            .field("time", &self.time)
            .finish()
    }
}

/// All `(i, j)` with `i < j < count`.
pub fn unordered_pairs(count: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..count).flat_map(move |i| (i + 1..count).map(move |j| (i, j)))
}
