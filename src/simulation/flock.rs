//! # Flock
//!
//! The ordered population of boids and its initializer.
//!
//! A flock is created once, with ids densely assigned `0..count` in creation
//! order, and then replaced wholesale every frame: [`Flock::advance`] reads the
//! current flock as a read-only snapshot and returns a new one. Boids are never
//! added or removed after creation.

use super::boid::{Boid, BoidId, Color};
use super::executor::FrameExecutor;
use super::kernel::FlockKernel;
use crate::config::validate_viewport;
use crate::error::{FlockError, Result};
use cgmath::Vector2;
use rand::Rng;

/// Distance from the viewport border inside which no boid is spawned
pub const SPAWN_INSET: f64 = 100.0;

/// The two starting colors a boid is drawn from
pub const SPAWN_COLORS: [Color; 2] = [Color::new(255, 0, 127), Color::new(0, 255, 127)];

/// Ordered collection of boids with fixed size
#[derive(Clone, Debug, Default)]
pub struct Flock {
    boids: Vec<Boid>,
}

impl Flock {
    /// Wraps an existing population whose ids are `0..n` in flock order.
    ///
    /// Executors visit boids in flock order, so keeping ids dense and sorted
    /// makes that the id order too.
    pub fn from_boids(boids: Vec<Boid>) -> Result<Self> {
        for (index, boid) in boids.iter().enumerate() {
            let id = boid.id();
            if (id as usize) < index {
                return Err(FlockError::DuplicateId(id));
            }
            if id as usize != index {
                return Err(FlockError::UnexpectedId { index, id });
            }
        }
        Ok(Self { boids })
    }

    pub fn len(&self) -> usize {
        self.boids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boids.is_empty()
    }

    /// Boids in flock order, for rendering or inspection
    pub fn boids(&self) -> &[Boid] {
        &self.boids
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Boid> {
        self.boids.iter()
    }

    pub fn get(&self, id: BoidId) -> Option<&Boid> {
        self.boids.get(id as usize)
    }

    pub fn into_boids(self) -> Vec<Boid> {
        self.boids
    }

    /// Runs one frame through `executor`, using `self` as the frame snapshot.
    ///
    /// An empty flock is returned unchanged without touching the executor.
    pub fn advance(&self, executor: &mut dyn FrameExecutor, kernel: &FlockKernel) -> Result<Flock> {
        if self.is_empty() {
            return Ok(Flock::default());
        }

        let boids = executor.apply_frame(&self.boids, kernel)?;
        debug_assert_eq!(boids.len(), self.boids.len());
        Ok(Flock { boids })
    }
}

impl<'a> IntoIterator for &'a Flock {
    type Item = &'a Boid;
    type IntoIter = std::slice::Iter<'a, Boid>;

    fn into_iter(self) -> Self::IntoIter {
        self.boids.iter()
    }
}

/// Creates a flock of `count` boids using the thread-local random source
pub fn create_flock(width: f64, height: f64, count: usize) -> Result<Flock> {
    create_flock_with_rng(width, height, count, &mut rand::rng())
}

/// Creates a flock of `count` boids drawing from `rng`.
///
/// Positions are uniform over `[100, width - 100] x [100, height - 100]`,
/// velocity components uniform over `[-1, 1]`, and each boid starts with one
/// of [`SPAWN_COLORS`] at even odds. Both sides of the viewport must exceed 200.
pub fn create_flock_with_rng<R: Rng + ?Sized>(
    width: f64,
    height: f64,
    count: usize,
    rng: &mut R,
) -> Result<Flock> {
    validate_viewport(width, height)?;
    if count > BoidId::MAX as usize {
        return Err(FlockError::InvalidConfiguration(format!(
            "count {count} exceeds the id space"
        )));
    }

    let boids = (0..count)
        .map(|i| {
            let position = Vector2::new(
                rng.random_range(SPAWN_INSET..=width - SPAWN_INSET),
                rng.random_range(SPAWN_INSET..=height - SPAWN_INSET),
            );
            let velocity = Vector2::new(rng.random_range(-1.0..=1.0), rng.random_range(-1.0..=1.0));
            let color = if rng.random_bool(0.5) {
                SPAWN_COLORS[0]
            } else {
                SPAWN_COLORS[1]
            };
            Boid::new(i as BoidId, position, velocity, color)
        })
        .collect();

    Ok(Flock { boids })
}
