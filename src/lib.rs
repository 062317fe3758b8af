// src/lib.rs
//! Boids
//!
//! A 2D flocking simulation. Each frame every boid steers by alignment,
//! cohesion and separation against its neighbors, turns away from the
//! viewport edges, and has its speed clamped. One state-transition function,
//! three ways to schedule it:
//!
//! - [`Strategy::Sequential`]: one thread, boids in id order
//! - [`Strategy::SharedMemoryParallel`]: a rayon parallel-for
//! - [`Strategy::DataOffloadParallel`]: a kernel grid on a compute device
//!
//! All three read the previous frame as an immutable snapshot and write a new
//! flock, so their results agree.
//!
//! ```no_run
//! use boids::{advance_frame, create_flock, Strategy};
//!
//! let mut flock = create_flock(1920.0, 1080.0, 2500).unwrap();
//! for _ in 0..100 {
//!     flock = advance_frame(&flock, Strategy::SharedMemoryParallel).unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod performance;
pub mod prelude;
pub mod simulation;
pub mod wgpu_utils;

pub use config::{EdgeMargins, FlockConfig, FlockRules, OffloadTarget, Strategy};
pub use error::{FlockError, Result};
pub use simulation::{create_flock, create_flock_with_rng, Boid, Flock, FlockKernel, FlockSimulation};

use simulation::executor::{build_executor, ExecutorOptions};

/// Runs one frame over `flock` with the default rules and viewport margins.
///
/// The data-offload strategy runs on the host device here; use
/// [`FlockSimulation`] with an [`OffloadTarget`] to keep a GPU device alive
/// across frames.
pub fn advance_frame(flock: &Flock, strategy: Strategy) -> Result<Flock> {
    advance_frame_with(flock, strategy, &FlockKernel::default())
}

/// Runs one frame over `flock` with an explicit kernel configuration
pub fn advance_frame_with(flock: &Flock, strategy: Strategy, kernel: &FlockKernel) -> Result<Flock> {
    if flock.is_empty() {
        return Ok(Flock::default());
    }
    let mut executor = build_executor(strategy, ExecutorOptions::default())?;
    flock.advance(executor.as_mut(), kernel)
}
