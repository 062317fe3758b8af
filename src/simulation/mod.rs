// src/simulation/mod.rs
//! Flocking simulation
//!
//! The boid model, the flock and its initializer, the per-boid update kernel,
//! and the executors that apply the kernel to a whole flock once per frame.

pub mod boid;
pub mod device;
pub mod executor;
pub mod flock;
pub mod kernel;
pub mod runner;

pub use boid::{Boid, BoidId, Color};
pub use executor::{build_executor, ExecutorOptions, FrameExecutor, ParallelExecutor, SequentialExecutor};
pub use flock::{create_flock, create_flock_with_rng, Flock};
pub use kernel::FlockKernel;
pub use runner::FlockSimulation;
