//! # Boids Prelude
//!
//! Commonly used types in one import:
//!
//! ```rust
//! use boids::prelude::*;
//!
//! let config = FlockConfig::default().with_count(100).with_seed(1);
//! let mut sim = FlockSimulation::new(config).unwrap();
//! sim.step().unwrap();
//! ```

pub use crate::config::{EdgeMargins, FlockConfig, FlockRules, OffloadTarget, Strategy};
pub use crate::error::{FlockError, Result};
pub use crate::performance::FrameStats;
pub use crate::simulation::device::{ComputeDevice, GpuDevice, HostDevice, OffloadExecutor};
pub use crate::simulation::{
    build_executor, create_flock, create_flock_with_rng, Boid, BoidId, Color, ExecutorOptions,
    Flock, FlockKernel, FlockSimulation, FrameExecutor, ParallelExecutor, SequentialExecutor,
};
pub use crate::{advance_frame, advance_frame_with};

pub use cgmath::Vector2;
