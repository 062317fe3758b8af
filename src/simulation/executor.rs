//! # Frame Executors
//!
//! A frame executor applies the [`FlockKernel`] to every boid of a snapshot
//! and returns the next population in the same order. Executors only decide
//! scheduling: each one reads from the untouched snapshot and writes into a
//! separate output buffer, so no boid ever sees another boid's state from the
//! same frame.
//!
//! - [`SequentialExecutor`]: a single-threaded loop in flock order
//! - [`ParallelExecutor`]: a rayon parallel-for, on the global pool or a
//!   dedicated one
//! - [`crate::simulation::device::OffloadExecutor`]: one work-item per boid
//!   dispatched to a compute device
//!
//! Use [`build_executor`] to pick one from configuration.

use super::boid::Boid;
use super::device::{ComputeDevice, GpuDevice, HostDevice, OffloadExecutor};
use super::kernel::FlockKernel;
use crate::config::{OffloadTarget, Strategy};
use crate::error::Result;
use rayon::prelude::*;

/// Schedules one frame of kernel calls
pub trait FrameExecutor {
    /// Name for logs and statistics
    fn name(&self) -> &str;

    /// Returns `kernel.update(boid, snapshot)` for every boid, in snapshot order.
    fn apply_frame(&mut self, snapshot: &[Boid], kernel: &FlockKernel) -> Result<Vec<Boid>>;
}

/// Runs the kernel for each boid in turn on the calling thread
#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialExecutor;

impl FrameExecutor for SequentialExecutor {
    fn name(&self) -> &str {
        "sequential"
    }

    fn apply_frame(&mut self, snapshot: &[Boid], kernel: &FlockKernel) -> Result<Vec<Boid>> {
        let mut next = Vec::with_capacity(snapshot.len());
        for boid in snapshot {
            next.push(kernel.update(boid, snapshot));
        }
        Ok(next)
    }
}

/// Splits the boids across a rayon worker pool
pub struct ParallelExecutor {
    pool: Option<rayon::ThreadPool>,
}

impl ParallelExecutor {
    /// Uses rayon's global pool
    pub fn new() -> Self {
        Self { pool: None }
    }

    /// Uses a dedicated pool of `threads` workers
    pub fn with_threads(threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("flock-worker-{i}"))
            .build()?;
        Ok(Self { pool: Some(pool) })
    }

    pub fn threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }
}

impl Default for ParallelExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameExecutor for ParallelExecutor {
    fn name(&self) -> &str {
        "shared-memory-parallel"
    }

    fn apply_frame(&mut self, snapshot: &[Boid], kernel: &FlockKernel) -> Result<Vec<Boid>> {
        let run = || {
            let mut next = Vec::with_capacity(snapshot.len());
            snapshot
                .par_iter()
                .map(|boid| kernel.update(boid, snapshot))
                .collect_into_vec(&mut next);
            next
        };

        let next = match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        };
        Ok(next)
    }
}

/// Options that select and size an executor
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecutorOptions {
    pub offload_target: OffloadTarget,
    pub worker_threads: Option<usize>,
}

/// Builds the executor for `strategy`.
///
/// For [`Strategy::DataOffloadParallel`] with [`OffloadTarget::Auto`], a GPU
/// that cannot be set up is logged and replaced by the host device.
pub fn build_executor(strategy: Strategy, options: ExecutorOptions) -> Result<Box<dyn FrameExecutor>> {
    let executor: Box<dyn FrameExecutor> = match strategy {
        Strategy::Sequential => Box::new(SequentialExecutor),
        Strategy::SharedMemoryParallel => match options.worker_threads {
            Some(threads) => Box::new(ParallelExecutor::with_threads(threads)?),
            None => Box::new(ParallelExecutor::new()),
        },
        Strategy::DataOffloadParallel => {
            let device: Box<dyn ComputeDevice> = match options.offload_target {
                OffloadTarget::Host => Box::new(host_device(options.worker_threads)?),
                OffloadTarget::Gpu => Box::new(GpuDevice::new()?),
                OffloadTarget::Auto => match GpuDevice::new() {
                    Ok(gpu) => Box::new(gpu),
                    Err(err) => {
                        log::warn!("GPU device unavailable ({err}), offloading to host");
                        Box::new(host_device(options.worker_threads)?)
                    }
                },
            };
            Box::new(OffloadExecutor::new(device))
        }
    };
    log::debug!("Using {} executor", executor.name());
    Ok(executor)
}

fn host_device(worker_threads: Option<usize>) -> Result<HostDevice> {
    match worker_threads {
        Some(workers) => HostDevice::with_workers(workers),
        None => HostDevice::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::boid::Color;
    use crate::simulation::flock::create_flock_with_rng;
    use cgmath::Vector2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn boid(id: u32, x: f64, vx: f64) -> Boid {
        Boid::new(id, Vector2::new(x, 500.0), Vector2::new(vx, 0.0), Color::new(0, 255, 127))
    }

    #[test]
    fn test_sequential_reads_snapshot_not_updated_boids() {
        let a = boid(0, 500.0, 1.2);
        let b = boid(1, 505.0, -1.2);
        let snapshot = [a, b];
        let kernel = FlockKernel::default();

        let next = SequentialExecutor.apply_frame(&snapshot, &kernel).unwrap();
        assert_eq!(next.len(), 2);
        for (computed, original) in next.iter().zip(snapshot.iter()) {
            let expected = kernel.update(original, &snapshot);
            assert_eq!(computed.position, expected.position);
            assert_eq!(computed.velocity, expected.velocity);
        }

        // Updating in place would let boid 1 align with boid 0's new velocity
        let in_place = kernel.update(&b, &[next[0], b]);
        assert!((next[1].velocity.x - -1.08).abs() < 1e-12);
        assert!((in_place.velocity.x - next[1].velocity.x).abs() > 1e-6);
    }

    #[test]
    fn test_parallel_matches_sequential_bitwise() {
        let mut rng = StdRng::seed_from_u64(11);
        let flock = create_flock_with_rng(640.0, 480.0, 400, &mut rng).unwrap();
        let kernel = FlockKernel::default();

        let sequential = SequentialExecutor.apply_frame(flock.boids(), &kernel).unwrap();
        let parallel = ParallelExecutor::with_threads(4)
            .unwrap()
            .apply_frame(flock.boids(), &kernel)
            .unwrap();

        for (s, p) in sequential.iter().zip(parallel.iter()) {
            assert_eq!(s.id(), p.id());
            assert_eq!(s.position.x.to_bits(), p.position.x.to_bits());
            assert_eq!(s.position.y.to_bits(), p.position.y.to_bits());
            assert_eq!(s.velocity.x.to_bits(), p.velocity.x.to_bits());
            assert_eq!(s.velocity.y.to_bits(), p.velocity.y.to_bits());
            assert_eq!(s.color, p.color);
        }
    }

    #[test]
    fn test_dedicated_pool_size() {
        let executor = ParallelExecutor::with_threads(3).unwrap();
        assert_eq!(executor.threads(), 3);
    }

    #[test]
    fn test_build_executor_names() {
        let options = ExecutorOptions::default();
        let names: Vec<String> = Strategy::ALL
            .iter()
            .map(|s| build_executor(*s, options).unwrap().name().to_string())
            .collect();
        assert_eq!(names[0], "sequential");
        assert_eq!(names[1], "shared-memory-parallel");
        assert!(names[2].starts_with("data-offload"));
    }
}
