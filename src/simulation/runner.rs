//! Stateful flock driver
//!
//! [`FlockSimulation`] owns the current flock, the executor picked by its
//! configuration and the frame statistics. The caller drives it one frame at
//! a time and hands [`FlockSimulation::flock`] to its renderer in between.
//! Keeping the executor alive across frames matters for the GPU device, whose
//! pipeline and buffers are reused.

use super::executor::{build_executor, ExecutorOptions, FrameExecutor};
use super::flock::{create_flock_with_rng, Flock};
use super::kernel::FlockKernel;
use crate::config::{FlockConfig, Strategy};
use crate::error::Result;
use crate::performance::FrameStats;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;

pub struct FlockSimulation {
    config: FlockConfig,
    kernel: FlockKernel,
    flock: Flock,
    executor: Box<dyn FrameExecutor>,
    stats: FrameStats,
}

impl FlockSimulation {
    /// Validates `config`, spawns the initial flock and builds the executor
    pub fn new(config: FlockConfig) -> Result<Self> {
        config.validate()?;

        let flock = Self::spawn(&config)?;
        let executor = build_executor(config.strategy, Self::executor_options(&config))?;
        log::info!(
            "Created flock of {} boids on a {}x{} viewport ({})",
            flock.len(),
            config.width,
            config.height,
            executor.name()
        );

        Ok(Self {
            kernel: FlockKernel::new(config.rules, config.edges),
            config,
            flock,
            executor,
            stats: FrameStats::new(),
        })
    }

    fn spawn(config: &FlockConfig) -> Result<Flock> {
        match config.seed {
            Some(seed) => create_flock_with_rng(
                config.width,
                config.height,
                config.count,
                &mut StdRng::seed_from_u64(seed),
            ),
            None => create_flock_with_rng(config.width, config.height, config.count, &mut rand::rng()),
        }
    }

    fn executor_options(config: &FlockConfig) -> ExecutorOptions {
        ExecutorOptions {
            offload_target: config.offload_target,
            worker_threads: config.worker_threads,
        }
    }

    /// Advances one frame and returns the new flock.
    ///
    /// On error the previous flock is kept; a frame is never half applied.
    pub fn step(&mut self) -> Result<&Flock> {
        let start = Instant::now();
        let next = self.flock.advance(self.executor.as_mut(), &self.kernel)?;
        let elapsed = start.elapsed();

        self.flock = next;
        self.stats.record(elapsed);
        log::debug!(
            "Frame {} took {:.3} ms ({})",
            self.stats.frame_count(),
            elapsed.as_secs_f64() * 1000.0,
            self.executor.name()
        );
        Ok(&self.flock)
    }

    /// Advances `frames` frames
    pub fn run(&mut self, frames: usize) -> Result<&Flock> {
        for _ in 0..frames {
            self.step()?;
        }
        Ok(&self.flock)
    }

    /// Respawns the flock and clears statistics. A seeded config respawns the
    /// same population.
    pub fn reset(&mut self) -> Result<()> {
        self.flock = Self::spawn(&self.config)?;
        self.stats.reset();
        Ok(())
    }

    /// Switches to another strategy, keeping the current flock
    pub fn set_strategy(&mut self, strategy: Strategy) -> Result<()> {
        self.executor = build_executor(strategy, Self::executor_options(&self.config))?;
        self.config.strategy = strategy;
        self.stats.reset();
        Ok(())
    }

    pub fn flock(&self) -> &Flock {
        &self.flock
    }

    pub fn config(&self) -> &FlockConfig {
        &self.config
    }

    pub fn kernel(&self) -> &FlockKernel {
        &self.kernel
    }

    pub fn strategy(&self) -> Strategy {
        self.config.strategy
    }

    pub fn executor_name(&self) -> &str {
        self.executor.name()
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlockError;

    fn config() -> FlockConfig {
        FlockConfig::default().with_count(120).with_seed(5)
    }

    #[test]
    fn test_new_spawns_configured_count() {
        let sim = FlockSimulation::new(config()).unwrap();
        assert_eq!(sim.flock().len(), 120);
        assert_eq!(sim.strategy(), Strategy::Sequential);
        assert_eq!(sim.executor_name(), "sequential");
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let result = FlockSimulation::new(config().with_viewport(150.0, 150.0));
        assert!(matches!(result, Err(FlockError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_step_records_stats_and_keeps_ids() {
        let mut sim = FlockSimulation::new(config()).unwrap();
        sim.run(3).unwrap();
        assert_eq!(sim.stats().frame_count(), 3);
        let ids: Vec<u32> = sim.flock().iter().map(|b| b.id()).collect();
        assert_eq!(ids, (0..120).collect::<Vec<u32>>());
    }

    #[test]
    fn test_reset_respawns_seeded_population() {
        let mut sim = FlockSimulation::new(config()).unwrap();
        let initial: Vec<_> = sim.flock().iter().map(|b| b.position).collect();
        sim.run(2).unwrap();
        sim.reset().unwrap();
        let respawned: Vec<_> = sim.flock().iter().map(|b| b.position).collect();
        assert_eq!(initial, respawned);
        assert_eq!(sim.stats().frame_count(), 0);
    }

    #[test]
    fn test_switching_strategy_keeps_trajectory() {
        let mut a = FlockSimulation::new(config()).unwrap();
        let mut b = FlockSimulation::new(config()).unwrap();
        b.set_strategy(Strategy::SharedMemoryParallel).unwrap();

        a.run(4).unwrap();
        b.run(4).unwrap();
        for (x, y) in a.flock().iter().zip(b.flock().iter()) {
            assert_eq!(x.position, y.position);
            assert_eq!(x.velocity, y.velocity);
            assert_eq!(x.color, y.color);
        }
    }
}
