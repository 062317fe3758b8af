//! # Simulation Configuration
//!
//! Settings for a flock run, split the same way the simulation uses them:
//!
//! - [`FlockRules`]: the flocking rule weights and ranges read by the kernel
//! - [`EdgeMargins`]: where the viewport edges start pushing boids back
//! - [`FlockConfig`]: everything a [`crate::FlockSimulation`] needs, including
//!   the population size and the execution strategy
//!
//! All three have sensible defaults matching a 1920x1080 viewport and can be
//! adjusted with consuming `with_*` builders.
//!
//! ```no_run
//! use boids::config::{FlockConfig, Strategy};
//!
//! let config = FlockConfig::default()
//!     .with_viewport(1280.0, 720.0)
//!     .with_count(5000)
//!     .with_strategy(Strategy::SharedMemoryParallel)
//!     .with_seed(7);
//! config.validate().unwrap();
//! ```

use crate::error::{FlockError, Result};
use std::fmt;

/// Smallest viewport side the initializer accepts (exclusive).
pub const MIN_VIEWPORT_SIDE: f64 = 200.0;

/// Weights and ranges of the flocking rules.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlockRules {
    /// Half-width of the bounding box used to prefilter neighbors
    pub max_range: f64,
    /// Neighbors closer than this (but not too close) count for alignment/cohesion
    pub visible_range: f64,
    /// Neighbors closer than this push the boid away
    pub close_range: f64,
    pub centering_factor: f64,
    pub matching_factor: f64,
    pub avoid_factor: f64,
    pub turn_factor: f64,
    pub min_speed: f64,
    pub max_speed: f64,
}

impl Default for FlockRules {
    fn default() -> Self {
        Self {
            max_range: 40.0,
            visible_range: 35.0,
            close_range: 3.5,
            // Cohesion is switched off but stays tunable
            centering_factor: 0.0,
            matching_factor: 0.05,
            avoid_factor: 0.1,
            turn_factor: 0.2,
            min_speed: 1.0,
            max_speed: 1.6,
        }
    }
}

impl FlockRules {
    pub fn visible_range_squared(&self) -> f64 {
        self.visible_range * self.visible_range
    }

    pub fn close_range_squared(&self) -> f64 {
        self.close_range * self.close_range
    }

    pub fn with_centering_factor(mut self, factor: f64) -> Self {
        self.centering_factor = factor;
        self
    }

    pub fn with_matching_factor(mut self, factor: f64) -> Self {
        self.matching_factor = factor;
        self
    }

    pub fn with_avoid_factor(mut self, factor: f64) -> Self {
        self.avoid_factor = factor;
        self
    }

    pub fn with_turn_factor(mut self, factor: f64) -> Self {
        self.turn_factor = factor;
        self
    }

    /// Sets the speed clamp range
    pub fn with_speed_limits(mut self, min_speed: f64, max_speed: f64) -> Self {
        self.min_speed = min_speed;
        self.max_speed = max_speed;
        self
    }

    /// Sets the prefilter box, visible and close ranges
    pub fn with_ranges(mut self, max_range: f64, visible_range: f64, close_range: f64) -> Self {
        self.max_range = max_range;
        self.visible_range = visible_range;
        self.close_range = close_range;
        self
    }

    /// Checks that ranges and speeds are finite and ordered
    pub fn validate(&self) -> Result<()> {
        let values = [
            self.max_range,
            self.visible_range,
            self.close_range,
            self.centering_factor,
            self.matching_factor,
            self.avoid_factor,
            self.turn_factor,
            self.min_speed,
            self.max_speed,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(FlockError::InvalidConfiguration(
                "flock rules must be finite".to_string(),
            ));
        }
        if self.min_speed <= 0.0 || self.min_speed > self.max_speed {
            return Err(FlockError::InvalidConfiguration(format!(
                "speed limits must satisfy 0 < min ({}) <= max ({})",
                self.min_speed, self.max_speed
            )));
        }
        if self.close_range < 0.0 || self.close_range > self.visible_range {
            return Err(FlockError::InvalidConfiguration(format!(
                "close range {} must lie in [0, visible range {}]",
                self.close_range, self.visible_range
            )));
        }
        Ok(())
    }
}

/// Viewport edges that start turning boids back toward the center.
///
/// A boid with `x < low` is pushed right, `x > high_x` pushed left, and the
/// same for `y` against `low` and `high_y`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeMargins {
    pub low: f64,
    pub high_x: f64,
    pub high_y: f64,
}

impl Default for EdgeMargins {
    fn default() -> Self {
        Self {
            low: 50.0,
            high_x: 1870.0,
            high_y: 1030.0,
        }
    }
}

impl EdgeMargins {
    /// Margins inset by `margin` from every side of a `width` x `height` viewport
    pub fn for_viewport(width: f64, height: f64, margin: f64) -> Self {
        Self {
            low: margin,
            high_x: width - margin,
            high_y: height - margin,
        }
    }
}

/// How a frame is scheduled. All strategies compute the same transition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// One thread, boids in id order
    #[default]
    Sequential,
    /// Parallel-for over the boids on a worker pool
    SharedMemoryParallel,
    /// One work-item per boid dispatched to a compute device
    DataOffloadParallel,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [
        Strategy::Sequential,
        Strategy::SharedMemoryParallel,
        Strategy::DataOffloadParallel,
    ];
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Sequential => "sequential",
            Strategy::SharedMemoryParallel => "shared-memory-parallel",
            Strategy::DataOffloadParallel => "data-offload-parallel",
        };
        f.write_str(name)
    }
}

/// Which device runs the data-offload strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OffloadTarget {
    /// Kernel grid emulated on host threads
    #[default]
    Host,
    /// wgpu compute shader; fails if no f64-capable adapter exists
    Gpu,
    /// GPU when available, host otherwise
    Auto,
}

/// Complete configuration of a flock run.
#[derive(Clone, Debug, PartialEq)]
pub struct FlockConfig {
    pub width: f64,
    pub height: f64,
    pub count: usize,
    pub edges: EdgeMargins,
    pub rules: FlockRules,
    pub strategy: Strategy,
    pub offload_target: OffloadTarget,
    /// Dedicated worker count for the parallel strategies; `None` uses all cores
    pub worker_threads: Option<usize>,
    /// Seed for the initial population; `None` draws from the thread RNG
    pub seed: Option<u64>,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
            count: Self::default_count_for(Strategy::Sequential),
            edges: EdgeMargins::default(),
            rules: FlockRules::default(),
            strategy: Strategy::Sequential,
            offload_target: OffloadTarget::Host,
            worker_threads: None,
            seed: None,
        }
    }
}

impl FlockConfig {
    /// Population size that keeps a strategy interactive on typical hardware
    pub fn default_count_for(strategy: Strategy) -> usize {
        match strategy {
            Strategy::Sequential | Strategy::SharedMemoryParallel => 2500,
            Strategy::DataOffloadParallel => 15000,
        }
    }

    /// Sets the viewport and moves the edge margins with it
    pub fn with_viewport(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self.edges = EdgeMargins::for_viewport(width, height, self.edges.low);
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_edges(mut self, edges: EdgeMargins) -> Self {
        self.edges = edges;
        self
    }

    pub fn with_rules(mut self, rules: FlockRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_offload_target(mut self, target: OffloadTarget) -> Self {
        self.offload_target = target;
        self
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Rejects viewports the initializer cannot sample from and other bad values
    pub fn validate(&self) -> Result<()> {
        validate_viewport(self.width, self.height)?;
        if self.count > u32::MAX as usize {
            return Err(FlockError::InvalidConfiguration(format!(
                "count {} exceeds the id space of {}",
                self.count,
                u32::MAX
            )));
        }
        if self.worker_threads == Some(0) {
            return Err(FlockError::InvalidConfiguration(
                "worker thread count must be at least 1".to_string(),
            ));
        }
        let edges = [self.edges.low, self.edges.high_x, self.edges.high_y];
        if edges.iter().any(|v| !v.is_finite()) {
            return Err(FlockError::InvalidConfiguration(
                "edge margins must be finite".to_string(),
            ));
        }
        self.rules.validate()
    }
}

pub(crate) fn validate_viewport(width: f64, height: f64) -> Result<()> {
    if !width.is_finite() || !height.is_finite() {
        return Err(FlockError::InvalidConfiguration(format!(
            "viewport {width}x{height} must be finite"
        )));
    }
    if width <= MIN_VIEWPORT_SIDE || height <= MIN_VIEWPORT_SIDE {
        return Err(FlockError::InvalidConfiguration(format!(
            "viewport {width}x{height} must be larger than {MIN_VIEWPORT_SIDE} on both sides"
        )));
    }
    Ok(())
}
