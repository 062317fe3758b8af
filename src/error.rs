//! Error types for the flock simulation
//!
//! The simulation itself is total over finite inputs. Errors come from
//! configuration validation and from setting up or talking to a compute device.

use thiserror::Error;

/// Errors produced while configuring or advancing a flock.
#[derive(Debug, Error)]
pub enum FlockError {
    /// A configuration value is out of its accepted range.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Two boids handed to [`crate::Flock::from_boids`] share an id.
    #[error("duplicate boid id {0}")]
    DuplicateId(u32),

    /// A boid's id does not match its position in the flock.
    #[error("boid at index {index} has id {id}, expected ids 0..n in order")]
    UnexpectedId { index: usize, id: u32 },

    /// No GPU adapter could be found.
    #[error("no compatible GPU adapter found: {0}")]
    NoAdapter(String),

    /// The adapter exists but lacks a feature the compute kernel needs.
    #[error("GPU adapter does not support required feature {0}")]
    MissingFeature(&'static str),

    /// Failed to create the GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    /// Mapping or polling a buffer for readback failed.
    #[error("failed to read back GPU buffer: {0}")]
    BufferMapping(String),

    /// The flock needs more workgroups than a single dispatch allows.
    #[error("{count} boids exceed the dispatch limit of {limit}")]
    DispatchTooLarge { count: usize, limit: usize },

    /// Building the dedicated worker pool failed.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, FlockError>;
