// src/wgpu_utils/mod.rs
//! WGPU buffer and binding helpers used by the GPU compute device

pub mod binding_types;
pub mod uniform_buffer;

pub use binding_types::*;
pub use uniform_buffer::{ArrayBuffer, UniformBuffer};
