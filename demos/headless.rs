//! # Headless Flock Run
//!
//! Steps a flock through every update strategy without a window and prints
//! frame timings for each, so the strategies can be compared on one machine.
//!
//! ## Usage
//!
//! Run with: `cargo run --release --example headless -- [count] [frames] [gpu]`
//!
//! Passing `gpu` as the third argument offloads the data-offload strategy to
//! a GPU when one with f64 shader support is present, falling back to the
//! host device otherwise. Set `RUST_LOG=debug` for per-frame timings.

use anyhow::Context;
use boids::prelude::*;

const DEFAULT_FRAMES: usize = 300;
const SEED: u64 = 2024;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let count = match args.next() {
        Some(arg) => arg.parse().context("count must be a whole number")?,
        None => FlockConfig::default_count_for(Strategy::SharedMemoryParallel),
    };
    let frames = match args.next() {
        Some(arg) => arg.parse().context("frames must be a whole number")?,
        None => DEFAULT_FRAMES,
    };
    let offload_target = match args.next().as_deref() {
        Some("gpu") => OffloadTarget::Auto,
        _ => OffloadTarget::Host,
    };

    println!("Boids: {count} agents, {frames} frames per strategy");
    println!();

    for strategy in Strategy::ALL {
        let config = FlockConfig::default()
            .with_count(count)
            .with_strategy(strategy)
            .with_offload_target(offload_target)
            .with_seed(SEED);
        let mut sim = FlockSimulation::new(config)
            .with_context(|| format!("failed to set up {strategy} simulation"))?;

        sim.run(frames)
            .with_context(|| format!("{strategy} frame failed"))?;

        let stats = sim.stats();
        println!(
            "{:<24} {:>9.3} ms avg  {:>9.3} ms min  {:>9.3} ms max  {:>8.1} fps  ({})",
            strategy.to_string(),
            stats.average().as_secs_f64() * 1000.0,
            stats.min().unwrap_or_default().as_secs_f64() * 1000.0,
            stats.max().unwrap_or_default().as_secs_f64() * 1000.0,
            stats.frames_per_second(),
            sim.executor_name(),
        );
    }

    Ok(())
}
