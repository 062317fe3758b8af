//! Host compute device
//!
//! Runs the kernel grid on a dedicated rayon pool. The output buffer is cut
//! into workgroups of [`WORKGROUP_SIZE`] slots and each workgroup is one
//! parallel task, so every task owns disjoint output slots. The pool's
//! `install` returning is the barrier.

use super::{workgroup_count, ComputeDevice, WORKGROUP_SIZE};
use crate::error::Result;
use crate::simulation::boid::Boid;
use crate::simulation::kernel::FlockKernel;
use rayon::prelude::*;

/// Kernel grid evaluated by a pool of `workers` host threads
#[derive(Debug)]
pub struct HostDevice {
    pool: rayon::ThreadPool,
}

impl HostDevice {
    /// One worker per logical CPU
    pub fn new() -> Result<Self> {
        Self::with_workers(num_cpus::get())
    }

    pub fn with_workers(workers: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("flock-device-{i}"))
            .build()?;
        Ok(Self { pool })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl ComputeDevice for HostDevice {
    fn name(&self) -> &str {
        "host"
    }

    fn dispatch(&mut self, snapshot: &[Boid], output: &mut [Boid], kernel: &FlockKernel) -> Result<()> {
        debug_assert_eq!(snapshot.len(), output.len());

        log::trace!(
            "Host dispatch: {} work-items in {} workgroups on {} workers",
            output.len(),
            workgroup_count(output.len()),
            self.workers()
        );

        self.pool.install(|| {
            output
                .par_chunks_mut(WORKGROUP_SIZE)
                .enumerate()
                .for_each(|(group_id, group)| {
                    let base = group_id * WORKGROUP_SIZE;
                    for (local_id, slot) in group.iter_mut().enumerate() {
                        *slot = kernel.update(&snapshot[base + local_id], snapshot);
                    }
                });
        });

        Ok(())
    }
}
