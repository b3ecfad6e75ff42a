/// Thread pool setup for multi-file analysis.

use anyhow::{Context, Result};
use tracing::info;

/// Initialize the global rayon thread pool with half the available cores,
/// minimum 1 worker.
pub fn init_thread_pool() -> Result<usize> {
    let cores = num_cpus::get();
    let workers = std::cmp::max(1, cores / 2);

    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build_global()
        .context("Failed to initialize the global thread pool")?;

    info!(workers, cores, "initialized thread pool");
    Ok(workers)
}
