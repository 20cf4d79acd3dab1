use gsst_core::derive_substream_seed;

/// Seed of the substream consumed by tempering attempt `step`.
pub fn step_seed(master_seed: u64, step: u64) -> u64 {
    derive_substream_seed(master_seed, step)
}

/// Master seed for walker `walker` when several sessions share one run seed.
pub fn walker_seed(master_seed: u64, walker: usize) -> u64 {
    derive_substream_seed(master_seed ^ 0xA5A5_A5A5_A5A5_A5A5, walker as u64)
}
