// src/protocol/seed.rs
//
// Trial seeds.
//
// The orchestrator draws one seed per trial before dispatch. Seeds mix the
// wall clock with a process-wide counter so that seeds issued within the
// same clock tick still differ, and the environment and the learner of a
// trial get distinct streams derived from the trial seed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static SEED_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Stream index of the environment generator.
pub const ENVIRONMENT_STREAM: u64 = 0;
/// Stream index of the learner generator.
pub const LEARNER_STREAM: u64 = 1;
/// First stream of the per-value seeds of a parameter sweep.
pub const SWEEP_STREAM: u64 = 2;

/// SplitMix64 finalizer.
pub fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Time-derived seed, distinct for every call in this process.
pub fn time_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let n = SEED_COUNTER.fetch_add(1, Ordering::Relaxed);
    splitmix64(nanos ^ splitmix64(n))
}

/// Seed of sub-stream `stream` of `seed`.
pub fn derive_seed(seed: u64, stream: u64) -> u64 {
    splitmix64(seed ^ splitmix64(stream.wrapping_add(1)))
}

/// Seed of the `index`-th value of a sweep played in one trial. The first
/// value uses the trial seed itself, so a single-value sweep plays exactly
/// like a plain trial.
pub fn sweep_seed(seed: u64, index: usize) -> u64 {
    if index == 0 {
        seed
    } else {
        derive_seed(seed, SWEEP_STREAM + index as u64)
    }
}
