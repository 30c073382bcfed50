//! Fixture helpers shared by benchmark cases.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seed used by the bundled cases so repeated runs see identical data.
pub const FIXTURE_SEED: u64 = 0x5eed_f00d;

/// `len` values uniformly drawn from `[0, 1)`.
pub fn random_f32(len: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.random::<f32>()).collect()
}

/// `len` values uniformly drawn from `[-1, 1)`.
pub fn random_signed_f32(len: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.random_range(-1.0..1.0)).collect()
}
