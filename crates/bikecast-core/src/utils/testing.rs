//! Seeded synthetic series for tests and benchmarks

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Standard Gaussian white noise
pub fn white_noise(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.sample::<f64, _>(StandardNormal)).collect()
}

/// AR(1) process with unit-variance innovations
pub fn ar1(n: usize, phi: f64, seed: u64) -> Vec<f64> {
    let mut prev = 0.0;
    white_noise(n, seed)
        .into_iter()
        .map(|e| {
            prev = phi * prev + e;
            prev
        })
        .collect()
}

/// Cumulative sum of white noise
pub fn random_walk(n: usize, seed: u64) -> Vec<f64> {
    let mut level = 0.0;
    white_noise(n, seed)
        .into_iter()
        .map(|e| {
            level += e;
            level
        })
        .collect()
}
