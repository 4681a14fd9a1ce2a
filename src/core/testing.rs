// src/core/testing.rs

//! Test-only helpers: random point sets and a brute-force reference search.

use crate::core::kdtree::{Coordinate, KdPoint};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Lower bound for generated coordinates.
const AXIS_POSITION_MIN: f64 = 100_000.0;
/// Upper bound (exclusive) for generated coordinates.
const AXIS_POSITION_MAX: f64 = 1_000_000.0;

/// Generates uniformly distributed `f64` points from a fixed seed.
pub struct RandomPointGenerator {
    rng: StdRng,
}

impl RandomPointGenerator {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    pub fn generate_points(&mut self, dimensions: usize, count: usize) -> Vec<KdPoint<f64>> {
        (0..count)
            .map(|_| {
                (0..dimensions)
                    .map(|_| self.rng.gen_range(AXIS_POSITION_MIN..AXIS_POSITION_MAX))
                    .collect::<Vec<f64>>()
                    .into()
            })
            .collect()
    }
}

/// Smallest squared distance from `query` to any point not equal to it.
pub fn brute_force_nearest_distance<T: Coordinate>(points: &[KdPoint<T>], query: &KdPoint<T>) -> Option<f64> {
    points
        .iter()
        .filter(|p| *p != query)
        .map(|p| p.distance_squared(query).unwrap())
        .min_by(|a, b| a.partial_cmp(b).unwrap())
}

/// Routes `tracing` output through the test harness; safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().with_max_level(tracing::Level::DEBUG).try_init();
}
