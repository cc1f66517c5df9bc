/*
 * Seed Module
 *
 * Deterministic per-boid seeding. Each boid's initial velocity comes from
 * its own `SmallRng`, seeded by
 *
 *   seed = base_seed XOR (index * MIXING_CONSTANT)
 *
 * so a given base seed always reproduces the same flock, and appending
 * boids never disturbs the velocities of the existing ones. Wall-clock
 * seeding is only used when asked for explicitly.
 */

use std::time::{SystemTime, UNIX_EPOCH};

use glam::DVec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds, Interval};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedSource {
    Fixed(u64),
    WallClock,
}

impl Default for SeedSource {
    fn default() -> Self {
        SeedSource::Fixed(0)
    }
}

impl SeedSource {
    /// Resolve to a concrete base seed. `WallClock` reads the current time in
    /// milliseconds, so two setups in the same millisecond get the same flock.
    pub fn resolve(self) -> u64 {
        match self {
            SeedSource::Fixed(seed) => seed,
            SeedSource::WallClock => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0),
        }
    }
}

#[inline]
pub fn agent_seed(base: u64, index: usize) -> u64 {
    base ^ (index as u64).wrapping_mul(MIXING_CONSTANT)
}

// Components in [0, 1), normalized: every direction lies in the positive
// octant. Falls back to +X in the (practically unreachable) all-zero case.
fn unit_direction(rng: &mut SmallRng) -> DVec3 {
    let v = DVec3::new(rng.gen(), rng.gen(), rng.gen());
    v.try_normalize().unwrap_or(DVec3::X)
}

/// Random vector of exactly `magnitude` length.
pub fn random_vector(magnitude: f64, seed: u64) -> DVec3 {
    random_vector_in_range(Interval::new(magnitude, magnitude), seed)
}

/// Random vector whose length is drawn uniformly from `magnitude`.
pub fn random_vector_in_range(magnitude: Interval, seed: u64) -> DVec3 {
    let mut rng = SmallRng::seed_from_u64(seed);
    let dir = unit_direction(&mut rng);
    dir * magnitude.parameter_at(rng.gen())
}

/// `count` points scattered uniformly inside `bounds`.
pub fn random_positions(bounds: &Bounds, count: usize, seed: u64) -> Vec<DVec3> {
    (0..count)
        .map(|i| {
            let mut rng = SmallRng::seed_from_u64(agent_seed(seed, i));
            bounds.point_at(DVec3::new(rng.gen(), rng.gen(), rng.gen()))
        })
        .collect()
}
