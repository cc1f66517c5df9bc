/*
 * Geometry Module
 *
 * Axis-aligned bounded volume used by the flock and its boundary policy.
 * A volume is a center point plus one interval per axis; the intervals
 * are offsets from the center, so a cube of half-size 15 around the origin
 * is `center = 0` with `[-15, 15]` on every axis.
 */

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::{FlockError, FlockResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub t0: f64,
    pub t1: f64,
}

impl Interval {
    pub const fn new(t0: f64, t1: f64) -> Self {
        Self { t0, t1 }
    }

    pub fn length(&self) -> f64 {
        self.t1 - self.t0
    }

    // Map a normalized parameter (0 at t0, 1 at t1) onto the interval
    pub fn parameter_at(&self, normalized: f64) -> f64 {
        self.t0 + normalized * (self.t1 - self.t0)
    }

    pub fn is_valid(&self) -> bool {
        self.t0.is_finite() && self.t1.is_finite() && self.t0 <= self.t1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub center: DVec3,
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::cube(DVec3::ZERO, 15.0)
    }
}

impl Bounds {
    pub fn new(center: DVec3, x: Interval, y: Interval, z: Interval) -> Self {
        Self { center, x, y, z }
    }

    /// Symmetric volume: `[-half, half]` on every axis around `center`.
    pub fn cube(center: DVec3, half: f64) -> Self {
        Self::with_half_extents(center, DVec3::splat(half))
    }

    /// Symmetric volume with independent half-extents per axis.
    pub fn with_half_extents(center: DVec3, half: DVec3) -> Self {
        Self::new(
            center,
            Interval::new(-half.x, half.x),
            Interval::new(-half.y, half.y),
            Interval::new(-half.z, half.z),
        )
    }

    pub fn axes(&self) -> [Interval; 3] {
        [self.x, self.y, self.z]
    }

    pub fn min(&self) -> DVec3 {
        self.center + DVec3::new(self.x.t0, self.y.t0, self.z.t0)
    }

    pub fn max(&self) -> DVec3 {
        self.center + DVec3::new(self.x.t1, self.y.t1, self.z.t1)
    }

    pub fn extent(&self) -> DVec3 {
        DVec3::new(self.x.length(), self.y.length(), self.z.length())
    }

    pub fn contains(&self, point: DVec3) -> bool {
        let (lo, hi) = (self.min(), self.max());
        point.cmpge(lo).all() && point.cmple(hi).all()
    }

    // Point at normalized coordinates inside the volume; (0.5, 0.5, 0.5) is
    // the middle of the intervals, not necessarily the center point
    pub fn point_at(&self, normalized: DVec3) -> DVec3 {
        self.center
            + DVec3::new(
                self.x.parameter_at(normalized.x),
                self.y.parameter_at(normalized.y),
                self.z.parameter_at(normalized.z),
            )
    }

    pub fn validate(&self) -> FlockResult<()> {
        if !self.center.is_finite() {
            return Err(FlockError::InvalidConfiguration(format!(
                "bounds center {} is not finite",
                self.center
            )));
        }
        for (name, iv) in ["x", "y", "z"].iter().zip(self.axes()) {
            if !iv.is_valid() {
                return Err(FlockError::InvalidConfiguration(format!(
                    "bounds {name} interval [{}, {}] is empty or not finite",
                    iv.t0, iv.t1
                )));
            }
        }
        Ok(())
    }
}
