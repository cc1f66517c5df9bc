/*
 * Boundary Module
 *
 * Remaps a point that has left the bounded volume back inside it.
 *
 * - Wrap: toroidal. Leaving through one face re-enters near the opposite
 *   face at the same penetration depth.
 * - Mirror: the overflow is folded back from the face it crossed. Only the
 *   position is reflected; the velocity keeps its direction, so a boid will
 *   tend to re-cross the same face next tick. `reflect_velocity` opts into
 *   a bounce that also negates the crossed velocity components.
 *
 * Axes are checked X, Y, Z in turn, high face before low face, and the
 * checks are not exclusive: a point past two faces is remapped on both.
 */

use glam::{BVec3, DVec3};
use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds, Interval};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryMode {
    #[default]
    Wrap,
    Mirror,
}

impl BoundaryMode {
    pub fn toggled(self) -> Self {
        match self {
            BoundaryMode::Wrap => BoundaryMode::Mirror,
            BoundaryMode::Mirror => BoundaryMode::Wrap,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryPolicy {
    pub bounds: Bounds,
    pub mode: BoundaryMode,
    pub reflect_velocity: bool,
}

impl BoundaryPolicy {
    pub fn new(bounds: Bounds, mode: BoundaryMode) -> Self {
        Self {
            bounds,
            mode,
            reflect_velocity: false,
        }
    }

    pub fn with_velocity_reflection(mut self, enabled: bool) -> Self {
        self.reflect_velocity = enabled;
        self
    }

    pub fn remap(&self, point: DVec3) -> DVec3 {
        self.remap_with_crossings(point).0
    }

    /// Remap `point` and report which axes crossed a face.
    pub fn remap_with_crossings(&self, point: DVec3) -> (DVec3, BVec3) {
        let c = self.bounds.center;
        let (x, cx) = remap_axis(point.x, c.x, self.bounds.x, self.mode);
        let (y, cy) = remap_axis(point.y, c.y, self.bounds.y, self.mode);
        let (z, cz) = remap_axis(point.z, c.z, self.bounds.z, self.mode);
        (DVec3::new(x, y, z), BVec3::new(cx, cy, cz))
    }

    // Velocity after a remap. Untouched unless the bounce variant is on.
    pub fn adjust_velocity(&self, velocity: DVec3, crossed: BVec3) -> DVec3 {
        if self.mode != BoundaryMode::Mirror || !self.reflect_velocity {
            return velocity;
        }
        DVec3::select(crossed, -velocity, velocity)
    }
}

// The face test includes the center. Wrap keeps it through `v`, since
// `t0 + (v - t1)` is `(c + t0) + depth`; Mirror's `t1 - (v - t1)` drops it
// and only lands on the true face when the center is zero.
#[inline]
fn remap_axis(value: f64, center: f64, iv: Interval, mode: BoundaryMode) -> (f64, bool) {
    let mut v = value;
    let mut crossed = false;

    if v > iv.t1 + center {
        v = match mode {
            BoundaryMode::Wrap => iv.t0 + (v - iv.t1),
            BoundaryMode::Mirror => iv.t1 - (v - iv.t1),
        };
        crossed = true;
    }
    if v < iv.t0 + center {
        v = match mode {
            BoundaryMode::Wrap => iv.t1 - (iv.t0 - v),
            BoundaryMode::Mirror => iv.t0 + (iv.t0 - v),
        };
        crossed = true;
    }

    (v, crossed)
}
