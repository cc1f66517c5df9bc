/*
 * Curve Module
 *
 * Parametric curves the flock can be attracted to. A curve answers two
 * questions: which parameter is closest to a point, and where the curve is
 * at a given parameter. Parameters outside the curve's domain are allowed
 * (the attraction crawl pushes past the ends): closed curves wrap around,
 * open ones clamp to their end points.
 */

use std::f64::consts::TAU;
use std::fmt::Debug;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::{FlockError, FlockResult};

pub trait Curve: Debug + Send + Sync {
    fn closest_parameter(&self, point: DVec3) -> f64;

    fn point_at(&self, t: f64) -> DVec3;
}

// ── Polyline ──────────────────────────────────────────────────────────────────

/// Straight segments through an ordered list of points. Segment `i` spans
/// parameters `[i, i + 1]`. A polyline whose first and last points coincide
/// is closed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub points: Vec<DVec3>,
}

impl Polyline {
    pub fn new(points: Vec<DVec3>) -> Self {
        Self { points }
    }

    /// A polyline suitable as an attractor: at least two points, all finite.
    pub fn attractor(points: Vec<DVec3>) -> FlockResult<Self> {
        if points.len() < 2 {
            return Err(FlockError::InvalidConfiguration(format!(
                "attractor polyline needs at least 2 points, got {}",
                points.len()
            )));
        }
        if points.iter().any(|p| !p.is_finite()) {
            return Err(FlockError::InvalidConfiguration(
                "attractor polyline has a non-finite point".to_string(),
            ));
        }
        Ok(Self::new(points))
    }

    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    pub fn is_closed(&self) -> bool {
        self.points.len() > 2 && self.points.first() == self.points.last()
    }

    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }
}

impl Curve for Polyline {
    fn closest_parameter(&self, point: DVec3) -> f64 {
        let mut best_t = 0.0;
        let mut best_d = f64::INFINITY;

        for (i, w) in self.points.windows(2).enumerate() {
            let (a, b) = (w[0], w[1]);
            let ab = b - a;
            let len_sq = ab.length_squared();
            let s = if len_sq > 0.0 {
                ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let d = point.distance_squared(a + ab * s);
            if d < best_d {
                best_d = d;
                best_t = i as f64 + s;
            }
        }

        best_t
    }

    fn point_at(&self, t: f64) -> DVec3 {
        let segments = self.segment_count();
        if segments == 0 {
            return self.points.first().copied().unwrap_or(DVec3::ZERO);
        }

        let domain = segments as f64;
        let t = if self.is_closed() {
            t.rem_euclid(domain)
        } else {
            t.clamp(0.0, domain)
        };

        let i = (t.floor() as usize).min(segments - 1);
        let s = t - i as f64;
        self.points[i].lerp(self.points[i + 1], s)
    }
}

// ── Circle ────────────────────────────────────────────────────────────────────

/// Circle parameterized by angle in radians, period 2π.
#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    pub center: DVec3,
    pub radius: f64,
    x_axis: DVec3,
    y_axis: DVec3,
}

impl Circle {
    pub fn new(center: DVec3, normal: DVec3, radius: f64) -> FlockResult<Self> {
        let normal = normal.try_normalize().ok_or_else(|| {
            FlockError::InvalidConfiguration(format!("circle normal {normal} has no direction"))
        })?;
        if !(radius.is_finite() && radius > 0.0) || !center.is_finite() {
            return Err(FlockError::InvalidConfiguration(format!(
                "circle needs a finite center and positive radius, got radius {radius}"
            )));
        }
        let (x_axis, y_axis) = normal.any_orthonormal_pair();
        Ok(Self {
            center,
            radius,
            x_axis,
            y_axis,
        })
    }

    /// Circle in the world XY plane.
    pub fn in_xy(center: DVec3, radius: f64) -> FlockResult<Self> {
        let mut circle = Self::new(center, DVec3::Z, radius)?;
        circle.x_axis = DVec3::X;
        circle.y_axis = DVec3::Y;
        Ok(circle)
    }
}

impl Curve for Circle {
    fn closest_parameter(&self, point: DVec3) -> f64 {
        let d = point - self.center;
        let (u, v) = (d.dot(self.x_axis), d.dot(self.y_axis));
        if u == 0.0 && v == 0.0 {
            // every point on the circle is equally close
            return 0.0;
        }
        v.atan2(u).rem_euclid(TAU)
    }

    fn point_at(&self, t: f64) -> DVec3 {
        let (sin, cos) = t.sin_cos();
        self.center + (self.x_axis * cos + self.y_axis * sin) * self.radius
    }
}
