/*
 * Attractor Module
 *
 * An ordered set of curves the flock is drawn towards. The field itself is
 * stateless: the crawl that keeps the target sliding along a curve is the
 * parameter offset passed into each query.
 */

use std::sync::Arc;

use glam::DVec3;

use crate::curve::Curve;

#[derive(Debug, Clone, Default)]
pub struct AttractorField {
    curves: Vec<Arc<dyn Curve>>,
}

impl AttractorField {
    pub fn new(curves: Vec<Arc<dyn Curve>>) -> Self {
        Self { curves }
    }

    pub fn set(&mut self, curves: Vec<Arc<dyn Curve>>) {
        self.curves = curves;
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn curves(&self) -> &[Arc<dyn Curve>] {
        &self.curves
    }

    /// Closest target across all curves, each evaluated `crawl` past its
    /// closest parameter to `point`. The first curve wins ties.
    pub fn nearest_point(&self, point: DVec3, crawl: f64) -> Option<DVec3> {
        let mut best: Option<(f64, DVec3)> = None;

        for curve in &self.curves {
            let target = curve.point_at(curve.closest_parameter(point) + crawl);
            let d = target.distance(point);
            match best {
                Some((min_d, _)) if d >= min_d => {}
                _ => best = Some((d, target)),
            }
        }

        best.map(|(_, target)| target)
    }
}
