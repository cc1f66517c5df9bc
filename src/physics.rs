/*
 * Physics Module
 *
 * The steering rules applied to one boid per tick:
 * alignment, cohesion, separation and curve attraction.
 *
 * Neighbor data for the first three rules is gathered in one pass over a
 * candidate list (the whole flock, or what the spatial grid returns). A
 * neighbor is any other boid at a different position closer than the
 * perception radius; boids sharing the exact position of the one being
 * steered are skipped, itself included.
 */

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::attractor::AttractorField;
use crate::boid::Boid;
use crate::curve::Polyline;

/// Tunable weights. Any of them may change between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockWeights {
    pub perception_radius: f64,
    pub alignment: f64,
    pub cohesion: f64,
    pub separation: f64,
    pub attraction: f64,
    pub crawl_speed: f64,
}

impl Default for FlockWeights {
    fn default() -> Self {
        Self {
            perception_radius: 15.0,
            alignment: 0.1,
            cohesion: 0.1,
            separation: 0.1,
            attraction: 0.1,
            crawl_speed: 0.05,
        }
    }
}

impl FlockWeights {
    // Every rule off; switch single rules back on with struct update syntax
    pub fn zeroed(perception_radius: f64) -> Self {
        Self {
            perception_radius,
            alignment: 0.0,
            cohesion: 0.0,
            separation: 0.0,
            attraction: 0.0,
            crawl_speed: 0.0,
        }
    }
}

// Running sums over the neighbor set of one boid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighborhood {
    pub count: usize,
    pub velocity_sum: DVec3,
    // seeded with the boid's own position
    pub position_sum: DVec3,
    pub proximity_sum: DVec3,
}

impl Neighborhood {
    pub fn gather(
        boids: &[Boid],
        index: usize,
        candidates: impl IntoIterator<Item = usize>,
        perception_radius: f64,
    ) -> Self {
        let me = boids[index].position;
        let mut n = Neighborhood {
            count: 0,
            velocity_sum: DVec3::ZERO,
            position_sum: me,
            proximity_sum: DVec3::ZERO,
        };

        for j in candidates {
            let other = &boids[j];
            if other.position == me {
                continue;
            }
            let proximity = me - other.position;
            if proximity.length() < perception_radius {
                n.count += 1;
                n.velocity_sum += other.velocity;
                n.position_sum += other.position;
                n.proximity_sum += proximity;
            }
        }

        n
    }

    fn mean(&self, sum: DVec3) -> DVec3 {
        if self.count > 0 {
            sum / self.count as f64
        } else {
            sum
        }
    }

    /// Average neighbor velocity, zero without neighbors.
    pub fn alignment_target(&self) -> DVec3 {
        self.mean(self.velocity_sum)
    }

    // The boid's own position sits in the sum but not in the divisor, which
    // biases small neighborhoods towards the boid itself
    pub fn cohesion_target(&self, position: DVec3) -> DVec3 {
        self.mean(self.position_sum) - position
    }

    pub fn separation_target(&self) -> DVec3 {
        self.mean(self.proximity_sum)
    }
}

/// Apply all four rules to `boid`, in order, without advancing it.
pub fn steer(
    boid: &mut Boid,
    neighbors: &Neighborhood,
    attraction_target: Option<DVec3>,
    weights: &FlockWeights,
) {
    boid.steer_towards(neighbors.alignment_target(), weights.alignment);
    let cohesion = neighbors.cohesion_target(boid.position);
    boid.steer_towards(cohesion, weights.cohesion);
    boid.steer_towards(neighbors.separation_target(), weights.separation);

    if let Some(target) = attraction_target {
        let pull = target - boid.position;
        boid.steer_towards(pull, weights.attraction);
    }
}

#[inline]
pub fn attraction_target(field: &AttractorField, position: DVec3, weights: &FlockWeights) -> Option<DVec3> {
    if field.is_empty() {
        None
    } else {
        field.nearest_point(position, weights.crawl_speed)
    }
}

/// `[position - velocity, position, position + applied]` for display.
pub fn trail(boid: &Boid, applied: DVec3) -> Polyline {
    Polyline::new(vec![
        boid.position - boid.velocity,
        boid.position,
        boid.position + applied,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{BoundaryMode, BoundaryPolicy};
    use crate::geometry::Bounds;

    fn boid(p: DVec3, v: DVec3) -> Boid {
        Boid::new(p, v, BoundaryPolicy::new(Bounds::cube(DVec3::ZERO, 100.0), BoundaryMode::Wrap))
    }

    #[test]
    fn gather_skips_self_coincident_and_distant_boids() {
        let boids = vec![
            boid(DVec3::ZERO, DVec3::X),
            boid(DVec3::ZERO, DVec3::Y),
            boid(DVec3::new(3.0, 0.0, 0.0), DVec3::Z),
            boid(DVec3::new(5.0, 0.0, 0.0), DVec3::ONE),
        ];
        let n = Neighborhood::gather(&boids, 0, 0..boids.len(), 5.0);
        assert_eq!(n.count, 1);
        assert_eq!(n.velocity_sum, DVec3::Z);
        assert_eq!(n.position_sum, DVec3::new(3.0, 0.0, 0.0));
        assert_eq!(n.proximity_sum, DVec3::new(-3.0, 0.0, 0.0));
    }

    #[test]
    fn cohesion_average_is_seeded_with_own_position() {
        let boids = vec![
            boid(DVec3::new(2.0, 0.0, 0.0), DVec3::X),
            boid(DVec3::new(4.0, 0.0, 0.0), DVec3::X),
        ];
        let n = Neighborhood::gather(&boids, 0, 0..2, 10.0);
        // (2 + 4) / 1 - 2
        assert_eq!(n.cohesion_target(boids[0].position), DVec3::new(4.0, 0.0, 0.0));
    }

    #[test]
    fn empty_neighborhood_targets() {
        let boids = vec![boid(DVec3::new(1.0, 2.0, 3.0), DVec3::X)];
        let n = Neighborhood::gather(&boids, 0, 0..1, 10.0);
        assert_eq!(n.count, 0);
        assert_eq!(n.alignment_target(), DVec3::ZERO);
        assert_eq!(n.cohesion_target(boids[0].position), DVec3::ZERO);
        assert_eq!(n.separation_target(), DVec3::ZERO);
    }

    #[test]
    fn isolated_boid_is_damped_along_its_heading() {
        let mut b = boid(DVec3::ZERO, DVec3::new(2.0, 0.0, 0.0));
        let n = Neighborhood::gather(std::slice::from_ref(&b), 0, 0..1, 10.0);
        steer(&mut b, &n, None, &FlockWeights::default());
        // three rules at 0.1 each, all pulling towards zero velocity
        assert!(b.acceleration.abs_diff_eq(DVec3::new(-0.6, 0.0, 0.0), 1e-12));
    }

    #[test]
    fn attraction_pulls_towards_target() {
        let mut b = boid(DVec3::ZERO, DVec3::ZERO);
        let n = Neighborhood::gather(std::slice::from_ref(&b), 0, 0..1, 10.0);
        let weights = FlockWeights {
            attraction: 0.5,
            ..FlockWeights::zeroed(10.0)
        };
        steer(&mut b, &n, Some(DVec3::new(0.0, 4.0, 0.0)), &weights);
        assert_eq!(b.acceleration, DVec3::new(0.0, 2.0, 0.0));
    }
}
