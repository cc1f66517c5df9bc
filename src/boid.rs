/*
 * Boid Module
 *
 * This module defines the Boid struct and its behavior.
 * A boid carries an acceleration accumulator that the steering rules add
 * into during a tick; `tick` consumes it exactly once:
 * 1. Position: move by the current velocity, then apply the boundary policy
 * 2. Velocity: add the accumulated acceleration, floored at `min_speed`
 * 3. Acceleration: reported back to the caller, then reset to zero
 */

use glam::DVec3;

use crate::boundary::BoundaryPolicy;
use crate::seed;
use crate::{INITIAL_SPEED, MIN_SPEED};

#[derive(Debug, Clone)]
pub struct Boid {
    pub position: DVec3,
    pub velocity: DVec3,
    pub acceleration: DVec3,
    pub min_speed: f64,
    policy: BoundaryPolicy,
}

impl Boid {
    pub fn new(position: DVec3, velocity: DVec3, policy: BoundaryPolicy) -> Self {
        Self {
            position,
            velocity,
            acceleration: DVec3::ZERO,
            min_speed: MIN_SPEED,
            policy,
        }
    }

    // Random initial heading at INITIAL_SPEED, reproducible from `seed`
    pub fn seeded(position: DVec3, policy: BoundaryPolicy, seed: u64) -> Self {
        Self::new(position, seed::random_vector(INITIAL_SPEED, seed), policy)
    }

    pub fn policy(&self) -> &BoundaryPolicy {
        &self.policy
    }

    /// Add `(desired - velocity) * weight` to the accumulator.
    ///
    /// Contributions from different rules sum linearly; nothing here
    /// normalizes or clamps the result.
    pub fn steer_towards(&mut self, desired: DVec3, weight: f64) {
        self.acceleration += (desired - self.velocity) * weight;
    }

    /// Advance one step and return the acceleration that was applied.
    pub fn tick(&mut self) -> DVec3 {
        let (position, crossed) = self.policy.remap_with_crossings(self.position + self.velocity);
        self.position = position;

        let velocity = self.floored(self.velocity + self.acceleration);
        self.velocity = self.policy.adjust_velocity(velocity, crossed);

        std::mem::replace(&mut self.acceleration, DVec3::ZERO)
    }

    // Rescale to exactly min_speed when too slow, keeping direction.
    // A zero vector has no direction, so it is sent along +X.
    fn floored(&self, velocity: DVec3) -> DVec3 {
        if velocity.length() < self.min_speed {
            velocity.try_normalize().unwrap_or(DVec3::X) * self.min_speed
        } else {
            velocity
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryMode;
    use crate::geometry::Bounds;
    use approx::assert_relative_eq;

    fn open_policy() -> BoundaryPolicy {
        BoundaryPolicy::new(Bounds::cube(DVec3::ZERO, 1000.0), BoundaryMode::Wrap)
    }

    #[test]
    fn steering_contributions_add_up() {
        let mut b = Boid::new(DVec3::ZERO, DVec3::new(2.0, 0.0, 0.0), open_policy());
        b.steer_towards(DVec3::new(0.0, 2.0, 0.0), 0.5);
        b.steer_towards(DVec3::new(4.0, 0.0, 0.0), 1.0);
        assert_eq!(b.acceleration, DVec3::new(-1.0, 1.0, 0.0) + DVec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn tick_moves_with_old_velocity_and_resets_accumulator() {
        let mut b = Boid::new(DVec3::ZERO, DVec3::new(2.0, 0.0, 0.0), open_policy());
        b.steer_towards(DVec3::new(2.0, 3.0, 0.0), 1.0);
        let applied = b.tick();

        assert_eq!(applied, DVec3::new(0.0, 3.0, 0.0));
        assert_eq!(b.position, DVec3::new(2.0, 0.0, 0.0));
        assert_eq!(b.velocity, DVec3::new(2.0, 3.0, 0.0));
        assert_eq!(b.acceleration, DVec3::ZERO);
    }

    #[test]
    fn slow_velocity_is_raised_to_min_speed() {
        let mut b = Boid::new(DVec3::ZERO, DVec3::new(0.3, 0.4, 0.0), open_policy());
        b.tick();
        assert_relative_eq!(b.velocity.length(), MIN_SPEED, epsilon = 1e-12);
        assert_relative_eq!(b.velocity.x / b.velocity.y, 0.75, epsilon = 1e-12);
    }

    #[test]
    fn zero_velocity_falls_back_to_x_axis() {
        let mut b = Boid::new(DVec3::ZERO, DVec3::new(1.0, 0.0, 0.0), open_policy());
        b.steer_towards(DVec3::ZERO, 1.0);
        b.tick();
        assert_eq!(b.velocity, DVec3::new(MIN_SPEED, 0.0, 0.0));
    }

    #[test]
    fn seeded_boid_starts_at_initial_speed() {
        let b = Boid::seeded(DVec3::ZERO, open_policy(), 11);
        assert_relative_eq!(b.velocity.length(), INITIAL_SPEED, epsilon = 1e-12);
        assert_eq!(b.min_speed, MIN_SPEED);
    }
}
