/*
 * Flock Module
 *
 * FlockSimulation owns the boids, the tunable weights, the attractor field
 * and the per-tick output buffers, and advances every boid by exactly one
 * step per `tick` call.
 *
 * The default update order is sequential and in place: boid `i` is steered
 * and moved before boid `i + 1` gathers its neighbors, so later boids see
 * the already-updated state of earlier ones. `UpdateOrder::Snapshot` is the
 * alternative where every boid is steered against the state at the start of
 * the tick (computed in parallel); it diverges numerically from the
 * sequential order and is never the default.
 */

use std::sync::Arc;

use glam::DVec3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::attractor::AttractorField;
use crate::boid::Boid;
use crate::boundary::BoundaryMode;
use crate::curve::{Curve, Polyline};
use crate::geometry::Bounds;
use crate::physics::{self, FlockWeights, Neighborhood};
use crate::spatial_grid::{NeighborSearch, SpatialGrid};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateOrder {
    #[default]
    Sequential,
    Snapshot,
}

/// Per-boid results of one tick, in boid creation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickOutput {
    pub positions: Vec<DVec3>,
    pub velocities: Vec<DVec3>,
    pub accelerations: Vec<DVec3>,
    pub trails: Vec<Polyline>,
}

#[derive(Debug)]
pub struct FlockSimulation {
    bounds: Bounds,
    mode: BoundaryMode,
    boids: Vec<Boid>,
    weights: FlockWeights,
    attractors: AttractorField,
    update_order: UpdateOrder,
    neighbor_search: NeighborSearch,
    grid: Option<SpatialGrid>,
    candidates: Vec<usize>,
    last_accelerations: Vec<DVec3>,
    last_trails: Vec<Polyline>,
    ticks: u64,
}

impl FlockSimulation {
    // Assembled by FlockBuilder, which validates the inputs
    pub(crate) fn from_parts(
        bounds: Bounds,
        mode: BoundaryMode,
        boids: Vec<Boid>,
        weights: FlockWeights,
        attractors: AttractorField,
        update_order: UpdateOrder,
        neighbor_search: NeighborSearch,
    ) -> Self {
        let n = boids.len();
        Self {
            bounds,
            mode,
            boids,
            weights,
            attractors,
            update_order,
            neighbor_search,
            grid: None,
            candidates: Vec::new(),
            last_accelerations: Vec::with_capacity(n),
            last_trails: Vec::with_capacity(n),
            ticks: 0,
        }
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn boundary_mode(&self) -> BoundaryMode {
        self.mode
    }

    pub fn boids(&self) -> &[Boid] {
        &self.boids
    }

    pub fn len(&self) -> usize {
        self.boids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boids.is_empty()
    }

    pub fn weights(&self) -> &FlockWeights {
        &self.weights
    }

    pub fn weights_mut(&mut self) -> &mut FlockWeights {
        &mut self.weights
    }

    pub fn set_weights(&mut self, weights: FlockWeights) {
        self.weights = weights;
    }

    pub fn attractors(&self) -> &AttractorField {
        &self.attractors
    }

    /// Replace the attractor curves. An empty list turns attraction off.
    pub fn set_attractors(&mut self, curves: Vec<Arc<dyn Curve>>) {
        self.attractors.set(curves);
    }

    pub fn update_order(&self) -> UpdateOrder {
        self.update_order
    }

    pub fn neighbor_search(&self) -> NeighborSearch {
        self.neighbor_search
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn last_accelerations(&self) -> &[DVec3] {
        &self.last_accelerations
    }

    pub fn last_trails(&self) -> &[Polyline] {
        &self.last_trails
    }

    /// Advance every boid by one step.
    pub fn tick(&mut self) -> TickOutput {
        self.prepare_grid();
        self.last_accelerations.clear();
        self.last_trails.clear();

        match self.update_order {
            UpdateOrder::Sequential => self.tick_sequential(),
            UpdateOrder::Snapshot => self.tick_snapshot(),
        }

        self.ticks += 1;
        trace!(tick = self.ticks, boids = self.boids.len(), "flock advanced");
        self.output()
    }

    fn output(&self) -> TickOutput {
        TickOutput {
            positions: self.boids.iter().map(|b| b.position).collect(),
            velocities: self.boids.iter().map(|b| b.velocity).collect(),
            accelerations: self.last_accelerations.clone(),
            trails: self.last_trails.clone(),
        }
    }

    // Recreate the grid when the perception radius moved, otherwise just
    // re-insert everyone
    fn prepare_grid(&mut self) {
        if self.neighbor_search != NeighborSearch::Grid {
            self.grid = None;
            return;
        }
        let radius = self.weights.perception_radius;
        if self.grid_is_stale(radius) {
            self.grid = Some(SpatialGrid::new(&self.bounds, radius));
        }
        if let Some(grid) = self.grid.as_mut() {
            grid.rebuild(self.boids.iter().map(|b| b.position));
        }
    }

    fn grid_is_stale(&self, radius: f64) -> bool {
        match &self.grid {
            Some(grid) => grid.perception_radius() != radius,
            None => true,
        }
    }

    fn tick_sequential(&mut self) {
        let weights = self.weights;
        let radius = weights.perception_radius;
        let mut candidates = std::mem::take(&mut self.candidates);

        for i in 0..self.boids.len() {
            let position = self.boids[i].position;
            let neighbors = match &self.grid {
                Some(grid) => {
                    grid.nearby_indices(position, &mut candidates);
                    Neighborhood::gather(&self.boids, i, candidates.iter().copied(), radius)
                }
                None => Neighborhood::gather(&self.boids, i, 0..self.boids.len(), radius),
            };
            let target = physics::attraction_target(&self.attractors, position, &weights);

            let boid = &mut self.boids[i];
            physics::steer(boid, &neighbors, target, &weights);
            let applied = boid.tick();

            self.last_trails.push(physics::trail(boid, applied));
            self.last_accelerations.push(applied);
            if let Some(grid) = self.grid.as_mut() {
                grid.relocate(i, boid.position);
            }
        }

        self.candidates = candidates;
    }

    fn tick_snapshot(&mut self) {
        let weights = self.weights;
        let radius = weights.perception_radius;

        let plans: Vec<(Neighborhood, Option<DVec3>)> = {
            let boids = &self.boids;
            let grid = self.grid.as_ref();
            let attractors = &self.attractors;
            (0..boids.len())
                .into_par_iter()
                .map_init(Vec::new, |candidates, i| {
                    let position = boids[i].position;
                    let neighbors = match grid {
                        Some(grid) => {
                            grid.nearby_indices(position, candidates);
                            Neighborhood::gather(boids, i, candidates.iter().copied(), radius)
                        }
                        None => Neighborhood::gather(boids, i, 0..boids.len(), radius),
                    };
                    (neighbors, physics::attraction_target(attractors, position, &weights))
                })
                .collect()
        };

        let results: Vec<(DVec3, Polyline)> = self
            .boids
            .par_iter_mut()
            .zip(plans.par_iter())
            .map(|(boid, (neighbors, target))| {
                physics::steer(boid, neighbors, *target, &weights);
                let applied = boid.tick();
                (applied, physics::trail(boid, applied))
            })
            .collect();

        for (applied, trail) in results {
            self.last_accelerations.push(applied);
            self.last_trails.push(trail);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FlockBuilder;
    use crate::seed::{random_positions, SeedSource};

    fn flock(order: UpdateOrder, search: NeighborSearch) -> FlockSimulation {
        let bounds = Bounds::cube(DVec3::ZERO, 30.0);
        FlockBuilder::new(bounds, random_positions(&bounds, 60, 5))
            .seed(SeedSource::Fixed(5))
            .weights(FlockWeights {
                perception_radius: 8.0,
                ..FlockWeights::default()
            })
            .update_order(order)
            .neighbor_search(search)
            .build()
            .unwrap()
    }

    #[test]
    fn output_has_one_entry_per_boid() {
        let mut sim = flock(UpdateOrder::Sequential, NeighborSearch::BruteForce);
        let out = sim.tick();
        assert_eq!(out.positions.len(), 60);
        assert_eq!(out.velocities.len(), 60);
        assert_eq!(out.accelerations.len(), 60);
        assert_eq!(out.trails.len(), 60);
        assert_eq!(sim.last_accelerations(), out.accelerations.as_slice());
        assert_eq!(sim.tick_count(), 1);
    }

    #[test]
    fn trail_runs_from_behind_through_position_to_acceleration() {
        let mut sim = flock(UpdateOrder::Sequential, NeighborSearch::BruteForce);
        let out = sim.tick();
        for i in 0..sim.len() {
            let p = out.positions[i];
            assert_eq!(
                out.trails[i].points,
                vec![p - out.velocities[i], p, p + out.accelerations[i]]
            );
        }
    }

    #[test]
    fn grid_matches_brute_force_exactly() {
        let mut brute = flock(UpdateOrder::Sequential, NeighborSearch::BruteForce);
        let mut grid = flock(UpdateOrder::Sequential, NeighborSearch::Grid);
        for _ in 0..25 {
            assert_eq!(brute.tick(), grid.tick());
        }
    }

    #[test]
    fn grid_matches_brute_force_in_snapshot_order() {
        let mut brute = flock(UpdateOrder::Snapshot, NeighborSearch::BruteForce);
        let mut grid = flock(UpdateOrder::Snapshot, NeighborSearch::Grid);
        for _ in 0..10 {
            assert_eq!(brute.tick(), grid.tick());
        }
    }

    #[test]
    fn grid_follows_perception_changes() {
        let mut brute = flock(UpdateOrder::Sequential, NeighborSearch::BruteForce);
        let mut grid = flock(UpdateOrder::Sequential, NeighborSearch::Grid);
        for radius in [8.0, 20.0, 3.0, 12.0] {
            brute.weights_mut().perception_radius = radius;
            grid.weights_mut().perception_radius = radius;
            assert_eq!(brute.tick(), grid.tick());
        }
    }

    #[test]
    fn grid_is_kept_across_ticks_when_cells_are_capped() {
        let bounds = Bounds::cube(DVec3::ZERO, 15.0);
        let mut sim = FlockBuilder::new(bounds, vec![DVec3::ZERO, DVec3::X])
            .weights(FlockWeights {
                perception_radius: 0.1,
                ..FlockWeights::default()
            })
            .neighbor_search(NeighborSearch::Grid)
            .build()
            .unwrap();

        sim.tick();
        let first = sim.grid.as_ref().map(|g| g.cell_size()).unwrap();
        assert!(first > 2.0 * 0.1);
        assert!(!sim.grid_is_stale(0.1));
        sim.tick();
        assert!(!sim.grid_is_stale(0.1));

        sim.weights_mut().perception_radius = 0.2;
        assert!(sim.grid_is_stale(0.2));
        sim.tick();
        assert_eq!(sim.grid.as_ref().map(|g| g.perception_radius()), Some(0.2));
    }

    #[test]
    fn sequential_and_snapshot_orders_diverge() {
        let mut seq = flock(UpdateOrder::Sequential, NeighborSearch::BruteForce);
        let mut snap = flock(UpdateOrder::Snapshot, NeighborSearch::BruteForce);
        seq.weights_mut().perception_radius = 20.0;
        snap.weights_mut().perception_radius = 20.0;
        let a = seq.tick();
        let b = snap.tick();
        // the first boid sees the same untouched flock either way
        assert_eq!(a.accelerations[0], b.accelerations[0]);
        assert_ne!(a.accelerations, b.accelerations);
    }
}
