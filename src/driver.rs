/*
 * Driver Module
 *
 * The host-facing state machine that decides, per invocation, whether to
 * set the flock up or to advance it.
 *
 *   Uninitialized --solve--> Running        (setup, no tick this call)
 *   Running       --solve--> Running        (one tick)
 *   any           --StructuralParameterChanged / ExplicitReset--> Uninitialized
 *
 * Inside `solve`, a reset or structural change builds the replacement first;
 * when that setup fails the previous state, running or not, is kept.
 *
 * Structural changes are detected by comparing each call's inputs against a
 * snapshot taken at setup: the bounds, the start points and the identity of
 * the attractor curves. Weights are not structural and are pushed into the
 * running flock on every call.
 *
 * The boundary mode is a sticky session flag. Toggling it does not discard
 * the running flock; it takes effect at the next setup.
 */

use std::sync::Arc;

use glam::DVec3;
use tracing::{debug, warn};

use crate::boundary::BoundaryMode;
use crate::builder::FlockBuilder;
use crate::curve::Curve;
use crate::error::FlockResult;
use crate::flock::{FlockSimulation, TickOutput, UpdateOrder};
use crate::geometry::Bounds;
use crate::params::{self, FlockConfig};
use crate::physics::FlockWeights;
use crate::seed::SeedSource;
use crate::spatial_grid::NeighborSearch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverEvent {
    StructuralParameterChanged,
    ExplicitReset,
}

#[derive(Debug, Default)]
pub enum DriverState {
    #[default]
    Uninitialized,
    Running(Box<FlockSimulation>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DriverOutcome {
    Initialized { boids: usize },
    Ticked(TickOutput),
}

/// Everything the host hands over on each invocation.
#[derive(Debug, Clone, Default)]
pub struct DriverInputs {
    pub bounds: Bounds,
    pub positions: Vec<DVec3>,
    pub weights: FlockWeights,
    pub attractors: Vec<Arc<dyn Curve>>,
    pub reset: bool,
}

impl DriverInputs {
    pub fn from_config(config: &FlockConfig) -> FlockResult<Self> {
        Ok(Self {
            bounds: config.bounds,
            positions: config.initial_positions(),
            weights: config.weights,
            attractors: config.curves()?,
            reset: false,
        })
    }
}

#[derive(Debug)]
struct StructuralSnapshot {
    bounds: Bounds,
    positions: Vec<DVec3>,
    attractors: Vec<Arc<dyn Curve>>,
}

impl StructuralSnapshot {
    fn take(inputs: &DriverInputs) -> Self {
        Self {
            bounds: inputs.bounds,
            positions: inputs.positions.clone(),
            attractors: inputs.attractors.clone(),
        }
    }

    fn matches(&self, inputs: &DriverInputs) -> bool {
        self.bounds == inputs.bounds
            && self.positions == inputs.positions
            && self.attractors.len() == inputs.attractors.len()
            && self
                .attractors
                .iter()
                .zip(&inputs.attractors)
                .all(|(a, b)| Arc::ptr_eq(a, b))
    }
}

#[derive(Debug, Default)]
pub struct Driver {
    state: DriverState,
    snapshot: Option<StructuralSnapshot>,
    boundary_mode: BoundaryMode,
    reflect_velocity: bool,
    seed: SeedSource,
    update_order: UpdateOrder,
    neighbor_search: NeighborSearch,
}

impl Driver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &FlockConfig) -> Self {
        Self {
            boundary_mode: config.boundary,
            reflect_velocity: config.reflect_velocity,
            seed: config.seed,
            update_order: config.update_order,
            neighbor_search: config.neighbor_search,
            ..Self::default()
        }
    }

    pub fn state(&self) -> &DriverState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, DriverState::Running(_))
    }

    pub fn simulation(&self) -> Option<&FlockSimulation> {
        match &self.state {
            DriverState::Running(sim) => Some(sim),
            DriverState::Uninitialized => None,
        }
    }

    pub fn boundary_mode(&self) -> BoundaryMode {
        self.boundary_mode
    }

    pub fn set_boundary_mode(&mut self, mode: BoundaryMode) {
        self.boundary_mode = mode;
    }

    // Flip the sticky flag; the running flock keeps its mode until re-setup
    pub fn toggle_boundary_mode(&mut self) -> BoundaryMode {
        self.boundary_mode = self.boundary_mode.toggled();
        debug!(mode = ?self.boundary_mode, "boundary mode toggled");
        self.boundary_mode
    }

    /// Discard the running flock; the next `solve` sets up a fresh one.
    pub fn notify(&mut self, event: DriverEvent) {
        if self.is_running() {
            debug!(?event, "discarding running flock");
        }
        self.state = DriverState::Uninitialized;
        self.snapshot = None;
    }

    pub fn solve(&mut self, inputs: &DriverInputs) -> FlockResult<DriverOutcome> {
        let event = if inputs.reset {
            Some(DriverEvent::ExplicitReset)
        } else if self.snapshot.as_ref().is_some_and(|s| !s.matches(inputs)) {
            Some(DriverEvent::StructuralParameterChanged)
        } else {
            None
        };

        if event.is_none() {
            if let DriverState::Running(sim) = &mut self.state {
                sim.set_weights(inputs.weights);
                return Ok(DriverOutcome::Ticked(sim.tick()));
            }
        }

        // A failed setup leaves whatever was running in place
        let sim = self.setup(inputs)?;
        if let Some(event) = event {
            self.notify(event);
        }

        let boids = sim.len();
        self.state = DriverState::Running(Box::new(sim));
        self.snapshot = Some(StructuralSnapshot::take(inputs));
        debug!(boids, "driver running");
        Ok(DriverOutcome::Initialized { boids })
    }

    fn setup(&self, inputs: &DriverInputs) -> FlockResult<FlockSimulation> {
        for message in params::range_warnings(&inputs.weights) {
            warn!("{message}");
        }

        FlockBuilder::new(inputs.bounds, inputs.positions.clone())
            .weights(inputs.weights)
            .boundary_mode(self.boundary_mode)
            .reflect_velocity(self.reflect_velocity)
            .seed(self.seed)
            .attractors(inputs.attractors.clone())
            .update_order(self.update_order)
            .neighbor_search(self.neighbor_search)
            .build()
    }
}
