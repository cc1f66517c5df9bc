/*
 * Boid Flocking Simulation - Module Definitions
 *
 * This file defines the module structure for the flocking library.
 * A flock is set up once (FlockBuilder), then advanced one tick per call
 * (FlockSimulation::tick). The Driver wraps that setup-or-tick decision for
 * hosts that invoke the simulation repeatedly, e.g. from a timer.
 */

// Re-export key components for easier access
pub use attractor::AttractorField;
pub use boid::Boid;
pub use boundary::{BoundaryMode, BoundaryPolicy};
pub use builder::FlockBuilder;
pub use curve::{Circle, Curve, Polyline};
pub use driver::{Driver, DriverEvent, DriverInputs, DriverOutcome, DriverState};
pub use error::{FlockError, FlockResult};
pub use flock::{FlockSimulation, TickOutput, UpdateOrder};
pub use geometry::{Bounds, Interval};
pub use params::{CurveSpec, FlockConfig};
pub use physics::FlockWeights;
pub use seed::SeedSource;
pub use spatial_grid::{NeighborSearch, SpatialGrid};

pub use glam::DVec3;

// Define modules
pub mod attractor;
pub mod boid;
pub mod boundary;
pub mod builder;
pub mod curve;
pub mod driver;
pub mod error;
pub mod flock;
pub mod geometry;
pub mod params;
pub mod physics;
pub mod seed;
pub mod spatial_grid;

// Constants
pub const MIN_SPEED: f64 = 1.5;
pub const INITIAL_SPEED: f64 = 2.0;
