/*
 * Simulation Parameters Module
 *
 * This module defines the FlockConfig struct that collects everything needed
 * to set up a flock: the bounded volume, the start points (given or scattered
 * at random), the steering weights, the boundary behavior and the attractor
 * curves. Configs load from TOML; every field has a default, so a file only
 * needs the values it changes.
 *
 * It also documents the valid range of each weight. The simulation accepts
 * values outside these ranges; the helpers here let a driver warn about them.
 */

use std::ops::RangeInclusive;
use std::path::Path;
use std::sync::Arc;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::boundary::BoundaryMode;
use crate::builder::FlockBuilder;
use crate::curve::{Circle, Curve, Polyline};
use crate::error::{FlockError, FlockResult};
use crate::flock::UpdateOrder;
use crate::geometry::Bounds;
use crate::physics::FlockWeights;
use crate::seed::{self, SeedSource};
use crate::spatial_grid::NeighborSearch;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CurveSpec {
    Polyline {
        points: Vec<DVec3>,
    },
    Circle {
        center: DVec3,
        #[serde(default = "default_normal")]
        normal: DVec3,
        radius: f64,
    },
}

fn default_normal() -> DVec3 {
    DVec3::Z
}

impl CurveSpec {
    pub fn build(&self) -> FlockResult<Arc<dyn Curve>> {
        Ok(match self {
            CurveSpec::Polyline { points } => Arc::new(Polyline::attractor(points.clone())?),
            CurveSpec::Circle { center, normal, radius } => {
                Arc::new(Circle::new(*center, *normal, *radius)?)
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockConfig {
    // Used only when `positions` is not given
    pub agent_count: usize,
    pub positions: Option<Vec<DVec3>>,
    pub bounds: Bounds,
    pub weights: FlockWeights,
    pub boundary: BoundaryMode,
    pub reflect_velocity: bool,
    pub seed: SeedSource,
    pub update_order: UpdateOrder,
    pub neighbor_search: NeighborSearch,
    pub attractors: Vec<CurveSpec>,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            agent_count: 50,
            positions: None,
            bounds: Bounds::default(),
            weights: FlockWeights::default(),
            boundary: BoundaryMode::Wrap,
            reflect_velocity: false,
            seed: SeedSource::default(),
            update_order: UpdateOrder::default(),
            neighbor_search: NeighborSearch::default(),
            attractors: Vec::new(),
        }
    }
}

impl FlockConfig {
    pub fn from_toml_str(text: &str) -> FlockResult<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> FlockResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| FlockError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Explicit positions, or `agent_count` points scattered in the bounds.
    /// Scattering uses the fixed seed, or 0 under a wall-clock seed.
    pub fn initial_positions(&self) -> Vec<DVec3> {
        match &self.positions {
            Some(points) => points.clone(),
            None => {
                let scatter_seed = match self.seed {
                    SeedSource::Fixed(s) => s,
                    SeedSource::WallClock => 0,
                };
                seed::random_positions(&self.bounds, self.agent_count, scatter_seed)
            }
        }
    }

    pub fn curves(&self) -> FlockResult<Vec<Arc<dyn Curve>>> {
        self.attractors.iter().map(CurveSpec::build).collect()
    }

    pub fn builder(&self) -> FlockResult<FlockBuilder> {
        Ok(FlockBuilder::new(self.bounds, self.initial_positions())
            .weights(self.weights)
            .boundary_mode(self.boundary)
            .reflect_velocity(self.reflect_velocity)
            .seed(self.seed)
            .attractors(self.curves()?)
            .update_order(self.update_order)
            .neighbor_search(self.neighbor_search))
    }

    // Documented ranges
    pub fn weight_range() -> RangeInclusive<f64> {
        0.0..=1.0
    }

    pub fn attraction_range() -> RangeInclusive<f64> {
        -1.0..=1.0
    }
}

/// One message per weight outside its documented range.
pub fn range_warnings(weights: &FlockWeights) -> Vec<String> {
    let unit = FlockConfig::weight_range();
    let signed = FlockConfig::attraction_range();
    let checks = [
        ("alignment", weights.alignment, &unit),
        ("cohesion", weights.cohesion, &unit),
        ("separation", weights.separation, &unit),
        ("attraction", weights.attraction, &signed),
        ("crawl_speed", weights.crawl_speed, &signed),
    ];

    checks
        .iter()
        .filter(|(_, value, range)| !range.contains(value))
        .map(|(name, value, range)| {
            format!("{name} = {value} is outside [{}, {}]", range.start(), range.end())
        })
        .collect()
}
