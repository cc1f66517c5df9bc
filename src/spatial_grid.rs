/*
 * Spatial Grid Module
 *
 * This module defines the SpatialGrid struct for neighbor lookups.
 * It divides the bounded volume into cubic cells at least as wide as the
 * perception radius, so every neighbor of a boid lives in the 3x3x3 block
 * of cells around it.
 *
 * The grid only narrows the candidate set; the exact distance test is still
 * done by the caller. Candidates are returned in ascending boid index, the
 * same order a full scan visits them, so the floating-point sums built from
 * them are identical to the brute-force path.
 *
 * Positions outside the volume are clamped into the edge cells. Clamping
 * never pulls two points more than one cell apart, so out-of-bounds boids
 * still find each other.
 */

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::geometry::Bounds;

// Keeps the cell count bounded when the perception radius is tiny compared
// to the volume
const MAX_CELLS_PER_AXIS: usize = 128;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborSearch {
    #[default]
    BruteForce,
    Grid,
}

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    // radius the grid was sized for; cell_size may be larger
    perception_radius: f64,
    cell_size: f64,
    origin: DVec3,
    dims: [usize; 3],
    cells: Vec<Vec<usize>>,
    // cell currently holding each boid, for incremental moves
    boid_cells: Vec<usize>,
}

impl SpatialGrid {
    pub fn new(bounds: &Bounds, perception_radius: f64) -> Self {
        let extent = bounds.extent();
        let min_cell = extent.max_element() / MAX_CELLS_PER_AXIS as f64;
        let cell_size = perception_radius.max(min_cell).max(f64::MIN_POSITIVE);

        let axis_cells = |len: f64| -> usize {
            let n = (len / cell_size).ceil();
            if n.is_finite() && n >= 1.0 {
                (n as usize).min(MAX_CELLS_PER_AXIS)
            } else {
                1
            }
        };
        let dims = [axis_cells(extent.x), axis_cells(extent.y), axis_cells(extent.z)];

        Self {
            perception_radius,
            cell_size,
            origin: bounds.min(),
            dims,
            cells: vec![Vec::new(); dims[0] * dims[1] * dims[2]],
            boid_cells: Vec::new(),
        }
    }

    pub fn perception_radius(&self) -> f64 {
        self.perception_radius
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    #[inline]
    fn cell_coords(&self, pos: DVec3) -> [usize; 3] {
        let rel = (pos - self.origin) / self.cell_size;
        let clamp = |v: f64, n: usize| -> usize {
            // NaN lands in cell 0
            v.floor().clamp(0.0, (n - 1) as f64) as usize
        };
        [
            clamp(rel.x, self.dims[0]),
            clamp(rel.y, self.dims[1]),
            clamp(rel.z, self.dims[2]),
        ]
    }

    #[inline]
    fn flat(&self, [x, y, z]: [usize; 3]) -> usize {
        (z * self.dims[1] + y) * self.dims[0] + x
    }

    // Clear the grid and insert every position, indexed by slice order
    pub fn rebuild(&mut self, positions: impl IntoIterator<Item = DVec3>) {
        for cell in &mut self.cells {
            cell.clear();
        }
        self.boid_cells.clear();

        for (i, pos) in positions.into_iter().enumerate() {
            let cell = self.flat(self.cell_coords(pos));
            self.cells[cell].push(i);
            self.boid_cells.push(cell);
        }
    }

    /// Move boid `index` to the cell containing `position`.
    pub fn relocate(&mut self, index: usize, position: DVec3) {
        let new_cell = self.flat(self.cell_coords(position));
        let old_cell = self.boid_cells[index];
        if new_cell == old_cell {
            return;
        }
        if let Some(slot) = self.cells[old_cell].iter().position(|&i| i == index) {
            self.cells[old_cell].swap_remove(slot);
        }
        self.cells[new_cell].push(index);
        self.boid_cells[index] = new_cell;
    }

    /// Fill `out` with every boid index in the 27 cells around `position`,
    /// sorted ascending.
    pub fn nearby_indices(&self, position: DVec3, out: &mut Vec<usize>) {
        out.clear();
        let [cx, cy, cz] = self.cell_coords(position);
        let span = |c: usize, n: usize| c.saturating_sub(1)..=(c + 1).min(n - 1);

        for z in span(cz, self.dims[2]) {
            for y in span(cy, self.dims[1]) {
                for x in span(cx, self.dims[0]) {
                    out.extend_from_slice(&self.cells[self.flat([x, y, z])]);
                }
            }
        }

        out.sort_unstable();
    }
}
