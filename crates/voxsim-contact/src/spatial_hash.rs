//! Spatial hash broad phase.
//!
//! Bins voxel centers into a uniform grid. Candidate pairs come from the
//! same or one of the 26 adjacent cells, so the cell size must be at least
//! the largest contact distance.

use std::collections::HashMap;

use voxsim_math::DVec3;
use voxsim_types::{VoxsimError, VoxsimResult};

use crate::broad::{BroadPhase, CandidatePair};

type CellKey = (i64, i64, i64);

/// Uniform-grid broad phase.
pub struct SpatialHash {
    inv_cell_size: f64,
    grid: HashMap<CellKey, Vec<u32>>,
    body_count: usize,
}

impl SpatialHash {
    pub fn new(cell_size: f64) -> Self {
        let cell_size = cell_size.max(1e-9);
        Self {
            inv_cell_size: 1.0 / cell_size,
            grid: HashMap::new(),
            body_count: 0,
        }
    }

    pub fn cell_size(&self) -> f64 {
        1.0 / self.inv_cell_size
    }

    pub fn set_cell_size(&mut self, cell_size: f64) {
        self.inv_cell_size = 1.0 / cell_size.max(1e-9);
    }

    pub fn body_count(&self) -> usize {
        self.body_count
    }

    pub fn occupied_cells(&self) -> usize {
        self.grid.len()
    }

    fn cell_key(&self, p: DVec3) -> CellKey {
        let c = (p * self.inv_cell_size).floor();
        (c.x as i64, c.y as i64, c.z as i64)
    }
}

impl BroadPhase for SpatialHash {
    fn update(&mut self, positions: &[DVec3]) -> VoxsimResult<()> {
        if positions.len() > u32::MAX as usize {
            return Err(VoxsimError::ResourceLimit(format!(
                "{} bodies exceed the broad phase index range",
                positions.len()
            )));
        }
        self.grid.clear();
        self.body_count = positions.len();
        for (i, p) in positions.iter().enumerate() {
            if !p.is_finite() {
                continue;
            }
            let key = self.cell_key(*p);
            self.grid.entry(key).or_default().push(i as u32);
        }
        Ok(())
    }

    fn query_pairs(&self) -> Vec<CandidatePair> {
        let mut pairs = Vec::new();

        for (&(cx, cy, cz), bodies) in &self.grid {
            for i in 0..bodies.len() {
                for j in (i + 1)..bodies.len() {
                    pairs.push(CandidatePair::new(bodies[i], bodies[j]));
                }
            }

            // Half of the 26 neighbours, so every pair is seen once.
            for dx in -1..=1_i64 {
                for dy in -1..=1_i64 {
                    for dz in -1..=1_i64 {
                        let nkey = (cx + dx, cy + dy, cz + dz);
                        if nkey <= (cx, cy, cz) {
                            continue;
                        }
                        if let Some(neighbours) = self.grid.get(&nkey) {
                            for &a in bodies {
                                for &b in neighbours {
                                    pairs.push(CandidatePair::new(a, b));
                                }
                            }
                        }
                    }
                }
            }
        }

        pairs
    }

    fn name(&self) -> &str {
        "spatial_hash"
    }
}
