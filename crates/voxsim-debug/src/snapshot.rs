//! Kinematic snapshots for replay and debugging.
//!
//! A snapshot holds the per-voxel pose and velocity of a simulator at one
//! step, in simulation order. Comparing two snapshots of the same object
//! shows where a run diverged.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;
use voxsim_math::{DQuat, DVec3};
use voxsim_solver::Simulator;
use voxsim_types::{VoxsimError, VoxsimResult};

/// Voxel kinematics at one step.
///
/// Serialized with `bincode` for compact binary output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KinematicSnapshot {
    /// Step count when the snapshot was taken.
    pub step: u64,
    /// Simulated time in seconds.
    pub time: f64,
    pub positions: Vec<DVec3>,
    pub orientations: Vec<DQuat>,
    pub velocities: Vec<DVec3>,
}

impl KinematicSnapshot {
    /// Copies the current kinematic buffers of `sim`.
    ///
    /// An idle simulator has no buffers and gives an empty snapshot.
    pub fn capture(sim: &Simulator) -> Self {
        Self {
            step: sim.step_count(),
            time: sim.time(),
            positions: sim.positions().to_vec(),
            orientations: sim.orientations().to_vec(),
            velocities: sim.velocities().to_vec(),
        }
    }

    pub fn voxel_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Largest position difference between matching voxels of two snapshots.
    pub fn max_position_delta(&self, other: &KinematicSnapshot) -> VoxsimResult<f64> {
        if self.voxel_count() != other.voxel_count() {
            return Err(VoxsimError::Validation(format!(
                "snapshots hold {} and {} voxels",
                self.voxel_count(),
                other.voxel_count()
            )));
        }
        Ok(self
            .positions
            .iter()
            .zip(&other.positions)
            .map(|(a, b)| a.distance(*b))
            .fold(0.0, f64::max))
    }

    // ─── Serialization ───────────────────────────────────────

    pub fn to_bytes(&self) -> VoxsimResult<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| VoxsimError::Serialization(format!("snapshot encoding failed: {e}")))
    }

    pub fn from_bytes(data: &[u8]) -> VoxsimResult<Self> {
        bincode::deserialize(data)
            .map_err(|e| VoxsimError::Serialization(format!("snapshot decoding failed: {e}")))
    }

    pub fn save(&self, path: &Path) -> VoxsimResult<()> {
        fs::write(path, self.to_bytes()?)?;
        info!(
            path = %path.display(),
            step = self.step,
            voxels = self.voxel_count(),
            "saved snapshot"
        );
        Ok(())
    }

    pub fn load(path: &Path) -> VoxsimResult<Self> {
        Self::from_bytes(&fs::read(path)?)
    }
}
