//! Aggregate statistics over all voxels and bonds.

use serde::{Deserialize, Serialize};
use voxsim_math::DVec3;

use crate::bond::Bond;
use crate::state::VoxelState;

/// Whole-object statistics after a step.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SimStats {
    pub center_of_mass: DVec3,
    /// Sum of every voxel's displacement from nominal.
    pub total_displacement: DVec3,
    /// `total_displacement` divided by the voxel count.
    pub normalized_displacement: DVec3,
    pub max_voxel_displacement: f64,
    pub max_voxel_velocity: f64,
    pub max_voxel_kinetic_energy: f64,
    /// Largest distance any voxel moved during the step.
    pub max_move: f64,
    pub max_bond_strain: f64,
    pub max_bond_stress: f64,
    pub max_bond_strain_energy: f64,
    pub total_kinetic_energy: f64,
    pub total_strain_energy: f64,
    pub max_pressure: f64,
    pub min_pressure: f64,
    pub yielded_bonds: usize,
    pub broken_bonds: usize,
}

impl SimStats {
    /// Computes statistics from the current voxel and bond state.
    pub fn compute(voxels: &VoxelState, bonds: &[Bond]) -> Self {
        let mut s = SimStats {
            center_of_mass: voxels.center_of_mass(),
            min_pressure: f64::INFINITY,
            max_pressure: f64::NEG_INFINITY,
            ..Default::default()
        };

        for i in 0..voxels.count {
            let d = voxels.displacement(i);
            s.total_displacement += d;
            s.max_voxel_displacement = s.max_voxel_displacement.max(d.length());
            s.max_voxel_velocity = s.max_voxel_velocity.max(voxels.vel[i].length());
            s.max_voxel_kinetic_energy = s.max_voxel_kinetic_energy.max(voxels.kinetic_energy[i]);
            s.max_move = s.max_move.max(voxels.last_move[i]);
            s.total_kinetic_energy += voxels.kinetic_energy[i];
            s.max_pressure = s.max_pressure.max(voxels.pressure[i]);
            s.min_pressure = s.min_pressure.min(voxels.pressure[i]);
        }
        if voxels.count > 0 {
            s.normalized_displacement = s.total_displacement / voxels.count as f64;
        } else {
            s.min_pressure = 0.0;
            s.max_pressure = 0.0;
        }

        for b in bonds {
            s.max_bond_strain = s.max_bond_strain.max(b.strain.abs());
            s.max_bond_stress = s.max_bond_stress.max(b.stress.abs());
            s.max_bond_strain_energy = s.max_bond_strain_energy.max(b.strain_energy);
            s.total_strain_energy += b.strain_energy;
            s.yielded_bonds += b.yielded as usize;
            s.broken_bonds += b.broken as usize;
        }
        s
    }

    pub fn total_energy(&self) -> f64 {
        self.total_kinetic_energy + self.total_strain_energy
    }
}
