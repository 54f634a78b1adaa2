//! Simulation state: SoA buffers for all per-voxel data.
//!
//! Only occupied voxels are simulated. They are numbered densely by
//! [`SimIndex`]; `sim_of` and `structure_index` map between that numbering
//! and the structure's dense cell index.
//!
//! # Layout
//!
//! Every per-voxel array has length `count`:
//! ```text
//! pos:          [p0, p1, p2, ...]
//! lin_mom:      [m0, m1, m2, ...]
//! ...
//! ```

use voxsim_boundary::VoxelConstraint;
use voxsim_lattice::{AuxField, Topology};
use voxsim_material::{MaterialModel, VoxelObject};
use voxsim_math::{DQuat, DVec3};
use voxsim_types::{Dof, MaterialIndex, SimIndex, VoxelIndex, VoxsimError, VoxsimResult};

/// A leaf material as the integrator sees it.
#[derive(Debug, Clone)]
pub struct SimMaterial {
    pub index: MaterialIndex,
    pub model: MaterialModel,
    pub elastic_modulus: f64,
    pub poissons_ratio: f64,
    pub density: f64,
    pub cte: f64,
    pub static_friction: f64,
    pub dynamic_friction: f64,
}

/// SoA voxel buffers.
#[derive(Debug, Clone, Default)]
pub struct VoxelState {
    pub count: usize,
    /// Nominal edge length shared by every voxel (meters).
    pub nominal_size: f64,

    // ─── Identity ───
    pub structure_index: Vec<VoxelIndex>,
    /// Per structure cell, its simulated voxel if occupied.
    pub sim_of: Vec<Option<SimIndex>>,
    /// Index into the simulator's material table.
    pub material: Vec<usize>,
    /// Per [`voxsim_lattice::BondDir`] slot, the bond in the simulator's bond list.
    pub bonds: Vec<[Option<u32>; 6]>,

    // ─── Constants ───
    pub nominal_pos: Vec<DVec3>,
    pub mass: Vec<f64>,
    pub inertia: Vec<f64>,
    pub first_moment: Vec<f64>,
    pub elastic_modulus: Vec<f64>,
    /// Temperature phase offset (radians).
    pub temp_phase: Vec<f64>,
    pub constraint: Vec<VoxelConstraint>,

    // ─── Kinematics ───
    pub pos: Vec<DVec3>,
    pub orientation: Vec<DQuat>,
    pub lin_mom: Vec<DVec3>,
    pub ang_mom: Vec<DVec3>,
    pub vel: Vec<DVec3>,
    pub ang_vel: Vec<DVec3>,
    /// Current edge length after thermal expansion.
    pub scale: Vec<f64>,

    // ─── Per-step results ───
    pub force: Vec<DVec3>,
    pub moment: Vec<DVec3>,
    /// Distance moved during the last step.
    pub last_move: Vec<f64>,
    pub kinetic_energy: Vec<f64>,
    pub pressure: Vec<f64>,
    /// Averaged axial strain along each axis.
    pub strain: Vec<DVec3>,
    /// Temperature offset from the base temperature.
    pub delta_temp: Vec<f64>,
    pub static_friction: Vec<bool>,
    pub touching_floor: Vec<bool>,
    pub yielded: Vec<bool>,
    pub broken: Vec<bool>,
}

impl VoxelState {
    /// Builds state for every occupied voxel of `object`.
    ///
    /// `constraints` is dense over the structure, as produced by
    /// [`voxsim_boundary::BoundarySet::assign`]. Fails with
    /// [`VoxsimError::Recursion`] if any voxel does not resolve to a leaf
    /// within the hop limit.
    pub fn build(
        object: &VoxelObject,
        constraints: &[VoxelConstraint],
        topology: &Topology,
    ) -> VoxsimResult<(Self, Vec<SimMaterial>)> {
        let structure = &object.structure;
        if constraints.len() != structure.len() {
            return Err(VoxsimError::Validation(format!(
                "constraint count ({}) != structure size ({})",
                constraints.len(),
                structure.len()
            )));
        }
        let size = object.lattice.lattice_dim;
        let volume = size * size * size;

        let mut materials: Vec<SimMaterial> = Vec::new();
        let mut table: Vec<Option<usize>> = vec![None; object.palette.len()];
        let mut s = VoxelState {
            nominal_size: size,
            sim_of: vec![None; structure.len()],
            ..Default::default()
        };

        for vi in structure.occupied() {
            let r = object.resolve_leaf(vi);
            if !r.complete {
                return Err(VoxsimError::Recursion(format!(
                    "voxel {} does not resolve to a leaf material",
                    vi.0
                )));
            }
            let Some(leaf) = object.palette.leaf(r.index) else {
                continue;
            };
            let mat = match table.get(r.index.index()).copied().flatten() {
                Some(m) => m,
                None => {
                    materials.push(SimMaterial {
                        index: r.index,
                        model: leaf.model(),
                        elastic_modulus: leaf.elastic_modulus,
                        poissons_ratio: leaf.poissons_ratio,
                        density: leaf.density,
                        cte: leaf.cte,
                        static_friction: leaf.static_friction,
                        dynamic_friction: leaf.dynamic_friction,
                    });
                    if let Some(slot) = table.get_mut(r.index.index()) {
                        *slot = Some(materials.len() - 1);
                    }
                    materials.len() - 1
                }
            };
            let Some([x, y, z]) = structure.coords_of(vi) else {
                continue;
            };

            let e = structure
                .aux_at(AuxField::Stiffness, vi)
                .filter(|&v| v > 0.0)
                .unwrap_or(leaf.elastic_modulus);
            let phase = structure
                .aux_at(AuxField::PhaseOffset, vi)
                .unwrap_or(leaf.temp_phase);
            let mass = volume * leaf.density;
            let nominal = object.lattice.position(x, y, z);

            s.sim_of[vi.index()] = Some(SimIndex(s.count as u32));
            s.structure_index.push(vi);
            s.material.push(mat);
            s.nominal_pos.push(nominal);
            s.mass.push(mass);
            s.inertia.push(mass * size * size / 6.0);
            s.first_moment.push(mass * size / 2.0);
            s.elastic_modulus.push(e);
            s.temp_phase.push(phase);
            s.constraint.push(constraints[vi.index()]);
            s.count += 1;
        }

        s.bonds = s
            .structure_index
            .iter()
            .map(|&vi| {
                let mut slots = [None; 6];
                if let Some(src) = topology.voxel_bonds.get(vi.index()) {
                    for (dst, b) in slots.iter_mut().zip(src.iter()) {
                        *dst = b.map(|id| id.0);
                    }
                }
                slots
            })
            .collect();

        s.reset();
        Ok((s, materials))
    }

    /// Returns every voxel to its nominal pose, at rest.
    pub fn reset(&mut self) {
        let n = self.count;
        self.pos = self.nominal_pos.clone();
        self.orientation = vec![DQuat::IDENTITY; n];
        self.lin_mom = vec![DVec3::ZERO; n];
        self.ang_mom = vec![DVec3::ZERO; n];
        self.vel = vec![DVec3::ZERO; n];
        self.ang_vel = vec![DVec3::ZERO; n];
        self.scale = vec![self.nominal_size; n];
        self.force = vec![DVec3::ZERO; n];
        self.moment = vec![DVec3::ZERO; n];
        self.last_move = vec![0.0; n];
        self.kinetic_energy = vec![0.0; n];
        self.pressure = vec![0.0; n];
        self.strain = vec![DVec3::ZERO; n];
        self.delta_temp = vec![0.0; n];
        self.static_friction = vec![false; n];
        self.touching_floor = vec![false; n];
        self.yielded = vec![false; n];
        self.broken = vec![false; n];
    }

    /// Frees the kinematic buffers. Constants and the index maps stay.
    pub fn release(&mut self) {
        for v in [
            &mut self.pos,
            &mut self.lin_mom,
            &mut self.ang_mom,
            &mut self.vel,
            &mut self.ang_vel,
            &mut self.force,
            &mut self.moment,
            &mut self.strain,
        ] {
            *v = Vec::new();
        }
        for v in [
            &mut self.scale,
            &mut self.last_move,
            &mut self.kinetic_energy,
            &mut self.pressure,
            &mut self.delta_temp,
        ] {
            *v = Vec::new();
        }
        self.orientation = Vec::new();
        self.static_friction = Vec::new();
        self.touching_floor = Vec::new();
        self.yielded = Vec::new();
        self.broken = Vec::new();
    }

    /// True while kinematic buffers are allocated.
    pub fn is_allocated(&self) -> bool {
        self.pos.len() == self.count && self.count > 0
    }

    /// Zeros all momenta and velocities, keeping the current pose.
    pub fn zero_motion(&mut self) {
        for i in 0..self.count {
            self.lin_mom[i] = DVec3::ZERO;
            self.ang_mom[i] = DVec3::ZERO;
            self.vel[i] = DVec3::ZERO;
            self.ang_vel[i] = DVec3::ZERO;
            self.kinetic_energy[i] = 0.0;
        }
    }

    pub fn sim_index(&self, index: VoxelIndex) -> Option<SimIndex> {
        self.sim_of.get(index.index()).copied().flatten()
    }

    /// Displacement from the nominal position.
    pub fn displacement(&self, i: usize) -> DVec3 {
        self.pos[i] - self.nominal_pos[i]
    }

    /// Critical damping scale `2·sqrt(m·E·s)` for translation.
    pub fn translational_damping(&self, i: usize) -> f64 {
        2.0 * (self.mass[i] * self.elastic_modulus[i] * self.nominal_size).sqrt()
    }

    /// Critical damping scale `2·sqrt(I·E·s³)` for rotation.
    pub fn rotational_damping(&self, i: usize) -> f64 {
        let s = self.nominal_size;
        2.0 * (self.inertia[i] * self.elastic_modulus[i] * s * s * s).sqrt()
    }

    /// True if every degree of freedom is fixed.
    pub fn is_fully_fixed(&self, i: usize) -> bool {
        self.constraint[i].dof.is_all_fixed()
    }

    pub fn is_fixed(&self, i: usize, dof: Dof) -> bool {
        self.constraint[i].dof.is_fixed(dof)
    }

    pub fn total_mass(&self) -> f64 {
        self.mass.iter().sum()
    }

    /// Mass-weighted centre of all voxels.
    pub fn center_of_mass(&self) -> DVec3 {
        let m = self.total_mass();
        if m <= 0.0 {
            return DVec3::ZERO;
        }
        self.pos
            .iter()
            .zip(&self.mass)
            .fold(DVec3::ZERO, |acc, (p, &mi)| acc + *p * mi)
            / m
    }
}
