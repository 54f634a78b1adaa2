//! Dense voxel occupancy bitmap.
//!
//! Cells are stored X-fastest, then Y, then Z:
//! `index = x + X*y + X*Y*z`. A value of 0 is empty; any other value is a
//! palette index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use voxsim_types::{MaterialIndex, VoxelIndex, VoxsimError, VoxsimResult};

/// Optional per-voxel scalar arrays carried by a structure.
///
/// Values are dense over the structure index; cells that are empty hold 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AuxField {
    /// Per-voxel elastic modulus override.
    Stiffness,
    /// Per-voxel temperature phase offset (radians).
    PhaseOffset,
    FinalPhaseOffset,
    InitialVoxelSize,
    FinalVoxelSize,
    PreDamageRoll,
    PreDamagePitch,
    PreDamageYaw,
    PreDamageStress,
    PreDamagePressure,
    StressAdaptationRate,
    PressureAdaptationRate,
}

impl AuxField {
    pub const ALL: [AuxField; 12] = [
        AuxField::Stiffness,
        AuxField::PhaseOffset,
        AuxField::FinalPhaseOffset,
        AuxField::InitialVoxelSize,
        AuxField::FinalVoxelSize,
        AuxField::PreDamageRoll,
        AuxField::PreDamagePitch,
        AuxField::PreDamageYaw,
        AuxField::PreDamageStress,
        AuxField::PreDamagePressure,
        AuxField::StressAdaptationRate,
        AuxField::PressureAdaptationRate,
    ];

    /// Element name used in the document format.
    pub fn tag(&self) -> &'static str {
        match self {
            AuxField::Stiffness => "Stiffness",
            AuxField::PhaseOffset => "PhaseOffset",
            AuxField::FinalPhaseOffset => "FinalPhaseOffset",
            AuxField::InitialVoxelSize => "InitialVoxelSize",
            AuxField::FinalVoxelSize => "FinalVoxelSize",
            AuxField::PreDamageRoll => "PreDamageRoll",
            AuxField::PreDamagePitch => "PreDamagePitch",
            AuxField::PreDamageYaw => "PreDamageYaw",
            AuxField::PreDamageStress => "PreDamageStress",
            AuxField::PreDamagePressure => "PreDamagePressure",
            AuxField::StressAdaptationRate => "StressAdaptationRate",
            AuxField::PressureAdaptationRate => "PressureAdaptationRate",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.tag() == tag)
    }
}

/// Voxel occupancy grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    dims: [usize; 3],
    data: Vec<u8>,
    aux: BTreeMap<AuxField, Vec<f64>>,
}

impl Structure {
    /// Creates an empty structure of the given dimensions.
    pub fn new(x: usize, y: usize, z: usize) -> Self {
        Self {
            dims: [x, y, z],
            data: vec![0; x * y * z],
            aux: BTreeMap::new(),
        }
    }

    /// Builds a structure from raw cell data in storage order.
    pub fn from_data(dims: [usize; 3], data: Vec<u8>) -> VoxsimResult<Self> {
        let expected = dims
            .iter()
            .try_fold(1usize, |n, &d| n.checked_mul(d))
            .ok_or_else(|| VoxsimError::Validation(format!("structure dims {dims:?} overflow")))?;
        if data.len() != expected {
            return Err(VoxsimError::Validation(format!(
                "structure data has {} cells, expected {}",
                data.len(),
                expected
            )));
        }
        Ok(Self {
            dims,
            data,
            aux: BTreeMap::new(),
        })
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn x_voxels(&self) -> usize {
        self.dims[0]
    }

    pub fn y_voxels(&self) -> usize {
        self.dims[1]
    }

    pub fn z_voxels(&self) -> usize {
        self.dims[2]
    }

    /// Total number of cells (`X*Y*Z`).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw cell data in storage order.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    // ─── Index mapping ───────────────────────────────────────

    /// Maps coordinates to a structure index; `None` when outside the grid.
    pub fn index_of(&self, x: i64, y: i64, z: i64) -> Option<VoxelIndex> {
        let [nx, ny, nz] = self.dims;
        if x < 0 || y < 0 || z < 0 {
            return None;
        }
        let (x, y, z) = (x as usize, y as usize, z as usize);
        if x >= nx || y >= ny || z >= nz {
            return None;
        }
        Some(VoxelIndex((x + nx * y + nx * ny * z) as u32))
    }

    /// Inverse of [`Structure::index_of`]; `None` for out-of-range indices.
    pub fn coords_of(&self, index: VoxelIndex) -> Option<[usize; 3]> {
        let i = index.index();
        if i >= self.data.len() {
            return None;
        }
        let [nx, ny, _] = self.dims;
        let z = i / (nx * ny);
        let rem = i - z * nx * ny;
        Some([rem % nx, rem / nx, z])
    }

    // ─── Cell access ─────────────────────────────────────────

    /// Material at `index`; `None` if the index is outside the grid.
    pub fn get(&self, index: VoxelIndex) -> Option<MaterialIndex> {
        self.data.get(index.index()).copied().map(MaterialIndex)
    }

    /// Material at the given coordinates; empty when outside the grid.
    pub fn get_at(&self, x: i64, y: i64, z: i64) -> MaterialIndex {
        self.index_of(x, y, z)
            .and_then(|i| self.get(i))
            .unwrap_or(MaterialIndex::EMPTY)
    }

    pub fn set(&mut self, index: VoxelIndex, material: MaterialIndex) -> VoxsimResult<()> {
        match self.data.get_mut(index.index()) {
            Some(cell) => {
                *cell = material.0;
                Ok(())
            }
            None => Err(VoxsimError::Validation(format!(
                "voxel index {} outside structure of {} cells",
                index.0,
                self.data.len()
            ))),
        }
    }

    pub fn set_at(&mut self, x: i64, y: i64, z: i64, material: MaterialIndex) -> VoxsimResult<()> {
        let index = self.index_of(x, y, z).ok_or_else(|| {
            VoxsimError::Validation(format!("coordinates ({x}, {y}, {z}) outside structure"))
        })?;
        self.set(index, material)
    }

    /// Sets every cell to `material`.
    pub fn fill(&mut self, material: MaterialIndex) {
        self.data.fill(material.0);
    }

    /// Empties every cell and drops auxiliary arrays.
    pub fn clear(&mut self) {
        self.data.fill(0);
        self.aux.clear();
    }

    /// Iterates the indices of occupied cells in storage order.
    pub fn occupied(&self) -> impl Iterator<Item = VoxelIndex> + '_ {
        self.data
            .iter()
            .enumerate()
            .filter(|(_, &m)| m != 0)
            .map(|(i, _)| VoxelIndex(i as u32))
    }

    pub fn occupied_count(&self) -> usize {
        self.data.iter().filter(|&&m| m != 0).count()
    }

    /// Number of cells holding exactly `material`.
    pub fn count_of(&self, material: MaterialIndex) -> usize {
        self.data.iter().filter(|&&m| m == material.0).count()
    }

    // ─── Edits ───────────────────────────────────────────────

    /// Changes the dimensions, keeping voxels whose coordinates still fit.
    ///
    /// Auxiliary arrays are dropped.
    pub fn resize(&mut self, x: usize, y: usize, z: usize) {
        let mut next = Structure::new(x, y, z);
        let [ox, oy, oz] = self.dims;
        for k in 0..oz.min(z) {
            for j in 0..oy.min(y) {
                for i in 0..ox.min(x) {
                    next.data[i + x * j + x * y * k] = self.data[i + ox * j + ox * oy * k];
                }
            }
        }
        *self = next;
    }

    /// Shifts every voxel by `(dx, dy, dz)` cells. Voxels pushed outside the
    /// grid are lost; vacated cells become empty.
    pub fn shift(&mut self, dx: i64, dy: i64, dz: i64) {
        let [nx, ny, nz] = self.dims;
        let mut next = vec![0u8; self.data.len()];
        for k in 0..nz as i64 {
            for j in 0..ny as i64 {
                for i in 0..nx as i64 {
                    let src = self.get_at(i - dx, j - dy, k - dz);
                    next[i as usize + nx * j as usize + nx * ny * k as usize] = src.0;
                }
            }
        }
        self.data = next;
        self.aux.clear();
    }

    /// Replaces every occurrence of `from` with `to`. When `renumber` is set,
    /// indices greater than `from` are decremented afterwards (used when a
    /// palette entry is deleted).
    pub fn replace_material(&mut self, from: MaterialIndex, to: MaterialIndex, renumber: bool) {
        for cell in &mut self.data {
            if *cell == from.0 {
                *cell = to.0;
            } else if renumber && *cell > from.0 {
                *cell -= 1;
            }
        }
    }

    // ─── Auxiliary arrays ────────────────────────────────────

    pub fn aux(&self, field: AuxField) -> Option<&[f64]> {
        self.aux.get(&field).map(Vec::as_slice)
    }

    /// Aux value for one voxel, if the array is present.
    pub fn aux_at(&self, field: AuxField, index: VoxelIndex) -> Option<f64> {
        self.aux.get(&field).and_then(|v| v.get(index.index()).copied())
    }

    /// Installs a dense per-cell array. Its length must equal [`Structure::len`].
    pub fn set_aux(&mut self, field: AuxField, values: Vec<f64>) -> VoxsimResult<()> {
        if values.len() != self.data.len() {
            return Err(VoxsimError::Validation(format!(
                "{} array has {} values, expected {}",
                field.tag(),
                values.len(),
                self.data.len()
            )));
        }
        self.aux.insert(field, values);
        Ok(())
    }

    pub fn remove_aux(&mut self, field: AuxField) -> Option<Vec<f64>> {
        self.aux.remove(&field)
    }

    pub fn aux_fields(&self) -> impl Iterator<Item = AuxField> + '_ {
        self.aux.keys().copied()
    }
}

impl Default for Structure {
    fn default() -> Self {
        Self::new(0, 0, 0)
    }
}
