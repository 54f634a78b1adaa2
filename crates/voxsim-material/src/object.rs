//! A voxel object: lattice, palette and structure together.
//!
//! Every edit validates its inputs first and commits nothing on error.

use serde::{Deserialize, Serialize};
use tracing::debug;
use voxsim_lattice::{Lattice, Structure, VoxelAppearance};
use voxsim_math::DVec3;
use voxsim_types::constants::MAX_RESOLVE_HOPS;
use voxsim_types::{MaterialIndex, VoxelIndex, VoxsimError, VoxsimResult};

use crate::material::MaterialKind;
use crate::palette::{LeafResolution, Palette};
use crate::properties::LeafProperties;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoxelObject {
    pub lattice: Lattice,
    pub appearance: VoxelAppearance,
    pub palette: Palette,
    pub structure: Structure,
}

impl VoxelObject {
    /// An empty `x * y * z` object with only the empty material.
    pub fn new(lattice: Lattice, x: usize, y: usize, z: usize) -> Self {
        Self {
            lattice,
            appearance: VoxelAppearance::default(),
            palette: Palette::new(),
            structure: Structure::new(x, y, z),
        }
    }

    /// Wraps existing parts, checking that every cell names a palette entry.
    pub fn from_parts(
        lattice: Lattice,
        palette: Palette,
        structure: Structure,
    ) -> VoxsimResult<Self> {
        if let Some(&bad) = structure
            .data()
            .iter()
            .find(|&&m| m as usize >= palette.len())
        {
            return Err(VoxsimError::Validation(format!(
                "structure references material {bad} but palette has {} entries",
                palette.len()
            )));
        }
        Ok(Self {
            lattice,
            appearance: VoxelAppearance::default(),
            palette,
            structure,
        })
    }

    /// Resets to an empty `0 x 0 x 0` object with a fresh palette.
    pub fn clear(&mut self) {
        *self = Self::new(self.lattice, 0, 0, 0);
    }

    // ─── Resolution ──────────────────────────────────────────

    /// Resolves the structural material at `index` down to a leaf.
    pub fn resolve_leaf(&self, index: VoxelIndex) -> LeafResolution {
        let (Some(material), Some(coords)) =
            (self.structure.get(index), self.structure.coords_of(index))
        else {
            return LeafResolution {
                index: MaterialIndex::EMPTY,
                visible: true,
                complete: true,
            };
        };
        self.palette.resolve(material, coords.map(|c| c as i64))
    }

    /// Leaf properties for the voxel at `index`.
    pub fn leaf_at(&self, index: VoxelIndex) -> Option<&LeafProperties> {
        let r = self.resolve_leaf(index);
        if r.index.is_empty() {
            return None;
        }
        self.palette.leaf(r.index)
    }

    // ─── Structure edits ─────────────────────────────────────

    pub fn material_at(&self, index: VoxelIndex) -> Option<MaterialIndex> {
        self.structure.get(index)
    }

    pub fn set_voxel(&mut self, index: VoxelIndex, material: MaterialIndex) -> VoxsimResult<()> {
        self.check_material(material)?;
        self.structure.set(index, material)
    }

    pub fn set_voxel_at(
        &mut self,
        x: i64,
        y: i64,
        z: i64,
        material: MaterialIndex,
    ) -> VoxsimResult<()> {
        self.check_material(material)?;
        self.structure.set_at(x, y, z, material)
    }

    pub fn fill(&mut self, material: MaterialIndex) -> VoxsimResult<()> {
        self.check_material(material)?;
        self.structure.fill(material);
        Ok(())
    }

    pub fn resize(&mut self, x: usize, y: usize, z: usize) {
        self.structure.resize(x, y, z);
    }

    pub fn shift(&mut self, dx: i64, dy: i64, dz: i64) {
        self.structure.shift(dx, dy, dz);
    }

    fn check_material(&self, material: MaterialIndex) -> VoxsimResult<()> {
        if self.palette.contains(material) {
            Ok(())
        } else {
            Err(VoxsimError::Validation(format!(
                "material index {} not in palette of {}",
                material.0,
                self.palette.len()
            )))
        }
    }

    // ─── Palette edits ───────────────────────────────────────

    /// Replaces every use of `index` with `with` in the structure, in
    /// internal sub-lattices, and in dither references. With `delete`, the
    /// palette entry is removed and higher indices shift down by one.
    pub fn replace_material(
        &mut self,
        index: MaterialIndex,
        with: MaterialIndex,
        delete: bool,
    ) -> VoxsimResult<()> {
        if index == with {
            return Ok(());
        }
        let delete = delete && !index.is_empty();
        self.check_material(index)?;
        self.check_material(with)?;

        // Any composite that used `index` now uses `with`; refuse if that
        // composite is reachable from `with`.
        for (ci, m) in self.palette.iter() {
            if m.is_composite()
                && m.references().contains(&index)
                && (ci == with || self.palette.is_in_recursive_path(with, ci))
            {
                return Err(VoxsimError::Recursion(format!(
                    "replacing material {} with {} would make '{}' reference itself",
                    index.0, with.0, m.name
                )));
            }
        }

        let target = if delete && with > index {
            MaterialIndex(with.0 - 1)
        } else {
            with
        };
        let renumber = |m: MaterialIndex| -> MaterialIndex {
            if m == index {
                target
            } else if delete && m > index {
                MaterialIndex(m.0 - 1)
            } else {
                m
            }
        };

        self.structure.replace_material(index, target, delete);
        for m in self.palette.materials_mut().iter_mut() {
            match &mut m.kind {
                MaterialKind::Internal(s) => s.structure.replace_material(index, target, delete),
                MaterialKind::Dither(d) => {
                    d.first = renumber(d.first);
                    d.second = renumber(d.second);
                }
                MaterialKind::Leaf(_) => {}
            }
        }
        if delete {
            self.palette.materials_mut().remove(index.index());
        }
        debug!(from = index.0, to = with.0, delete, "material replaced");
        Ok(())
    }

    /// Substitutes one level of `index` everywhere it occurs in a voxel's
    /// resolution chain, writing the sub-material into the structure.
    pub fn flatten_material(&mut self, index: MaterialIndex) -> VoxsimResult<()> {
        match self.palette.get(index) {
            Some(m) if m.is_composite() => {}
            _ => {
                return Err(VoxsimError::Validation(
                    "cannot flatten a non-composite material".into(),
                ))
            }
        }

        let mut updates = Vec::new();
        for vi in self.structure.occupied() {
            let (Some(mut cur), Some(c)) = (self.structure.get(vi), self.structure.coords_of(vi))
            else {
                continue;
            };
            let mut coords = c.map(|v| v as i64);
            for _ in 0..MAX_RESOLVE_HOPS {
                let Some((next, local)) = self.palette.step(cur, coords) else {
                    break;
                };
                if cur == index {
                    updates.push((vi, next));
                    break;
                }
                cur = next;
                coords = local;
            }
        }
        for (vi, m) in updates {
            self.structure.set(vi, m)?;
        }
        Ok(())
    }

    /// Removes a palette entry, emptying the voxels that used it.
    pub fn delete_material(
        &mut self,
        index: MaterialIndex,
        flatten_first: bool,
    ) -> VoxsimResult<()> {
        if index.is_empty() {
            return Err(VoxsimError::Validation(
                "cannot delete the reserved empty material".into(),
            ));
        }
        self.check_material(index)?;
        if flatten_first && self.palette.get(index).is_some_and(|m| m.is_composite()) {
            self.flatten_material(index)?;
        }
        self.replace_material(index, MaterialIndex::EMPTY, true)
    }

    /// Empties the structure and resets the palette to the empty material.
    pub fn clear_palette(&mut self) {
        self.structure.clear();
        self.palette.clear();
    }

    // ─── Queries ─────────────────────────────────────────────

    pub fn voxel_count(&self) -> usize {
        self.structure.occupied_count()
    }

    /// Voxels using `material`, either structurally or after resolution.
    pub fn count_of(&self, material: MaterialIndex, leaf_only: bool) -> usize {
        if !leaf_only {
            return self.structure.count_of(material);
        }
        (0..self.structure.len() as u32)
            .filter(|&i| self.resolve_leaf(VoxelIndex(i)).index == material)
            .count()
    }

    /// Number of distinct leaf materials (excluding empty) present after resolution.
    pub fn leaf_materials_in_use(&self) -> usize {
        let mut seen = vec![false; self.palette.len()];
        for vi in self.structure.occupied() {
            let r = self.resolve_leaf(vi);
            if let Some(s) = seen.get_mut(r.index.index()) {
                *s = true;
            }
        }
        seen.iter().skip(1).filter(|&&s| s).count()
    }

    /// Distinct leaf indices in use, ascending.
    pub fn leaf_indices_in_use(&self) -> Vec<MaterialIndex> {
        let mut seen = vec![false; self.palette.len()];
        for vi in self.structure.occupied() {
            let r = self.resolve_leaf(vi);
            if let Some(s) = seen.get_mut(r.index.index()) {
                *s = true;
            }
        }
        seen.iter()
            .enumerate()
            .skip(1)
            .filter(|(_, &s)| s)
            .map(|(i, _)| MaterialIndex(i as u8))
            .collect()
    }

    /// Area of all faces not shared with an occupied neighbour.
    pub fn surface_area(&self) -> f64 {
        let [nx, ny, nz] = self.structure.dims().map(|d| d as i64);
        let mut faces = [0usize; 3];
        let s = &self.structure;
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    if s.get_at(i, j, k).is_empty() {
                        continue;
                    }
                    faces[0] += s.get_at(i + 1, j, k).is_empty() as usize
                        + s.get_at(i - 1, j, k).is_empty() as usize;
                    faces[1] += s.get_at(i, j + 1, k).is_empty() as usize
                        + s.get_at(i, j - 1, k).is_empty() as usize;
                    faces[2] += s.get_at(i, j, k + 1).is_empty() as usize
                        + s.get_at(i, j, k - 1).is_empty() as usize;
                }
            }
        }
        let d = self.lattice.voxel_size();
        d.y * d.z * faces[0] as f64 + d.x * d.z * faces[1] as f64 + d.x * d.y * faces[2] as f64
    }

    pub fn volume(&self) -> f64 {
        let d = self.lattice.voxel_size();
        self.voxel_count() as f64 * d.x * d.y * d.z
    }

    /// Mass from the densities of each voxel's resolved leaf.
    pub fn weight(&self) -> f64 {
        let d = self.lattice.voxel_size();
        let vox_vol = d.x * d.y * d.z;
        self.structure
            .occupied()
            .filter_map(|vi| self.leaf_at(vi))
            .map(|leaf| leaf.density * vox_vol)
            .sum()
    }

    pub fn workspace(&self) -> DVec3 {
        self.lattice.workspace(self.structure.dims())
    }

    /// Center of the voxel at `index`, including lattice offsets.
    pub fn position(&self, index: VoxelIndex) -> Option<DVec3> {
        let [x, y, z] = self.structure.coords_of(index)?;
        Some(self.lattice.position(x, y, z))
    }

    /// Whether two structural indices are adjacent; both must be occupied
    /// unless `include_empty` is set.
    pub fn are_adjacent(&self, a: VoxelIndex, b: VoxelIndex, include_empty: bool) -> bool {
        if !include_empty {
            let occupied = |i| self.structure.get(i).is_some_and(|m| !m.is_empty());
            if !occupied(a) || !occupied(b) {
                return false;
            }
        }
        match (self.position(a), self.position(b)) {
            (Some(pa), Some(pb)) => self.lattice.are_adjacent(pa, pb),
            _ => false,
        }
    }
}

impl Default for VoxelObject {
    fn default() -> Self {
        Self::new(Lattice::default(), 0, 0, 0)
    }
}
