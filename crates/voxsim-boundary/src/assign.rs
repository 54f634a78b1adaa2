//! The set of regions on an object and per-voxel constraint assignment.

use serde::{Deserialize, Serialize};
use tracing::debug;
use voxsim_lattice::{Lattice, Structure};
use voxsim_math::DVec3;
use voxsim_types::{Dof, DofMask, VoxelIndex, VoxsimError, VoxsimResult};

use crate::region::BoundaryRegion;

/// Constraints and loads acting on one voxel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VoxelConstraint {
    pub dof: DofMask,
    /// Prescribed displacement on fixed translational DOF.
    pub displace: DVec3,
    /// Prescribed rotation on fixed rotational DOF.
    pub ang_displace: DVec3,
    /// This voxel's share of region forces.
    pub force: DVec3,
    pub torque: DVec3,
}

impl VoxelConstraint {
    pub fn is_free(&self) -> bool {
        self.dof.is_none_fixed() && self.force == DVec3::ZERO && self.torque == DVec3::ZERO
    }
}

/// Ordered list of boundary-condition regions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundarySet {
    regions: Vec<BoundaryRegion>,
}

fn component(v: DVec3, axis: usize) -> f64 {
    v.to_array()[axis]
}

fn set_component(v: &mut DVec3, axis: usize, value: f64) {
    let mut a = v.to_array();
    a[axis] = value;
    *v = DVec3::from_array(a);
}

impl BoundarySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_regions(regions: Vec<BoundaryRegion>) -> Self {
        Self { regions }
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundaryRegion> {
        self.regions.iter()
    }

    pub fn regions(&self) -> &[BoundaryRegion] {
        &self.regions
    }

    pub fn get(&self, index: usize) -> Option<&BoundaryRegion> {
        self.regions.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut BoundaryRegion> {
        self.regions.get_mut(index)
    }

    /// Appends a region and returns its index.
    pub fn add(&mut self, region: BoundaryRegion) -> usize {
        self.regions.push(region);
        self.regions.len() - 1
    }

    pub fn remove(&mut self, index: usize) -> VoxsimResult<BoundaryRegion> {
        if index >= self.regions.len() {
            return Err(VoxsimError::Validation(format!(
                "boundary region {index} out of range ({} regions)",
                self.regions.len()
            )));
        }
        Ok(self.regions.remove(index))
    }

    pub fn clear(&mut self) {
        self.regions.clear();
    }

    /// Rescales every region for a new envelope.
    pub fn scale_to(&mut self, old: DVec3, new: DVec3) {
        for r in &mut self.regions {
            r.scale_to(old, new);
        }
    }

    // ─── Voxel selection ─────────────────────────────────────

    /// Occupied voxels touched by region `index`: a voxel is selected when
    /// its half-size box around its center overlaps the region.
    pub fn touching(
        &self,
        index: usize,
        structure: &Structure,
        lattice: &Lattice,
    ) -> Vec<VoxelIndex> {
        let Some(region) = self.regions.get(index) else {
            return Vec::new();
        };
        let envelope = lattice.workspace(structure.dims());
        let half = lattice.voxel_size() * 0.5;
        structure
            .occupied()
            .filter(|&vi| {
                structure.coords_of(vi).is_some_and(|[x, y, z]| {
                    region
                        .primitive
                        .is_touching_box(lattice.position(x, y, z), half, envelope)
                })
            })
            .collect()
    }

    /// Dense per-structure-index constraints.
    ///
    /// DOF masks of overlapping regions are OR-ed; a fixed component takes
    /// the prescribed value of the last region fixing it. Region forces and
    /// torques are divided evenly over the voxels the region touches.
    pub fn assign(&self, structure: &Structure, lattice: &Lattice) -> Vec<VoxelConstraint> {
        let mut out = vec![VoxelConstraint::default(); structure.len()];
        for (ri, region) in self.regions.iter().enumerate() {
            let touched = self.touching(ri, structure, lattice);
            if touched.is_empty() {
                continue;
            }
            let share = 1.0 / touched.len() as f64;
            let mask = region.dof_fixed();
            for vi in &touched {
                let c = &mut out[vi.index()];
                c.dof = c.dof.union(mask);
                for dof in Dof::ALL {
                    if !mask.is_fixed(dof) {
                        continue;
                    }
                    let axis = dof.axis();
                    if dof.is_rotational() {
                        set_component(
                            &mut c.ang_displace,
                            axis,
                            component(region.ang_displace(), axis),
                        );
                    } else {
                        set_component(&mut c.displace, axis, component(region.displace(), axis));
                    }
                }
                c.force += region.force() * share;
                c.torque += region.torque() * share;
            }
            debug!(region = ri, voxels = touched.len(), "boundary region assigned");
        }
        out
    }

    /// Occupied voxels not face-connected to any fully fixed region, plus
    /// fully fixed voxels with no bonded neighbour.
    pub fn disconnected(&self, structure: &Structure, lattice: &Lattice) -> Vec<VoxelIndex> {
        let mut visited = vec![false; structure.len()];
        let mut queue = Vec::new();
        for (ri, region) in self.regions.iter().enumerate() {
            if !region.dof_fixed().is_all_fixed() {
                continue;
            }
            for vi in self.touching(ri, structure, lattice) {
                if !visited[vi.index()] {
                    visited[vi.index()] = true;
                    queue.push(vi);
                }
            }
        }

        let mut head = 0;
        while head < queue.len() {
            let vi = queue[head];
            head += 1;
            let Some([x, y, z]) = structure.coords_of(vi) else {
                continue;
            };
            let (x, y, z) = (x as i64, y as i64, z as i64);
            let mut alone = true;
            for (dx, dy, dz) in [
                (1, 0, 0),
                (-1, 0, 0),
                (0, 1, 0),
                (0, -1, 0),
                (0, 0, 1),
                (0, 0, -1),
            ] {
                let Some(ni) = structure.index_of(x + dx, y + dy, z + dz) else {
                    continue;
                };
                if structure.get(ni).is_some_and(|m| !m.is_empty()) {
                    alone = false;
                    if !visited[ni.index()] {
                        visited[ni.index()] = true;
                        queue.push(ni);
                    }
                }
            }
            if alone {
                visited[vi.index()] = false;
            }
        }

        structure.occupied().filter(|vi| !visited[vi.index()]).collect()
    }
}
