//! Face adjacency between occupied voxels.
//!
//! Bonds exist only between face neighbours in index space; edge and corner
//! contact never bonds.

use voxsim_math::Axis;
use voxsim_types::{BondId, VoxelIndex};

use crate::structure::Structure;

/// One of the six face directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondDir {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl BondDir {
    pub const ALL: [BondDir; 6] = [
        BondDir::PosX,
        BondDir::NegX,
        BondDir::PosY,
        BondDir::NegY,
        BondDir::PosZ,
        BondDir::NegZ,
    ];

    pub fn offset(&self) -> [i64; 3] {
        match self {
            BondDir::PosX => [1, 0, 0],
            BondDir::NegX => [-1, 0, 0],
            BondDir::PosY => [0, 1, 0],
            BondDir::NegY => [0, -1, 0],
            BondDir::PosZ => [0, 0, 1],
            BondDir::NegZ => [0, 0, -1],
        }
    }

    pub fn axis(&self) -> Axis {
        match self {
            BondDir::PosX | BondDir::NegX => Axis::X,
            BondDir::PosY | BondDir::NegY => Axis::Y,
            BondDir::PosZ | BondDir::NegZ => Axis::Z,
        }
    }

    pub fn opposite(&self) -> BondDir {
        match self {
            BondDir::PosX => BondDir::NegX,
            BondDir::NegX => BondDir::PosX,
            BondDir::PosY => BondDir::NegY,
            BondDir::NegY => BondDir::PosY,
            BondDir::PosZ => BondDir::NegZ,
            BondDir::NegZ => BondDir::PosZ,
        }
    }

    pub fn slot(&self) -> usize {
        *self as usize
    }
}

/// A bond between two face-adjacent voxels; `neg` is the lower coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BondPair {
    pub neg: VoxelIndex,
    pub pos: VoxelIndex,
    pub axis: Axis,
}

/// Adjacency tables for the occupied voxels of a structure.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    /// All bonds, one per face-adjacent occupied pair.
    pub bonds: Vec<BondPair>,
    /// Per structure index, the bond in each [`BondDir`] slot.
    pub voxel_bonds: Vec<[Option<BondId>; 6]>,
}

impl Topology {
    /// Enumerates face bonds by scanning each occupied voxel's +X, +Y, +Z
    /// neighbour.
    pub fn build(structure: &Structure) -> Self {
        let mut bonds = Vec::new();
        let mut voxel_bonds = vec![[None; 6]; structure.len()];

        for index in structure.occupied() {
            let Some([x, y, z]) = structure.coords_of(index) else {
                continue;
            };
            for dir in [BondDir::PosX, BondDir::PosY, BondDir::PosZ] {
                let [dx, dy, dz] = dir.offset();
                let (nx, ny, nz) = (x as i64 + dx, y as i64 + dy, z as i64 + dz);
                if structure.get_at(nx, ny, nz).is_empty() {
                    continue;
                }
                let Some(other) = structure.index_of(nx, ny, nz) else {
                    continue;
                };
                let id = BondId(bonds.len() as u32);
                bonds.push(BondPair {
                    neg: index,
                    pos: other,
                    axis: dir.axis(),
                });
                voxel_bonds[index.index()][dir.slot()] = Some(id);
                voxel_bonds[other.index()][dir.opposite().slot()] = Some(id);
            }
        }

        Self { bonds, voxel_bonds }
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    /// Number of bonded faces on a voxel.
    pub fn neighbor_count(&self, index: VoxelIndex) -> usize {
        self.voxel_bonds
            .get(index.index())
            .map(|slots| slots.iter().filter(|b| b.is_some()).count())
            .unwrap_or(0)
    }

    /// Occupied voxels with at least one exposed face.
    pub fn surface_voxels(&self, structure: &Structure) -> Vec<VoxelIndex> {
        structure
            .occupied()
            .filter(|&i| self.neighbor_count(i) < 6)
            .collect()
    }
}
