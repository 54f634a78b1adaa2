//! Strongly-typed identifiers for lattice entities.
//!
//! Newtype wrappers prevent accidental mixing of structural indices
//! (every cell of the bitmap) with simulation indices (only occupied
//! cells) or palette indices.

use serde::{Deserialize, Serialize};

/// Index into the full `X*Y*Z` structure bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoxelIndex(pub u32);

/// Index into the simulator's compact per-voxel arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SimIndex(pub u32);

/// Index into the material palette. Index 0 is always the empty material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialIndex(pub u8);

/// Index into the simulator's bond array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BondId(pub u32);

impl VoxelIndex {
    /// Returns the raw index as `usize` for array indexing.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl SimIndex {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl MaterialIndex {
    /// The reserved empty material.
    pub const EMPTY: MaterialIndex = MaterialIndex(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// True for the reserved empty material.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BondId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for VoxelIndex {
    fn from(val: u32) -> Self {
        Self(val)
    }
}

impl From<u32> for SimIndex {
    fn from(val: u32) -> Self {
        Self(val)
    }
}

impl From<u8> for MaterialIndex {
    fn from(val: u8) -> Self {
        Self(val)
    }
}

impl TryFrom<usize> for MaterialIndex {
    type Error = crate::VoxsimError;

    fn try_from(val: usize) -> Result<Self, Self::Error> {
        u8::try_from(val).map(Self).map_err(|_| {
            crate::VoxsimError::Validation(format!("Material index {val} out of range"))
        })
    }
}
