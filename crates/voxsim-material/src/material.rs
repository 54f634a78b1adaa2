//! Palette entries: leaves and composites.

use serde::{Deserialize, Serialize};
use voxsim_lattice::Structure;
use voxsim_math::Axis;
use voxsim_types::MaterialIndex;

use crate::hash::spatial_hash;
use crate::properties::LeafProperties;

/// Rotation applied to an internal sub-lattice before indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuarterTurn {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl QuarterTurn {
    pub fn code(&self) -> i32 {
        match self {
            QuarterTurn::R0 => 0,
            QuarterTurn::R90 => 1,
            QuarterTurn::R180 => 2,
            QuarterTurn::R270 => 3,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            1 => QuarterTurn::R90,
            2 => QuarterTurn::R180,
            3 => QuarterTurn::R270,
            _ => QuarterTurn::R0,
        }
    }
}

/// Two-material spatial mix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DitherSpec {
    pub first: MaterialIndex,
    pub second: MaterialIndex,
    /// Fraction of voxels (0..=1) that resolve to `first`.
    pub first_fraction: f64,
}

impl DitherSpec {
    /// Chooses a sub-material for the voxel at `(x, y, z)`.
    pub fn choose(&self, x: i64, y: i64, z: i64) -> MaterialIndex {
        let k = self.first.0 as u32 + self.second.0 as u32;
        if spatial_hash(x, y, z, k) < self.first_fraction {
            self.first
        } else {
            self.second
        }
    }
}

/// A tiled sub-lattice whose cells reference the outer palette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalSpec {
    pub structure: Structure,
    pub offset: [i64; 3],
    pub rotation_axis: Axis,
    pub rotation: QuarterTurn,
}

impl InternalSpec {
    pub fn new(structure: Structure) -> Self {
        Self {
            structure,
            offset: [0; 3],
            rotation_axis: Axis::X,
            rotation: QuarterTurn::R0,
        }
    }

    /// Maps outer coordinates into the sub-lattice: rotate, offset, then
    /// wrap into range. Returns the sub-material and the local coordinates.
    pub fn locate(&self, x: i64, y: i64, z: i64) -> Option<(MaterialIndex, [i64; 3])> {
        let [sx, sy, sz] = self.structure.dims().map(|d| d as i64);
        if sx == 0 || sy == 0 || sz == 0 {
            return None;
        }
        let (mut x, mut y, mut z) = (x, y, z);
        match (self.rotation_axis, self.rotation) {
            (_, QuarterTurn::R0) => {}
            (Axis::X, QuarterTurn::R90) => (y, z) = (z, -y - 1),
            (Axis::X, QuarterTurn::R180) => (y, z) = (-y - 1, -z - 1),
            (Axis::X, QuarterTurn::R270) => (y, z) = (-z - 1, y),
            (Axis::Y, QuarterTurn::R90) => (x, z) = (-z - 1, x),
            (Axis::Y, QuarterTurn::R180) => (x, z) = (-x - 1, -z - 1),
            (Axis::Y, QuarterTurn::R270) => (x, z) = (z, -x - 1),
            (Axis::Z, QuarterTurn::R90) => (x, y) = (y, -x - 1),
            (Axis::Z, QuarterTurn::R180) => (x, y) = (-x - 1, -y - 1),
            (Axis::Z, QuarterTurn::R270) => (x, y) = (-y - 1, x),
        }
        let lx = (x - self.offset[0]).rem_euclid(sx);
        let ly = (y - self.offset[1]).rem_euclid(sy);
        let lz = (z - self.offset[2]).rem_euclid(sz);
        Some((self.structure.get_at(lx, ly, lz), [lx, ly, lz]))
    }
}

/// Variant payload of a palette entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MaterialKind {
    Leaf(LeafProperties),
    Dither(DitherSpec),
    Internal(InternalSpec),
}

impl MaterialKind {
    /// Numeric tag used in documents. Code 2 (external file reference) is
    /// obsolete and never written.
    pub fn code(&self) -> i32 {
        match self {
            MaterialKind::Leaf(_) => 0,
            MaterialKind::Internal(_) => 1,
            MaterialKind::Dither(_) => 3,
        }
    }
}

/// One palette entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    /// Display color, RGBA in `[0, 1]`.
    pub color: [f32; 4],
    pub visible: bool,
    pub kind: MaterialKind,
}

impl Material {
    pub fn leaf(name: impl Into<String>, props: LeafProperties) -> Self {
        Self {
            name: name.into(),
            color: [0.5, 0.5, 0.5, 1.0],
            visible: true,
            kind: MaterialKind::Leaf(props),
        }
    }

    pub fn dither(
        name: impl Into<String>,
        first: MaterialIndex,
        second: MaterialIndex,
        first_fraction: f64,
    ) -> Self {
        Self {
            name: name.into(),
            color: [0.5, 0.5, 0.5, 1.0],
            visible: true,
            kind: MaterialKind::Dither(DitherSpec {
                first,
                second,
                first_fraction: first_fraction.clamp(0.0, 1.0),
            }),
        }
    }

    pub fn internal(name: impl Into<String>, spec: InternalSpec) -> Self {
        Self {
            name: name.into(),
            color: [0.5, 0.5, 0.5, 1.0],
            visible: true,
            kind: MaterialKind::Internal(spec),
        }
    }

    /// The reserved index-0 entry.
    pub fn erase() -> Self {
        Self {
            name: "Erase".into(),
            color: [0.0, 0.0, 0.0, 0.0],
            visible: true,
            kind: MaterialKind::Leaf(LeafProperties::zeroed()),
        }
    }

    pub fn with_color(mut self, r: f32, g: f32, b: f32, a: f32) -> Self {
        self.color = [r, g, b, a];
        self
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, MaterialKind::Leaf(_))
    }

    pub fn is_composite(&self) -> bool {
        !self.is_leaf()
    }

    pub fn leaf_properties(&self) -> Option<&LeafProperties> {
        match &self.kind {
            MaterialKind::Leaf(p) => Some(p),
            _ => None,
        }
    }

    pub fn leaf_properties_mut(&mut self) -> Option<&mut LeafProperties> {
        match &mut self.kind {
            MaterialKind::Leaf(p) => Some(p),
            _ => None,
        }
    }

    /// Palette indices this material refers to directly.
    pub fn references(&self) -> Vec<MaterialIndex> {
        match &self.kind {
            MaterialKind::Leaf(_) => Vec::new(),
            MaterialKind::Dither(d) => vec![d.first, d.second],
            MaterialKind::Internal(s) => {
                let mut seen = [false; 256];
                for &m in s.structure.data() {
                    seen[m as usize] = true;
                }
                (1..256)
                    .filter(|&i| seen[i])
                    .map(|i| MaterialIndex(i as u8))
                    .collect()
            }
        }
    }
}
