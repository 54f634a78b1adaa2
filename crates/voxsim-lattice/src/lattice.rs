//! Lattice geometry descriptor.
//!
//! A lattice maps integer voxel coordinates to physical positions. The
//! base spacing `lattice_dim` is scaled per axis by the `*_dim_adj`
//! factors. Rows and layers can be shifted by the line/layer offsets
//! (fractions of a voxel) to describe non-cubic packings such as
//! close-packed spheres.

use serde::{Deserialize, Serialize};
use voxsim_math::DVec3;
use voxsim_types::constants::DEFAULT_LATTICE_DIM;

/// Keeps offsets that land exactly on a voxel boundary on the positive side.
const OFFSET_EPS: f64 = 1.0e-6;

/// Lattice geometry parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    /// Base voxel pitch in meters.
    pub lattice_dim: f64,

    // ─── Per-axis pitch scale ───
    pub x_dim_adj: f64,
    pub y_dim_adj: f64,
    pub z_dim_adj: f64,

    /// X shift per successive Y row, as a fraction of the pitch.
    pub x_line_offset: f64,
    /// Y shift per successive X column, as a fraction of the pitch.
    pub y_line_offset: f64,
    /// X shift per successive Z layer.
    pub x_layer_offset: f64,
    /// Y shift per successive Z layer.
    pub y_layer_offset: f64,
}

impl Lattice {
    /// A cubic lattice with the given pitch.
    pub fn cubic(lattice_dim: f64) -> Self {
        Self {
            lattice_dim,
            x_dim_adj: 1.0,
            y_dim_adj: 1.0,
            z_dim_adj: 1.0,
            x_line_offset: 0.0,
            y_line_offset: 0.0,
            x_layer_offset: 0.0,
            y_layer_offset: 0.0,
        }
    }

    /// Hexagonal close-packed spheres of the given diameter.
    pub fn hex_close_packed(lattice_dim: f64) -> Self {
        Self {
            lattice_dim,
            x_dim_adj: 1.0,
            y_dim_adj: 0.866_025,
            z_dim_adj: 0.816_497,
            x_line_offset: 0.5,
            y_line_offset: 0.0,
            x_layer_offset: 0.5,
            y_layer_offset: 0.288_675,
        }
    }

    /// True if no line or layer offsets are present.
    pub fn is_rectangular(&self) -> bool {
        self.x_line_offset == 0.0
            && self.y_line_offset == 0.0
            && self.x_layer_offset == 0.0
            && self.y_layer_offset == 0.0
    }

    /// Physical size of one voxel along each axis.
    pub fn voxel_size(&self) -> DVec3 {
        DVec3::new(
            self.lattice_dim * self.x_dim_adj,
            self.lattice_dim * self.y_dim_adj,
            self.lattice_dim * self.z_dim_adj,
        )
    }

    /// Largest X offset reached within `y_count` rows and `z_count` layers,
    /// as a fraction of the pitch.
    pub fn max_offset_x(&self, y_count: usize, z_count: usize) -> f64 {
        let mut max = 0.0;
        for i in 0..y_count {
            for j in 0..z_count {
                let tmp = i as f64 * self.x_line_offset + j as f64 * self.x_layer_offset;
                if tmp > max && tmp < self.x_dim_adj {
                    max = tmp;
                }
            }
        }
        max
    }

    /// Largest Y offset reached within `x_count` columns and `z_count` layers.
    pub fn max_offset_y(&self, x_count: usize, z_count: usize) -> f64 {
        let mut max = 0.0;
        for i in 0..x_count {
            for j in 0..z_count {
                let tmp = i as f64 * self.y_line_offset + j as f64 * self.y_layer_offset;
                if tmp > max && tmp < 1.0 {
                    max = tmp;
                }
            }
        }
        max
    }

    /// Bounding envelope of a `dims` voxel grid including offset padding.
    pub fn workspace(&self, dims: [usize; 3]) -> DVec3 {
        let [nx, ny, nz] = dims;
        DVec3::new(
            self.lattice_dim * self.x_dim_adj * (nx as f64 + self.max_offset_x(ny, nz)),
            self.lattice_dim * self.y_dim_adj * (ny as f64 + self.max_offset_y(nx, nz)),
            self.lattice_dim * self.z_dim_adj * nz as f64,
        )
    }

    /// Center of voxel `(ix, iy, iz)` without line/layer offsets.
    pub fn nominal_position(&self, ix: usize, iy: usize, iz: usize) -> DVec3 {
        self.voxel_size() * DVec3::new(ix as f64 + 0.5, iy as f64 + 0.5, iz as f64 + 0.5)
    }

    /// Center of voxel `(ix, iy, iz)` including line/layer offsets.
    ///
    /// Offsets that accumulate past a full voxel wrap back so every voxel
    /// stays inside the workspace envelope.
    pub fn position(&self, ix: usize, iy: usize, iz: usize) -> DVec3 {
        if self.is_rectangular() {
            return self.nominal_position(ix, iy, iz);
        }
        let (fx, fy, fz) = (ix as f64, iy as f64, iz as f64);

        let mut off_x = self.x_line_offset * fy + self.x_layer_offset * fz + OFFSET_EPS;
        let mut off_y = self.y_line_offset * fx + self.y_layer_offset * fz + OFFSET_EPS;
        let mut back_x = (off_x / self.x_dim_adj).trunc();
        let mut back_y = (off_y / self.y_dim_adj).trunc();

        // Second pass: a wrap in one axis changes the row count seen by the other.
        off_x = self.x_line_offset * (fy - back_y) + self.x_layer_offset * fz + OFFSET_EPS;
        off_y = self.y_line_offset * (fx - back_x) + self.y_layer_offset * fz + OFFSET_EPS;
        back_x = (off_x / self.x_dim_adj).trunc();
        back_y = (off_y / self.y_dim_adj).trunc();

        off_x -= back_x * self.x_dim_adj;
        off_y -= back_y * self.y_dim_adj;

        DVec3::new(
            self.lattice_dim * (self.x_dim_adj * (0.5 + fx) + off_x),
            self.lattice_dim * (self.y_dim_adj * (0.5 + fy) + off_y),
            self.lattice_dim * self.z_dim_adj * (0.5 + fz),
        )
    }

    /// Whether two voxel centers are structurally adjacent.
    ///
    /// Rectangular lattices accept face neighbours only. Offset lattices
    /// accept any pair closer than 1.4 pitches.
    pub fn are_adjacent(&self, p1: DVec3, p2: DVec3) -> bool {
        let rel = p2 - p1;
        if self.is_rectangular() {
            let a = rel.abs();
            let half = self.voxel_size() * 0.5;
            let face = |along: f64, h: f64| along > h && along < 3.0 * h;
            (a.y < half.y && a.z < half.z && face(a.x, half.x))
                || (a.x < half.x && a.z < half.z && face(a.y, half.y))
                || (a.x < half.x && a.y < half.y && face(a.z, half.z))
        } else {
            rel.length() < 1.4 * self.lattice_dim
        }
    }
}

impl Default for Lattice {
    fn default() -> Self {
        Self::cubic(DEFAULT_LATTICE_DIM)
    }
}

/// Display shape of a voxel. Purely descriptive; the core never renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoxelShape {
    Sphere,
    Box,
    Cylinder,
    /// Shape loaded from an external file.
    File(String),
}

/// Voxel appearance descriptor stored alongside the lattice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoxelAppearance {
    pub shape: VoxelShape,
    pub x_squeeze: f64,
    pub y_squeeze: f64,
    pub z_squeeze: f64,
}

impl Default for VoxelAppearance {
    fn default() -> Self {
        Self {
            shape: VoxelShape::Sphere,
            x_squeeze: 1.0,
            y_squeeze: 1.0,
            z_squeeze: 1.0,
        }
    }
}
