//! Lattice axes and bond-local frames.
//!
//! Bond force computation is written once for a bond pointing along +X.
//! Bonds along Y or Z are rotated into that frame and back again with
//! these exact permutations (no trigonometry, no rounding).

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// A lattice axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Component index (0, 1, 2).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Unit vector along this axis.
    #[inline]
    pub fn unit(self) -> DVec3 {
        match self {
            Axis::X => DVec3::X,
            Axis::Y => DVec3::Y,
            Axis::Z => DVec3::Z,
        }
    }

    /// The axis a nominal offset lies on, if it is axis-aligned.
    pub fn of_offset(d: DVec3) -> Option<Axis> {
        if d.x == 0.0 && d.y == 0.0 && d.z != 0.0 {
            Some(Axis::Z)
        } else if d.x == 0.0 && d.z == 0.0 && d.y != 0.0 {
            Some(Axis::Y)
        } else if d.y == 0.0 && d.z == 0.0 && d.x != 0.0 {
            Some(Axis::X)
        } else {
            None
        }
    }
}

/// Maps a vector from world orientation into the +X bond frame.
#[inline]
pub fn to_x_frame(axis: Axis, v: DVec3) -> DVec3 {
    match axis {
        Axis::X => v,
        Axis::Y => DVec3::new(v.y, -v.x, v.z),
        Axis::Z => DVec3::new(v.z, v.y, -v.x),
    }
}

/// Inverse of [`to_x_frame`].
#[inline]
pub fn from_x_frame(axis: Axis, v: DVec3) -> DVec3 {
    match axis {
        Axis::X => v,
        Axis::Y => DVec3::new(-v.y, v.x, v.z),
        Axis::Z => DVec3::new(-v.z, v.y, v.x),
    }
}

/// Maps an orientation into the +X bond frame (permutes the vector part).
#[inline]
pub fn quat_to_x_frame(axis: Axis, q: DQuat) -> DQuat {
    let v = to_x_frame(axis, DVec3::new(q.x, q.y, q.z));
    DQuat::from_xyzw(v.x, v.y, v.z, q.w)
}
