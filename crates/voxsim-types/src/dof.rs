//! Degree-of-freedom masks for boundary conditions.
//!
//! Bit layout (low to high): X, Y, Z, TX, TY, TZ. A set bit means the
//! degree of freedom is fixed (displacement-driven), a clear bit means
//! it is free (force-driven).

use serde::{Deserialize, Serialize};

/// One of the six independent motion components of a voxel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dof {
    X,
    Y,
    Z,
    Tx,
    Ty,
    Tz,
}

impl Dof {
    /// All six degrees of freedom in bit order.
    pub const ALL: [Dof; 6] = [Dof::X, Dof::Y, Dof::Z, Dof::Tx, Dof::Ty, Dof::Tz];

    /// Bit for this degree of freedom within a [`DofMask`].
    #[inline]
    pub fn bit(self) -> u8 {
        match self {
            Dof::X => 0x01,
            Dof::Y => 0x02,
            Dof::Z => 0x04,
            Dof::Tx => 0x08,
            Dof::Ty => 0x10,
            Dof::Tz => 0x20,
        }
    }

    /// True for the three rotational components.
    #[inline]
    pub fn is_rotational(self) -> bool {
        matches!(self, Dof::Tx | Dof::Ty | Dof::Tz)
    }

    /// Vector component (0 = x, 1 = y, 2 = z) this DOF acts on.
    #[inline]
    pub fn axis(self) -> usize {
        match self {
            Dof::X | Dof::Tx => 0,
            Dof::Y | Dof::Ty => 1,
            Dof::Z | Dof::Tz => 2,
        }
    }
}

/// A 6-bit fixed/free mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DofMask(u8);

impl DofMask {
    /// Nothing fixed.
    pub const NONE: DofMask = DofMask(0x00);
    /// Everything fixed.
    pub const ALL: DofMask = DofMask(0x3F);

    /// Builds a mask from raw bits, discarding anything above bit 5.
    pub fn from_bits(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    /// Raw bit pattern.
    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_fixed(self, dof: Dof) -> bool {
        self.0 & dof.bit() != 0
    }

    pub fn is_all_fixed(self) -> bool {
        self.0 & Self::ALL.0 == Self::ALL.0
    }

    pub fn is_none_fixed(self) -> bool {
        self.0 & Self::ALL.0 == 0
    }

    /// True if all three translational components are fixed.
    pub fn is_translation_fixed(self) -> bool {
        self.0 & 0x07 == 0x07
    }

    /// True if all three rotational components are fixed.
    pub fn is_rotation_fixed(self) -> bool {
        self.0 & 0x38 == 0x38
    }

    pub fn set_fixed(&mut self, dof: Dof, fixed: bool) {
        if fixed {
            self.0 |= dof.bit();
        } else {
            self.0 &= !dof.bit();
        }
    }

    /// Bitwise union, used when several regions claim the same voxel.
    pub fn union(self, other: DofMask) -> DofMask {
        DofMask(self.0 | other.0)
    }
}
