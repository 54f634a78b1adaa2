//! # voxsim-types
//!
//! Shared types, identifiers, error types, and physical constants
//! for the Voxsim voxel lattice simulator.
//!
//! This crate has zero domain logic — it defines the vocabulary
//! that all other Voxsim crates share.

pub mod constants;
pub mod dof;
pub mod error;
pub mod ids;
pub mod scalar;

pub use dof::{Dof, DofMask};
pub use error::{VoxsimError, VoxsimResult};
pub use ids::{BondId, MaterialIndex, SimIndex, VoxelIndex};
pub use scalar::Scalar;
