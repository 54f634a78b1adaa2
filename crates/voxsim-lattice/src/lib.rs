//! # voxsim-lattice
//!
//! Geometry and occupancy for voxel objects.
//!
//! ## Key Types
//!
//! - [`Lattice`] — base spacing plus per-axis scale and line/layer offsets
//! - [`Structure`] — dense `X*Y*Z` bitmap of palette indices with optional
//!   per-voxel auxiliary arrays
//! - [`topology::Topology`] — face adjacency (bonds) and surface voxels
//! - [`generators`] — procedural structures for tests and benchmarks

pub mod generators;
pub mod lattice;
pub mod structure;
pub mod topology;

pub use lattice::{Lattice, VoxelAppearance, VoxelShape};
pub use structure::{AuxField, Structure};
pub use topology::{BondDir, BondPair, Topology};
