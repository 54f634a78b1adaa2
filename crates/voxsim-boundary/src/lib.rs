//! # voxsim-boundary
//!
//! Boundary-condition regions: a primitive shape that selects voxels, plus
//! which degrees of freedom are fixed there and what drives them.
//!
//! Primitive parameters are fractions of the workspace envelope, so a region
//! drawn as "the X+ face, 1% thick" keeps its meaning when the lattice is
//! resized.
//!
//! ## Primitives
//!
//! - [`PrimitiveKind::Box`] — axis-aligned box
//! - [`PrimitiveKind::Cylinder`] — axis given by the first nonzero size component
//! - [`PrimitiveKind::Sphere`]
//! - [`PrimitiveKind::Mesh`] — closed triangle soup, tested by ray parity

pub mod assign;
pub mod mesh;
pub mod primitive;
pub mod region;

pub use assign::{BoundarySet, VoxelConstraint};
pub use mesh::TriangleSoup;
pub use primitive::{Primitive, PrimitiveKind};
pub use region::BoundaryRegion;
