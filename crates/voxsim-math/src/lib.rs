//! # voxsim-math
//!
//! Linear algebra primitives for the Voxsim simulator.
//!
//! Provides:
//! - Re-exports of `glam` double-precision types (`DVec3`, `DQuat`, `DMat3`)
//! - Bond-frame permutations that map Y- and Z-aligned bonds onto +X
//! - Rotation-vector helpers with small-angle classification
//! - Axis-aligned bounding boxes

pub mod bounds;
pub mod frame;
pub mod rotation;

// Re-export glam types as the canonical math types for Voxsim.
pub use glam::{DMat3, DQuat, DVec3};

pub use bounds::Aabb;
pub use frame::Axis;
