//! # voxsim-contact
//!
//! Contact forces for the voxel simulator.
//!
//! Two independent effects live here:
//! 1. **Floor** — penalty contact against a (possibly sloped) ground plane
//!    with static and dynamic friction
//! 2. **Self-collision** — a spatial hash broad phase feeding pairwise
//!    penalty repulsion between voxels that are not bonded
//!
//! Both work on plain per-voxel inputs so the integrator owns all state.

pub mod broad;
pub mod collision;
pub mod contact;
pub mod floor;
pub mod spatial_hash;

pub use broad::{BroadPhase, CandidatePair, NullBroadPhase};
pub use collision::{CollisionBody, SelfCollision};
pub use contact::ContactResult;
pub use floor::{Floor, FloorBody, FloorResponse};
pub use spatial_hash::SpatialHash;
