//! # voxsim-solver
//!
//! Explicit dynamics for voxel lattices.
//!
//! ## Key Types
//!
//! - [`Simulator`] — run-state machine, bond pass and Euler integration
//! - [`PhysicsConfig`] — damping, time step, features, stop condition, environment
//! - [`Feature`] / [`FeatureSet`] — named physics toggles
//! - [`StopCondition`] — what ends a run
//! - [`VoxelState`] — SoA buffers for every simulated voxel
//! - [`Bond`] — beam model between face neighbours
//! - [`SimWorker`] — the simulator on a background thread

pub mod bond;
pub mod config;
pub mod features;
pub mod integrator;
pub mod state;
pub mod stats;
pub mod stop;
pub mod worker;

pub use bond::{Bond, BondConstants, BondContext};
pub use config::{Environment, PhysicsConfig};
pub use features::{Feature, FeatureSet};
pub use integrator::{RunState, Simulator};
pub use state::{SimMaterial, VoxelState};
pub use stats::SimStats;
pub use stop::{Histories, StopCondition, StopKind};
pub use worker::{SimWorker, WorkerCommand, WorkerStatus};
