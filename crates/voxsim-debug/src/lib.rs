//! # voxsim-debug
//!
//! Step hooks and kinematic snapshots for debugging simulation runs.
//! Snapshots serialize the voxel positions, orientations and velocities
//! to binary so two runs can be compared step for step.

pub mod hooks;
pub mod snapshot;

pub use hooks::{
    run_with_hooks, InspectionHook, SnapshotHook, StatsRecorder, StatsRow, TelemetryHook,
};
pub use snapshot::KinematicSnapshot;
