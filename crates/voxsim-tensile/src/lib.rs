//! # voxsim-tensile
//!
//! Quasi-static tensile testing on top of the dynamics integrator.
//!
//! ## Key Types
//!
//! - [`TensileTest`] — strain increments, each settled to equilibrium
//! - [`Convergence`] — auto presets, fixed motion threshold or fixed step count
//! - [`BlendSettings`] — graded re-rendering of two-material objects
//! - [`TensileResults`] — per-increment readings, written as TSV

pub mod blend;
pub mod controller;
pub mod convergence;
pub mod results;

pub use blend::{blend_object, BlendCurve, BlendSettings, GRADED_MATERIALS};
pub use controller::{check_boundaries, detect_basic, TensileParams, TensileTest};
pub use convergence::{Convergence, ConvergencePreset};
pub use results::{BasicTensile, RegionReading, TensileResults, TensileRow};
