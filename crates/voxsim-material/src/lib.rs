//! # voxsim-material
//!
//! Materials and the objects built from them.
//!
//! ## Models
//!
//! - [`model::LinearModel`] — stress = E·ε, never yields
//! - [`model::LinearFailModel`] — linear until a failure threshold
//! - [`model::BilinearModel`] — elastic then plastic slope
//! - [`model::DataModel`] — piecewise-linear user stress/strain data
//!
//! ## Composition
//!
//! A [`Palette`] holds [`Material`] entries that are either leaves or
//! composites (dither, internal sub-lattice). A [`VoxelObject`] ties the
//! palette to a [`voxsim_lattice::Structure`] and resolves every voxel to
//! its leaf material.

pub mod hash;
pub mod material;
pub mod model;
pub mod object;
pub mod palette;
pub mod presets;
pub mod properties;
pub mod series;

pub use material::{DitherSpec, InternalSpec, Material, MaterialKind, QuarterTurn};
pub use model::{ConstitutiveModel, MaterialModel, StressResponse};
pub use object::VoxelObject;
pub use palette::{LeafResolution, Palette};
pub use presets::MaterialLibrary;
pub use properties::{FailureMode, LeafProperties, ModelKind};
pub use series::StressStrainSeries;
