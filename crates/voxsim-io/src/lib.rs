//! # voxsim-io
//!
//! Persisted documents and the run contract.
//!
//! - [`xml`] — a small element tree over `quick-xml`
//! - [`encoding`] — per-layer voxel data encodings
//! - [`vxc`] — the structure document (lattice, voxel, palette, structure)
//! - [`bcs`] — the boundary-condition/environment document
//! - [`contract`] — the TOML run configuration and the run summary
//! - [`validator`] — checks run configurations and loaded documents

pub mod bcs;
pub mod contract;
pub mod encoding;
pub mod validator;
pub mod vxc;
pub mod xml;

pub use bcs::{load_bcx, read_bcx, save_bcx, write_bcx, EnvironmentDocument};
pub use contract::{OutputPaths, RunConfig, RunSummary};
pub use encoding::Compression;
pub use validator::{validate_boundaries, validate_object, validate_run_config};
pub use vxc::{load_vxc, read_vxc, read_vxc_into, save_vxc, write_vxc};
pub use xml::XmlElement;
