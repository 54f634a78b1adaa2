//! Physical constants and simulation defaults.

/// Gravitational acceleration (m/s²), applied along -Z.
pub const GRAVITY: f64 = -9.81;

/// Default lattice spacing (meters). One millimetre voxels.
pub const DEFAULT_LATTICE_DIM: f64 = 0.001;

/// Maximum number of palette entries, including the reserved empty material.
pub const MAX_MATERIALS: usize = 256;

/// Maximum composite hops taken while resolving a voxel to its leaf material.
pub const MAX_RESOLVE_HOPS: usize = 100;

/// Number of entries kept in each statistics history.
pub const HISTORY_SIZE: usize = 500;

/// Default fraction of the maximum stable timestep actually used.
pub const DEFAULT_DT_FRAC: f64 = 0.9;

/// Offset used by the 0.2% yield rule for tabulated stress/strain data.
pub const YIELD_OFFSET_STRAIN: f64 = 0.002;

/// Epsilon for floating-point comparisons.
pub const EPSILON: f64 = 1.0e-12;
