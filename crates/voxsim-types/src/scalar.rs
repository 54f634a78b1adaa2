//! Scalar type alias for the simulation.
//!
//! Voxel lattices routinely mix millimetre positions with megapascal
//! moduli, so everything runs in double precision.

/// The floating-point type used throughout the simulation.
pub type Scalar = f64;
