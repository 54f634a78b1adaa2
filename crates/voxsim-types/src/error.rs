//! Error types for the Voxsim engine.
//!
//! All crates return `VoxsimResult<T>` from fallible operations.
//! A failed operation never leaves a half-applied edit behind.

use thiserror::Error;

/// Unified error type for the Voxsim engine.
#[derive(Debug, Error)]
pub enum VoxsimError {
    /// Input is malformed or physically nonsensical.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A fixed capacity (e.g. palette size) would be exceeded.
    #[error("Resource limit reached: {0}")]
    ResourceLimit(String),

    /// A composite material references itself or one of its ancestors.
    #[error("Recursive material reference: {0}")]
    Recursion(String),

    /// Configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A document could not be parsed or its contents do not match its header.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The operation is not allowed in the current simulator state.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Convenience alias for `Result<T, VoxsimError>`.
pub type VoxsimResult<T> = Result<T, VoxsimError>;
