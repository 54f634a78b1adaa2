//! Broad phase collision detection trait.
//!
//! Quickly identifies *candidate* voxel pairs from positions using a
//! spatial acceleration structure. Exact overlap is decided afterwards.

use voxsim_math::DVec3;
use voxsim_types::VoxsimResult;

/// Candidate pair of body indices, `a < b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CandidatePair {
    pub a: u32,
    pub b: u32,
}

impl CandidatePair {
    pub fn new(a: u32, b: u32) -> Self {
        if a <= b {
            Self { a, b }
        } else {
            Self { a: b, b: a }
        }
    }
}

/// Trait for broad phase collision detection.
///
/// # Implementations
/// - [`SpatialHash`](crate::spatial_hash::SpatialHash) — uniform grid
/// - [`NullBroadPhase`] — no candidates
pub trait BroadPhase: Send {
    /// Rebuilds the acceleration structure from current positions.
    fn update(&mut self, positions: &[DVec3]) -> VoxsimResult<()>;

    /// All pairs whose cells are the same or adjacent.
    fn query_pairs(&self) -> Vec<CandidatePair>;

    fn name(&self) -> &str;
}

/// No-op broad phase for runs without self-collision.
pub struct NullBroadPhase;

impl BroadPhase for NullBroadPhase {
    fn update(&mut self, _positions: &[DVec3]) -> VoxsimResult<()> {
        Ok(())
    }

    fn query_pairs(&self) -> Vec<CandidatePair> {
        Vec::new()
    }

    fn name(&self) -> &str {
        "null_broad_phase"
    }
}
