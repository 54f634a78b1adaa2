//! Self-collision between non-bonded voxels.
//!
//! Two voxels collide when their centers come closer than 0.75 of the sum
//! of their sizes (an effective diameter of 1.5 voxels). The repulsion is
//! the pair's combined axial stiffness times the overlap along the line of
//! centers, damped on the normal component of relative velocity.

use tracing::trace;
use voxsim_math::DVec3;
use voxsim_types::{VoxsimError, VoxsimResult};

use crate::broad::BroadPhase;
use crate::contact::ContactResult;
use crate::spatial_hash::SpatialHash;

/// Contact distance as a fraction of the summed voxel sizes.
pub const CONTACT_DIAMETER: f64 = 0.75;

/// Per-voxel inputs to collision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionBody {
    pub position: DVec3,
    pub velocity: DVec3,
    pub mass: f64,
    pub size: f64,
    pub elastic_modulus: f64,
}

/// Broad phase plus pairwise penalty response.
pub struct SelfCollision {
    broad: Box<dyn BroadPhase>,
    damping: f64,
}

impl SelfCollision {
    /// Spatial hash sized for voxels up to `max_size`.
    pub fn new(max_size: f64, damping: f64) -> Self {
        Self::with_broad_phase(
            Box::new(SpatialHash::new(2.0 * CONTACT_DIAMETER * max_size)),
            damping,
        )
    }

    pub fn with_broad_phase(broad: Box<dyn BroadPhase>, damping: f64) -> Self {
        Self {
            broad,
            damping: damping.clamp(0.0, 1.0),
        }
    }

    pub fn damping(&self) -> f64 {
        self.damping
    }

    pub fn set_damping(&mut self, damping: f64) {
        self.damping = damping.clamp(0.0, 1.0);
    }

    pub fn broad_phase_name(&self) -> &str {
        self.broad.name()
    }

    /// Adds collision forces into `forces`. Pairs for which `bonded`
    /// returns true are skipped.
    pub fn accumulate(
        &mut self,
        bodies: &[CollisionBody],
        bonded: impl Fn(u32, u32) -> bool,
        forces: &mut [DVec3],
    ) -> VoxsimResult<ContactResult> {
        if forces.len() != bodies.len() {
            return Err(VoxsimError::Validation(format!(
                "force buffer length ({}) != body count ({})",
                forces.len(),
                bodies.len()
            )));
        }
        let positions: Vec<DVec3> = bodies.iter().map(|b| b.position).collect();
        self.broad.update(&positions)?;

        let mut result = ContactResult::default();
        for pair in self.broad.query_pairs() {
            if bonded(pair.a, pair.b) {
                continue;
            }
            let (ia, ib) = (pair.a as usize, pair.b as usize);
            let (a, b) = (&bodies[ia], &bodies[ib]);
            let rel = b.position - a.position;
            let dist = rel.length();
            let overlap = (a.size + b.size) * CONTACT_DIAMETER - dist;
            if overlap <= 0.0 || dist <= 0.0 {
                continue;
            }
            let modulus_sum = a.elastic_modulus + b.elastic_modulus;
            let mass_sum = a.mass + b.mass;
            if modulus_sum <= 0.0 || mass_sum <= 0.0 {
                continue;
            }
            let normal = rel / dist;

            // Series-combined modulus over the mean size gives E·L.
            let e = 2.0 * a.elastic_modulus * b.elastic_modulus / modulus_sum;
            let k = e * 0.5 * (a.size + b.size);
            let reduced_mass = a.mass * b.mass / mass_sum;
            let closing = (b.velocity - a.velocity).dot(normal);
            let magnitude = k * overlap - self.damping * 2.0 * (k * reduced_mass).sqrt() * closing;
            let magnitude = magnitude.max(0.0);

            forces[ib] += normal * magnitude;
            forces[ia] -= normal * magnitude;
            result.record(overlap, magnitude);
        }
        trace!(contacts = result.resolved_count, "self collision pass");
        Ok(result)
    }
}
