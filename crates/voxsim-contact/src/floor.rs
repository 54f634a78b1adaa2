//! Floor contact.
//!
//! A penalty floor at `z = x · tan(slope)`. A voxel penetrates when its
//! lower half reaches below the plane; the normal force is the voxel's
//! axial stiffness times the penetration, minus collision damping on the
//! normal velocity. Friction is Coulomb with separate static and dynamic
//! coefficients. Call after every other force is summed so static
//! friction sees the full lateral load.

use serde::{Deserialize, Serialize};
use voxsim_math::DVec3;

/// Per-voxel inputs to the floor test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloorBody {
    pub position: DVec3,
    pub velocity: DVec3,
    pub mass: f64,
    /// Current edge length (meters).
    pub size: f64,
    /// Axial stiffness `E · size` (N/m).
    pub stiffness: f64,
    /// Critical damping scale `2·sqrt(m·E·size)`.
    pub critical_damping: f64,
    pub static_friction: f64,
    pub dynamic_friction: f64,
}

/// Outcome of the floor test for one voxel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FloorResponse {
    /// Force to add to the voxel (N).
    pub force: DVec3,
    pub penetration: f64,
    /// Lateral force must be zeroed this step.
    pub static_friction: bool,
    /// Lateral momentum must be zeroed (the voxel would stop within the step).
    pub halt_lateral: bool,
}

impl FloorResponse {
    pub fn is_touching(&self) -> bool {
        self.penetration > 0.0
    }
}

/// Ground plane, optionally tilted about the Y axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Floor {
    /// Slope in degrees; positive raises the floor toward +X.
    pub slope_deg: f64,
}

impl Floor {
    pub fn flat() -> Self {
        Self { slope_deg: 0.0 }
    }

    pub fn sloped(slope_deg: f64) -> Self {
        Self { slope_deg }
    }

    /// Floor height under `x`.
    pub fn height_at(&self, x: f64) -> f64 {
        x * self.slope_deg.to_radians().tan()
    }

    /// Penetration depth, zero when clear of the floor.
    pub fn penetration(&self, position: DVec3, size: f64) -> f64 {
        let p = 0.5 * size - position.z + self.height_at(position.x);
        p.max(0.0)
    }

    /// Evaluates floor contact given every other force `applied` on the
    /// voxel this step.
    pub fn respond(
        &self,
        body: &FloorBody,
        applied: DVec3,
        collision_damping: f64,
        dt: f64,
    ) -> FloorResponse {
        let penetration = self.penetration(body.position, body.size);
        if penetration <= 0.0 {
            return FloorResponse::default();
        }

        let normal = body.stiffness * penetration;
        let mut force = DVec3::new(0.0, 0.0, normal);
        force.z -= collision_damping * body.critical_damping * body.velocity.z;

        let mut response = FloorResponse {
            force,
            penetration,
            ..Default::default()
        };

        let surface_vel = body.velocity.x.hypot(body.velocity.y);
        let surface_force = applied.x.hypot(applied.y);
        let friction = body.dynamic_friction * normal;

        if body.velocity.x == 0.0 && body.velocity.y == 0.0 {
            if surface_force < body.static_friction * normal {
                response.static_friction = true;
            }
        } else if friction * dt < body.mass * surface_vel {
            let angle = body.velocity.y.atan2(body.velocity.x);
            response.force -= DVec3::new(angle.cos() * friction, angle.sin() * friction, 0.0);
        } else {
            // Friction would reverse the slide within this step.
            response.static_friction = true;
            response.halt_lateral = true;
        }
        response
    }
}
