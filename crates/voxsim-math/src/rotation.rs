//! Rotation-vector helpers.

use glam::{DQuat, DVec3};

/// Angle below which a relative rotation counts as "small" (radians).
pub const SMALL_ANGLE_RAD: f64 = 0.05;

/// Builds a unit quaternion from a rotation vector (axis × angle).
#[inline]
pub fn from_rotation_vector(v: DVec3) -> DQuat {
    if v.length_squared() == 0.0 {
        DQuat::IDENTITY
    } else {
        DQuat::from_scaled_axis(v)
    }
}

/// Rotation vector (axis × angle) of a unit quaternion, taking the short way round.
#[inline]
pub fn to_rotation_vector(q: DQuat) -> DVec3 {
    let q = if q.w < 0.0 { -q } else { q };
    q.to_scaled_axis()
}

/// True if the rotation is below [`SMALL_ANGLE_RAD`].
#[inline]
pub fn is_small_angle(q: DQuat) -> bool {
    to_rotation_vector(q).length() < SMALL_ANGLE_RAD
}

/// Integrates an orientation by angular velocity `w` over `dt` and renormalizes.
pub fn integrate(q: DQuat, w: DVec3, dt: f64) -> DQuat {
    let spin = DQuat::from_xyzw(w.x, w.y, w.z, 0.0) * q * 0.5;
    (q + spin * dt).normalize()
}
