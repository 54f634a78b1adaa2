//! A boundary-condition region: primitive plus DOF constraints and loads.
//!
//! For each of the six DOF the region either fixes it (and may prescribe a
//! displacement or rotation) or leaves it free (and may apply a force or
//! torque). Toggling a DOF clears the value belonging to the other state so
//! that a displacement and a force are never both armed on the same DOF.

use serde::{Deserialize, Serialize};
use tracing::debug;
use voxsim_math::DVec3;
use voxsim_types::{Dof, DofMask};

use crate::primitive::{Primitive, PrimitiveKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryRegion {
    pub primitive: Primitive,
    /// Display color, RGBA.
    pub color: [f32; 4],
    dof_fixed: DofMask,
    /// Total force in N on free translational DOF, shared among the voxels.
    force: DVec3,
    /// Total torque in N·m on free rotational DOF.
    torque: DVec3,
    /// Prescribed displacement in m on fixed translational DOF.
    displace: DVec3,
    /// Prescribed rotation in rad on fixed rotational DOF.
    ang_displace: DVec3,
}

fn set_component(v: &mut DVec3, axis: usize, value: f64) {
    match axis {
        0 => v.x = value,
        1 => v.y = value,
        _ => v.z = value,
    }
}

impl BoundaryRegion {
    /// A free region with no loads.
    pub fn new(primitive: Primitive) -> Self {
        Self {
            primitive,
            color: [0.5, 0.5, 0.5, 1.0],
            dof_fixed: DofMask::NONE,
            force: DVec3::ZERO,
            torque: DVec3::ZERO,
            displace: DVec3::ZERO,
            ang_displace: DVec3::ZERO,
        }
    }

    /// A region with every DOF fixed and an optional prescribed displacement.
    pub fn fixed(primitive: Primitive, displace: DVec3) -> Self {
        let mut r = Self::new(primitive);
        r.dof_fixed = DofMask::ALL;
        r.displace = displace;
        r.color = [0.0, 0.0, 1.0, 0.5];
        r
    }

    /// A free region carrying a force and torque.
    pub fn forced(primitive: Primitive, force: DVec3, torque: DVec3) -> Self {
        let mut r = Self::new(primitive);
        r.force = force;
        r.torque = torque;
        r.color = [1.0, 0.0, 0.0, 0.5];
        r
    }

    /// Builds a region from stored parts without toggle side effects.
    pub fn from_parts(
        primitive: Primitive,
        dof_fixed: DofMask,
        force: DVec3,
        torque: DVec3,
        displace: DVec3,
        ang_displace: DVec3,
    ) -> Self {
        Self {
            primitive,
            color: [0.5, 0.5, 0.5, 1.0],
            dof_fixed,
            force,
            torque,
            displace,
            ang_displace,
        }
    }

    pub fn dof_fixed(&self) -> DofMask {
        self.dof_fixed
    }

    pub fn is_fixed(&self, dof: Dof) -> bool {
        self.dof_fixed.is_fixed(dof)
    }

    pub fn force(&self) -> DVec3 {
        self.force
    }

    pub fn torque(&self) -> DVec3 {
        self.torque
    }

    pub fn displace(&self) -> DVec3 {
        self.displace
    }

    pub fn ang_displace(&self) -> DVec3 {
        self.ang_displace
    }

    /// Fixes or frees one DOF, zeroing the value of the opposite state.
    pub fn set_fixed(&mut self, dof: Dof, fixed: bool) {
        if self.dof_fixed.is_fixed(dof) == fixed {
            return;
        }
        self.dof_fixed.set_fixed(dof, fixed);
        let axis = dof.axis();
        match (dof.is_rotational(), fixed) {
            (false, true) => set_component(&mut self.force, axis, 0.0),
            (false, false) => set_component(&mut self.displace, axis, 0.0),
            (true, true) => set_component(&mut self.torque, axis, 0.0),
            (true, false) => set_component(&mut self.ang_displace, axis, 0.0),
        }
        debug!(?dof, fixed, "boundary dof toggled");
    }

    /// Applies [`BoundaryRegion::set_fixed`] to every DOF.
    pub fn set_all_fixed(&mut self, fixed: bool) {
        for dof in Dof::ALL {
            self.set_fixed(dof, fixed);
        }
    }

    /// Sets the force; components on fixed DOF are ignored.
    pub fn set_force(&mut self, force: DVec3) {
        self.force = self.mask_free(force, false);
    }

    pub fn set_torque(&mut self, torque: DVec3) {
        self.torque = self.mask_free(torque, true);
    }

    /// Sets the displacement; components on free DOF are ignored.
    pub fn set_displace(&mut self, displace: DVec3) {
        self.displace = self.mask_fixed(displace, false);
    }

    pub fn set_ang_displace(&mut self, ang: DVec3) {
        self.ang_displace = self.mask_fixed(ang, true);
    }

    fn dofs(rotational: bool) -> [Dof; 3] {
        if rotational {
            [Dof::Tx, Dof::Ty, Dof::Tz]
        } else {
            [Dof::X, Dof::Y, Dof::Z]
        }
    }

    fn mask_free(&self, v: DVec3, rotational: bool) -> DVec3 {
        let mut out = v;
        for dof in Self::dofs(rotational) {
            if self.dof_fixed.is_fixed(dof) {
                set_component(&mut out, dof.axis(), 0.0);
            }
        }
        out
    }

    fn mask_fixed(&self, v: DVec3, rotational: bool) -> DVec3 {
        let mut out = v;
        for dof in Self::dofs(rotational) {
            if !self.dof_fixed.is_fixed(dof) {
                set_component(&mut out, dof.axis(), 0.0);
            }
        }
        out
    }

    pub fn has_displacement(&self) -> bool {
        self.displace != DVec3::ZERO || self.ang_displace != DVec3::ZERO
    }

    pub fn has_load(&self) -> bool {
        self.force != DVec3::ZERO || self.torque != DVec3::ZERO
    }

    pub fn is_box(&self) -> bool {
        matches!(self.primitive.kind, PrimitiveKind::Box)
    }

    /// See [`Primitive::scale_to`].
    pub fn scale_to(&mut self, old: DVec3, new: DVec3) {
        self.primitive.scale_to(old, new);
    }
}
