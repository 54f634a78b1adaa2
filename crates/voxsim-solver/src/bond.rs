//! Beam bond between two face-adjacent voxels.
//!
//! Each bond is an Euler–Bernoulli beam of length `L` and square cross
//! section `L²`. Forces are computed once in a frame where the bond points
//! along +X; Y and Z bonds are permuted into that frame and back.
//!
//! # Angle regimes
//!
//! While relative rotation and extension stay small, voxel 2's offset is
//! measured directly in voxel 1's frame. Beyond that, the frame is rotated
//! so the bond line is exactly +X, which keeps large deflections stable.
//! Switching uses hysteresis so a bond near the threshold does not flip
//! every step. Bond damping is skipped on the step a bond switches regime,
//! since the rate estimates straddle two frames.

use voxsim_material::ConstitutiveModel;
use voxsim_math::frame::{from_x_frame, quat_to_x_frame, to_x_frame};
use voxsim_math::rotation::to_rotation_vector;
use voxsim_math::{Axis, DQuat, DVec3};

use crate::state::{SimMaterial, VoxelState};

/// Bend angle below which a bond uses the small-angle regime (radians).
pub const SMALL_ANGLE_BEND_RAD: f64 = 0.05;
/// Length ratio below which a bond uses the small-angle regime.
pub const SMALL_ANGLE_EXTENSION: f64 = 1.30;
/// Thresholds grow by this factor before a small-angle bond leaves the regime.
pub const HYSTERESIS_FACTOR: f64 = 1.1;

/// Stop refining endpoint strains once stresses agree to this fraction.
const STRESS_BALANCE_TOL: f64 = 0.0005;
const MAX_BALANCE_ITERATIONS: usize = 3;

// ─── Constants ───────────────────────────────────────────────

/// Beam stiffnesses of a bond, fixed at import.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BondConstants {
    /// Series-combined elastic modulus.
    pub e: f64,
    /// Series-combined Poisson's ratio.
    pub nu: f64,
    /// Effective modulus including Poisson confinement.
    pub eh: f64,
    pub g: f64,
    pub cte: f64,
    pub length: f64,
    /// Axial `E·A/L`.
    pub a1: f64,
    /// Torsional `G·J/L`.
    pub a2: f64,
    /// Shear `12·E·I/L³`.
    pub b1: f64,
    /// Coupled shear/bend `6·E·I/L²`.
    pub b2: f64,
    /// Bending `2·E·I/L`.
    pub b3: f64,
    /// Both endpoints share material and stiffness.
    pub homogeneous: bool,
}

impl BondConstants {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        e1: f64,
        nu1: f64,
        cte1: f64,
        e2: f64,
        nu2: f64,
        cte2: f64,
        same_material: bool,
        length: f64,
    ) -> Self {
        let e = harmonic(e1, e2);
        let nu = harmonic(nu1, nu2);
        let confined = |e: f64, nu: f64| {
            let d = (1.0 - 2.0 * nu) * (1.0 + nu);
            if d > 0.0 {
                e / d
            } else {
                e
            }
        };
        let eh = harmonic(confined(e1, nu1), confined(e2, nu2));
        let g = e / (2.0 * (1.0 + nu));

        let l = length;
        let area = l * l;
        let i = l * l * l * l / 12.0;
        let j = l * l * l * l / 6.0;

        Self {
            e,
            nu,
            eh,
            g,
            cte: 0.5 * (cte1 + cte2),
            length: l,
            a1: e * area / l,
            a2: g * j / l,
            b1: 12.0 * e * i / (l * l * l),
            b2: 6.0 * e * i / (l * l),
            b3: 2.0 * e * i / l,
            homogeneous: same_material && e1 == e2,
        }
    }
}

/// `2ab/(a+b)`, zero if both are zero.
fn harmonic(a: f64, b: f64) -> f64 {
    if a + b == 0.0 {
        0.0
    } else {
        2.0 * a * b / (a + b)
    }
}

// ─── Per-step inputs ─────────────────────────────────────────

/// Global switches and scalars the bond update needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BondContext {
    pub dt: f64,
    pub bond_damping: f64,
    pub plasticity: bool,
    pub failure: bool,
    pub volume_effects: bool,
    pub temperature: bool,
}

// ─── Bond ────────────────────────────────────────────────────

/// A bond and everything it remembers between steps.
#[derive(Debug, Clone, PartialEq)]
pub struct Bond {
    /// Voxel at the lower coordinate.
    pub v1: u32,
    pub v2: u32,
    pub axis: Axis,
    pub constants: BondConstants,

    /// Force on voxel 1 / voxel 2 (world frame).
    pub force1: DVec3,
    pub force2: DVec3,
    /// Beam end moments; the moment applied to a voxel is the negation.
    pub moment1: DVec3,
    pub moment2: DVec3,

    /// Total axial strain.
    pub strain: f64,
    /// Strain carried by each endpoint after stress balancing.
    pub strain_v1: f64,
    pub strain_v2: f64,
    pub stress: f64,
    pub strain_energy: f64,
    pub max_strain: f64,
    pub strain_offset: f64,
    pub yielded: bool,
    pub broken: bool,

    /// Lateral strain sums and cross sections written by each endpoint.
    pub lateral_strain1: f64,
    pub lateral_strain2: f64,
    pub cs_area1: f64,
    pub cs_area2: f64,

    small_angle: bool,
    pos2: DVec3,
    angle1: DVec3,
    angle2: DVec3,
    last_pos2: DVec3,
    last_angle1: DVec3,
    last_angle2: DVec3,
}

impl Bond {
    pub fn new(v1: u32, v2: u32, axis: Axis, constants: BondConstants) -> Self {
        let area = constants.length * constants.length;
        Self {
            v1,
            v2,
            axis,
            constants,
            force1: DVec3::ZERO,
            force2: DVec3::ZERO,
            moment1: DVec3::ZERO,
            moment2: DVec3::ZERO,
            strain: 0.0,
            strain_v1: 0.0,
            strain_v2: 0.0,
            stress: 0.0,
            strain_energy: 0.0,
            max_strain: 0.0,
            strain_offset: 0.0,
            yielded: false,
            broken: false,
            lateral_strain1: 0.0,
            lateral_strain2: 0.0,
            cs_area1: area,
            cs_area2: area,
            small_angle: true,
            pos2: DVec3::ZERO,
            angle1: DVec3::ZERO,
            angle2: DVec3::ZERO,
            last_pos2: DVec3::ZERO,
            last_angle1: DVec3::ZERO,
            last_angle2: DVec3::ZERO,
        }
    }

    /// Clears all history back to the unloaded state.
    pub fn reset(&mut self) {
        *self = Self::new(self.v1, self.v2, self.axis, self.constants);
    }

    pub fn is_small_angle(&self) -> bool {
        self.small_angle
    }

    /// Largest stable step for this bond: `1 / (2π·sqrt(k/m))`.
    pub fn max_stable_dt(&self, m1: f64, m2: f64) -> f64 {
        let m = m1.min(m2);
        let k = self.constants.a1.max(self.constants.b1);
        if k <= 0.0 || m <= 0.0 {
            return f64::INFINITY;
        }
        1.0 / (2.0 * std::f64::consts::PI * (k / m).sqrt())
    }

    /// Strain this bond contributes to voxel `v`.
    pub fn strain_for(&self, v: u32) -> f64 {
        if v == self.v1 {
            self.strain_v1
        } else {
            self.strain_v2
        }
    }

    /// Recomputes forces, moments, strain and stress from the voxels' pose.
    pub fn update(&mut self, voxels: &VoxelState, materials: &[SimMaterial], ctx: &BondContext) {
        let (i1, i2) = (self.v1 as usize, self.v2 as usize);
        let ax = self.axis;

        let rel = to_x_frame(ax, voxels.pos[i2] - voxels.pos[i1]);
        let q1 = quat_to_x_frame(ax, voxels.orientation[i1]);
        let q2 = quat_to_x_frame(ax, voxels.orientation[i2]);

        let aligned = q1.conjugate() * rel;
        let new_ang2 = q1.conjugate() * q2;
        let nominal = if ctx.volume_effects {
            self.constants.length
        } else {
            0.5 * (voxels.scale[i1] + voxels.scale[i2])
        };

        let changed = self.update_regime(aligned, new_ang2, nominal);

        let total_rot;
        if self.small_angle {
            self.angle1 = DVec3::ZERO;
            self.angle2 = to_rotation_vector(new_ang2);
            self.pos2 = aligned - DVec3::new(nominal, 0.0, 0.0);
            total_rot = q1.conjugate();
        } else {
            let len = aligned.length();
            let to_x = if len > 0.0 {
                DQuat::from_rotation_arc(aligned / len, DVec3::X)
            } else {
                DQuat::IDENTITY
            };
            total_rot = to_x * q1.conjugate();
            self.pos2 = DVec3::new(len - nominal, 0.0, 0.0);
            self.angle1 = to_rotation_vector(to_x);
            self.angle2 = to_rotation_vector(total_rot * q2);
        }

        let c = self.constants;
        self.strain = if c.length > 0.0 { self.pos2.x / c.length } else { 0.0 };
        self.stress = self.update_stress(self.strain, voxels, materials, ctx);

        let (p, a1, a2) = (self.pos2, self.angle1, self.angle2);
        let cs = 0.5 * (self.cs_area1 + self.cs_area2);
        let mut f1 = DVec3::new(
            self.stress * cs,
            c.b1 * p.y - c.b2 * (a1.z + a2.z),
            c.b1 * p.z + c.b2 * (a1.y + a2.y),
        );
        let mut f2 = -f1;
        let mut m1 = DVec3::new(
            c.a2 * (a1.x - a2.x),
            c.b2 * p.z + c.b3 * (2.0 * a1.y + a2.y),
            -c.b2 * p.y + c.b3 * (2.0 * a1.z + a2.z),
        );
        let mut m2 = DVec3::new(
            c.a2 * (a2.x - a1.x),
            c.b2 * p.z + c.b3 * (a1.y + 2.0 * a2.y),
            -c.b2 * p.y + c.b3 * (a1.z + 2.0 * a2.z),
        );

        self.strain_energy = strain_energy(&c, f1, m1, m2);

        if !changed && ctx.dt > 0.0 && ctx.bond_damping > 0.0 {
            self.add_damping(voxels, ctx, &mut f1, &mut f2, &mut m1, &mut m2);
        }
        self.last_pos2 = self.pos2;
        self.last_angle1 = self.angle1;
        self.last_angle2 = self.angle2;

        let back = total_rot.conjugate();
        self.force1 = from_x_frame(ax, back * f1);
        self.force2 = from_x_frame(ax, back * f2);
        self.moment1 = from_x_frame(ax, back * m1);
        self.moment2 = from_x_frame(ax, back * m2);
    }

    /// Applies hysteresis to the regime switch. Returns true if it switched.
    fn update_regime(&mut self, aligned: DVec3, new_ang2: DQuat, nominal: f64) -> bool {
        let bend = to_rotation_vector(new_ang2).length();
        let extension = if nominal > 0.0 { aligned.x / nominal } else { 0.0 };
        if self.small_angle {
            let f = HYSTERESIS_FACTOR;
            if bend >= SMALL_ANGLE_BEND_RAD * f || extension >= SMALL_ANGLE_EXTENSION * f {
                self.small_angle = false;
                return true;
            }
        } else if bend < SMALL_ANGLE_BEND_RAD && extension < SMALL_ANGLE_EXTENSION {
            self.small_angle = true;
            return true;
        }
        false
    }

    /// Axial stress at `strain`, with plastic unloading and failure flags.
    fn update_stress(
        &mut self,
        strain: f64,
        voxels: &VoxelState,
        materials: &[SimMaterial],
        ctx: &BondContext,
    ) -> f64 {
        let (i1, i2) = (self.v1 as usize, self.v2 as usize);
        let c = self.constants;

        let mut stress = if !ctx.plasticity || strain >= self.max_strain {
            self.max_strain = strain;
            let (model_stress, yielded, failed) = if c.homogeneous {
                self.strain_v1 = strain;
                self.strain_v2 = strain;
                let r = materials[voxels.material[i1]]
                    .model
                    .evaluate(strain, Some(voxels.elastic_modulus[i1]));
                (r.stress, r.yielded, r.failed)
            } else {
                self.balance_strains(strain, voxels, materials)
            };
            self.yielded |= yielded;
            if ctx.failure {
                self.broken |= failed;
            }
            if ctx.plasticity && c.e > 0.0 {
                self.strain_offset = self.max_strain - model_stress / c.e;
            }
            if ctx.volume_effects && c.e > 0.0 {
                // uniaxial model response lifted to the confined modulus
                let lateral = 0.5 * (self.lateral_strain1 + self.lateral_strain2);
                model_stress * (c.eh / c.e) * (1.0 - c.nu) + c.eh * c.nu * lateral
            } else {
                model_stress
            }
        } else {
            c.e * (strain - self.strain_offset)
        };

        if ctx.volume_effects && ctx.temperature {
            let thermal = |i: usize| {
                let m = &materials[voxels.material[i]];
                let d = 1.0 - 2.0 * m.poissons_ratio;
                if d > 0.0 {
                    voxels.elastic_modulus[i] * m.cte * voxels.delta_temp[i] / d
                } else {
                    0.0
                }
            };
            stress -= 0.5 * (thermal(i1) + thermal(i2));
        }
        stress
    }

    /// Splits `strain` between two different materials so their stresses
    /// agree, then returns the mean stress and combined flags.
    fn balance_strains(
        &mut self,
        strain: f64,
        voxels: &VoxelState,
        materials: &[SimMaterial],
    ) -> (f64, bool, bool) {
        let (i1, i2) = (self.v1 as usize, self.v2 as usize);
        let m1 = &materials[voxels.material[i1]].model;
        let m2 = &materials[voxels.material[i2]].model;
        let (e1, e2) = (voxels.elastic_modulus[i1], voxels.elastic_modulus[i2]);

        let (mut s1e, mut s2e) = (strain, strain);
        let mut r1 = m1.evaluate(s1e, Some(e1));
        let mut r2 = m2.evaluate(s2e, Some(e2));
        for _ in 0..MAX_BALANCE_ITERATIONS {
            let sum = r1.stress + r2.stress;
            if sum == 0.0 || (r1.stress - r2.stress).abs() <= STRESS_BALANCE_TOL * sum.abs() {
                break;
            }
            s1e *= 2.0 * r2.stress / sum;
            s2e *= 2.0 * r1.stress / sum;
            r1 = m1.evaluate(s1e, Some(e1));
            r2 = m2.evaluate(s2e, Some(e2));
        }
        self.strain_v1 = s1e;
        self.strain_v2 = s2e;
        (
            0.5 * (r1.stress + r2.stress),
            r1.yielded || r2.yielded,
            r1.failed || r2.failed,
        )
    }

    fn add_damping(
        &self,
        voxels: &VoxelState,
        ctx: &BondContext,
        f1: &mut DVec3,
        f2: &mut DVec3,
        m1: &mut DVec3,
        m2: &mut DVec3,
    ) {
        let (i1, i2) = (self.v1 as usize, self.v2 as usize);
        let c = &self.constants;
        let z = 0.5 * ctx.bond_damping;
        let v = (self.pos2 - self.last_pos2) / ctx.dt;
        let w1 = (self.angle1 - self.last_angle1) / ctx.dt;
        let w2 = (self.angle2 - self.last_angle2) / ctx.dt;

        let crit = |k: f64, m: f64| 2.0 * (k * m).sqrt();
        let (ma, mb) = (voxels.mass[i1], voxels.mass[i2]);
        let (fa, fb) = (voxels.first_moment[i1], voxels.first_moment[i2]);
        let (ia, ib) = (voxels.inertia[i1], voxels.inertia[i2]);

        *f1 += z * DVec3::new(
            crit(c.a1, ma) * v.x,
            crit(c.b1, ma) * v.y - crit(c.b2, fa) * (w1.z + w2.z),
            crit(c.b1, ma) * v.z + crit(c.b2, fa) * (w1.y + w2.y),
        );
        *f2 -= z * DVec3::new(
            crit(c.a1, mb) * v.x,
            crit(c.b1, mb) * v.y - crit(c.b2, fb) * (w1.z + w2.z),
            crit(c.b1, mb) * v.z + crit(c.b2, fb) * (w1.y + w2.y),
        );
        *m1 += 0.5 * z * DVec3::new(
            -crit(c.a2, ia) * (w2.x - w1.x),
            crit(c.b2, fa) * v.z + crit(c.b3, ia) * (2.0 * w1.y + w2.y),
            -crit(c.b2, fa) * v.y + crit(c.b3, ia) * (2.0 * w1.z + w2.z),
        );
        *m2 += 0.5 * z * DVec3::new(
            crit(c.a2, ib) * (w2.x - w1.x),
            crit(c.b2, fb) * v.z + crit(c.b3, ib) * (w1.y + 2.0 * w2.y),
            -crit(c.b2, fb) * v.y + crit(c.b3, ib) * (w1.z + 2.0 * w2.z),
        );
    }
}

/// Elastic energy stored in axial, torsional and bending deformation.
fn strain_energy(c: &BondConstants, f1: DVec3, m1: DVec3, m2: DVec3) -> f64 {
    let mut e = 0.0;
    if c.a1 > 0.0 {
        e += f1.x * f1.x / (2.0 * c.a1);
    }
    if c.a2 > 0.0 {
        e += m1.x * m1.x / (2.0 * c.a2);
    }
    if c.b3 > 0.0 {
        e += (m1.z * m1.z - m1.z * m2.z + m2.z * m2.z) / (3.0 * c.b3);
        e += (m1.y * m1.y - m1.y * m2.y + m2.y * m2.y) / (3.0 * c.b3);
    }
    e
}
