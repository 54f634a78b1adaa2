//! Material blending across material boundaries.
//!
//! An object made of (at most) two leaf materials is re-rendered onto a
//! graded palette of [`GRADED_MATERIALS`] linear materials spanning the two
//! moduli. Each voxel takes the gradation nearest the weighted average
//! modulus of its ellipsoidal neighbourhood, so a hard stiffness step turns
//! into a ramp a few voxels wide.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use voxsim_material::{LeafProperties, Material, Palette, VoxelObject};
use voxsim_math::DVec3;
use voxsim_types::{MaterialIndex, VoxsimError, VoxsimResult};

/// Size of the graded palette.
pub const GRADED_MATERIALS: usize = 100;

/// Most leaf materials a blended object may use.
pub const MAX_BLEND_MATERIALS: usize = 2;

/// Zero radii are replaced by this fraction of the lattice dimension.
const MIN_RADIUS_FRACTION: f64 = 1.0e-4;

/// Shape of the neighbour weight falloff.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum BlendCurve {
    #[default]
    Linear,
    Exponential,
    Polynomial { exponent: f64 },
}

impl BlendCurve {
    /// Maps `p` in [0, 1] onto [0, 1].
    pub fn apply(&self, p: f64) -> f64 {
        let p = p.clamp(0.0, 1.0);
        match *self {
            BlendCurve::Linear => p,
            BlendCurve::Exponential => 2f64.powf(p) - 1.0,
            BlendCurve::Polynomial { exponent } => p.powf(exponent),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BlendCurve::Linear => "linear",
            BlendCurve::Exponential => "exponential",
            BlendCurve::Polynomial { .. } => "polynomial",
        }
    }
}

/// Blend radius per axis (m) and falloff curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendSettings {
    pub radius: DVec3,
    pub curve: BlendCurve,
}

impl Default for BlendSettings {
    fn default() -> Self {
        Self::none()
    }
}

impl BlendSettings {
    /// No blending.
    pub fn none() -> Self {
        Self {
            radius: DVec3::ZERO,
            curve: BlendCurve::Linear,
        }
    }

    pub fn new(radius: DVec3, curve: BlendCurve) -> Self {
        Self { radius, curve }
    }

    /// Blending runs when any radius is non-zero.
    pub fn is_enabled(&self) -> bool {
        self.radius != DVec3::ZERO
    }

    pub fn validate(&self) -> VoxsimResult<()> {
        if !self.radius.is_finite() || self.radius.min_element() < 0.0 {
            return Err(VoxsimError::InvalidConfig(format!(
                "blend radius must be finite and non-negative, got {}",
                self.radius
            )));
        }
        if let BlendCurve::Polynomial { exponent } = self.curve {
            if !(exponent.is_finite() && exponent > 0.0) {
                return Err(VoxsimError::InvalidConfig(format!(
                    "polynomial blend exponent must be positive, got {exponent}"
                )));
            }
        }
        Ok(())
    }
}

/// End-member of the graded palette.
#[derive(Debug, Clone, Copy)]
struct EndMember {
    elastic_modulus: f64,
    poissons_ratio: f64,
    density: f64,
    color: [f32; 4],
}

/// Returns a copy of `object` re-rendered onto a graded palette.
///
/// Fails with [`VoxsimError::Validation`] if more than
/// [`MAX_BLEND_MATERIALS`] leaf materials are in use.
pub fn blend_object(object: &VoxelObject, settings: &BlendSettings) -> VoxsimResult<VoxelObject> {
    settings.validate()?;
    let in_use = object.leaf_indices_in_use();
    if in_use.len() > MAX_BLEND_MATERIALS {
        return Err(VoxsimError::Validation(format!(
            "blending supports at most {MAX_BLEND_MATERIALS} materials, object uses {}",
            in_use.len()
        )));
    }
    let Some((lo, hi)) = end_members(object, &in_use) else {
        return Ok(object.clone());
    };

    let vox = object.lattice.lattice_dim;
    let floor = vox * MIN_RADIUS_FRACTION;
    let mix = DVec3::new(
        if settings.radius.x == 0.0 { floor } else { settings.radius.x },
        if settings.radius.y == 0.0 { floor } else { settings.radius.y },
        if settings.radius.z == 0.0 { floor } else { settings.radius.z },
    );
    let reach = mix + DVec3::splat(vox);
    let look = [
        (mix.x / vox) as i64 + 1,
        (mix.y / vox) as i64 + 1,
        (mix.z / vox) as i64 + 1,
    ];
    let centre_weight = (DVec3::ONE + DVec3::splat(vox) / reach).max_element();
    let span = hi.elastic_modulus - lo.elastic_modulus;

    let mut out = object.clone();
    out.palette = graded_palette(&lo, &hi)?;

    let src = &object.structure;
    for vi in src.occupied() {
        let Some([x, y, z]) = src.coords_of(vi) else {
            continue;
        };
        let base = object.lattice.position(x, y, z);
        let (x, y, z) = (x as i64, y as i64, z as i64);

        let mut weighted = 0.0;
        let mut total = 0.0;
        for k in z - look[2]..=z + look[2] {
            for j in y - look[1]..=y + look[1] {
                for i in x - look[0]..=x + look[0] {
                    let Some(ni) = src.index_of(i, j, k) else {
                        continue;
                    };
                    let Some(leaf) = object.leaf_at(ni) else {
                        continue;
                    };
                    let w = if (i, j, k) == (x, y, z) {
                        centre_weight
                    } else {
                        let d = object.lattice.position(i as usize, j as usize, k as usize) - base;
                        let sum = (d * d / (reach * reach)).element_sum();
                        if sum <= 1.0 {
                            settings.curve.apply(1.0 - sum)
                        } else {
                            0.0
                        }
                    };
                    weighted += w * leaf.elastic_modulus;
                    total += w;
                }
            }
        }

        let avg = if total > 0.0 { weighted / total } else { lo.elastic_modulus };
        let p = if span > 0.0 { (avg - lo.elastic_modulus) / span } else { 0.0 };
        let top = (GRADED_MATERIALS - 1) as f64;
        let grade = (p * top).round().clamp(0.0, top);
        out.structure.set(vi, MaterialIndex(1 + grade as u8))?;
    }

    info!(
        voxels = object.voxel_count(),
        radius = %mix,
        curve = settings.curve.name(),
        "blended object onto graded palette"
    );
    Ok(out)
}

/// Minimum- and maximum-modulus leaves among `in_use`.
fn end_members(object: &VoxelObject, in_use: &[MaterialIndex]) -> Option<(EndMember, EndMember)> {
    let members: Vec<EndMember> = in_use
        .iter()
        .filter_map(|&mi| {
            let m = object.palette.get(mi)?;
            let leaf = m.leaf_properties()?;
            Some(EndMember {
                elastic_modulus: leaf.elastic_modulus,
                poissons_ratio: leaf.poissons_ratio,
                density: leaf.density,
                color: m.color,
            })
        })
        .collect();
    if members.is_empty() {
        warn!("nothing to blend: object has no leaf materials in use");
        return None;
    }
    let lo = members
        .iter()
        .copied()
        .min_by(|a, b| a.elastic_modulus.total_cmp(&b.elastic_modulus))?;
    let hi = members
        .iter()
        .copied()
        .max_by(|a, b| a.elastic_modulus.total_cmp(&b.elastic_modulus))?;
    debug!(min_e = lo.elastic_modulus, max_e = hi.elastic_modulus, "blend end members");
    Some((lo, hi))
}

/// `GM0..GM99`, interpolated linearly between the end members.
fn graded_palette(lo: &EndMember, hi: &EndMember) -> VoxsimResult<Palette> {
    let mut palette = Palette::new();
    for i in 0..GRADED_MATERIALS {
        let t = i as f64 / (GRADED_MATERIALS - 1) as f64;
        let lerp = |a: f64, b: f64| a + (b - a) * t;
        let mut props = LeafProperties::new(
            lerp(lo.elastic_modulus, hi.elastic_modulus),
            lerp(lo.poissons_ratio, hi.poissons_ratio),
        );
        props.density = lerp(lo.density, hi.density);
        let c = |k: usize| lerp(lo.color[k] as f64, hi.color[k] as f64) as f32;
        palette.add(Material::leaf(format!("GM{i}"), props).with_color(c(0), c(1), c(2), c(3)))?;
    }
    Ok(palette)
}
