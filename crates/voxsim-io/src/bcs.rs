//! The boundary-condition document.
//!
//! An `Environment` element carries the region set under
//! `Boundary_Conditions`, plus `Gravity` and `Thermal` sections. Older
//! documents split regions into `Fixed_Regions` and `Forced_Regions` and
//! mark fixity with a boolean `Fixed` tag; both are still read.

use std::path::Path;

use tracing::{info, warn};
use voxsim_boundary::{BoundaryRegion, BoundarySet, Primitive, PrimitiveKind, TriangleSoup};
use voxsim_math::DVec3;
use voxsim_solver::{Environment, Feature, PhysicsConfig};
use voxsim_types::constants::GRAVITY;
use voxsim_types::{DofMask, VoxsimError, VoxsimResult};

use crate::xml::XmlElement;

/// Largest accepted floor slope magnitude (degrees).
const MAX_FLOOR_SLOPE: f64 = 89.0;

/// Boundary regions together with the environment switches stored
/// alongside them.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentDocument {
    pub boundaries: BoundarySet,
    pub environment: Environment,
    pub gravity: bool,
    pub floor: bool,
    pub temperature: bool,
    pub vary_temperature: bool,
}

impl Default for EnvironmentDocument {
    fn default() -> Self {
        Self::new(BoundarySet::new())
    }
}

impl EnvironmentDocument {
    /// Regions with every environment effect off.
    pub fn new(boundaries: BoundarySet) -> Self {
        Self {
            boundaries,
            environment: Environment::default(),
            gravity: false,
            floor: false,
            temperature: false,
            vary_temperature: false,
        }
    }

    /// Captures the environment part of `physics`.
    pub fn from_physics(boundaries: BoundarySet, physics: &PhysicsConfig) -> Self {
        let f = &physics.features;
        Self {
            boundaries,
            environment: physics.environment,
            gravity: f.is_enabled(Feature::Gravity),
            floor: f.is_enabled(Feature::Floor),
            temperature: f.is_enabled(Feature::Temperature),
            vary_temperature: f.is_enabled(Feature::VaryTemperature),
        }
    }

    /// Copies the environment and its switches into `physics`.
    pub fn apply_to(&self, physics: &mut PhysicsConfig) {
        physics.environment = self.environment;
        physics.features.set(Feature::Gravity, self.gravity);
        physics.features.set(Feature::Floor, self.floor);
        physics.features.set(Feature::Temperature, self.temperature);
        physics.features.set(Feature::VaryTemperature, self.vary_temperature);
    }
}

// ─── Writing ─────────────────────────────────────────────────

pub fn write_bcx(doc: &EnvironmentDocument) -> XmlElement {
    let mut root = XmlElement::new("Environment");

    let mut bcs = XmlElement::new("Boundary_Conditions");
    bcs.push_value("NumBCs", doc.boundaries.len());
    for region in doc.boundaries.iter() {
        bcs.push(write_region(region));
    }
    root.push(bcs);

    let env = &doc.environment;
    let mut gravity = XmlElement::new("Gravity");
    gravity
        .push_bool("GravEnabled", doc.gravity)
        .push_value("GravAcc", env.gravity_accel)
        .push_bool("FloorEnabled", doc.floor)
        .push_value("FloorSlope", env.floor_slope);
    root.push(gravity);

    let mut thermal = XmlElement::new("Thermal");
    thermal
        .push_bool("TempEnabled", doc.temperature)
        .push_value("TempAmplitude", env.temp_amplitude)
        .push_value("TempBase", env.base_temp)
        .push_bool("VaryTempEnabled", doc.vary_temperature)
        .push_value("TempPeriod", env.temp_period);
    root.push(thermal);

    root
}

pub fn save_bcx(doc: &EnvironmentDocument, path: &Path) -> VoxsimResult<()> {
    write_bcx(doc).write_file(path)?;
    info!(path = %path.display(), regions = doc.boundaries.len(), "saved boundary document");
    Ok(())
}

fn write_region(region: &BoundaryRegion) -> XmlElement {
    let p = &region.primitive;
    let [r, g, b, a] = region.color;
    let mut el = XmlElement::new("FRegion");
    el.push_value("PrimType", p.kind.code())
        .push_value("X", p.position.x)
        .push_value("Y", p.position.y)
        .push_value("Z", p.position.z)
        .push_value("dX", p.size.x)
        .push_value("dY", p.size.y)
        .push_value("dZ", p.size.z)
        .push_value("Radius", p.radius)
        .push_value("R", r)
        .push_value("G", g)
        .push_value("B", b)
        .push_value("alpha", a)
        .push_value("DofFixed", region.dof_fixed().bits());
    push_vec(&mut el, "Force", region.force());
    push_vec(&mut el, "Torque", region.torque());
    push_vec(&mut el, "Displace", region.displace());
    push_vec(&mut el, "AngDisplace", region.ang_displace());
    if let PrimitiveKind::Mesh(mesh) = &p.kind {
        el.push(write_mesh(mesh));
    }
    el
}

fn push_vec(el: &mut XmlElement, prefix: &str, v: DVec3) {
    el.push_value(&format!("{prefix}X"), v.x)
        .push_value(&format!("{prefix}Y"), v.y)
        .push_value(&format!("{prefix}Z"), v.z);
}

fn write_mesh(mesh: &TriangleSoup) -> XmlElement {
    let mut vertices = XmlElement::new("Vertices");
    for v in &mesh.vertices {
        let mut el = XmlElement::new("Vertex");
        el.push_value("Vx", v.x).push_value("Vy", v.y).push_value("Vz", v.z);
        vertices.push(el);
    }
    let mut facets = XmlElement::new("Facets");
    for t in &mesh.triangles {
        let mut el = XmlElement::new("Facet");
        el.push_value("V0", t[0]).push_value("V1", t[1]).push_value("V2", t[2]);
        facets.push(el);
    }
    let mut el = XmlElement::new("CMesh");
    el.push(vertices);
    el.push(facets);
    el
}

// ─── Reading ─────────────────────────────────────────────────

/// Reads an `Environment` element, or a root holding one.
pub fn read_bcx(root: &XmlElement) -> VoxsimResult<EnvironmentDocument> {
    let env_el = if root.name == "Environment" {
        root
    } else {
        root.child("Environment").ok_or_else(|| {
            VoxsimError::Parse(format!("<{}> holds no Environment element", root.name))
        })?
    };

    let mut regions = Vec::new();
    if let Some(bcs) = env_el.child("Boundary_Conditions") {
        read_regions(bcs, "NumBCs", &mut regions)?;
    } else {
        if let Some(fixed) = env_el.child("Fixed_Regions") {
            read_regions(fixed, "NumFixed", &mut regions)?;
        }
        if let Some(forced) = env_el.child("Forced_Regions") {
            read_regions(forced, "NumForced", &mut regions)?;
        }
    }

    let mut doc = EnvironmentDocument::new(BoundarySet::from_regions(regions));
    let env = &mut doc.environment;

    if let Some(g) = env_el.child("Gravity") {
        doc.gravity = g.bool_value("GravEnabled").unwrap_or(false);
        env.gravity_accel = g.value_or("GravAcc", GRAVITY);
        doc.floor = g.bool_value("FloorEnabled").unwrap_or(false);
        let slope: f64 = g.value_or("FloorSlope", 0.0);
        env.floor_slope = slope.clamp(-MAX_FLOOR_SLOPE, MAX_FLOOR_SLOPE);
        if env.floor_slope != slope {
            warn!(slope, clamped = env.floor_slope, "floor slope truncated");
        }
    }

    if let Some(t) = env_el.child("Thermal") {
        doc.temperature = t.bool_value("TempEnabled").unwrap_or(false);
        env.base_temp = t.value_or("TempBase", 25.0);
        env.temp_amplitude = match t.value::<f64>("TempAmplitude") {
            Some(a) => a,
            // Older documents stored the absolute target temperature.
            None => t.value::<f64>("TempAmp").map(|abs| abs - env.base_temp).unwrap_or(0.0),
        };
        doc.vary_temperature = t.bool_value("VaryTempEnabled").unwrap_or(false);
        env.temp_period = t.value_or("TempPeriod", 0.1);
    }

    Ok(doc)
}

pub fn load_bcx(path: &Path) -> VoxsimResult<EnvironmentDocument> {
    let doc = read_bcx(&XmlElement::read_file(path)?)?;
    info!(path = %path.display(), regions = doc.boundaries.len(), "loaded boundary document");
    Ok(doc)
}

fn read_regions(
    section: &XmlElement,
    count_tag: &str,
    out: &mut Vec<BoundaryRegion>,
) -> VoxsimResult<()> {
    let declared: usize = section.value_or(count_tag, 0);
    let found: Vec<&XmlElement> = section.children_named("FRegion").collect();
    if found.len() < declared {
        return Err(VoxsimError::Parse(format!(
            "{} declares {declared} regions but holds {}",
            section.name,
            found.len()
        )));
    }
    for el in found.into_iter().take(declared) {
        if let Some(region) = read_region(el)? {
            out.push(region);
        }
    }
    Ok(())
}

/// Reads one region; entries without a primitive type are skipped.
fn read_region(el: &XmlElement) -> VoxsimResult<Option<BoundaryRegion>> {
    let Some(code) = el.value::<i32>("PrimType") else {
        warn!("boundary region without PrimType skipped");
        return Ok(None);
    };
    let mut primitive = match code {
        0..=2 => Primitive::default_for_code(code),
        3 => {
            let mesh = el.child("CMesh").map(read_mesh).transpose()?.unwrap_or_default();
            Primitive::mesh(mesh, DVec3::ZERO, DVec3::ZERO)
        }
        other => {
            return Err(VoxsimError::Parse(format!(
                "unknown boundary primitive type {other}"
            )))
        }
    };
    primitive.position = read_vec(el, "X", "Y", "Z");
    primitive.size = read_vec(el, "dX", "dY", "dZ");
    primitive.radius = el.value_or("Radius", 0.0);

    let dof = match el.value::<u8>("DofFixed") {
        Some(bits) => DofMask::from_bits(bits),
        None => match el.bool_value("Fixed") {
            Some(true) => DofMask::ALL,
            _ => DofMask::NONE,
        },
    };

    let mut region = BoundaryRegion::from_parts(
        primitive,
        dof,
        read_vec(el, "ForceX", "ForceY", "ForceZ"),
        read_vec(el, "TorqueX", "TorqueY", "TorqueZ"),
        read_vec(el, "DisplaceX", "DisplaceY", "DisplaceZ"),
        read_vec(el, "AngDisplaceX", "AngDisplaceY", "AngDisplaceZ"),
    );
    region.color = [
        el.value_or("R", 0.0),
        el.value_or("G", 0.0),
        el.value_or("B", 0.0),
        el.value_or("alpha", 0.0),
    ];
    Ok(Some(region))
}

fn read_vec(el: &XmlElement, x: &str, y: &str, z: &str) -> DVec3 {
    DVec3::new(el.value_or(x, 0.0), el.value_or(y, 0.0), el.value_or(z, 0.0))
}

fn read_mesh(el: &XmlElement) -> VoxsimResult<TriangleSoup> {
    let vertices: Vec<DVec3> = el
        .child("Vertices")
        .map(|vs| {
            vs.children_named("Vertex")
                .map(|v| read_vec(v, "Vx", "Vy", "Vz"))
                .collect()
        })
        .unwrap_or_default();
    let mut triangles = Vec::new();
    if let Some(fs) = el.child("Facets") {
        for f in fs.children_named("Facet") {
            let t: [u32; 3] = [f.value_or("V0", 0), f.value_or("V1", 0), f.value_or("V2", 0)];
            if t.iter().any(|&i| i as usize >= vertices.len()) {
                return Err(VoxsimError::Parse(format!(
                    "mesh facet {t:?} references a missing vertex ({} vertices)",
                    vertices.len()
                )));
            }
            triangles.push(t);
        }
    }
    Ok(TriangleSoup::new(vertices, triangles))
}
