//! The structure document.
//!
//! A `VXC` element holds `Lattice`, `Voxel`, `Palette` and `Structure`
//! sections. Palette entries are written from index 1; index 0 is the
//! reserved empty material and never stored. Auxiliary per-voxel arrays
//! live inside `Structure`, one comma-separated `Layer` per Z slice, and
//! are only written for fields that are present.

use std::path::Path;

use tracing::{info, warn};
use voxsim_lattice::{AuxField, Lattice, Structure, VoxelAppearance, VoxelShape};
use voxsim_material::{
    FailureMode, InternalSpec, LeafProperties, Material, MaterialKind, ModelKind, Palette,
    QuarterTurn, VoxelObject,
};
use voxsim_math::Axis;
use voxsim_types::constants::DEFAULT_LATTICE_DIM;
use voxsim_types::{MaterialIndex, VoxsimError, VoxsimResult};

use crate::encoding::{
    decode_layer, decode_values, encode_layer, encode_values, layer_size_error, Compression,
};
use crate::xml::XmlElement;

/// Newest document version this reader understands.
pub const VXC_VERSION: &str = "0.94";

// ─── Writing ─────────────────────────────────────────────────

/// Builds the `VXC` element for `object`.
pub fn write_vxc(object: &VoxelObject, compression: Compression) -> VoxsimResult<XmlElement> {
    let mut root = XmlElement::new("VXC");
    root.set_attr("Version", VXC_VERSION);
    root.push(write_lattice(&object.lattice));
    root.push(write_voxel(&object.appearance));
    root.push(write_palette(&object.palette, compression)?);
    root.push(write_structure(&object.structure, compression)?);
    Ok(root)
}

/// Writes `object` to `path` as a standalone document.
pub fn save_vxc(object: &VoxelObject, path: &Path, compression: Compression) -> VoxsimResult<()> {
    write_vxc(object, compression)?.write_file(path)?;
    info!(path = %path.display(), voxels = object.voxel_count(), "saved structure document");
    Ok(())
}

fn write_lattice(l: &Lattice) -> XmlElement {
    let mut el = XmlElement::new("Lattice");
    el.push_value("Lattice_Dim", l.lattice_dim)
        .push_value("X_Dim_Adj", l.x_dim_adj)
        .push_value("Y_Dim_Adj", l.y_dim_adj)
        .push_value("Z_Dim_Adj", l.z_dim_adj)
        .push_value("X_Line_Offset", l.x_line_offset)
        .push_value("Y_Line_Offset", l.y_line_offset)
        .push_value("X_Layer_Offset", l.x_layer_offset)
        .push_value("Y_Layer_Offset", l.y_layer_offset);
    el
}

fn write_voxel(v: &VoxelAppearance) -> XmlElement {
    let mut el = XmlElement::new("Voxel");
    match &v.shape {
        VoxelShape::File(file) => el.push_value("File", file),
        VoxelShape::Sphere => el.push_value("Vox_Name", "SPHERE"),
        VoxelShape::Box => el.push_value("Vox_Name", "BOX"),
        VoxelShape::Cylinder => el.push_value("Vox_Name", "CYLINDER"),
    };
    el.push_value("X_Squeeze", v.x_squeeze)
        .push_value("Y_Squeeze", v.y_squeeze)
        .push_value("Z_Squeeze", v.z_squeeze);
    el
}

fn write_palette(palette: &Palette, compression: Compression) -> VoxsimResult<XmlElement> {
    let mut el = XmlElement::new("Palette");
    for (index, material) in palette.iter().skip(1) {
        let mut m = write_material(material, compression)?;
        m.set_attr("ID", index.0);
        el.push(m);
    }
    Ok(el)
}

fn write_material(material: &Material, compression: Compression) -> VoxsimResult<XmlElement> {
    let mut el = XmlElement::new("Material");
    el.push_value("MatType", material.kind.code())
        .push_value("Name", &material.name);

    let [r, g, b, a] = material.color;
    let mut display = XmlElement::new("Display");
    display
        .push_value("Red", r)
        .push_value("Green", g)
        .push_value("Blue", b)
        .push_value("Alpha", a);
    el.push(display);

    match &material.kind {
        MaterialKind::Leaf(props) => {
            el.push(write_mechanical(props));
        }
        MaterialKind::Dither(d) => {
            el.push_value("RandIndex1", d.first.0)
                .push_value("RandIndex2", d.second.0)
                .push_value("PercIndex1", d.first_fraction);
        }
        MaterialKind::Internal(spec) => {
            el.push(write_structure(&spec.structure, compression)?);
            el.push_value("X_Offset", spec.offset[0])
                .push_value("Y_Offset", spec.offset[1])
                .push_value("Z_Offset", spec.offset[2])
                .push_value("StructRotateAxis", spec.rotation_axis.index())
                .push_value("StructRotateAmount", spec.rotation.code());
        }
    }
    Ok(el)
}

fn write_mechanical(p: &LeafProperties) -> XmlElement {
    let mut el = XmlElement::new("Mechanical");
    el.push_value("MatModel", p.model_kind.code());
    if let (ModelKind::Data, Some(series)) = (p.model_kind, &p.series) {
        let mut ss = XmlElement::new("SSData");
        ss.push_value("NumDataPts", series.len());
        let mut strain = XmlElement::new("StrainData");
        for v in series.strain() {
            strain.push_value("Strain", v);
        }
        let mut stress = XmlElement::new("StressData");
        for v in series.stress() {
            stress.push_value("Stress", v);
        }
        ss.push(strain);
        ss.push(stress);
        el.push(ss);
    }
    el.push_value("Elastic_Mod", p.elastic_modulus)
        .push_value("Plastic_Mod", p.plastic_modulus)
        .push_value("Yield_Stress", p.yield_stress)
        .push_value("FailModel", p.failure_mode.code())
        .push_value("Fail_Stress", p.fail_stress)
        .push_value("Fail_Strain", p.fail_strain)
        .push_value("Density", p.density)
        .push_value("Poissons_Ratio", p.poissons_ratio)
        .push_value("CTE", p.cte)
        .push_value("MaterialTempPhase", p.temp_phase)
        .push_value("uStatic", p.static_friction)
        .push_value("uDynamic", p.dynamic_friction);
    el
}

fn write_structure(s: &Structure, compression: Compression) -> VoxsimResult<XmlElement> {
    let [nx, ny, nz] = s.dims();
    let layer = nx * ny;

    let mut el = XmlElement::new("Structure");
    el.set_attr("Compression", compression.tag());
    el.push_value("X_Voxels", nx)
        .push_value("Y_Voxels", ny)
        .push_value("Z_Voxels", nz);

    let mut data = XmlElement::new("Data");
    for z in 0..nz {
        let bytes = &s.data()[z * layer..(z + 1) * layer];
        data.push_value("Layer", encode_layer(bytes, compression)?);
    }
    el.push(data);

    for field in AuxField::ALL {
        let Some(values) = s.aux(field) else {
            continue;
        };
        let mut aux = XmlElement::new(field.tag());
        for z in 0..nz {
            aux.push_value("Layer", encode_values(&values[z * layer..(z + 1) * layer]));
        }
        el.push(aux);
    }
    Ok(el)
}

// ─── Reading ─────────────────────────────────────────────────

/// Reads an object from a `VXC` element, or from any root holding one
/// (such as a full simulation document).
pub fn read_vxc(root: &XmlElement) -> VoxsimResult<VoxelObject> {
    let vxc = if root.name == "VXC" || root.name == "DMF" {
        root
    } else {
        root.child("VXC")
            .ok_or_else(|| VoxsimError::Parse(format!("<{}> holds no VXC element", root.name)))?
    };

    if let Some(version) = vxc.attr("Version") {
        let newer = match (version.parse::<f64>(), VXC_VERSION.parse::<f64>()) {
            (Ok(v), Ok(ours)) => v > ours,
            _ => false,
        };
        if newer {
            warn!(version, "document is newer than this reader; results may be unpredictable");
        }
    }

    let lattice = vxc
        .child("Lattice")
        .map(read_lattice)
        .unwrap_or_else(|| Lattice::cubic(DEFAULT_LATTICE_DIM));
    let appearance = vxc.child("Voxel").map(read_voxel).unwrap_or_default();
    let palette = match vxc.child("Palette") {
        Some(p) => read_palette(p)?,
        None => Palette::new(),
    };
    let structure = match vxc.child("Structure") {
        Some(s) => read_structure(s)?,
        None => Structure::new(0, 0, 0),
    };

    let mut object = VoxelObject::from_parts(lattice, palette, structure)
        .map_err(|e| VoxsimError::Parse(e.to_string()))?;
    object.appearance = appearance;
    Ok(object)
}

/// Replaces `object` with the document's contents. On failure `object` is
/// left cleared rather than partly loaded.
pub fn read_vxc_into(object: &mut VoxelObject, root: &XmlElement) -> VoxsimResult<()> {
    match read_vxc(root) {
        Ok(loaded) => {
            *object = loaded;
            Ok(())
        }
        Err(e) => {
            object.clear();
            Err(e)
        }
    }
}

/// Loads an object from a document on disk.
pub fn load_vxc(path: &Path) -> VoxsimResult<VoxelObject> {
    let object = read_vxc(&XmlElement::read_file(path)?)?;
    info!(
        path = %path.display(),
        dims = ?object.structure.dims(),
        materials = object.palette.len(),
        "loaded structure document"
    );
    Ok(object)
}

fn read_lattice(el: &XmlElement) -> Lattice {
    Lattice {
        lattice_dim: el.value_or("Lattice_Dim", DEFAULT_LATTICE_DIM),
        x_dim_adj: el.value_or("X_Dim_Adj", 1.0),
        y_dim_adj: el.value_or("Y_Dim_Adj", 1.0),
        z_dim_adj: el.value_or("Z_Dim_Adj", 1.0),
        x_line_offset: el.value_or("X_Line_Offset", 0.0),
        y_line_offset: el.value_or("Y_Line_Offset", 0.0),
        x_layer_offset: el.value_or("X_Layer_Offset", 0.0),
        y_layer_offset: el.value_or("Y_Layer_Offset", 0.0),
    }
}

fn read_voxel(el: &XmlElement) -> VoxelAppearance {
    let shape = match (el.child_text("File"), el.child_text("Vox_Name")) {
        (Some(file), _) => VoxelShape::File(file.to_string()),
        (None, Some("BOX")) => VoxelShape::Box,
        (None, Some("CYLINDER")) => VoxelShape::Cylinder,
        _ => VoxelShape::Sphere,
    };
    VoxelAppearance {
        shape,
        x_squeeze: el.value_or("X_Squeeze", 1.0),
        y_squeeze: el.value_or("Y_Squeeze", 1.0),
        z_squeeze: el.value_or("Z_Squeeze", 1.0),
    }
}

fn read_palette(el: &XmlElement) -> VoxsimResult<Palette> {
    let mut materials = vec![Material::erase()];
    for m in el.children_named("Material") {
        materials.push(read_material(m)?);
    }
    let count = materials.len();
    for (i, m) in materials.iter().enumerate() {
        if let Some(bad) = m.references().into_iter().find(|r| r.index() >= count) {
            return Err(VoxsimError::Parse(format!(
                "material {i} ('{}') references missing material {}",
                m.name, bad.0
            )));
        }
    }
    let palette = Palette::from_materials(materials)?;
    for (index, m) in palette.iter() {
        if let Some(r) = m
            .references()
            .into_iter()
            .find(|&r| r == index || palette.is_in_recursive_path(r, index))
        {
            return Err(VoxsimError::Recursion(format!(
                "material {} ('{}') reaches itself through material {}",
                index.0, m.name, r.0
            )));
        }
    }
    Ok(palette)
}

fn read_material(el: &XmlElement) -> VoxsimResult<Material> {
    let code = el.value::<i32>("MatType").unwrap_or_else(|| {
        if el.child("Structure").is_some() {
            1
        } else if el.child("RandIndex1").is_some() {
            3
        } else {
            0
        }
    });
    let name: String = el.value_or("Name", "Default".to_string());

    let mut material = match code {
        0 => Material::leaf(name, read_mechanical(el.child("Mechanical"))),
        1 => {
            let structure = match el.child("Structure") {
                Some(s) => read_structure(s)?,
                None => Structure::new(0, 0, 0),
            };
            let mut spec = InternalSpec::new(structure);
            spec.offset = [
                el.value_or("X_Offset", 0),
                el.value_or("Y_Offset", 0),
                el.value_or("Z_Offset", 0),
            ];
            spec.rotation_axis = match el.value_or("StructRotateAxis", 0) {
                1 => Axis::Y,
                2 => Axis::Z,
                _ => Axis::X,
            };
            spec.rotation = QuarterTurn::from_code(el.value_or("StructRotateAmount", 0));
            Material::internal(name, spec)
        }
        3 => Material::dither(
            name,
            MaterialIndex(el.value_or("RandIndex1", 0)),
            MaterialIndex(el.value_or("RandIndex2", 0)),
            el.value_or("PercIndex1", 0.0),
        ),
        2 => {
            return Err(VoxsimError::Parse(format!(
                "material '{name}' references an external document, which is no longer supported"
            )))
        }
        other => {
            return Err(VoxsimError::Parse(format!(
                "material '{name}' has unknown type {other}"
            )))
        }
    };

    if let Some(display) = el.child("Display") {
        material.color = [
            display.value_or("Red", 0.5),
            display.value_or("Green", 0.5),
            display.value_or("Blue", 0.5),
            display.value_or("Alpha", 1.0),
        ];
    }
    Ok(material)
}

fn read_mechanical(el: Option<&XmlElement>) -> LeafProperties {
    let mut p = LeafProperties::zeroed();
    let Some(el) = el else {
        return p;
    };

    p.model_kind = ModelKind::from_code(el.value_or("MatModel", 0));
    p.elastic_modulus = el.value_or("Elastic_Mod", 0.0);
    p.plastic_modulus = el.value_or("Plastic_Mod", 0.0);
    p.yield_stress = el.value_or("Yield_Stress", 0.0);
    p.fail_stress = el.value_or("Fail_Stress", 0.0);
    p.fail_strain = el.value_or("Fail_Strain", 0.0);
    p.density = el.value_or("Density", 0.0);
    p.poissons_ratio = el.value_or("Poissons_Ratio", 0.0);
    p.cte = el.value_or("CTE", 0.0);
    p.temp_phase = el.value_or("MaterialTempPhase", 0.0);
    p.static_friction = el.value_or("uStatic", 0.0);
    p.dynamic_friction = el.value_or("uDynamic", 0.0);
    p.failure_mode = match el.value::<i32>("FailModel") {
        Some(code) => FailureMode::from_code(code),
        None if p.fail_stress != 0.0 => FailureMode::MaxStress,
        None if p.fail_strain != 0.0 => FailureMode::MaxStrain,
        None => FailureMode::MaxStress,
    };

    if p.model_kind == ModelKind::Data {
        let list = |section: &str, item: &str| -> Vec<f64> {
            el.child("SSData")
                .and_then(|ss| ss.child(section))
                .map(|s| {
                    s.children_named(item)
                        .filter_map(|c| c.text.trim().parse().ok())
                        .collect()
                })
                .unwrap_or_default()
        };
        let (strain, stress) = (list("StrainData", "Strain"), list("StressData", "Stress"));
        if let Err(e) = p.set_series(strain, stress) {
            warn!(error = %e, "invalid stress/strain data; material falls back to linear");
            p.model_kind = ModelKind::Linear;
        }
    }
    p
}

fn read_structure(el: &XmlElement) -> VoxsimResult<Structure> {
    let compression = Compression::from_tag(el.attr("Compression").unwrap_or(""));
    let nx: usize = el.value_or("X_Voxels", 1);
    let ny: usize = el.value_or("Y_Voxels", 1);
    let nz: usize = el.value_or("Z_Voxels", 1);
    let too_large =
        || VoxsimError::Parse(format!("structure of {nx} × {ny} × {nz} voxels is too large"));
    let layer = nx.checked_mul(ny).ok_or_else(too_large)?;
    let total = layer.checked_mul(nz).ok_or_else(too_large)?;

    let data_el = el.child("Data").ok_or_else(layer_size_error)?;
    let layers: Vec<&XmlElement> = data_el.children_named("Layer").collect();
    if layers.len() < nz {
        return Err(layer_size_error());
    }
    let mut data = Vec::new();
    for l in layers.iter().take(nz) {
        data.extend(decode_layer(&l.text, compression, layer)?);
    }
    let mut structure = Structure::from_data([nx, ny, nz], data)?;

    for field in AuxField::ALL {
        let Some(aux) = el.child(field.tag()) else {
            continue;
        };
        let mut values = Vec::with_capacity(total);
        let mut rows = aux.children_named("Layer");
        for _ in 0..nz {
            let text = rows.next().map(|r| r.text.as_str()).unwrap_or("");
            values.extend(decode_values(text, layer));
        }
        structure.set_aux(field, values)?;
    }
    Ok(structure)
}
