//! Integration tests for voxsim-io.

use std::fs;

use voxsim_boundary::{BoundaryRegion, BoundarySet, Primitive, TriangleSoup};
use voxsim_io::bcs::{load_bcx, read_bcx, save_bcx, write_bcx, EnvironmentDocument};
use voxsim_io::contract::{RunConfig, RunSummary};
use voxsim_io::encoding::{decode_layer, decode_values, encode_layer, Compression};
use voxsim_io::validator::{validate_boundaries, validate_object, validate_run_config};
use voxsim_io::vxc::{load_vxc, read_vxc, read_vxc_into, save_vxc, write_vxc};
use voxsim_io::XmlElement;
use voxsim_lattice::generators::{block, layered};
use voxsim_lattice::{AuxField, Lattice, Structure, VoxelShape};
use voxsim_material::{
    FailureMode, InternalSpec, LeafProperties, Material, ModelKind, Palette, VoxelObject,
};
use voxsim_math::{Axis, DVec3};
use voxsim_solver::{Feature, PhysicsConfig, StopCondition};
use voxsim_tensile::Convergence;
use voxsim_types::{DofMask, MaterialIndex, VoxsimError};

fn parse(xml: &str) -> XmlElement {
    XmlElement::parse_str(xml).unwrap()
}

// ─── XML Tree Tests ───────────────────────────────────────────

#[test]
fn parse_nested_elements_and_attributes() {
    let root = parse(
        r#"<?xml version="1.0"?>
        <VXC Version="0.94">
          <Lattice><Lattice_Dim>0.002</Lattice_Dim></Lattice>
          <Empty/>
          <Name>a &lt;b&gt;</Name>
        </VXC>"#,
    );
    assert_eq!(root.name, "VXC");
    assert_eq!(root.attr("Version"), Some("0.94"));
    assert_eq!(root.children.len(), 3);
    let dim: f64 = root.child("Lattice").unwrap().value("Lattice_Dim").unwrap();
    assert!((dim - 0.002).abs() < 1e-15);
    assert!(root.child("Empty").unwrap().text.is_empty());
    assert_eq!(root.child_text("Name"), Some("a <b>"));
}

#[test]
fn missing_and_malformed_values_use_default() {
    let root = parse("<R><A>abc</A><B>4</B></R>");
    assert_eq!(root.value_or("A", 7), 7);
    assert_eq!(root.value_or("B", 7), 4);
    assert_eq!(root.value_or("C", 7), 7);
}

#[test]
fn bool_values_accept_digits_and_words() {
    let root = parse("<R><A>1</A><B>0</B><C>true</C><D>x</D></R>");
    assert_eq!(root.bool_value("A"), Some(true));
    assert_eq!(root.bool_value("B"), Some(false));
    assert_eq!(root.bool_value("C"), Some(true));
    assert_eq!(root.bool_value("D"), None);
    assert_eq!(root.bool_value("E"), None);
}

#[test]
fn tree_survives_write_and_parse() {
    let mut root = XmlElement::new("Doc");
    root.set_attr("ID", 3);
    root.push_value("Text", "x & y");
    let mut inner = XmlElement::new("Inner");
    inner.push_bool("Flag", true);
    root.push(inner);

    let back = parse(&root.to_xml_string().unwrap());
    assert_eq!(back, root);
}

#[test]
fn unbalanced_document_rejected() {
    assert!(matches!(
        XmlElement::parse_str("<a><b></a>"),
        Err(VoxsimError::Parse(_))
    ));
    assert!(matches!(
        XmlElement::parse_str("<a><b>"),
        Err(VoxsimError::Parse(_))
    ));
}

#[test]
fn empty_document_rejected() {
    assert!(matches!(XmlElement::parse_str(""), Err(VoxsimError::Parse(_))));
}

// ─── Encoding Tests ───────────────────────────────────────────

#[test]
fn readable_layer_is_offset_by_zero_char() {
    assert_eq!(encode_layer(&[0, 1, 2, 12], Compression::AsciiReadable).unwrap(), "012<");
    assert_eq!(
        decode_layer("0120", Compression::AsciiReadable, 4).unwrap(),
        vec![0, 1, 2, 0]
    );
}

#[test]
fn compressed_layers_decode_to_original_bytes() {
    let bytes: Vec<u8> = (0..64).map(|i| (i % 5) as u8).collect();
    for c in [Compression::Base64, Compression::Zlib] {
        let text = encode_layer(&bytes, c).unwrap();
        assert_eq!(decode_layer(&text, c, bytes.len()).unwrap(), bytes, "{c}");
    }
}

#[test]
fn layer_size_mismatch_is_a_parse_error() {
    let err = decode_layer("111", Compression::AsciiReadable, 4).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Parse error: Voxel layer data not present or does not match expected size."
    );
}

#[test]
fn oversized_zlib_layer_rejected() {
    let text = encode_layer(&[1; 64], Compression::Zlib).unwrap();
    assert!(matches!(
        decode_layer(&text, Compression::Zlib, 16),
        Err(VoxsimError::Parse(_))
    ));
    assert_eq!(decode_layer(&text, Compression::Zlib, 64).unwrap(), vec![1; 64]);
}

#[test]
fn raw_layers_are_read_only() {
    assert!(encode_layer(&[1, 2], Compression::Raw).is_err());
    assert_eq!(decode_layer("\u{1}\u{2}", Compression::Raw, 2).unwrap(), vec![1, 2]);
}

#[test]
fn value_layers_pad_missing_cells() {
    assert_eq!(decode_values("1.5,x,3", 4), vec![1.5, 0.0, 3.0, 0.0]);
    assert_eq!(decode_values("", 2), vec![0.0, 0.0]);
}

#[test]
fn compression_names() {
    assert_eq!(Compression::from_tag("ZLIB"), Compression::Zlib);
    assert_eq!(Compression::from_tag("QT_ZLIB"), Compression::Zlib);
    assert_eq!(Compression::from_tag(""), Compression::AsciiReadable);
    assert_eq!("base64".parse::<Compression>().unwrap(), Compression::Base64);
    assert!("lz4".parse::<Compression>().is_err());
}

// ─── Structure Document Tests ─────────────────────────────────

/// Four materials covering every entry kind, a layered block and a
/// phase-offset array.
fn sample_object() -> VoxelObject {
    let mut soft = LeafProperties::new(1.0e6, 0.3);
    soft.density = 1100.0;
    soft.cte = 1.0e-4;
    soft.temp_phase = 1.5;
    let mut curve = LeafProperties::new(0.0, 0.35);
    curve
        .set_series(vec![0.0, 0.01, 0.05], vec![0.0, 1.0e4, 2.0e4])
        .unwrap();

    let mut palette = Palette::new();
    let a = palette
        .add(Material::leaf("Soft", soft).with_color(1.0, 0.25, 0.0, 1.0))
        .unwrap();
    let b = palette.add(Material::leaf("Curve", curve)).unwrap();
    palette.add(Material::dither("Mix", a, b, 0.25)).unwrap();
    let mut spec = InternalSpec::new(layered(2, 2, 2, &[a, b]));
    spec.offset = [1, 0, -1];
    spec.rotation_axis = Axis::Z;
    palette.add(Material::internal("Cells", spec)).unwrap();

    let mut structure = layered(3, 2, 4, &[a, b, MaterialIndex(3), MaterialIndex(4)]);
    let phases: Vec<f64> = (0..structure.len()).map(|i| i as f64 * 0.1).collect();
    structure.set_aux(AuxField::PhaseOffset, phases).unwrap();

    let mut object = VoxelObject::from_parts(Lattice::cubic(0.005), palette, structure).unwrap();
    object.appearance.shape = VoxelShape::Box;
    object.appearance.z_squeeze = 0.8;
    object
}

#[test]
fn structure_document_round_trip() {
    let object = sample_object();
    for c in [Compression::AsciiReadable, Compression::Base64, Compression::Zlib] {
        let xml = write_vxc(&object, c).unwrap().to_xml_string().unwrap();
        let back = read_vxc(&parse(&xml)).unwrap();
        assert_eq!(back, object, "{c}");
    }
}

#[test]
fn palette_entries_written_from_index_one() {
    let root = write_vxc(&sample_object(), Compression::Zlib).unwrap();
    let palette = root.child("Palette").unwrap();
    let ids: Vec<&str> = palette
        .children_named("Material")
        .filter_map(|m| m.attr("ID"))
        .collect();
    assert_eq!(ids, vec!["1", "2", "3", "4"]);
    assert_eq!(root.attr("Version"), Some("0.94"));
}

#[test]
fn absent_aux_arrays_are_not_written() {
    let mut object = sample_object();
    object.structure.remove_aux(AuxField::PhaseOffset);
    let root = write_vxc(&object, Compression::Zlib).unwrap();
    let structure = root.child("Structure").unwrap();
    assert!(structure.child("PhaseOffset").is_none());
    assert!(structure.child("Stiffness").is_none());
}

#[test]
fn sparse_material_fields_take_defaults() {
    let root = parse(
        r#"<VXC>
          <Palette>
            <Material ID="1">
              <Mechanical>
                <Elastic_Mod>1000000</Elastic_Mod>
                <Fail_Strain>0.1</Fail_Strain>
              </Mechanical>
            </Material>
            <Material ID="2"><Name>Bare</Name></Material>
          </Palette>
          <Structure Compression="ASCII_READABLE">
            <X_Voxels>2</X_Voxels><Y_Voxels>1</Y_Voxels><Z_Voxels>1</Z_Voxels>
            <Data><Layer>12</Layer></Data>
          </Structure>
        </VXC>"#,
    );
    let object = read_vxc(&root).unwrap();
    assert!((object.lattice.lattice_dim - 0.001).abs() < 1e-15);

    let first = object.palette.get(MaterialIndex(1)).unwrap();
    assert_eq!(first.name, "Default");
    assert_eq!(first.color, [0.5, 0.5, 0.5, 1.0]);
    let props = first.leaf_properties().unwrap();
    assert_eq!(props.failure_mode, FailureMode::MaxStrain);
    assert_eq!(props.model_kind, ModelKind::Linear);
    assert_eq!(props.density, 0.0);

    let bare = object.palette.leaf(MaterialIndex(2)).unwrap();
    assert_eq!(bare, &LeafProperties::zeroed());
}

#[test]
fn short_layer_fails_the_load() {
    let root = parse(
        r#"<VXC><Structure Compression="ASCII_READABLE">
            <X_Voxels>2</X_Voxels><Y_Voxels>2</Y_Voxels><Z_Voxels>2</Z_Voxels>
            <Data><Layer>0000</Layer></Data>
        </Structure></VXC>"#,
    );
    let err = read_vxc(&root).unwrap_err();
    assert!(err.to_string().contains("does not match expected size"));
}

#[test]
fn failed_load_leaves_object_cleared() {
    let mut object = sample_object();
    let bad = parse(
        r#"<VXC><Structure><X_Voxels>2</X_Voxels><Data><Layer>0</Layer></Data></Structure></VXC>"#,
    );
    assert!(read_vxc_into(&mut object, &bad).is_err());
    assert_eq!(object.voxel_count(), 0);
    assert_eq!(object.palette.len(), 1);
}

#[test]
fn dangling_material_reference_rejected() {
    let root = parse(
        r#"<VXC><Palette>
            <Material ID="1"><MatType>3</MatType><RandIndex1>1</RandIndex1><RandIndex2>9</RandIndex2></Material>
        </Palette></VXC>"#,
    );
    assert!(matches!(read_vxc(&root), Err(VoxsimError::Parse(_))));
}

#[test]
fn self_referencing_dither_load_rejected() {
    let root = parse(
        r#"<VXC><Palette>
            <Material ID="1"><MatType>3</MatType><RandIndex1>1</RandIndex1><RandIndex2>1</RandIndex2></Material>
        </Palette></VXC>"#,
    );
    assert!(matches!(read_vxc(&root), Err(VoxsimError::Recursion(_))));
}

#[test]
fn dither_cycle_through_another_material_rejected() {
    let root = parse(
        r#"<VXC><Palette>
            <Material ID="1"><Name>Leaf</Name><MatType>0</MatType></Material>
            <Material ID="2"><Name>D1</Name><MatType>3</MatType><RandIndex1>1</RandIndex1><RandIndex2>3</RandIndex2></Material>
            <Material ID="3"><Name>D2</Name><MatType>3</MatType><RandIndex1>2</RandIndex1><RandIndex2>1</RandIndex2></Material>
        </Palette></VXC>"#,
    );
    let mut object = sample_object();
    assert!(matches!(read_vxc_into(&mut object, &root), Err(VoxsimError::Recursion(_))));
    assert_eq!(object.palette.len(), 1);
}

#[test]
fn acyclic_dither_chain_loads() {
    let root = parse(
        r#"<VXC><Palette>
            <Material ID="1"><Name>Leaf</Name><MatType>0</MatType></Material>
            <Material ID="2"><Name>D1</Name><MatType>3</MatType><RandIndex1>1</RandIndex1><RandIndex2>1</RandIndex2></Material>
            <Material ID="3"><Name>D2</Name><MatType>3</MatType><RandIndex1>2</RandIndex1><RandIndex2>1</RandIndex2></Material>
        </Palette></VXC>"#,
    );
    assert_eq!(read_vxc(&root).unwrap().palette.len(), 4);
}

#[test]
fn overflowing_dimensions_fail_cleanly() {
    let root = parse(
        r#"<VXC><Structure Compression="ASCII_READABLE">
            <X_Voxels>18446744073709551615</X_Voxels><Y_Voxels>2</Y_Voxels><Z_Voxels>1</Z_Voxels>
            <Data><Layer>00</Layer></Data>
        </Structure></VXC>"#,
    );
    assert!(matches!(read_vxc(&root), Err(VoxsimError::Parse(_))));

    let deep = parse(
        r#"<VXC><Structure Compression="ASCII_READABLE">
            <X_Voxels>4294967296</X_Voxels><Y_Voxels>4294967296</Y_Voxels><Z_Voxels>2</Z_Voxels>
            <Data><Layer>0</Layer><Layer>0</Layer></Data>
        </Structure></VXC>"#,
    );
    assert!(read_vxc(&deep).is_err());
}

#[test]
fn huge_layer_with_short_data_is_a_size_error() {
    let root = parse(
        r#"<VXC><Structure Compression="ZLIB">
            <X_Voxels>100000000000</X_Voxels><Y_Voxels>1</Y_Voxels><Z_Voxels>1</Z_Voxels>
            <Data><Layer>eJwzAAAAMQAx</Layer></Data>
        </Structure></VXC>"#,
    );
    let err = read_vxc(&root).unwrap_err();
    assert!(err.to_string().contains("does not match expected size"));
}

#[test]
fn external_material_rejected() {
    let root = parse(r#"<VXC><Palette><Material><MatType>2</MatType></Material></Palette></VXC>"#);
    assert!(read_vxc(&root).is_err());
}

#[test]
fn structure_found_inside_simulation_document() {
    let object = sample_object();
    let mut vxa = XmlElement::new("VXA");
    vxa.push(XmlElement::new("Simulator"));
    vxa.push(write_vxc(&object, Compression::Base64).unwrap());
    let back = read_vxc(&parse(&vxa.to_xml_string().unwrap())).unwrap();
    assert_eq!(back.voxel_count(), object.voxel_count());

    assert!(read_vxc(&XmlElement::new("Other")).is_err());
}

#[test]
fn structure_document_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("object.vxc");
    let object = sample_object();
    save_vxc(&object, &path, Compression::Zlib).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("<?xml"));
    assert_eq!(load_vxc(&path).unwrap(), object);
}

// ─── Boundary Document Tests ──────────────────────────────────

fn sample_boundaries() -> BoundarySet {
    let mut forced = BoundaryRegion::forced(
        Primitive::cylinder(DVec3::new(0.5, 0.5, 0.9), DVec3::new(0.0, 0.0, 0.1), 0.2),
        DVec3::new(0.0, 0.0, -2.5),
        DVec3::ZERO,
    );
    forced.color = [0.9, 0.1, 0.1, 0.5];
    BoundarySet::from_regions(vec![
        BoundaryRegion::fixed(
            Primitive::new_box(DVec3::ZERO, DVec3::new(1.0, 1.0, 0.01)),
            DVec3::new(0.0, 0.0, 0.001),
        ),
        forced,
        BoundaryRegion::fixed(
            Primitive::mesh(TriangleSoup::unit_cube(), DVec3::splat(0.25), DVec3::splat(0.5)),
            DVec3::ZERO,
        ),
    ])
}

#[test]
fn boundary_document_round_trip() {
    let mut doc = EnvironmentDocument::new(sample_boundaries());
    doc.gravity = true;
    doc.floor = true;
    doc.vary_temperature = true;
    doc.environment.temp_amplitude = 15.0;
    doc.environment.floor_slope = 10.0;

    let xml = write_bcx(&doc).to_xml_string().unwrap();
    let back = read_bcx(&parse(&xml)).unwrap();
    assert_eq!(back, doc);
}

#[test]
fn legacy_regions_and_fixed_flag() {
    let root = parse(
        r#"<Environment>
          <Fixed_Regions><NumFixed>1</NumFixed>
            <FRegion><PrimType>0</PrimType><dX>0.1</dX><dY>1</dY><dZ>1</dZ><Fixed>1</Fixed></FRegion>
          </Fixed_Regions>
          <Forced_Regions><NumForced>1</NumForced>
            <FRegion><PrimType>2</PrimType><X>0.5</X><Radius>0.1</Radius><Fixed>0</Fixed><ForceZ>-1</ForceZ></FRegion>
          </Forced_Regions>
          <Thermal><TempBase>20</TempBase><TempAmp>30</TempAmp></Thermal>
        </Environment>"#,
    );
    let doc = read_bcx(&root).unwrap();
    assert_eq!(doc.boundaries.len(), 2);
    let fixed = doc.boundaries.get(0).unwrap();
    assert_eq!(fixed.dof_fixed(), DofMask::ALL);
    assert!((fixed.primitive.size.x - 0.1).abs() < 1e-12);
    let forced = doc.boundaries.get(1).unwrap();
    assert_eq!(forced.dof_fixed(), DofMask::NONE);
    assert!((forced.force().z + 1.0).abs() < 1e-12);
    assert!((doc.environment.temp_amplitude - 10.0).abs() < 1e-12);
    assert!(!doc.gravity);
}

#[test]
fn steep_floor_is_truncated() {
    let root = parse("<Environment><Gravity><FloorSlope>95</FloorSlope></Gravity></Environment>");
    let doc = read_bcx(&root).unwrap();
    assert!((doc.environment.floor_slope - 89.0).abs() < 1e-12);
    assert!((doc.environment.gravity_accel + 9.81).abs() < 1e-12);
}

#[test]
fn region_count_mismatch_rejected() {
    let root = parse(
        "<Environment><Boundary_Conditions><NumBCs>2</NumBCs>\
         <FRegion><PrimType>0</PrimType></FRegion></Boundary_Conditions></Environment>",
    );
    assert!(matches!(read_bcx(&root), Err(VoxsimError::Parse(_))));
}

#[test]
fn environment_applies_to_physics() {
    let mut doc = EnvironmentDocument::default();
    doc.gravity = true;
    doc.temperature = true;
    doc.environment.base_temp = 30.0;

    let mut physics = PhysicsConfig::default();
    doc.apply_to(&mut physics);
    assert!(physics.features.is_enabled(Feature::Gravity));
    assert!(physics.features.is_enabled(Feature::Temperature));
    assert!(!physics.features.is_enabled(Feature::Floor));
    assert!((physics.environment.base_temp - 30.0).abs() < 1e-12);

    let captured = EnvironmentDocument::from_physics(BoundarySet::new(), &physics);
    assert_eq!(captured, doc);
}

#[test]
fn boundary_document_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("setup.bcx");
    let doc = EnvironmentDocument::new(sample_boundaries());
    save_bcx(&doc, &path).unwrap();
    assert_eq!(load_bcx(&path).unwrap().boundaries, doc.boundaries);
}

// ─── Contract Tests ───────────────────────────────────────────

#[test]
fn minimal_run_config_uses_defaults() {
    let config = RunConfig::from_toml_str(r#"structure = "bar.vxc""#).unwrap();
    assert_eq!(config.structure.to_str(), Some("bar.vxc"));
    assert!(config.boundaries.is_none());
    assert!(!config.is_tensile());
    assert_eq!(config.physics, PhysicsConfig::default());
    assert_eq!(config.output.stats_every, 100);
}

#[test]
fn tensile_run_config_parses() {
    let config = RunConfig::from_toml_str(
        r#"
        structure = "bar.vxc"
        boundaries = "pull.bcx"

        [physics]
        bond_damping = 0.5

        [tensile]
        steps = 4

        [tensile.convergence]
        mode = "manual"
        iterations = 20

        [output]
        tensile_table = "out/table.tsv"
        "#,
    )
    .unwrap();
    assert!((config.physics.bond_damping - 0.5).abs() < 1e-12);
    let tensile = config.tensile.as_ref().unwrap();
    assert_eq!(tensile.steps, 4);
    assert_eq!(tensile.convergence, Convergence::manual(20));
    assert!(config.output.tensile_table.is_some());
}

#[test]
fn run_config_toml_round_trip() {
    let mut config = RunConfig::new("a.vxc");
    config.max_steps = Some(500);
    config.tensile = Some(Default::default());
    let back = RunConfig::from_toml_str(&config.to_toml_string().unwrap()).unwrap();
    assert_eq!(back, config);
}

#[test]
fn load_resolves_paths_against_config_dir() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.toml");
    fs::write(
        &path,
        "structure = \"bar.vxc\"\nboundaries = \"/abs/pull.bcx\"\n[output]\nsummary = \"s.json\"\n",
    )
    .unwrap();
    let config = RunConfig::load(&path).unwrap();
    assert_eq!(config.structure, dir.path().join("bar.vxc"));
    assert_eq!(config.boundaries.unwrap().to_str(), Some("/abs/pull.bcx"));
    assert_eq!(config.output.summary, Some(dir.path().join("s.json")));
}

#[test]
fn summary_serializes_to_json() {
    let summary = RunSummary {
        voxel_count: 8,
        steps: 10,
        ..Default::default()
    };
    let json = summary.to_json().unwrap();
    assert!(json.contains("\"voxel_count\": 8"));
    assert!(json.contains("final_stats"));
}

// ─── Validator Tests ──────────────────────────────────────────

fn config_with_files(dir: &std::path::Path) -> RunConfig {
    let structure = dir.join("bar.vxc");
    let bcs = dir.join("pull.bcx");
    fs::write(&structure, "<VXC/>").unwrap();
    fs::write(&bcs, "<Environment/>").unwrap();
    let mut config = RunConfig::new(structure);
    config.boundaries = Some(bcs);
    config.max_steps = Some(100);
    config
}

#[test]
fn valid_run_config_passes() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_with_files(dir.path());
    config.output.summary = Some(dir.path().join("summary.json"));
    assert!(validate_run_config(&config).is_ok());
}

#[test]
fn missing_structure_rejected() {
    let config = RunConfig::new("/definitely/not/here.vxc");
    assert!(matches!(
        validate_run_config(&config),
        Err(VoxsimError::InvalidConfig(_))
    ));
}

#[test]
fn tensile_without_boundaries_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_with_files(dir.path());
    config.boundaries = None;
    config.tensile = Some(Default::default());
    assert!(validate_run_config(&config).is_err());
}

#[test]
fn bad_output_settings_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_with_files(dir.path());
    config.output.stats_every = 0;
    assert!(validate_run_config(&config).is_err());

    let mut config = config_with_files(dir.path());
    let same = dir.path().join("out.csv");
    config.output.stats_csv = Some(same.clone());
    config.output.summary = Some(same);
    assert!(validate_run_config(&config).is_err());

    let mut config = config_with_files(dir.path());
    config.output.snapshot = Some(dir.path().join("missing_dir").join("snap.bin"));
    assert!(validate_run_config(&config).is_err());
}

#[test]
fn endless_plain_run_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_with_files(dir.path());
    config.max_steps = None;
    let err = validate_run_config(&config).unwrap_err();
    assert!(err.to_string().contains("stop condition"));
    config.physics.stop = StopCondition::max_time(0.01);
    assert!(validate_run_config(&config).is_ok());
}

#[test]
fn invalid_physics_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_with_files(dir.path());
    config.physics.dt_frac = f64::NAN;
    assert!(validate_run_config(&config).is_err());
}

#[test]
fn object_checks() {
    assert!(validate_object(&sample_object()).is_ok());

    let empty = VoxelObject::new(Lattice::cubic(0.001), 2, 2, 2);
    assert!(matches!(validate_object(&empty), Err(VoxsimError::Validation(_))));

    let mut palette = Palette::new();
    let m = palette.add_leaf("Limp", 0.0, 0.3).unwrap();
    let limp = VoxelObject::from_parts(Lattice::cubic(0.001), palette, block(2, 2, 2, m)).unwrap();
    assert!(validate_object(&limp).is_err());
}

#[test]
fn self_referencing_dither_is_a_recursion_error() {
    let palette = Palette::from_materials(vec![
        Material::erase(),
        Material::leaf("A", LeafProperties::new(1.0e6, 0.3)),
        Material::dither("Loop", MaterialIndex(1), MaterialIndex(2), 0.5),
    ])
    .unwrap();
    let object =
        VoxelObject::from_parts(Lattice::cubic(0.001), palette, block(2, 2, 2, MaterialIndex(1)))
            .unwrap();
    assert!(matches!(validate_object(&object), Err(VoxsimError::Recursion(_))));
}

#[test]
fn boundary_checks() {
    assert!(validate_boundaries(&sample_boundaries()).is_ok());
    let bad = BoundarySet::from_regions(vec![BoundaryRegion::new(Primitive::new_box(
        DVec3::ZERO,
        DVec3::new(-0.1, 1.0, 1.0),
    ))]);
    assert!(validate_boundaries(&bad).is_err());
    let nan = BoundarySet::from_regions(vec![BoundaryRegion::forced(
        Primitive::sphere(DVec3::splat(0.5), 0.1),
        DVec3::new(f64::NAN, 0.0, 0.0),
        DVec3::ZERO,
    )]);
    assert!(validate_boundaries(&nan).is_err());
}

#[test]
fn internal_structure_survives_alone() {
    let spec = InternalSpec::new(Structure::new(1, 1, 1));
    let mut palette = Palette::new();
    palette.add(Material::internal("Solo", spec)).unwrap();
    let object =
        VoxelObject::from_parts(Lattice::cubic(0.001), palette, Structure::new(1, 1, 1)).unwrap();
    let back = read_vxc(&write_vxc(&object, Compression::AsciiReadable).unwrap()).unwrap();
    assert_eq!(back, object);
}
