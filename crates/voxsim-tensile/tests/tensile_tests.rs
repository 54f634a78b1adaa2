//! Integration tests for voxsim-tensile.

use voxsim_boundary::{BoundaryRegion, BoundarySet, Primitive};
use voxsim_lattice::generators::block;
use voxsim_lattice::{Lattice, Structure};
use voxsim_material::{Palette, VoxelObject};
use voxsim_math::{Axis, DVec3};
use voxsim_solver::{Feature, FeatureSet, PhysicsConfig};
use voxsim_tensile::{
    blend_object, check_boundaries, detect_basic, BlendCurve, BlendSettings, Convergence,
    ConvergencePreset, TensileParams, TensileResults, TensileTest, GRADED_MATERIALS,
};
use voxsim_types::{MaterialIndex, VoxelIndex, VoxsimError};

const SIZE: f64 = 0.01;
const MODULUS: f64 = 1.0e6;

fn bar(nx: usize, ny: usize, nz: usize) -> VoxelObject {
    let mut palette = Palette::new();
    let mat = palette.add_leaf("Bar", MODULUS, 0.35).unwrap();
    VoxelObject::from_parts(Lattice::cubic(SIZE), palette, block(nx, ny, nz, mat)).unwrap()
}

/// Both X end faces fully fixed, the far one pulled by `pull` metres.
fn pulled_along_x(pull: f64) -> BoundarySet {
    BoundarySet::from_regions(vec![
        BoundaryRegion::fixed(
            Primitive::new_box(DVec3::ZERO, DVec3::new(0.05, 1.0, 1.0)),
            DVec3::ZERO,
        ),
        BoundaryRegion::fixed(
            Primitive::new_box(DVec3::new(0.96, 0.0, 0.0), DVec3::new(0.04, 1.0, 1.0)),
            DVec3::new(pull, 0.0, 0.0),
        ),
    ])
}

fn mechanical_only() -> PhysicsConfig {
    PhysicsConfig {
        features: FeatureSet::none(),
        ..Default::default()
    }
}

fn two_material_column() -> VoxelObject {
    let mut palette = Palette::new();
    let soft = palette.add_leaf("Soft", 1.0e6, 0.3).unwrap();
    let hard = palette.add_leaf("Hard", 1.0e7, 0.4).unwrap();
    let mut s = Structure::new(1, 1, 12);
    for k in 0..12 {
        s.set_at(0, 0, k, if k < 6 { soft } else { hard }).unwrap();
    }
    VoxelObject::from_parts(Lattice::cubic(SIZE), palette, s).unwrap()
}

// ─── Convergence Tests ───────────────────────────────────────

#[test]
fn preset_divisors() {
    assert_eq!(ConvergencePreset::Fast.divisor(), 0.02);
    assert_eq!(ConvergencePreset::Balanced.divisor(), 0.2);
    assert_eq!(ConvergencePreset::Accurate.divisor(), 2.0);
}

#[test]
fn preset_parsing() {
    assert_eq!("Fast".parse::<ConvergencePreset>().unwrap(), ConvergencePreset::Fast);
    assert_eq!(" accurate ".parse::<ConvergencePreset>().unwrap(), ConvergencePreset::Accurate);
    assert!(matches!(
        "sloppy".parse::<ConvergencePreset>(),
        Err(VoxsimError::InvalidConfig(_))
    ));
}

#[test]
fn invalid_convergence_rejected() {
    assert!(Convergence::threshold(0.0).validate().is_err());
    assert!(Convergence::threshold(f64::NAN).validate().is_err());
    assert!(Convergence::manual(0).validate().is_err());
    assert!(Convergence::manual(10).validate().is_ok());
    assert!(Convergence::auto(ConvergencePreset::Fast).validate().is_ok());
}

#[test]
fn params_toml_roundtrip() {
    let params = TensileParams {
        steps: 4,
        convergence: Convergence::threshold(1e-7),
        blend: BlendSettings::new(
            DVec3::new(0.0, 0.0, 0.02),
            BlendCurve::Polynomial { exponent: 2.0 },
        ),
        ..Default::default()
    };
    let text = toml::to_string(&params).unwrap();
    let back: TensileParams = toml::from_str(&text).unwrap();
    assert_eq!(back, params);
}

#[test]
fn params_zero_steps_rejected() {
    let params = TensileParams {
        steps: 0,
        ..Default::default()
    };
    assert!(TensileTest::new(params).is_err());
}

// ─── Boundary Check Tests ────────────────────────────────────

#[test]
fn boundaries_without_displacement_rejected() {
    let bcs = BoundarySet::from_regions(vec![BoundaryRegion::fixed(
        Primitive::new_box(DVec3::ZERO, DVec3::new(0.05, 1.0, 1.0)),
        DVec3::ZERO,
    )]);
    let err = check_boundaries(&bcs, 10, SIZE).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Validation error: At least one fixed boundary conditions must have non-zero displacement."
    );

    let test = TensileTest::new(TensileParams::default()).unwrap();
    assert!(test.run(&bar(10, 1, 1), &bcs, &mechanical_only()).is_err());
}

#[test]
fn basic_test_detected() {
    let basic = detect_basic(&bar(10, 2, 2), &pulled_along_x(1e-3)).unwrap();
    assert_eq!(basic.axis, Axis::X);
    assert_eq!(basic.displaced_region, 1);
    assert!((basic.cross_section - 4.0 * SIZE * SIZE).abs() < 1e-15);
    assert!((basic.initial_length - 9.0 * SIZE).abs() < 1e-12);
}

#[test]
fn basic_test_rejects_other_layouts() {
    let object = bar(10, 2, 2);

    let mut three = pulled_along_x(1e-3);
    three.add(BoundaryRegion::fixed(
        Primitive::new_box(DVec3::new(0.5, 0.0, 0.0), DVec3::new(0.05, 1.0, 1.0)),
        DVec3::ZERO,
    ));
    assert!(detect_basic(&object, &three).is_none());

    let mut diagonal = pulled_along_x(1e-3);
    diagonal
        .get_mut(1)
        .unwrap()
        .set_displace(DVec3::new(1e-3, 1e-3, 0.0));
    assert!(detect_basic(&object, &diagonal).is_none());

    let thick = BoundarySet::from_regions(vec![
        BoundaryRegion::fixed(
            Primitive::new_box(DVec3::ZERO, DVec3::new(0.3, 1.0, 1.0)),
            DVec3::ZERO,
        ),
        BoundaryRegion::fixed(
            Primitive::new_box(DVec3::new(0.96, 0.0, 0.0), DVec3::new(0.04, 1.0, 1.0)),
            DVec3::new(1e-3, 0.0, 0.0),
        ),
    ]);
    assert!(detect_basic(&object, &thick).is_none());
}

// ─── Blend Tests ─────────────────────────────────────────────

#[test]
fn blend_curves_span_unit_interval() {
    for curve in [
        BlendCurve::Linear,
        BlendCurve::Exponential,
        BlendCurve::Polynomial { exponent: 3.0 },
    ] {
        assert!(curve.apply(0.0).abs() < 1e-12, "{}", curve.name());
        assert!((curve.apply(1.0) - 1.0).abs() < 1e-12, "{}", curve.name());
    }
    assert!((BlendCurve::Exponential.apply(0.5) - (2f64.sqrt() - 1.0)).abs() < 1e-12);
    assert!((BlendCurve::Polynomial { exponent: 2.0 }.apply(0.5) - 0.25).abs() < 1e-12);
}

#[test]
fn blend_builds_graded_palette() {
    let blended = blend_object(
        &two_material_column(),
        &BlendSettings::new(DVec3::new(0.0, 0.0, 2.0 * SIZE), BlendCurve::Linear),
    )
    .unwrap();

    assert_eq!(blended.palette.len(), GRADED_MATERIALS + 1);
    assert_eq!(blended.palette.get(MaterialIndex(1)).unwrap().name, "GM0");
    assert_eq!(blended.palette.get(MaterialIndex(100)).unwrap().name, "GM99");
    let first = blended.palette.leaf(MaterialIndex(1)).unwrap();
    let last = blended.palette.leaf(MaterialIndex(100)).unwrap();
    assert!((first.elastic_modulus - 1.0e6).abs() < 1e-6);
    assert!((last.elastic_modulus - 1.0e7).abs() < 1e-6);
    assert!((first.poissons_ratio - 0.3).abs() < 1e-12);
    assert!((last.poissons_ratio - 0.4).abs() < 1e-12);
}

#[test]
fn blend_ramps_across_interface() {
    let blended = blend_object(
        &two_material_column(),
        &BlendSettings::new(DVec3::new(0.0, 0.0, 2.0 * SIZE), BlendCurve::Linear),
    )
    .unwrap();
    let grade = |k: u32| blended.structure.get(VoxelIndex(k)).unwrap().0;

    assert_eq!(grade(0), 1);
    assert_eq!(grade(11), 100);
    assert!(grade(5) > 1 && grade(5) < 100);
    assert!(grade(6) > grade(5));
    for k in 1..12 {
        assert!(grade(k) >= grade(k - 1), "grade decreased at layer {k}");
    }
    assert_eq!(blended.voxel_count(), 12);
}

#[test]
fn blend_rejects_three_materials() {
    let mut palette = Palette::new();
    let a = palette.add_leaf("A", 1e6, 0.3).unwrap();
    let b = palette.add_leaf("B", 2e6, 0.3).unwrap();
    let c = palette.add_leaf("C", 3e6, 0.3).unwrap();
    let mut s = Structure::new(3, 1, 1);
    s.set_at(0, 0, 0, a).unwrap();
    s.set_at(1, 0, 0, b).unwrap();
    s.set_at(2, 0, 0, c).unwrap();
    let object = VoxelObject::from_parts(Lattice::cubic(SIZE), palette, s).unwrap();
    let err = blend_object(
        &object,
        &BlendSettings::new(DVec3::splat(SIZE), BlendCurve::Linear),
    )
    .unwrap_err();
    assert!(matches!(err, VoxsimError::Validation(_)));
}

// ─── Result Table Tests ──────────────────────────────────────

#[test]
fn empty_results_have_no_header() {
    let r = TensileResults::default();
    assert!(r.is_empty());
    assert!(r.header().is_empty());
    assert_eq!(r.to_tsv(), "\n");
}

// ─── Controller Tests ────────────────────────────────────────

#[test]
fn linear_bar_recovers_modulus() {
    // 5% strain over the 9-voxel gauge length.
    let pull = 0.05 * 9.0 * SIZE;
    let params = TensileParams {
        steps: 10,
        convergence: Convergence::threshold(1e-7),
        ..Default::default()
    };
    let test = TensileTest::new(params).unwrap();
    let results = test
        .run(&bar(10, 2, 2), &pulled_along_x(pull), &mechanical_only())
        .unwrap();

    assert_eq!(results.len(), 10);
    assert!(results.basic.is_some());
    assert!(results.rows.iter().all(|r| r.converged));
    assert!(results.rows.iter().all(|r| r.broken_bonds == 0));

    let strains = results.strains();
    let stresses = results.stresses();
    assert_eq!(strains.len(), 10);
    for pair in strains.windows(2) {
        assert!(pair[1] > pair[0], "strain not increasing: {pair:?}");
    }
    assert!((strains[9] - 0.05).abs() < 1e-9);
    for (e, s) in strains.iter().zip(&stresses) {
        let secant = s / e;
        assert!(
            (secant - MODULUS).abs() < 0.05 * MODULUS,
            "secant modulus {secant} at strain {e}"
        );
    }

    let tsv = results.to_tsv();
    let mut lines = tsv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Disp (m)\tForce (N)\tStrain (%)\tStress (MPa)\tModulus (MPa)"
    );
    let first: Vec<&str> = lines.next().unwrap().split('\t').collect();
    assert_eq!(first.len(), 5);
    assert!(first[4].is_empty());
}

#[test]
fn manual_convergence_runs_fixed_steps() {
    let params = TensileParams {
        steps: 3,
        convergence: Convergence::manual(50),
        ..Default::default()
    };
    let test = TensileTest::new(params).unwrap();
    let results = test
        .run(&bar(4, 1, 1), &pulled_along_x(1e-4), &mechanical_only())
        .unwrap();
    assert_eq!(results.len(), 3);
    // 50 settling steps plus the failure check step.
    assert!(results.rows.iter().all(|r| r.steps == 51));
    assert!(results.threshold.is_none());
}

#[test]
fn auto_convergence_sets_threshold() {
    let params = TensileParams {
        steps: 3,
        convergence: Convergence::auto(ConvergencePreset::Fast),
        ..Default::default()
    };
    let test = TensileTest::new(params).unwrap();
    let results = test
        .run(&bar(6, 1, 1), &pulled_along_x(0.01 * 5.0 * SIZE), &mechanical_only())
        .unwrap();
    assert_eq!(results.len(), 3);
    let t = results.threshold.unwrap();
    assert!(t > 0.0 && t.is_finite());
    for pair in results.strains().windows(2) {
        assert!(pair[1] > pair[0]);
    }
}

#[test]
fn environment_effects_are_switched_off() {
    let physics = PhysicsConfig::default();
    assert!(physics.features.is_enabled(Feature::Gravity));
    let test = TensileTest::new(TensileParams::default()).unwrap();
    let (sim, _) = test
        .prepare(&bar(4, 1, 1), &pulled_along_x(1e-4), &physics)
        .unwrap();
    for f in [Feature::Gravity, Feature::Floor, Feature::Failure, Feature::Plasticity] {
        assert!(!sim.is_feature_enabled(f), "{f} left on");
    }
    assert!(sim.is_feature_enabled(Feature::Equilibrium));
}

#[test]
fn cancelled_test_keeps_no_rows() {
    let test = TensileTest::new(TensileParams::default()).unwrap();
    test.cancel_handle().store(true, std::sync::atomic::Ordering::Relaxed);
    let results = test
        .run(&bar(4, 1, 1), &pulled_along_x(1e-4), &mechanical_only())
        .unwrap();
    assert!(results.is_empty());
}

#[test]
fn results_written_as_tsv() {
    let params = TensileParams {
        steps: 2,
        convergence: Convergence::manual(20),
        ..Default::default()
    };
    let results = TensileTest::new(params)
        .unwrap()
        .run(&bar(4, 1, 1), &pulled_along_x(1e-4), &mechanical_only())
        .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tensile.txt");
    results.write_tsv(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 3);
    assert!(text.starts_with("Disp (m)\tForce (N)"));
}
