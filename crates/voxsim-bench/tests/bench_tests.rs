//! Integration tests for voxsim-bench.

use voxsim_bench::metrics::BenchmarkMetrics;
use voxsim_bench::runner::BenchmarkRunner;
use voxsim_bench::scenarios::{Scenario, ScenarioKind, VOXEL_SIZE};
use voxsim_solver::Feature;

fn sample_metrics(scenario: &str) -> BenchmarkMetrics {
    BenchmarkMetrics {
        scenario: scenario.into(),
        voxel_count: 1000,
        bond_count: 2700,
        steps: 100,
        sim_time: 1.0e-3,
        total_wall_time: 1.5,
        avg_step_time: 0.015,
        min_step_time: 0.01,
        max_step_time: 0.02,
        final_kinetic_energy: 1e-5,
        max_displacement: 2.5e-4,
        max_bond_strain: 0.01,
        broken_bonds: 0,
    }
}

// ─── Scenario Tests ───────────────────────────────────────────

#[test]
fn fixed_block_setup() {
    let s = Scenario::fixed_block().unwrap();
    assert_eq!(s.kind, ScenarioKind::FixedBlock);
    assert_eq!(s.object.voxel_count(), 1000);
    assert_eq!(s.boundaries.len(), 2);
    assert!(s.boundaries.get(1).unwrap().force().z < 0.0);
    assert!((s.object.lattice.lattice_dim - VOXEL_SIZE).abs() < 1e-15);
}

#[test]
fn tensile_bar_setup() {
    let s = Scenario::tensile_bar().unwrap();
    assert_eq!(s.kind, ScenarioKind::TensileBar);
    assert_eq!(s.object.structure.dims(), [20, 4, 4]);
    assert!(!s.config.features.is_enabled(Feature::Gravity));
    let pulled = s.boundaries.get(1).unwrap();
    assert!((pulled.displace().x - 0.2 * VOXEL_SIZE).abs() < 1e-15);
}

#[test]
fn all_scenarios() {
    assert_eq!(ScenarioKind::all().len(), 2);
    for &kind in ScenarioKind::all() {
        assert_eq!(ScenarioKind::from_name(kind.name()), Some(kind));
    }
    assert_eq!(ScenarioKind::from_name("sphere_drape"), None);
}

// ─── Runner Tests ─────────────────────────────────────────────

#[test]
fn run_fixed_block() {
    let mut scenario = Scenario::fixed_block().unwrap();
    scenario.steps = 5;
    let metrics = BenchmarkRunner::run(&scenario).unwrap();

    assert_eq!(metrics.scenario, "fixed_block");
    assert_eq!(metrics.steps, 5);
    assert_eq!(metrics.voxel_count, 1000);
    assert_eq!(metrics.bond_count, 2700);
    assert!(metrics.total_wall_time > 0.0);
    assert!(metrics.min_step_time <= metrics.max_step_time);
    assert!(metrics.max_displacement > 0.0);
}

#[test]
fn run_tensile_bar_moves_the_pulled_face() {
    let mut scenario = Scenario::tensile_bar().unwrap();
    scenario.steps = 5;
    let metrics = BenchmarkRunner::run(&scenario).unwrap();
    assert_eq!(metrics.bond_count, 784);
    assert!(metrics.max_displacement > 0.0);
    assert!(metrics.sim_time > 0.0);
}

#[test]
fn run_all_scenarios() {
    let results = BenchmarkRunner::run_all(Some(3)).unwrap();
    assert_eq!(results.len(), 2);
    for (m, kind) in results.iter().zip(ScenarioKind::all()) {
        assert_eq!(m.scenario, kind.name());
        assert_eq!(m.steps, 3);
        assert!(m.total_wall_time >= 0.0);
    }
}

// ─── Metrics Tests ────────────────────────────────────────────

#[test]
fn metrics_csv_output() {
    let row = sample_metrics("test").to_csv_row();
    assert!(row.starts_with("test,1000,2700,100,"));
    assert_eq!(
        row.split(',').count(),
        BenchmarkMetrics::to_csv_header().split(',').count()
    );
}

#[test]
fn metrics_csv_multi() {
    let csv = BenchmarkMetrics::to_csv(&[sample_metrics("a"), sample_metrics("b")]);
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("scenario,"));
    assert!(lines[2].starts_with("b,"));
}

#[test]
fn metrics_json_round_trip() {
    let json = serde_json::to_string(&sample_metrics("test")).unwrap();
    let recovered: BenchmarkMetrics = serde_json::from_str(&json).unwrap();
    assert_eq!(recovered.steps, 100);
    assert!((recovered.max_displacement - 2.5e-4).abs() < 1e-15);
}
