//! Integration tests for voxsim-solver.

use std::f64::consts::FRAC_PI_2;
use std::thread;
use std::time::Duration;

use voxsim_boundary::{BoundaryRegion, BoundarySet, Primitive};
use voxsim_lattice::generators::{block, layered};
use voxsim_lattice::{Lattice, Structure};
use voxsim_material::{FailureMode, LeafProperties, ModelKind, Palette, VoxelObject};
use voxsim_math::DVec3;
use voxsim_solver::config::{damping_from_slider, slow_damping_from_slider};
use voxsim_solver::{
    BondConstants, Feature, FeatureSet, Histories, PhysicsConfig, RunState, SimWorker, Simulator,
    StopCondition, StopKind,
};
use voxsim_solver::stop::{StopContext, READING_COUNT, READING_STRIDE};
use voxsim_telemetry::{EventBus, EventKind, VecSink};
use voxsim_types::VoxsimError;

const SIZE: f64 = 0.001;

fn cube(n: usize) -> VoxelObject {
    let mut palette = Palette::new();
    let mat = palette.add_leaf("Soft", 1.0e6, 0.35).unwrap();
    VoxelObject::from_parts(Lattice::cubic(SIZE), palette, block(n, n, n, mat)).unwrap()
}

fn bottom_fixed_top_pulled(force: f64) -> BoundarySet {
    BoundarySet::from_regions(vec![
        BoundaryRegion::fixed(
            Primitive::new_box(DVec3::ZERO, DVec3::new(1.0, 1.0, 0.01)),
            DVec3::ZERO,
        ),
        BoundaryRegion::forced(
            Primitive::new_box(DVec3::new(0.0, 0.0, 0.99), DVec3::new(1.0, 1.0, 0.01)),
            DVec3::new(0.0, 0.0, force),
            DVec3::ZERO,
        ),
    ])
}

fn imported(config: PhysicsConfig, n: usize, bcs: &BoundarySet) -> Simulator {
    let mut sim = Simulator::new(config);
    sim.import(&cube(n), bcs).unwrap();
    sim
}

// ─── Bond Tests ──────────────────────────────────────────────

#[test]
fn homogeneous_bond_constants_match_beam_formulas() {
    let c = BondConstants::new(1e6, 0.35, 0.0, 1e6, 0.35, 0.0, true, SIZE);
    assert!((c.e - 1e6).abs() < 1e-6);
    assert!((c.a1 - 1e3).abs() < 1e-9);
    assert!((c.b1 - 1e3).abs() < 1e-9);
    assert!((c.b2 - 0.5).abs() < 1e-12);
    assert!((c.b3 - 1e6 * SIZE.powi(3) / 6.0).abs() < 1e-15);
    assert!(c.homogeneous);
}

#[test]
fn mixed_bond_uses_series_modulus() {
    let c = BondConstants::new(1e6, 0.3, 0.0, 3e6, 0.3, 0.0, false, SIZE);
    assert!((c.e - 1.5e6).abs() < 1e-6);
    assert!((c.nu - 0.3).abs() < 1e-12);
    assert!(!c.homogeneous);
}

// ─── Configuration Tests ─────────────────────────────────────

#[test]
fn config_toml_roundtrip() {
    let mut config = PhysicsConfig::default();
    config.features.enable(Feature::SelfCollision);
    config.stop = StopCondition::min_max_move(1e-8);
    let text = toml::to_string(&config).unwrap();
    let back: PhysicsConfig = toml::from_str(&text).unwrap();
    assert_eq!(back, config);
}

#[test]
fn partial_toml_fills_defaults() {
    let config: PhysicsConfig = toml::from_str(
        r#"
        bond_damping = 0.5
        features = ["gravity", "volume_effects"]
        [stop]
        kind = "max_steps"
        value = 10.0
        "#,
    )
    .unwrap();
    assert_eq!(config.bond_damping, 0.5);
    assert_eq!(config.slow_damping, 0.001);
    assert!(config.features.is_enabled(Feature::VolumeEffects));
    assert!(!config.features.is_enabled(Feature::Floor));
    assert_eq!(config.stop.kind, StopKind::MaxSteps);
}

#[test]
fn out_of_range_damping_is_clamped() {
    let config = PhysicsConfig {
        bond_damping: 3.0,
        slow_damping: -1.0,
        ..Default::default()
    }
    .clamped();
    assert_eq!(config.bond_damping, 1.0);
    assert_eq!(config.slow_damping, 0.0);
    assert!(config.validate().is_ok());
}

#[test]
fn non_finite_config_is_rejected() {
    let config = PhysicsConfig {
        dt_frac: f64::NAN,
        ..Default::default()
    };
    assert!(matches!(config.validate(), Err(VoxsimError::InvalidConfig(_))));
}

#[test]
fn slider_mappings_are_monotonic() {
    assert_eq!(damping_from_slider(50.0), 0.5);
    assert_eq!(damping_from_slider(250.0), 1.0);
    assert_eq!(slow_damping_from_slider(0.0), 0.0);
    assert!(slow_damping_from_slider(25.0) < slow_damping_from_slider(50.0));
    assert!((slow_damping_from_slider(100.0) - 1.0).abs() < 1e-12);
}

// ─── Feature Tests ───────────────────────────────────────────

#[test]
fn features_parse_by_name() {
    assert_eq!("gravity".parse::<Feature>().unwrap(), Feature::Gravity);
    assert_eq!("Self-Collision".parse::<Feature>().unwrap(), Feature::SelfCollision);
    assert!(matches!("warp_drive".parse::<Feature>(), Err(VoxsimError::InvalidConfig(_))));
}

#[test]
fn feature_set_reports_changes() {
    let mut set = FeatureSet::none();
    assert!(set.enable(Feature::Floor));
    assert!(!set.enable(Feature::Floor));
    assert!(set.set_named("floor", false).unwrap());
    assert!(set.is_empty());
}

// ─── Stop Condition Tests ────────────────────────────────────

fn ctx(step: u64, histories: &Histories) -> StopContext<'_> {
    StopContext {
        step,
        time: step as f64 * 1e-3,
        temp_period: Some(0.1),
        voxel_count: 1,
        histories,
    }
}

#[test]
fn step_and_time_limits() {
    let h = Histories::new();
    assert!(StopCondition::max_steps(10).is_met(&ctx(10, &h)));
    assert!(!StopCondition::max_steps(10).is_met(&ctx(9, &h)));
    assert!(StopCondition::max_time(0.05).is_met(&ctx(60, &h)));
    assert!(!StopCondition::none().is_met(&ctx(1_000_000, &h)));
    let cycles = StopCondition::new(StopKind::TemperatureCycles, 2.0);
    assert!(!cycles.is_met(&ctx(199, &h)));
    assert!(cycles.is_met(&ctx(250, &h)));
}

#[test]
fn min_max_move_needs_ten_quiet_steps() {
    let mut h = Histories::new();
    for _ in 0..9 {
        h.push(0.0, 0.0, 1e-12);
    }
    let stop = StopCondition::min_max_move(1e-9);
    assert!(!stop.is_met(&ctx(9, &h)));
    h.push(0.0, 0.0, 1e-12);
    assert!(stop.is_met(&ctx(10, &h)));
    h.push(0.0, 0.0, 1e-6);
    assert!(!stop.is_met(&ctx(11, &h)));
}

#[test]
fn energy_trend_uses_strided_readings() {
    let mut h = Histories::new();
    for i in 0..451 {
        h.push(0.0, 1.0 + 1e-9 * i as f64, 0.0);
    }
    let stop = StopCondition::new(StopKind::EnergyConverged, 1e-6);
    assert!(stop.is_met(&ctx(451, &h)));
    assert!(!StopCondition::new(StopKind::EnergyConverged, 1e-8).is_met(&ctx(451, &h)));
}

#[test]
fn kinetic_energy_peak_detection() {
    let mut h = Histories::new();
    for ke in [1.0, 2.0, 3.0, 4.0, 5.0, 6.0] {
        h.push(ke, ke, 0.0);
    }
    assert!(!h.kinetic_energy_decreasing());
    for ke in [2.0, 1.0, 0.5] {
        h.push(ke, ke, 0.0);
    }
    assert!(h.kinetic_energy_decreasing());
}

// ─── State Machine Tests ─────────────────────────────────────

#[test]
fn stepping_requires_a_running_simulation() {
    let mut sim = Simulator::default();
    assert!(matches!(sim.step(), Err(VoxsimError::InvalidState(_))));
    assert!(matches!(sim.start(), Err(VoxsimError::InvalidState(_))));

    let bcs = bottom_fixed_top_pulled(1e-3);
    sim.import(&cube(3), &bcs).unwrap();
    assert_eq!(sim.state(), RunState::Idle);
    assert!(sim.positions().is_empty());
    assert!(matches!(sim.step(), Err(VoxsimError::InvalidState(_))));
}

#[test]
fn importing_an_empty_object_fails() {
    let mut sim = Simulator::default();
    let empty = VoxelObject::new(Lattice::cubic(SIZE), 4, 4, 4);
    assert!(matches!(
        sim.import(&empty, &BoundarySet::new()),
        Err(VoxsimError::InvalidState(_))
    ));
}

#[test]
fn lifecycle_transitions() {
    let bcs = bottom_fixed_top_pulled(1e-3);
    let mut sim = imported(PhysicsConfig::default(), 3, &bcs);

    sim.start().unwrap();
    assert_eq!(sim.state(), RunState::Running);
    assert_eq!(sim.positions().len(), 27);
    sim.step().unwrap();

    sim.pause().unwrap();
    assert_eq!(sim.state(), RunState::Paused);
    assert!(sim.step().is_err());
    assert_eq!(sim.step_count(), 1);

    sim.resume().unwrap();
    sim.step().unwrap();
    sim.stop();
    assert_eq!(sim.state(), RunState::Ended);
    assert!(sim.start().is_err());
    // Final pose is still readable.
    assert_eq!(sim.positions().len(), 27);

    sim.reset();
    assert_eq!(sim.state(), RunState::Idle);
    assert!(sim.positions().is_empty());
    sim.start().unwrap();
    assert_eq!(sim.step_count(), 0);
}

#[test]
fn max_steps_ends_the_run() {
    let bcs = bottom_fixed_top_pulled(1e-3);
    let config = PhysicsConfig {
        stop: StopCondition::max_steps(25),
        ..Default::default()
    };
    let mut sim = imported(config, 3, &bcs);
    let taken = sim.run_until_stop(Some(1000)).unwrap();
    assert_eq!(taken, 25);
    assert_eq!(sim.state(), RunState::Ended);
    assert_eq!(sim.stats_history().len(), 25);
}

#[test]
fn time_step_is_fraction_of_stable_limit() {
    let bcs = BoundarySet::new();
    let sim = imported(PhysicsConfig::default(), 2, &bcs);
    // k = E·s = 1000 N/m, m = 1e-9 kg
    let expected = 1.0 / (2.0 * std::f64::consts::PI * (1000.0f64 / 1e-9).sqrt());
    assert!((sim.max_stable_dt() - expected).abs() / expected < 1e-9);
    assert!((sim.dt() - 0.9 * expected).abs() / expected < 1e-9);
}

#[test]
fn equilibrium_mode_restores_damping() {
    let mut sim = Simulator::new(PhysicsConfig::default());
    sim.set_feature(Feature::VelocityClamp, true);
    sim.set_feature(Feature::Equilibrium, true);
    assert_eq!(sim.config().bond_damping, 0.1);
    assert_eq!(sim.config().slow_damping, 0.0);
    assert!(!sim.is_feature_enabled(Feature::VelocityClamp));

    sim.set_feature(Feature::Equilibrium, false);
    assert_eq!(sim.config().bond_damping, 1.0);
    assert_eq!(sim.config().slow_damping, 0.001);
    assert!(sim.is_feature_enabled(Feature::VelocityClamp));
}

#[test]
fn unknown_feature_name_is_rejected() {
    let mut sim = Simulator::default();
    assert!(sim.set_feature_named("volume_effects", true).is_ok());
    assert!(sim.set_feature_named("antigravity", true).is_err());
}

// ─── Physics Tests ───────────────────────────────────────────

#[test]
fn fixed_face_block_settles_under_load() {
    let force = 0.01;
    let bcs = bottom_fixed_top_pulled(force);
    let threshold = 1e-10;
    let mut config = PhysicsConfig::equilibrium();
    config.features.enable(Feature::Failure);
    config.stop = StopCondition::min_max_move(threshold);

    let mut sim = imported(config, 10, &bcs);
    assert_eq!(sim.region_voxels(0).len(), 100);
    assert_eq!(sim.region_voxels(1).len(), 100);

    sim.run_until_stop(Some(200_000)).unwrap();
    assert_eq!(sim.state(), RunState::Ended);

    let stats = *sim.stats();
    assert!(stats.max_move < threshold);
    assert!(stats.max_voxel_velocity * sim.dt() < threshold * 1.01);
    assert_eq!(sim.broken_bond_count(), 0);
    assert_eq!(stats.broken_bonds, 0);

    // Columns of nine axial springs in series: u = F·L/(E·A).
    let expected = force * 9.0 * SIZE / (1.0e6 * 100.0 * SIZE * SIZE);
    let top = sim.average_displacement(1).unwrap();
    assert!((top.z - expected).abs() / expected < 0.1, "top z {} vs {}", top.z, expected);

    let reaction = sim.sum_force(0).unwrap();
    assert!((reaction.z - force).abs() / force < 0.1, "reaction {}", reaction.z);
}

#[test]
fn resting_voxel_stays_on_the_floor() {
    let config = PhysicsConfig {
        features: [Feature::Gravity, Feature::Floor].into_iter().collect(),
        stop: StopCondition::max_steps(2000),
        ..Default::default()
    };
    let mut sim = imported(config, 1, &BoundarySet::new());
    sim.run_until_stop(None).unwrap();
    let z = sim.positions()[0].z;
    assert!((z - 0.5 * SIZE).abs() < 1e-9, "z = {z}");
    assert!(sim.voxels().touching_floor[0]);
}

#[test]
fn free_fall_without_floor() {
    let config = PhysicsConfig {
        features: [Feature::Gravity].into_iter().collect(),
        slow_damping: 0.0,
        stop: StopCondition::max_steps(100),
        ..Default::default()
    };
    let mut sim = imported(config, 1, &BoundarySet::new());
    sim.run_until_stop(None).unwrap();
    let t = sim.time();
    let vz = sim.velocities()[0].z;
    assert!((vz - (-9.81 * t)).abs() < 1e-9 * 9.81 * t.max(1e-12) + 1e-12);
}

#[test]
fn velocity_clamp_limits_per_step_motion() {
    let bcs = BoundarySet::from_regions(vec![BoundaryRegion::forced(
        Primitive::new_box(DVec3::ZERO, DVec3::ONE),
        DVec3::new(1.0e3, 0.0, 0.0),
        DVec3::ZERO,
    )]);
    let config = PhysicsConfig {
        features: [Feature::VelocityClamp].into_iter().collect(),
        max_velocity_limit: 0.1,
        stop: StopCondition::max_steps(50),
        ..Default::default()
    };
    let mut sim = imported(config, 1, &bcs);
    sim.run_until_stop(None).unwrap();
    assert!(sim.stats().max_move <= 0.1 * SIZE * (1.0 + 1e-12));
}

#[test]
fn events_reach_attached_sinks() {
    let bcs = bottom_fixed_top_pulled(1e-3);
    let config = PhysicsConfig {
        stop: StopCondition::max_steps(5),
        ..Default::default()
    };
    let mut sim = imported(config, 2, &bcs);
    let sink = VecSink::new();
    let mut bus = EventBus::new();
    bus.add_sink(Box::new(sink.clone()));
    sim.attach_bus(bus);
    sim.run_until_stop(None).unwrap();

    let events = sink.events();
    let steps = events
        .iter()
        .filter(|e| matches!(e.kind, EventKind::StepCompleted { .. }))
        .count();
    assert_eq!(steps, 5);
    assert!(events
        .iter()
        .any(|e| matches!(e.kind, EventKind::StopConditionReached { .. })));
}

// ─── Feature Behaviour Tests ─────────────────────────────────

fn tuned_block(dims: [usize; 3], tune: impl FnOnce(&mut LeafProperties)) -> VoxelObject {
    let mut palette = Palette::new();
    let mat = palette.add_leaf("Soft", 1.0e6, 0.35).unwrap();
    tune(palette.leaf_mut(mat).unwrap());
    let [x, y, z] = dims;
    VoxelObject::from_parts(Lattice::cubic(SIZE), palette, block(x, y, z, mat)).unwrap()
}

fn run_failing_pull(extra: &[Feature]) -> (Simulator, VecSink) {
    let object = tuned_block([3, 3, 3], |leaf| {
        leaf.model_kind = ModelKind::LinearFail;
        leaf.failure_mode = FailureMode::MaxStress;
        leaf.fail_stress = 1.0e3;
    });
    let mut features: FeatureSet = [Feature::Failure].into_iter().collect();
    for &f in extra {
        features.enable(f);
    }
    let config = PhysicsConfig {
        features,
        stop: StopCondition::max_steps(2000),
        ..Default::default()
    };
    let mut sim = Simulator::new(config);
    sim.import(&object, &bottom_fixed_top_pulled(10.0)).unwrap();
    let sink = VecSink::new();
    let mut bus = EventBus::new();
    bus.add_sink(Box::new(sink.clone()));
    sim.attach_bus(bus);
    sim.run_until_stop(None).unwrap();
    (sim, sink)
}

#[test]
fn overloaded_bonds_break_and_report() {
    let (sim, sink) = run_failing_pull(&[]);
    assert!(sim.broken_bond_count() > 0);
    assert_eq!(sim.stats().broken_bonds, sim.broken_bond_count());
    assert!(sink
        .events()
        .iter()
        .any(|e| matches!(e.kind, EventKind::BondFailure { .. })));
}

#[test]
fn volume_effects_keep_failure_active() {
    let (sim, _) = run_failing_pull(&[Feature::VolumeEffects]);
    assert!(sim.broken_bond_count() > 0);
}

#[test]
fn plastic_bond_keeps_residual_strain_after_unload() {
    let object = tuned_block([1, 1, 2], |leaf| {
        leaf.model_kind = ModelKind::Bilinear;
        leaf.yield_stress = 1.0e3;
        leaf.plastic_modulus = 1.0e5;
    });
    let mut config = PhysicsConfig::equilibrium();
    config.features.enable(Feature::Plasticity);
    config.stop = StopCondition::max_steps(1_000_000);
    let mut sim = Simulator::new(config);
    // 2e3 Pa on a single bond, twice the yield stress
    sim.import(&object, &bottom_fixed_top_pulled(2.0e-3)).unwrap();
    sim.run_until_stop(Some(20_000)).unwrap();
    assert_eq!(sim.yielded_bond_count(), 1);
    let offset = sim.bonds()[0].strain_offset;
    assert!(offset > 5.0e-3, "offset {offset}");

    sim.set_input_scale(0.0);
    sim.run_until_stop(Some(20_000)).unwrap();
    let bond = &sim.bonds()[0];
    assert!(bond.yielded);
    assert!((bond.strain - offset).abs() < 0.05 * offset, "strain {}", bond.strain);
    let top = sim.average_displacement(1).unwrap();
    assert!(top.z > 0.5 * offset * SIZE, "top z {}", top.z);
}

#[test]
fn heated_block_expands_by_cte() {
    let object = tuned_block([2, 2, 2], |leaf| leaf.cte = 1.0e-3);
    let mut config = PhysicsConfig::equilibrium();
    config.features.enable(Feature::Temperature);
    config.environment.temp_amplitude = 10.0;
    config.stop = StopCondition::min_max_move(1e-12);
    let mut sim = Simulator::new(config);
    sim.import(&object, &BoundarySet::new()).unwrap();
    sim.run_until_stop(Some(50_000)).unwrap();

    let expanded = 1.01 * SIZE;
    assert!((sim.voxels().delta_temp[0] - 10.0).abs() < 1e-12);
    assert!((sim.voxels().scale[0] - expanded).abs() < 1e-15);
    // voxel 1 is the +X neighbour of voxel 0
    let gap = sim.positions()[1] - sim.positions()[0];
    assert!((gap.x - expanded).abs() < 1e-7, "gap {}", gap.x);
}

#[test]
fn phase_offset_shifts_the_temperature_cycle() {
    let mut palette = Palette::new();
    let a = palette.add_leaf("InPhase", 1.0e6, 0.35).unwrap();
    let b = palette.add_leaf("Quarter", 1.0e6, 0.35).unwrap();
    palette.leaf_mut(b).unwrap().temp_phase = FRAC_PI_2;
    let object =
        VoxelObject::from_parts(Lattice::cubic(SIZE), palette, layered(1, 1, 2, &[a, b])).unwrap();
    let mut config = PhysicsConfig {
        features: [Feature::Temperature, Feature::VaryTemperature]
            .into_iter()
            .collect(),
        stop: StopCondition::max_steps(100),
        ..Default::default()
    };
    config.environment.temp_amplitude = 5.0;
    let mut sim = Simulator::new(config);
    sim.import(&object, &BoundarySet::new()).unwrap();
    sim.start().unwrap();

    sim.step().unwrap();
    assert!(sim.voxels().delta_temp[0].abs() < 1e-12);
    assert!((sim.voxels().delta_temp[1] - 5.0).abs() < 1e-12);

    let t = sim.time();
    sim.step().unwrap();
    let w = 2.0 * std::f64::consts::PI / sim.config().environment.temp_period;
    assert!((sim.voxels().delta_temp[0] - 5.0 * (w * t).sin()).abs() < 1e-12);
    assert!((sim.voxels().delta_temp[1] - 5.0 * (w * t).cos()).abs() < 1e-12);
}

#[test]
fn volume_effects_contract_a_pulled_column() {
    let lateral_strain = |features: &[Feature]| {
        let mut config = PhysicsConfig::equilibrium();
        for &f in features {
            config.features.enable(f);
        }
        let mut sim = Simulator::new(config);
        sim.import(&tuned_block([1, 1, 2], |_| {}), &bottom_fixed_top_pulled(1.0e-3))
            .unwrap();
        sim.run_until_stop(Some(20_000)).unwrap();
        sim.voxels().strain[1]
    };

    let plain = lateral_strain(&[]);
    assert!(plain.z > 0.0);
    assert_eq!(plain.x, 0.0);
    assert_eq!(plain.y, 0.0);

    let confined = lateral_strain(&[Feature::VolumeEffects]);
    let expected = (1.0 + confined.z).powf(-0.35) - 1.0;
    assert!(confined.x < 0.0);
    assert!((confined.x - expected).abs() < 1e-12);
    assert_eq!(confined.x, confined.y);
}

#[test]
fn self_collision_stops_unbonded_voxels_passing() {
    // two voxels with an empty cell between them, so no bond joins them
    let closest_gap = |collide: bool| {
        let mut palette = Palette::new();
        let mat = palette.add_leaf("Soft", 1.0e6, 0.35).unwrap();
        let mut structure = Structure::new(1, 1, 3);
        structure.set_at(0, 0, 0, mat).unwrap();
        structure.set_at(0, 0, 2, mat).unwrap();
        let object = VoxelObject::from_parts(Lattice::cubic(SIZE), palette, structure).unwrap();
        let mut features = FeatureSet::default();
        if collide {
            features.enable(Feature::SelfCollision);
        }
        let config = PhysicsConfig {
            features,
            stop: StopCondition::max_steps(3000),
            ..Default::default()
        };
        let mut sim = Simulator::new(config);
        sim.import(&object, &bottom_fixed_top_pulled(-1.0e-3)).unwrap();
        assert!(sim.bonds().is_empty());
        sim.start().unwrap();
        let mut closest = f64::INFINITY;
        while !sim.step().unwrap() {
            closest = closest.min(sim.positions()[1].z - sim.positions()[0].z);
        }
        closest
    };

    assert!(closest_gap(false) < 0.0);
    let gap = closest_gap(true);
    assert!(gap > 1.4 * SIZE, "gap {gap}");
}

#[test]
fn min_kinetic_energy_ends_a_quiet_run() {
    let window = (READING_STRIDE * (READING_COUNT - 1) + 1) as u64;
    let config = |features: FeatureSet| PhysicsConfig {
        features,
        stop: StopCondition::new(StopKind::MinKineticEnergy, 1e-30),
        ..Default::default()
    };

    let mut quiet = imported(config(FeatureSet::default()), 2, &BoundarySet::new());
    quiet.run_until_stop(Some(2000)).unwrap();
    assert_eq!(quiet.state(), RunState::Ended);
    assert!(quiet.step_count() >= window);
    assert!(quiet.step_count() <= window + 1);

    let falling = [Feature::Gravity].into_iter().collect();
    let mut falling = imported(config(falling), 2, &BoundarySet::new());
    falling.run_until_stop(Some(2000)).unwrap();
    assert_eq!(falling.state(), RunState::Running);
}

#[test]
fn temperature_cycles_end_after_whole_periods() {
    let dt = imported(PhysicsConfig::default(), 1, &BoundarySet::new()).dt();
    let period = 100.0 * dt;
    let config = |features: &[Feature]| {
        let mut config = PhysicsConfig {
            features: features.iter().copied().collect(),
            stop: StopCondition::new(StopKind::TemperatureCycles, 2.0),
            ..Default::default()
        };
        config.environment.temp_period = period;
        config
    };

    let mut cycled = imported(
        config(&[Feature::Temperature, Feature::VaryTemperature]),
        1,
        &BoundarySet::new(),
    );
    cycled.run_until_stop(Some(1000)).unwrap();
    assert_eq!(cycled.state(), RunState::Ended);
    assert!(cycled.time() >= 2.0 * period * (1.0 - 1e-12));
    assert!(cycled.time() < 2.0 * period + 2.0 * dt);

    // a steady temperature has no cycles to count
    let mut steady = imported(config(&[Feature::Temperature]), 1, &BoundarySet::new());
    steady.run_until_stop(Some(1000)).unwrap();
    assert_eq!(steady.state(), RunState::Running);
}

#[test]
fn locked_free_body_stays_centred_on_the_origin() {
    let config = PhysicsConfig {
        features: [Feature::Gravity, Feature::LockCenterOfMass]
            .into_iter()
            .collect(),
        stop: StopCondition::max_steps(200),
        ..Default::default()
    };
    let mut sim = imported(config, 2, &BoundarySet::new());
    sim.run_until_stop(None).unwrap();
    assert!(sim.center_of_mass().length() < 1e-15);
    // gravity still acts; only the drift is removed
    assert!(sim.velocities()[0].z < 0.0);
}

#[test]
fn lock_leaves_an_anchored_block_untouched() {
    let run = |lock: bool| {
        let mut features: FeatureSet = [Feature::Gravity].into_iter().collect();
        if lock {
            features.enable(Feature::LockCenterOfMass);
        }
        let config = PhysicsConfig {
            features,
            stop: StopCondition::max_steps(500),
            ..Default::default()
        };
        let mut sim = imported(config, 3, &bottom_fixed_top_pulled(1e-2));
        sim.run_until_stop(None).unwrap();
        sim
    };

    let (free, locked) = (run(false), run(true));
    assert_eq!(free.positions(), locked.positions());
    assert_eq!(free.stats().max_bond_strain, locked.stats().max_bond_strain);
}

// ─── Worker Tests ────────────────────────────────────────────

#[test]
fn worker_steps_in_background_and_pauses() {
    let bcs = bottom_fixed_top_pulled(1e-3);
    let sim = imported(PhysicsConfig::default(), 3, &bcs);
    let worker = SimWorker::spawn(sim).unwrap();
    worker.start().unwrap();

    let mut status = worker.query().unwrap();
    for _ in 0..200 {
        if status.step > 10 {
            break;
        }
        thread::sleep(Duration::from_millis(5));
        status = worker.query().unwrap();
    }
    assert!(status.step > 10);
    assert_eq!(status.state, RunState::Running);

    worker.pause().unwrap();
    let paused = worker.query().unwrap();
    assert_eq!(paused.state, RunState::Paused);
    thread::sleep(Duration::from_millis(20));
    assert_eq!(worker.query().unwrap().step, paused.step);
    assert!(!worker.history().is_empty());

    let sim = worker.join().unwrap();
    assert_eq!(sim.step_count(), paused.step);
}

#[test]
fn worker_forwards_input_scale() {
    let bcs = bottom_fixed_top_pulled(1e-3);
    let sim = imported(PhysicsConfig::default(), 2, &bcs);
    let worker = SimWorker::spawn(sim).unwrap();
    worker.set_input_scale(0.25).unwrap();
    // the query is answered after every earlier command is applied
    worker.query().unwrap();
    let sim = worker.join().unwrap();
    assert!((sim.input_scale() - 0.25).abs() < 1e-12);
}
