//! CLI command implementations.

use std::path::Path;
use std::time::Instant;

use tracing::{info, warn};
use voxsim_bench::metrics::BenchmarkMetrics;
use voxsim_bench::runner::BenchmarkRunner;
use voxsim_bench::scenarios::{Scenario, ScenarioKind};
use voxsim_boundary::BoundarySet;
use voxsim_debug::{run_with_hooks, KinematicSnapshot, StatsRecorder};
use voxsim_io::{
    load_bcx, load_vxc, validate_boundaries, validate_object, validate_run_config, RunConfig,
    RunSummary,
};
use voxsim_material::{MaterialKind, VoxelObject};
use voxsim_math::DVec3;
use voxsim_solver::{PhysicsConfig, RunState, Simulator};
use voxsim_tensile::{Convergence, ConvergencePreset, TensileParams, TensileResults, TensileTest};

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Run a simulation (or a tensile test) from a run config.
pub fn simulate(config_path: &Path) -> CliResult {
    println!("voxsim Simulation");
    println!("─────────────────");
    println!("Config: {}", config_path.display());
    println!();

    let config = RunConfig::load(config_path)?;
    validate_run_config(&config)?;

    let object = load_vxc(&config.structure)?;
    validate_object(&object)?;

    let mut physics = config.physics.clone();
    let boundaries = match &config.boundaries {
        Some(path) => {
            let doc = load_bcx(path)?;
            validate_boundaries(&doc.boundaries)?;
            doc.apply_to(&mut physics);
            doc.boundaries
        }
        None => BoundarySet::new(),
    };

    if let Some(params) = &config.tensile {
        let results = run_tensile(&object, &boundaries, &physics, params.clone())?;
        if let Some(path) = &config.output.tensile_table {
            results.write_tsv(path)?;
            println!("Results table written to: {}", path.display());
        }
        return Ok(());
    }

    let mut sim = Simulator::new(physics);
    sim.import(&object, &boundaries)?;
    println!(
        "Structure: {} voxels, {} bonds, dt = {:.3e}s",
        sim.voxel_count(),
        sim.bonds().len(),
        sim.dt()
    );

    let mut recorder = StatsRecorder::new(config.output.stats_every);
    let start = Instant::now();
    let steps = run_with_hooks(&mut sim, config.max_steps, &mut [&mut recorder])?;
    let wall = start.elapsed().as_secs_f64();
    info!(steps, wall_s = wall, "simulation finished");

    let summary = RunSummary {
        voxel_count: sim.voxel_count(),
        bond_count: sim.bonds().len(),
        steps,
        sim_time: sim.time(),
        wall_time_seconds: wall,
        dt: sim.dt(),
        stop_reached: sim.state() == RunState::Ended,
        final_stats: *sim.stats(),
    };

    if let Some(path) = &config.output.snapshot {
        KinematicSnapshot::capture(&sim).save(path)?;
        println!("Snapshot written to: {}", path.display());
    }
    sim.stop();

    println!("  Steps:         {}", summary.steps);
    println!("  Sim time:      {:.6e}s", summary.sim_time);
    println!("  Wall time:     {:.3}s", summary.wall_time_seconds);
    println!("  Stop reached:  {}", summary.stop_reached);
    println!("  Final KE:      {:.6e}", summary.final_stats.total_kinetic_energy);
    println!("  Max displace:  {:.6e}m", summary.final_stats.max_voxel_displacement);
    println!("  Broken bonds:  {}", summary.final_stats.broken_bonds);

    if let Some(path) = &config.output.stats_csv {
        recorder.write_csv(path)?;
        println!("Statistics written to: {}", path.display());
    }
    if let Some(path) = &config.output.summary {
        std::fs::write(path, summary.to_json()?)?;
        println!("Summary written to: {}", path.display());
    }
    Ok(())
}

/// Run a tensile test directly on a structure and boundary document.
pub fn tensile(
    structure: &Path,
    boundaries: &Path,
    steps: usize,
    preset: &str,
    output: Option<&Path>,
) -> CliResult {
    println!("voxsim Tensile Test");
    println!("═══════════════════");
    println!();

    let object = load_vxc(structure)?;
    validate_object(&object)?;
    let doc = load_bcx(boundaries)?;
    validate_boundaries(&doc.boundaries)?;

    let mut physics = PhysicsConfig::default();
    doc.apply_to(&mut physics);

    let preset: ConvergencePreset = preset.parse()?;
    let params = TensileParams {
        steps,
        convergence: Convergence::auto(preset),
        ..Default::default()
    };
    let results = run_tensile(&object, &doc.boundaries, &physics, params)?;

    if let Some(path) = output {
        results.write_tsv(path)?;
        println!("Results table written to: {}", path.display());
    } else {
        println!("Table:");
        print!("{}", results.to_tsv());
    }
    Ok(())
}

fn run_tensile(
    object: &VoxelObject,
    boundaries: &BoundarySet,
    physics: &PhysicsConfig,
    params: TensileParams,
) -> Result<TensileResults, Box<dyn std::error::Error>> {
    println!("Increments: {}", params.steps);
    let test = TensileTest::new(params)?;
    let start = Instant::now();
    let results = test.run(object, boundaries, physics)?;

    let unconverged = results.rows.iter().filter(|r| !r.converged).count();
    println!("  Rows:          {}", results.len());
    println!("  Wall time:     {:.3}s", start.elapsed().as_secs_f64());
    if let Some(t) = results.threshold {
        println!("  Threshold:     {t:.3e}m");
    }
    if let Some(basic) = &results.basic {
        println!(
            "  Basic test:    axis {:?}, section {:.3e}m², length {:.3e}m",
            basic.axis, basic.cross_section, basic.initial_length
        );
    }
    if unconverged > 0 {
        warn!(unconverged, "some increments hit the step cap");
        println!("  Unconverged:   {unconverged}");
    }
    println!();
    Ok(results)
}

/// Run benchmark suite.
pub fn benchmark(scenario_name: &str, steps: Option<u64>, output_path: Option<&Path>) -> CliResult {
    println!("voxsim Benchmark Suite");
    println!("══════════════════════");
    println!();

    let scenarios: Vec<ScenarioKind> = if scenario_name == "all" {
        ScenarioKind::all().to_vec()
    } else {
        match ScenarioKind::from_name(scenario_name) {
            Some(kind) => vec![kind],
            None => {
                let names: Vec<&str> = ScenarioKind::all().iter().map(|k| k.name()).collect();
                return Err(format!(
                    "Unknown scenario: '{scenario_name}'. Available: {}, all",
                    names.join(", ")
                )
                .into());
            }
        }
    };

    let mut all_metrics = Vec::new();
    for &kind in &scenarios {
        let mut scenario = Scenario::from_kind(kind)?;
        if let Some(n) = steps {
            scenario.steps = n;
        }

        println!(
            "Running: {} ({} voxels, {} steps)",
            kind.name(),
            scenario.object.voxel_count(),
            scenario.steps,
        );

        let metrics =
            BenchmarkRunner::run(&scenario).map_err(|e| format!("Benchmark failed: {e}"))?;

        println!("  Wall time:     {:.3}s", metrics.total_wall_time);
        println!("  Avg step:      {:.3}ms", metrics.avg_step_time * 1000.0);
        println!("  Final KE:      {:.6e}", metrics.final_kinetic_energy);
        println!("  Max displace:  {:.6e}m", metrics.max_displacement);
        println!();

        all_metrics.push(metrics);
    }

    let csv = BenchmarkMetrics::to_csv(&all_metrics);
    if let Some(path) = output_path {
        std::fs::write(path, &csv)?;
        println!("Results written to: {}", path.display());
    } else {
        println!("CSV Output:");
        println!("{csv}");
    }
    Ok(())
}

/// Print a summary of a structure document.
pub fn info(path: &Path) -> CliResult {
    let object = load_vxc(path)?;
    let [x, y, z] = object.structure.dims();
    let ws = object.workspace();

    println!("voxsim Object Info");
    println!("──────────────────");
    println!();
    println!("Dimensions:    {x} × {y} × {z}");
    println!("Lattice dim:   {:.3e}m", object.lattice.lattice_dim);
    println!("Workspace:     {:.3e} × {:.3e} × {:.3e}m", ws.x, ws.y, ws.z);
    println!("Voxels:        {}", object.voxel_count());
    println!("Volume:        {:.6e}m³", object.volume());
    println!("Weight:        {:.6e}kg", object.weight());
    println!("Surface area:  {:.6e}m²", object.surface_area());
    println!("Leaves in use: {}", object.leaf_materials_in_use());
    println!();
    println!("Palette ({} entries):", object.palette.len());
    for (index, material) in object.palette.iter().skip(1) {
        let kind = match &material.kind {
            MaterialKind::Leaf(p) => format!(
                "leaf, E = {:.3e}Pa, ν = {}, ρ = {}",
                p.elastic_modulus, p.poissons_ratio, p.density
            ),
            MaterialKind::Dither(d) => format!(
                "dither of {} and {} ({:.0}% first)",
                d.first.0,
                d.second.0,
                d.first_fraction * 100.0
            ),
            MaterialKind::Internal(s) => {
                let [sx, sy, sz] = s.structure.dims();
                format!("internal {sx} × {sy} × {sz}")
            }
        };
        println!(
            "  {:>3} {:<20} {:>7} voxels  {kind}",
            index.0,
            material.name,
            object.count_of(index, false)
        );
    }
    Ok(())
}

/// Validate a run config, structure document or boundary document.
pub fn validate(path: &Path) -> CliResult {
    println!("voxsim Validator");
    println!("────────────────");
    println!();

    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => {
            println!("Validating run config: {}", path.display());
            let config = RunConfig::load(path)?;
            validate_run_config(&config)?;
            println!("✅ Run config is valid.");
        }
        Some("vxc") | Some("vxa") | Some("dmf") => {
            println!("Validating structure: {}", path.display());
            let object = load_vxc(path)?;
            validate_object(&object)?;
            println!("✅ Structure is valid ({} voxels).", object.voxel_count());
        }
        Some("bcx") => {
            println!("Validating boundary conditions: {}", path.display());
            let doc = load_bcx(path)?;
            validate_boundaries(&doc.boundaries)?;
            println!("✅ Boundary document is valid ({} regions).", doc.boundaries.len());
        }
        _ => {
            return Err(format!(
                "Unrecognized file type: {} (expected .toml, .vxc or .bcx)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

/// Inspect a kinematic snapshot.
pub fn inspect(path: &Path) -> CliResult {
    println!("voxsim Snapshot Inspector");
    println!("─────────────────────────");
    println!();

    let snapshot = KinematicSnapshot::load(path)?;

    println!("Step:          {}", snapshot.step);
    println!("Sim time:      {:.6e}s", snapshot.time);
    println!("Voxels:        {}", snapshot.voxel_count());

    if !snapshot.is_empty() {
        let (min, max) = snapshot.positions.iter().fold(
            (DVec3::splat(f64::INFINITY), DVec3::splat(f64::NEG_INFINITY)),
            |(lo, hi), p| (lo.min(*p), hi.max(*p)),
        );
        let max_speed = snapshot
            .velocities
            .iter()
            .map(|v| v.length())
            .fold(0.0, f64::max);
        println!("Min corner:    ({:.4e}, {:.4e}, {:.4e})", min.x, min.y, min.z);
        println!("Max corner:    ({:.4e}, {:.4e}, {:.4e})", max.x, max.y, max.z);
        println!("Max speed:     {max_speed:.4e}m/s");
    }
    Ok(())
}
