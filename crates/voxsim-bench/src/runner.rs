//! Benchmark runner: executes scenarios on a fresh simulator and collects metrics.

use std::time::Instant;

use tracing::info;
use voxsim_solver::Simulator;
use voxsim_types::VoxsimResult;

use crate::metrics::BenchmarkMetrics;
use crate::scenarios::{Scenario, ScenarioKind};

/// Runs benchmark scenarios and collects metrics.
pub struct BenchmarkRunner;

impl BenchmarkRunner {
    /// Runs `scenario.steps` steps and reports timing and final state.
    pub fn run(scenario: &Scenario) -> VoxsimResult<BenchmarkMetrics> {
        let mut sim = Simulator::new(scenario.config.clone());
        sim.import(&scenario.object, &scenario.boundaries)?;
        sim.start()?;

        let mut step_times: Vec<f64> = Vec::with_capacity(scenario.steps as usize);
        let total_start = Instant::now();
        for _ in 0..scenario.steps {
            let t = Instant::now();
            let stop = sim.step()?;
            step_times.push(t.elapsed().as_secs_f64());
            if stop {
                break;
            }
        }
        let total_wall_time = total_start.elapsed().as_secs_f64();

        let avg_step = if step_times.is_empty() {
            0.0
        } else {
            step_times.iter().sum::<f64>() / step_times.len() as f64
        };
        let min_step = step_times.iter().copied().fold(f64::MAX, f64::min);
        let max_step = step_times.iter().copied().fold(0.0, f64::max);
        let stats = *sim.stats();

        let metrics = BenchmarkMetrics {
            scenario: scenario.kind.name().to_string(),
            voxel_count: sim.voxel_count(),
            bond_count: sim.bonds().len(),
            steps: sim.step_count(),
            sim_time: sim.time(),
            total_wall_time,
            avg_step_time: avg_step,
            min_step_time: if step_times.is_empty() { 0.0 } else { min_step },
            max_step_time: max_step,
            final_kinetic_energy: stats.total_kinetic_energy,
            max_displacement: stats.max_voxel_displacement,
            max_bond_strain: stats.max_bond_strain,
            broken_bonds: sim.broken_bond_count(),
        };
        info!(
            scenario = %metrics.scenario,
            steps = metrics.steps,
            wall_s = metrics.total_wall_time,
            "benchmark finished"
        );
        Ok(metrics)
    }

    /// Runs every scenario, optionally overriding its step count.
    pub fn run_all(steps: Option<u64>) -> VoxsimResult<Vec<BenchmarkMetrics>> {
        let mut results = Vec::new();
        for &kind in ScenarioKind::all() {
            let mut scenario = Scenario::from_kind(kind)?;
            if let Some(n) = steps {
                scenario.steps = n;
            }
            results.push(Self::run(&scenario)?);
        }
        Ok(results)
    }
}
