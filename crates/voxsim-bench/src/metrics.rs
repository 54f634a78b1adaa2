//! Benchmark metrics: data collected during a benchmark run.

use serde::{Deserialize, Serialize};

/// Metrics collected from a benchmark scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkMetrics {
    pub scenario: String,
    pub voxel_count: usize,
    pub bond_count: usize,
    /// Integration steps executed.
    pub steps: u64,
    /// Simulated time covered (seconds).
    pub sim_time: f64,
    /// Total wall-clock time (seconds).
    pub total_wall_time: f64,
    /// Average wall-clock time per step (seconds).
    pub avg_step_time: f64,
    pub min_step_time: f64,
    pub max_step_time: f64,
    /// Final total kinetic energy (J).
    pub final_kinetic_energy: f64,
    /// Largest voxel displacement from its nominal position (m).
    pub max_displacement: f64,
    pub max_bond_strain: f64,
    pub broken_bonds: usize,
}

impl BenchmarkMetrics {
    pub fn to_csv_header() -> String {
        "scenario,voxel_count,bond_count,steps,sim_time_s,total_wall_time_s,avg_step_ms,min_step_ms,max_step_ms,final_ke,max_displacement,max_bond_strain,broken_bonds".to_string()
    }

    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{:.6e},{:.6},{:.4},{:.4},{:.4},{:.6e},{:.6e},{:.6e},{}",
            self.scenario,
            self.voxel_count,
            self.bond_count,
            self.steps,
            self.sim_time,
            self.total_wall_time,
            self.avg_step_time * 1000.0,
            self.min_step_time * 1000.0,
            self.max_step_time * 1000.0,
            self.final_kinetic_energy,
            self.max_displacement,
            self.max_bond_strain,
            self.broken_bonds,
        )
    }

    /// Header plus one row per entry.
    pub fn to_csv(metrics: &[BenchmarkMetrics]) -> String {
        let mut csv = Self::to_csv_header();
        for m in metrics {
            csv.push('\n');
            csv.push_str(&m.to_csv_row());
        }
        csv
    }
}
