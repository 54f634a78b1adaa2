//! Inspection hooks for live debugging.
//!
//! Hooks are called by [`run_with_hooks`] after every integration step and
//! once when the run ends, to capture state without touching the solver.

use std::fs;
use std::path::Path;
use std::time::Instant;

use tracing::debug;
use voxsim_solver::{RunState, SimStats, Simulator};
use voxsim_telemetry::{EventKind, SimulationEvent};
use voxsim_types::VoxsimResult;

use crate::snapshot::KinematicSnapshot;

/// Trait for simulation inspection hooks.
///
/// ```text
/// start run:
///   for each step:
///     sim.step()
///     hook.on_step(sim)
///   hook.on_run_end(sim)
/// ```
pub trait InspectionHook {
    /// Called after each completed step.
    fn on_step(&mut self, sim: &Simulator) {
        let _ = sim;
    }

    /// Called once after the last step.
    fn on_run_end(&mut self, sim: &Simulator) {
        let _ = sim;
    }

    /// Returns the hook's name for logging.
    fn name(&self) -> &str;
}

/// Runs `sim` like [`Simulator::run_until_stop`], calling every hook after
/// each step. Returns the number of steps taken.
pub fn run_with_hooks(
    sim: &mut Simulator,
    max_steps: Option<u64>,
    hooks: &mut [&mut dyn InspectionHook],
) -> VoxsimResult<u64> {
    if sim.state() != RunState::Running {
        sim.start()?;
    }
    let start = Instant::now();
    let mut taken = 0;
    while sim.state() == RunState::Running {
        if max_steps.is_some_and(|m| taken >= m) {
            break;
        }
        sim.step()?;
        taken += 1;
        for hook in hooks.iter_mut() {
            hook.on_step(sim);
        }
    }
    sim.flush_events();
    for hook in hooks.iter_mut() {
        hook.on_run_end(sim);
    }
    debug!(
        steps = taken,
        hooks = hooks.len(),
        wall_ms = start.elapsed().as_secs_f64() * 1000.0,
        "hooked run finished"
    );
    Ok(taken)
}

// ─── Telemetry ───────────────────────────────────────────────

/// Collects step and energy events, for runs without an attached bus.
#[derive(Default)]
pub struct TelemetryHook {
    events: Vec<SimulationEvent>,
}

impl TelemetryHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains collected events for dispatch.
    pub fn drain_events(&mut self) -> Vec<SimulationEvent> {
        std::mem::take(&mut self.events)
    }
}

impl InspectionHook for TelemetryHook {
    fn on_step(&mut self, sim: &Simulator) {
        let step = sim.step_count();
        let stats = sim.stats();
        self.events.push(SimulationEvent::new(
            step,
            EventKind::StepCompleted {
                sim_time: sim.time(),
                dt: sim.dt(),
            },
        ));
        self.events.push(SimulationEvent::new(
            step,
            EventKind::Energy {
                kinetic: stats.total_kinetic_energy,
                strain: stats.total_strain_energy,
            },
        ));
    }

    fn name(&self) -> &str {
        "telemetry_hook"
    }
}

// ─── Statistics ──────────────────────────────────────────────

/// One recorded statistics row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsRow {
    pub step: u64,
    pub time: f64,
    pub stats: SimStats,
}

/// Records [`SimStats`] every `every` steps, plus the final step.
pub struct StatsRecorder {
    every: u64,
    rows: Vec<StatsRow>,
}

impl StatsRecorder {
    /// `every` is raised to 1 if zero.
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            rows: Vec::new(),
        }
    }

    pub fn rows(&self) -> &[StatsRow] {
        &self.rows
    }

    fn record(&mut self, sim: &Simulator) {
        let step = sim.step_count();
        if self.rows.last().is_some_and(|r| r.step == step) {
            return;
        }
        self.rows.push(StatsRow {
            step,
            time: sim.time(),
            stats: *sim.stats(),
        });
    }

    pub fn to_csv_header() -> String {
        "step,time_s,com_x,com_y,com_z,max_displacement,max_velocity,max_move,max_strain,max_stress,kinetic_energy,strain_energy,total_energy,yielded_bonds,broken_bonds".to_string()
    }

    pub fn to_csv_row(row: &StatsRow) -> String {
        let s = &row.stats;
        format!(
            "{},{:.9},{:.9e},{:.9e},{:.9e},{:.6e},{:.6e},{:.6e},{:.6e},{:.6e},{:.6e},{:.6e},{:.6e},{},{}",
            row.step,
            row.time,
            s.center_of_mass.x,
            s.center_of_mass.y,
            s.center_of_mass.z,
            s.max_voxel_displacement,
            s.max_voxel_velocity,
            s.max_move,
            s.max_bond_strain,
            s.max_bond_stress,
            s.total_kinetic_energy,
            s.total_strain_energy,
            s.total_energy(),
            s.yielded_bonds,
            s.broken_bonds,
        )
    }

    pub fn to_csv(&self) -> String {
        let mut csv = Self::to_csv_header();
        for row in &self.rows {
            csv.push('\n');
            csv.push_str(&Self::to_csv_row(row));
        }
        csv.push('\n');
        csv
    }

    pub fn write_csv(&self, path: &Path) -> VoxsimResult<()> {
        fs::write(path, self.to_csv())?;
        Ok(())
    }
}

impl InspectionHook for StatsRecorder {
    fn on_step(&mut self, sim: &Simulator) {
        if sim.step_count() % self.every == 0 {
            self.record(sim);
        }
    }

    fn on_run_end(&mut self, sim: &Simulator) {
        if sim.step_count() > 0 {
            self.record(sim);
        }
    }

    fn name(&self) -> &str {
        "stats_recorder"
    }
}

// ─── Snapshots ───────────────────────────────────────────────

/// Captures a [`KinematicSnapshot`] every `every` steps.
pub struct SnapshotHook {
    every: u64,
    snapshots: Vec<KinematicSnapshot>,
}

impl SnapshotHook {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            snapshots: Vec::new(),
        }
    }

    pub fn snapshots(&self) -> &[KinematicSnapshot] {
        &self.snapshots
    }

    pub fn into_snapshots(self) -> Vec<KinematicSnapshot> {
        self.snapshots
    }
}

impl InspectionHook for SnapshotHook {
    fn on_step(&mut self, sim: &Simulator) {
        if sim.step_count() % self.every == 0 {
            self.snapshots.push(KinematicSnapshot::capture(sim));
        }
    }

    fn name(&self) -> &str {
        "snapshot_hook"
    }
}
