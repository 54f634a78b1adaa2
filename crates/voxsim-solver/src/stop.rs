//! Stop conditions and the rolling histories they are judged on.
//!
//! Histories are newest first and hold at most [`HISTORY_SIZE`] steps.
//! Trend conditions look at ten readings taken 50 steps apart, so a
//! full window spans 451 steps.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};
use voxsim_types::constants::HISTORY_SIZE;

/// Steps between two trend readings.
pub const READING_STRIDE: usize = 50;
/// Readings that must agree before a trend condition is met.
pub const READING_COUNT: usize = 10;

/// Which criterion ends a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopKind {
    /// Runs until stopped externally.
    #[default]
    None,
    MaxSteps,
    MaxSimTime,
    /// Completed temperature cycles; only counts while temperature varies.
    TemperatureCycles,
    /// Total energy stays within `value` across the reading window.
    EnergyConverged,
    /// Kinetic energy per voxel stays below `value` across the reading window.
    MinKineticEnergy,
    /// Peak per-step voxel displacement stays below `value` for ten steps.
    MinMaxMove,
}

impl StopKind {
    pub fn name(&self) -> &'static str {
        match self {
            StopKind::None => "none",
            StopKind::MaxSteps => "max_steps",
            StopKind::MaxSimTime => "max_sim_time",
            StopKind::TemperatureCycles => "temperature_cycles",
            StopKind::EnergyConverged => "energy_converged",
            StopKind::MinKineticEnergy => "min_kinetic_energy",
            StopKind::MinMaxMove => "min_max_move",
        }
    }
}

impl fmt::Display for StopKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stop criterion with its single threshold.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StopCondition {
    pub kind: StopKind,
    pub value: f64,
}

impl StopCondition {
    pub fn new(kind: StopKind, value: f64) -> Self {
        Self { kind, value }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn max_steps(steps: u64) -> Self {
        Self::new(StopKind::MaxSteps, steps as f64)
    }

    pub fn max_time(seconds: f64) -> Self {
        Self::new(StopKind::MaxSimTime, seconds)
    }

    pub fn min_max_move(threshold: f64) -> Self {
        Self::new(StopKind::MinMaxMove, threshold)
    }
}

/// What the stop evaluation can see of the simulator.
#[derive(Debug, Clone, Copy)]
pub struct StopContext<'a> {
    pub step: u64,
    pub time: f64,
    /// Temperature period while the temperature varies, `None` otherwise.
    pub temp_period: Option<f64>,
    pub voxel_count: usize,
    pub histories: &'a Histories,
}

impl StopCondition {
    /// True once the run should end.
    pub fn is_met(&self, ctx: &StopContext<'_>) -> bool {
        let h = ctx.histories;
        match self.kind {
            StopKind::None => false,
            StopKind::MaxSteps => ctx.step as f64 >= self.value.round(),
            StopKind::MaxSimTime => ctx.time >= self.value,
            StopKind::TemperatureCycles => match ctx.temp_period {
                Some(p) if p > 0.0 => (ctx.time / p).floor() >= self.value,
                _ => false,
            },
            StopKind::EnergyConverged => {
                if ctx.step < READING_STRIDE as u64 {
                    return false;
                }
                let Some(readings) = strided(&h.total_energy, READING_STRIDE, READING_COUNT) else {
                    return false;
                };
                let (lo, hi) = readings
                    .iter()
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                        (lo.min(v), hi.max(v))
                    });
                hi - lo < self.value
            }
            StopKind::MinKineticEnergy => {
                if ctx.step < READING_COUNT as u64 {
                    return false;
                }
                let Some(readings) =
                    strided(&h.kinetic_energy, READING_STRIDE, READING_COUNT)
                else {
                    return false;
                };
                let n = ctx.voxel_count.max(1) as f64;
                readings.iter().all(|&ke| ke / n < self.value)
            }
            StopKind::MinMaxMove => {
                if ctx.step < READING_COUNT as u64 {
                    return false;
                }
                match strided(&h.max_move, 1, READING_COUNT) {
                    Some(r) => r.iter().all(|&m| m < self.value),
                    None => false,
                }
            }
        }
    }
}

/// `count` readings taken every `stride` entries from the front, or
/// `None` if the history is not yet that long.
fn strided(history: &VecDeque<f64>, stride: usize, count: usize) -> Option<Vec<f64>> {
    let needed = stride * (count - 1) + 1;
    if history.len() < needed {
        return None;
    }
    Some((0..count).map(|i| history[i * stride]).collect())
}

/// Per-step scalar histories, newest first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Histories {
    pub kinetic_energy: VecDeque<f64>,
    pub total_energy: VecDeque<f64>,
    pub max_move: VecDeque<f64>,
}

impl Histories {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kinetic: f64, total: f64, max_move: f64) {
        for (h, v) in [
            (&mut self.kinetic_energy, kinetic),
            (&mut self.total_energy, total),
            (&mut self.max_move, max_move),
        ] {
            h.push_front(v);
            h.truncate(HISTORY_SIZE);
        }
    }

    pub fn clear(&mut self) {
        self.kinetic_energy.clear();
        self.total_energy.clear();
        self.max_move.clear();
    }

    pub fn len(&self) -> usize {
        self.max_move.len()
    }

    pub fn is_empty(&self) -> bool {
        self.max_move.is_empty()
    }

    /// True just after kinetic energy has peaked: the last three steps
    /// sum to less than the three before.
    pub fn kinetic_energy_decreasing(&self) -> bool {
        let ke = &self.kinetic_energy;
        if ke.len() < 6 {
            return false;
        }
        let recent = ke[0] + ke[1] + ke[2];
        let before = ke[3] + ke[4] + ke[5];
        before > 0.0 && recent < before
    }
}
