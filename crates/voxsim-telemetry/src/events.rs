//! Simulation event types.
//!
//! Lightweight value types tagged with the step that produced them.

use serde::{Deserialize, Serialize};

/// A simulation event emitted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationEvent {
    /// Integration step count when the event was emitted.
    pub timestep: u64,
    pub kind: EventKind,
}

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    /// Simulator moved between lifecycle states.
    StateChanged { from: String, to: String },

    /// One integration step finished.
    StepCompleted {
        /// Simulated time after the step (seconds).
        sim_time: f64,
        /// Step size used (seconds).
        dt: f64,
    },

    /// Energy snapshot.
    Energy {
        kinetic: f64,
        strain: f64,
    },

    /// The configured stop condition was met.
    StopConditionReached { condition: String, value: f64 },

    /// Bonds broke during the step.
    BondFailure { broken: u32 },

    /// A tensile-test increment settled.
    TensileIncrement {
        step: u32,
        displacement: f64,
        force: f64,
        converged: bool,
    },

    /// Custom event for extensibility.
    Custom {
        label: String,
        /// JSON-encoded payload.
        payload: String,
    },
}

impl SimulationEvent {
    pub fn new(timestep: u64, kind: EventKind) -> Self {
        Self { timestep, kind }
    }
}
