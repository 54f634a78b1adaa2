//! Pluggable event sinks.
//!
//! Sinks consume events flushed from the bus. [`VecSink`] keeps them for
//! inspection; [`TracingSink`] turns them into log records.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::events::SimulationEvent;

/// Trait for event consumers.
///
/// Implement this to send telemetry somewhere new.
pub trait EventSink: Send {
    /// Processes a single event.
    fn handle(&mut self, event: &SimulationEvent);

    /// Called when the run ends. Flush buffers or close files here.
    fn finalize(&mut self) {}

    /// Returns a short name for this sink.
    fn name(&self) -> &str;
}

/// Collects events into a shared `Vec` for tests and inspection.
///
/// Clones share one buffer, so a clone kept outside the bus sees every
/// event the bus delivers.
#[derive(Clone, Default)]
pub struct VecSink {
    /// Events received so far, oldest first.
    events: Arc<Mutex<Vec<SimulationEvent>>>,
}

impl VecSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SimulationEvent>> {
        self.events.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Copy of everything received so far.
    pub fn events(&self) -> Vec<SimulationEvent> {
        self.lock().clone()
    }

    /// Number of events received.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing has arrived yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for VecSink {
    fn handle(&mut self, event: &SimulationEvent) {
        self.lock().push(event.clone());
    }

    fn name(&self) -> &str {
        "vec_sink"
    }
}

/// A sink that logs events through `tracing`.
pub struct TracingSink {
    /// `DEBUG` and `TRACE` log at debug level; anything else at info.
    level: tracing::Level,
}

impl TracingSink {
    /// Creates a tracing sink at the given log level.
    pub fn new(level: tracing::Level) -> Self {
        Self { level }
    }

    /// Level events are logged at.
    pub fn level(&self) -> tracing::Level {
        self.level
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new(tracing::Level::INFO)
    }
}

impl EventSink for TracingSink {
    fn handle(&mut self, event: &SimulationEvent) {
        if self.level == tracing::Level::DEBUG || self.level == tracing::Level::TRACE {
            tracing::debug!(timestep = event.timestep, event = ?event.kind, "simulation_event");
        } else {
            tracing::info!(timestep = event.timestep, event = ?event.kind, "simulation_event");
        }
    }

    fn name(&self) -> &str {
        "tracing_sink"
    }
}
