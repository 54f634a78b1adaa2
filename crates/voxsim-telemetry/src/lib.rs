//! # voxsim-telemetry
//!
//! Event bus for simulation telemetry. Emits structured events
//! (step timing, energy, state changes, stop conditions, tensile
//! increments) to pluggable sinks, and keeps the bounded statistics
//! history shared between the stepping worker and its readers.

pub mod bus;
pub mod events;
pub mod history;
pub mod sinks;

pub use bus::EventBus;
pub use events::{EventKind, SimulationEvent};
pub use history::{HistoryPoint, StatsHistory};
pub use sinks::{EventSink, TracingSink, VecSink};
