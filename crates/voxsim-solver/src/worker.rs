//! Background stepping thread.
//!
//! The worker owns the [`Simulator`] outright. Control requests arrive on a
//! command channel and are handled between steps, so a Pause or Stop always
//! lands on a step boundary. The statistics history is the only state
//! shared with other threads.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};
use voxsim_math::DVec3;
use voxsim_telemetry::StatsHistory;
use voxsim_types::{VoxsimError, VoxsimResult};

use crate::features::Feature;
use crate::integrator::{RunState, Simulator};
use crate::stats::SimStats;
use crate::stop::StopCondition;

/// A request to the worker thread.
#[derive(Debug)]
pub enum WorkerCommand {
    Start,
    Pause,
    Resume,
    Stop,
    Reset,
    SetFeature(Feature, bool),
    SetStop(StopCondition),
    SetInputScale(f64),
    /// Replies with the state after the current step.
    Query(Sender<WorkerStatus>),
    Shutdown,
}

/// Point-in-time answer to [`WorkerCommand::Query`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkerStatus {
    pub state: RunState,
    pub step: u64,
    pub time: f64,
    pub center_of_mass: DVec3,
    pub stats: SimStats,
}

/// Handle to a simulator running on its own thread.
pub struct SimWorker {
    commands: Sender<WorkerCommand>,
    handle: Option<JoinHandle<Simulator>>,
    history: StatsHistory,
}

impl SimWorker {
    /// Moves `sim` onto a new thread. The simulator keeps its current state;
    /// send [`WorkerCommand::Start`] to begin stepping.
    pub fn spawn(sim: Simulator) -> VoxsimResult<Self> {
        let history = sim.stats_history();
        let (tx, rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("voxsim-worker".into())
            .spawn(move || worker_loop(sim, rx))?;
        Ok(Self {
            commands: tx,
            handle: Some(handle),
            history,
        })
    }

    pub fn send(&self, command: WorkerCommand) -> VoxsimResult<()> {
        self.commands
            .send(command)
            .map_err(|_| VoxsimError::InvalidState("simulation worker has exited".into()))
    }

    pub fn start(&self) -> VoxsimResult<()> {
        self.send(WorkerCommand::Start)
    }

    pub fn pause(&self) -> VoxsimResult<()> {
        self.send(WorkerCommand::Pause)
    }

    pub fn resume(&self) -> VoxsimResult<()> {
        self.send(WorkerCommand::Resume)
    }

    pub fn stop(&self) -> VoxsimResult<()> {
        self.send(WorkerCommand::Stop)
    }

    pub fn reset(&self) -> VoxsimResult<()> {
        self.send(WorkerCommand::Reset)
    }

    pub fn set_feature(&self, feature: Feature, enabled: bool) -> VoxsimResult<()> {
        self.send(WorkerCommand::SetFeature(feature, enabled))
    }

    pub fn set_stop_condition(&self, stop: StopCondition) -> VoxsimResult<()> {
        self.send(WorkerCommand::SetStop(stop))
    }

    /// Scales every boundary force and displacement from the next step on.
    pub fn set_input_scale(&self, scale: f64) -> VoxsimResult<()> {
        self.send(WorkerCommand::SetInputScale(scale))
    }

    /// Blocks until the worker answers between steps.
    pub fn query(&self) -> VoxsimResult<WorkerStatus> {
        let (tx, rx) = mpsc::channel();
        self.send(WorkerCommand::Query(tx))?;
        rx.recv()
            .map_err(|_| VoxsimError::InvalidState("simulation worker has exited".into()))
    }

    /// Shared statistics history, appended to by the worker every step.
    pub fn history(&self) -> &StatsHistory {
        &self.history
    }

    /// Stops the thread and hands the simulator back.
    pub fn join(mut self) -> VoxsimResult<Simulator> {
        let _ = self.commands.send(WorkerCommand::Shutdown);
        let handle = self
            .handle
            .take()
            .ok_or_else(|| VoxsimError::InvalidState("worker already joined".into()))?;
        handle
            .join()
            .map_err(|_| VoxsimError::InvalidState("simulation worker panicked".into()))
    }
}

impl Drop for SimWorker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.commands.send(WorkerCommand::Shutdown);
            let _ = handle.join();
        }
    }
}

fn worker_loop(mut sim: Simulator, commands: Receiver<WorkerCommand>) -> Simulator {
    loop {
        let next = if sim.state() == RunState::Running {
            match commands.try_recv() {
                Ok(c) => Some(c),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => break,
            }
        } else {
            match commands.recv() {
                Ok(c) => Some(c),
                Err(_) => break,
            }
        };

        if let Some(command) = next {
            if !handle_command(&mut sim, command) {
                break;
            }
            continue;
        }

        if let Err(e) = sim.step() {
            warn!(error = %e, "step failed, ending run");
            sim.stop();
        }
        sim.flush_events();
    }
    sim.flush_events();
    sim
}

/// Applies one command. Returns false on shutdown.
fn handle_command(sim: &mut Simulator, command: WorkerCommand) -> bool {
    debug!(?command, "worker command");
    let result = match command {
        WorkerCommand::Start => sim.start(),
        WorkerCommand::Pause => sim.pause(),
        WorkerCommand::Resume => sim.resume(),
        WorkerCommand::Stop => {
            sim.stop();
            Ok(())
        }
        WorkerCommand::Reset => {
            sim.reset();
            Ok(())
        }
        WorkerCommand::SetFeature(feature, enabled) => {
            sim.set_feature(feature, enabled);
            Ok(())
        }
        WorkerCommand::SetStop(stop) => {
            sim.set_stop_condition(stop);
            Ok(())
        }
        WorkerCommand::SetInputScale(scale) => {
            sim.set_input_scale(scale);
            Ok(())
        }
        WorkerCommand::Query(reply) => {
            let _ = reply.send(WorkerStatus {
                state: sim.state(),
                step: sim.step_count(),
                time: sim.time(),
                center_of_mass: sim.center_of_mass(),
                stats: *sim.stats(),
            });
            Ok(())
        }
        WorkerCommand::Shutdown => return false,
    };
    if let Err(e) = result {
        warn!(error = %e, "worker command rejected");
    }
    true
}
