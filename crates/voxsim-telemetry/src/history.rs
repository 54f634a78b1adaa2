//! Bounded statistics history shared between the stepping worker and
//! readers.
//!
//! Newest point first. Once `capacity` points are held the oldest is
//! dropped. The lock is held only for a single push or copy and is never
//! nested with another lock.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use voxsim_types::constants::HISTORY_SIZE;

/// One recorded sample of aggregate statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub step: u64,
    pub time: f64,
    pub kinetic_energy: f64,
    pub strain_energy: f64,
    /// Largest per-step voxel displacement (meters).
    pub max_move: f64,
    pub max_velocity: f64,
    pub center_of_mass: [f64; 3],
}

impl HistoryPoint {
    pub fn total_energy(&self) -> f64 {
        self.kinetic_energy + self.strain_energy
    }
}

/// Cloneable handle to one shared history buffer.
#[derive(Debug, Clone)]
pub struct StatsHistory {
    points: Arc<Mutex<VecDeque<HistoryPoint>>>,
    capacity: usize,
}

impl StatsHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<HistoryPoint>> {
        self.points.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn push(&self, point: HistoryPoint) {
        let mut points = self.lock();
        points.push_front(point);
        points.truncate(self.capacity);
    }

    pub fn latest(&self) -> Option<HistoryPoint> {
        self.lock().front().copied()
    }

    /// Copy of the buffer, newest first.
    pub fn snapshot(&self) -> Vec<HistoryPoint> {
        self.lock().iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl Default for StatsHistory {
    fn default() -> Self {
        Self::new(HISTORY_SIZE)
    }
}
