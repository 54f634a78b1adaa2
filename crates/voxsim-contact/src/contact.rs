//! Aggregate result of a contact pass.

/// Summary of one contact evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContactResult {
    /// Number of contacts that produced a force.
    pub resolved_count: u32,
    /// Deepest overlap seen (meters).
    pub max_penetration: f64,
    /// Sum of contact force magnitudes (N).
    pub total_force_magnitude: f64,
}

impl ContactResult {
    pub fn record(&mut self, penetration: f64, force: f64) {
        self.resolved_count += 1;
        self.max_penetration = self.max_penetration.max(penetration);
        self.total_force_magnitude += force;
    }
}
