//! How each strain increment decides it has settled.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use voxsim_types::VoxsimError;

/// Named automatic thresholds.
///
/// The threshold is the first peak of per-step motion in the run divided by
/// the preset's divisor: larger divisors wait for stiller structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergencePreset {
    Fast,
    #[default]
    Balanced,
    Accurate,
}

impl ConvergencePreset {
    pub fn divisor(&self) -> f64 {
        match self {
            ConvergencePreset::Fast => 0.02,
            ConvergencePreset::Balanced => 0.2,
            ConvergencePreset::Accurate => 2.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ConvergencePreset::Fast => "fast",
            ConvergencePreset::Balanced => "balanced",
            ConvergencePreset::Accurate => "accurate",
        }
    }
}

impl fmt::Display for ConvergencePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConvergencePreset {
    type Err = VoxsimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(ConvergencePreset::Fast),
            "balanced" => Ok(ConvergencePreset::Balanced),
            "accurate" => Ok(ConvergencePreset::Accurate),
            other => Err(VoxsimError::InvalidConfig(format!(
                "unknown convergence preset '{other}' (expected fast, balanced or accurate)"
            ))),
        }
    }
}

/// Settling criterion for one strain increment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Convergence {
    /// Threshold derived from the first motion peak.
    Auto { preset: ConvergencePreset },
    /// Peak per-step voxel motion (m) must stay below `value`.
    Threshold { value: f64 },
    /// A fixed number of integrator steps, with no motion check.
    Manual { iterations: u64 },
}

impl Default for Convergence {
    fn default() -> Self {
        Convergence::Auto {
            preset: ConvergencePreset::default(),
        }
    }
}

impl Convergence {
    pub fn auto(preset: ConvergencePreset) -> Self {
        Convergence::Auto { preset }
    }

    pub fn threshold(value: f64) -> Self {
        Convergence::Threshold { value }
    }

    pub fn manual(iterations: u64) -> Self {
        Convergence::Manual { iterations }
    }

    pub fn validate(&self) -> Result<(), VoxsimError> {
        match *self {
            Convergence::Threshold { value } if !(value.is_finite() && value > 0.0) => {
                Err(VoxsimError::InvalidConfig(format!(
                    "convergence threshold must be positive, got {value}"
                )))
            }
            Convergence::Manual { iterations: 0 } => Err(VoxsimError::InvalidConfig(
                "manual convergence needs at least one iteration".into(),
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Convergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Convergence::Auto { preset } => write!(f, "auto ({preset})"),
            Convergence::Threshold { value } => write!(f, "threshold {value:e} m"),
            Convergence::Manual { iterations } => write!(f, "manual ({iterations} steps)"),
        }
    }
}
