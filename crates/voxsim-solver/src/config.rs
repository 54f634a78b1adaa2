//! Physics configuration.
//!
//! Damping coefficients are dimensionless fractions of critical damping.
//! Inputs come from continuous controls, so out-of-range values are
//! clamped with a warning rather than rejected.

use serde::{Deserialize, Serialize};
use tracing::warn;
use voxsim_types::constants::{DEFAULT_DT_FRAC, GRAVITY};
use voxsim_types::{VoxsimError, VoxsimResult};

use crate::features::{Feature, FeatureSet};
use crate::stop::StopCondition;

/// Largest allowed per-step displacement limit, as a fraction of voxel size.
pub const MAX_VELOCITY_LIMIT: f64 = 0.2;

/// Physical surroundings of the object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Environment {
    /// Acceleration along Z (m/s², negative is down).
    pub gravity_accel: f64,
    /// Floor slope in degrees.
    pub floor_slope: f64,
    /// Reference temperature at which voxels have nominal size (°C).
    pub base_temp: f64,
    /// Offset from `base_temp`, or the swing when the temperature varies.
    pub temp_amplitude: f64,
    /// Period of the temperature cycle (s).
    pub temp_period: f64,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            gravity_accel: GRAVITY,
            floor_slope: 0.0,
            base_temp: 25.0,
            temp_amplitude: 0.0,
            temp_period: 0.1,
        }
    }
}

impl Environment {
    /// Temperature at `time` for a material with `phase` (radians).
    ///
    /// `T = T_base + A·sin(2πt/P + phase)` when cycling, `T_base + A` otherwise.
    pub fn temperature(&self, time: f64, phase: f64, varying: bool) -> f64 {
        if varying && self.temp_period > 0.0 {
            let w = 2.0 * std::f64::consts::PI / self.temp_period;
            self.base_temp + self.temp_amplitude * (w * time + phase).sin()
        } else {
            self.base_temp + self.temp_amplitude
        }
    }
}

/// Configuration for the dynamics integrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Relative-velocity damping inside bonds.
    pub bond_damping: f64,
    /// Damping of every voxel towards rest.
    pub slow_damping: f64,
    /// Damping of floor and self-collision contacts.
    pub collision_damping: f64,
    /// Fraction of the largest stable step actually used.
    pub dt_frac: f64,
    /// Per-step displacement cap, as a fraction of voxel size.
    pub max_velocity_limit: f64,
    pub features: FeatureSet,
    pub stop: StopCondition,
    pub environment: Environment,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            bond_damping: 1.0,
            slow_damping: 0.001,
            collision_damping: 1.0,
            dt_frac: DEFAULT_DT_FRAC,
            max_velocity_limit: 0.1,
            features: FeatureSet::standard(),
            stop: StopCondition::none(),
            environment: Environment::default(),
        }
    }
}

impl PhysicsConfig {
    /// Small fixed runs for smoke tests: no floor, no failure, 1000 steps.
    pub fn quick() -> Self {
        Self {
            features: [Feature::Gravity].into_iter().collect(),
            stop: StopCondition::max_steps(1000),
            ..Default::default()
        }
    }

    /// Static solutions: equilibrium mode, no external effects, stops when
    /// the structure is motionless.
    pub fn equilibrium() -> Self {
        Self {
            features: [Feature::Equilibrium].into_iter().collect(),
            stop: StopCondition::min_max_move(1e-9),
            ..Default::default()
        }
    }

    /// Returns a copy with every range-limited parameter clamped.
    pub fn clamped(&self) -> Self {
        let mut c = self.clone();
        c.bond_damping = clamp_warn("bond_damping", c.bond_damping, 0.0, 1.0);
        c.slow_damping = clamp_warn("slow_damping", c.slow_damping, 0.0, 1.0);
        c.collision_damping = clamp_warn("collision_damping", c.collision_damping, 0.0, 1.0);
        c.dt_frac = clamp_warn("dt_frac", c.dt_frac, 1e-6, 1.0);
        c.max_velocity_limit = clamp_warn(
            "max_velocity_limit",
            c.max_velocity_limit,
            1e-6,
            MAX_VELOCITY_LIMIT,
        );
        c
    }

    /// Rejects values that cannot be clamped into meaning.
    pub fn validate(&self) -> VoxsimResult<()> {
        let finite = [
            ("bond_damping", self.bond_damping),
            ("slow_damping", self.slow_damping),
            ("collision_damping", self.collision_damping),
            ("dt_frac", self.dt_frac),
            ("max_velocity_limit", self.max_velocity_limit),
            ("stop.value", self.stop.value),
            ("environment.gravity_accel", self.environment.gravity_accel),
            ("environment.temp_period", self.environment.temp_period),
        ];
        for (name, v) in finite {
            if !v.is_finite() {
                return Err(VoxsimError::InvalidConfig(format!("{name} must be finite, got {v}")));
            }
        }
        if self.features.is_enabled(Feature::VaryTemperature)
            && self.environment.temp_period <= 0.0
        {
            return Err(VoxsimError::InvalidConfig(
                "environment.temp_period must be positive when the temperature varies".into(),
            ));
        }
        if self.stop.value < 0.0 {
            return Err(VoxsimError::InvalidConfig(format!(
                "stop.value must be non-negative, got {}",
                self.stop.value
            )));
        }
        Ok(())
    }
}

fn clamp_warn(name: &str, v: f64, lo: f64, hi: f64) -> f64 {
    if v.is_nan() {
        warn!(parameter = name, "NaN replaced by lower bound");
        return lo;
    }
    let c = v.clamp(lo, hi);
    if c != v {
        warn!(parameter = name, value = v, clamped = c, "parameter clamped");
    }
    c
}

// ─── Slider mappings ─────────────────────────────────────────

/// Linear slider position (0–100) to a damping ratio in [0, 1].
pub fn damping_from_slider(position: f64) -> f64 {
    (position / 100.0).clamp(0.0, 1.0)
}

/// Logarithmic slider position (0–100) to a slow-damping ratio.
///
/// Zero maps to zero; 1–100 spans four decades up to 1.0.
pub fn slow_damping_from_slider(position: f64) -> f64 {
    if position <= 0.0 {
        0.0
    } else {
        10f64.powf(position.min(100.0) / 25.0 - 4.0)
    }
}
