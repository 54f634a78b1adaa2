//! Named physics feature toggles.
//!
//! Features are addressed by name everywhere (config files, CLI flags,
//! worker commands) so a misspelt toggle is an error instead of a silently
//! flipped bit.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use voxsim_types::VoxsimError;

/// An independently switchable physical effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Reduced damping with motion zeroed at kinetic energy peaks.
    Equilibrium,
    /// Penalty contact between non-bonded voxels.
    SelfCollision,
    /// Per-step displacement capped at a fraction of voxel size.
    VelocityClamp,
    /// Poisson-coupled cross sections and lateral strains.
    VolumeEffects,
    /// Thermal expansion at the environment temperature.
    Temperature,
    /// Sinusoidally cycling temperature.
    VaryTemperature,
    Gravity,
    Floor,
    /// Unloading follows the elastic slope from the strain high-water mark.
    Plasticity,
    /// Bonds break past their failure threshold.
    Failure,
    /// Re-centres the centre of mass on its initial position every step.
    LockCenterOfMass,
}

impl Feature {
    pub const ALL: [Feature; 11] = [
        Feature::Equilibrium,
        Feature::SelfCollision,
        Feature::VelocityClamp,
        Feature::VolumeEffects,
        Feature::Temperature,
        Feature::VaryTemperature,
        Feature::Gravity,
        Feature::Floor,
        Feature::Plasticity,
        Feature::Failure,
        Feature::LockCenterOfMass,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Feature::Equilibrium => "equilibrium",
            Feature::SelfCollision => "self_collision",
            Feature::VelocityClamp => "velocity_clamp",
            Feature::VolumeEffects => "volume_effects",
            Feature::Temperature => "temperature",
            Feature::VaryTemperature => "vary_temperature",
            Feature::Gravity => "gravity",
            Feature::Floor => "floor",
            Feature::Plasticity => "plasticity",
            Feature::Failure => "failure",
            Feature::LockCenterOfMass => "lock_center_of_mass",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Feature {
    type Err = VoxsimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        Feature::ALL
            .into_iter()
            .find(|f| f.name() == key)
            .ok_or_else(|| {
                let known: Vec<&str> = Feature::ALL.iter().map(|f| f.name()).collect();
                VoxsimError::InvalidConfig(format!(
                    "unknown feature '{s}' (expected one of: {})",
                    known.join(", ")
                ))
            })
    }
}

/// The set of enabled features.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSet(BTreeSet<Feature>);

impl FeatureSet {
    pub fn none() -> Self {
        Self::default()
    }

    /// Gravity, floor, plasticity and failure: the interactive defaults.
    pub fn standard() -> Self {
        [Feature::Gravity, Feature::Floor, Feature::Plasticity, Feature::Failure]
            .into_iter()
            .collect()
    }

    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.0.contains(&feature)
    }

    /// Returns true if the state changed.
    pub fn set(&mut self, feature: Feature, enabled: bool) -> bool {
        if enabled {
            self.0.insert(feature)
        } else {
            self.0.remove(&feature)
        }
    }

    pub fn enable(&mut self, feature: Feature) -> bool {
        self.set(feature, true)
    }

    pub fn disable(&mut self, feature: Feature) -> bool {
        self.set(feature, false)
    }

    /// Sets a feature by name.
    pub fn set_named(&mut self, name: &str, enabled: bool) -> Result<bool, VoxsimError> {
        Ok(self.set(name.parse()?, enabled))
    }

    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Feature> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
