//! Constitutive models — the core material abstraction.
//!
//! Every model maps an axial strain to a stress plus yield/failure flags.
//! The bond model calls [`ConstitutiveModel::evaluate`] for both endpoint
//! voxels every step.
//!
//! # Strategy Pattern
//!
//! - `LinearModel` — stress = E·ε, never yields or fails
//! - `LinearFailModel` — linear, flags yield and failure together at a threshold
//! - `BilinearModel` — elastic to the yield point, plastic slope beyond
//! - `DataModel` — piecewise-linear through a [`StressStrainSeries`]

use serde::{Deserialize, Serialize};

use crate::properties::FailureMode;
use crate::series::StressStrainSeries;

/// Result of evaluating a model at one strain.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StressResponse {
    pub stress: f64,
    pub yielded: bool,
    pub failed: bool,
}

impl StressResponse {
    fn elastic(stress: f64) -> Self {
        Self {
            stress,
            yielded: false,
            failed: false,
        }
    }
}

/// Trait for constitutive models.
pub trait ConstitutiveModel: Send + Sync {
    /// Stress and flags at `strain`. `modulus_override`, when positive,
    /// replaces the material's elastic modulus (per-voxel stiffness maps).
    fn evaluate(&self, strain: f64, modulus_override: Option<f64>) -> StressResponse;

    /// Tangent stiffness at `strain`, under the same `modulus_override`.
    fn stiffness(&self, strain: f64, modulus_override: Option<f64>) -> f64;

    /// Elastic (small strain) modulus.
    fn elastic_modulus(&self) -> f64;

    /// Returns the name of this constitutive model.
    fn name(&self) -> &str;
}

fn effective_modulus(modulus: f64, modulus_override: Option<f64>) -> f64 {
    match modulus_override {
        Some(m) if m > 0.0 => m,
        _ => modulus,
    }
}

fn past_failure(
    mode: FailureMode,
    strain: f64,
    modulus: f64,
    fail_stress: f64,
    fail_strain: f64,
) -> bool {
    match mode {
        FailureMode::MaxStress => strain > fail_stress / modulus,
        FailureMode::MaxStrain => strain > fail_strain,
    }
}

// ─── Linear ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub modulus: f64,
}

impl ConstitutiveModel for LinearModel {
    fn evaluate(&self, strain: f64, modulus_override: Option<f64>) -> StressResponse {
        StressResponse::elastic(effective_modulus(self.modulus, modulus_override) * strain)
    }

    fn stiffness(&self, _strain: f64, modulus_override: Option<f64>) -> f64 {
        effective_modulus(self.modulus, modulus_override)
    }

    fn elastic_modulus(&self) -> f64 {
        self.modulus
    }

    fn name(&self) -> &str {
        "linear"
    }
}

// ─── Linear with failure ─────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFailModel {
    pub modulus: f64,
    pub mode: FailureMode,
    pub fail_stress: f64,
    pub fail_strain: f64,
}

impl ConstitutiveModel for LinearFailModel {
    fn evaluate(&self, strain: f64, modulus_override: Option<f64>) -> StressResponse {
        let e = effective_modulus(self.modulus, modulus_override);
        let failed = past_failure(self.mode, strain, e, self.fail_stress, self.fail_strain);
        StressResponse {
            stress: e * strain,
            yielded: failed,
            failed,
        }
    }

    fn stiffness(&self, _strain: f64, modulus_override: Option<f64>) -> f64 {
        effective_modulus(self.modulus, modulus_override)
    }

    fn elastic_modulus(&self) -> f64 {
        self.modulus
    }

    fn name(&self) -> &str {
        "linear_fail"
    }
}

// ─── Bilinear ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BilinearModel {
    pub modulus: f64,
    pub plastic_modulus: f64,
    pub yield_stress: f64,
    pub mode: FailureMode,
    pub fail_stress: f64,
    pub fail_strain: f64,
}

impl BilinearModel {
    pub fn yield_strain(&self) -> f64 {
        self.yield_stress / self.modulus
    }
}

impl ConstitutiveModel for BilinearModel {
    fn evaluate(&self, strain: f64, modulus_override: Option<f64>) -> StressResponse {
        let e = effective_modulus(self.modulus, modulus_override);
        let yield_strain = self.yield_stress / e;
        if strain <= yield_strain {
            return StressResponse::elastic(e * strain);
        }
        StressResponse {
            stress: self.yield_stress + self.plastic_modulus * (strain - yield_strain),
            yielded: true,
            failed: past_failure(self.mode, strain, e, self.fail_stress, self.fail_strain),
        }
    }

    fn stiffness(&self, strain: f64, modulus_override: Option<f64>) -> f64 {
        let e = effective_modulus(self.modulus, modulus_override);
        if strain > self.yield_stress / e {
            self.plastic_modulus
        } else {
            e
        }
    }

    fn elastic_modulus(&self) -> f64 {
        self.modulus
    }

    fn name(&self) -> &str {
        "bilinear"
    }
}

// ─── Data-driven ─────────────────────────────────────────────

/// An override scales the whole curve by `override / E`, so yield and
/// failure strains stay where the series puts them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataModel {
    pub series: StressStrainSeries,
}

impl DataModel {
    fn scale(&self, modulus_override: Option<f64>) -> f64 {
        let e = self.series.elastic_modulus();
        match modulus_override {
            Some(m) if m > 0.0 && e > 0.0 => m / e,
            _ => 1.0,
        }
    }
}

impl ConstitutiveModel for DataModel {
    fn evaluate(&self, strain: f64, modulus_override: Option<f64>) -> StressResponse {
        let k = self.scale(modulus_override);
        let s = &self.series;
        match s.interpolate(strain) {
            Some((stress, _)) => StressResponse {
                stress: k * stress,
                yielded: stress > s.yield_stress(),
                failed: false,
            },
            None => {
                let stress = if s.is_softening() {
                    s.stress()[s.len() - 1]
                } else {
                    s.stress()[s.len() - 1] + s.final_slope() * (strain - s.failure_strain())
                };
                StressResponse {
                    stress: k * stress,
                    yielded: true,
                    failed: true,
                }
            }
        }
    }

    fn stiffness(&self, strain: f64, modulus_override: Option<f64>) -> f64 {
        let s = &self.series;
        let slope = if strain < 0.0 {
            s.elastic_modulus()
        } else {
            match s.interpolate(strain) {
                Some((_, slope)) => slope,
                None if s.is_softening() => 0.0,
                None => s.final_slope(),
            }
        };
        self.scale(modulus_override) * slope
    }

    fn elastic_modulus(&self) -> f64 {
        self.series.elastic_modulus()
    }

    fn name(&self) -> &str {
        "data"
    }
}

// ─── Dispatch ────────────────────────────────────────────────

/// Closed set of models, dispatched without allocation in the bond loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MaterialModel {
    Linear(LinearModel),
    LinearFail(LinearFailModel),
    Bilinear(BilinearModel),
    Data(DataModel),
}

impl MaterialModel {
    fn inner(&self) -> &dyn ConstitutiveModel {
        match self {
            MaterialModel::Linear(m) => m,
            MaterialModel::LinearFail(m) => m,
            MaterialModel::Bilinear(m) => m,
            MaterialModel::Data(m) => m,
        }
    }
}

impl ConstitutiveModel for MaterialModel {
    fn evaluate(&self, strain: f64, modulus_override: Option<f64>) -> StressResponse {
        self.inner().evaluate(strain, modulus_override)
    }

    fn stiffness(&self, strain: f64, modulus_override: Option<f64>) -> f64 {
        self.inner().stiffness(strain, modulus_override)
    }

    fn elastic_modulus(&self) -> f64 {
        self.inner().elastic_modulus()
    }

    fn name(&self) -> &str {
        self.inner().name()
    }
}
