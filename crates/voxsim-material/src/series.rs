//! User-supplied stress/strain data.
//!
//! A series is a tension curve sampled at strictly increasing strains
//! starting at the origin. Validation derives the quantities the
//! data-driven model needs: the elastic slope of the first segment, the
//! 0.2%-offset yield stress, and the failure strain (the last point).

use serde::{Deserialize, Serialize};
use voxsim_types::constants::YIELD_OFFSET_STRAIN;
use voxsim_types::{VoxsimError, VoxsimResult};

/// A validated stress/strain series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressStrainSeries {
    strain: Vec<f64>,
    stress: Vec<f64>,
    /// Slope of the first segment, used for compression and unloading.
    elastic_modulus: f64,
    /// Intersection of the 0.2%-offset elastic line with the curve.
    yield_stress: f64,
}

/// Checks a candidate series without building it.
pub fn validate_series(strain: &[f64], stress: &[f64]) -> VoxsimResult<()> {
    if strain.is_empty() || stress.is_empty() {
        return Err(VoxsimError::Validation(
            "zero length stress or strain series".into(),
        ));
    }
    if strain.len() == 1 || stress.len() == 1 {
        return Err(VoxsimError::Validation(
            "series needs more than one point".into(),
        ));
    }
    if strain.len() != stress.len() {
        return Err(VoxsimError::Validation(format!(
            "strain and stress series have unequal lengths ({} vs {})",
            strain.len(),
            stress.len()
        )));
    }
    if strain[0] != 0.0 || stress[0] != 0.0 {
        return Err(VoxsimError::Validation(
            "initial point in series must be zero stress, zero strain".into(),
        ));
    }
    if strain.windows(2).any(|w| w[0] >= w[1]) {
        return Err(VoxsimError::Validation(
            "strain values must increase from zero without repeated values".into(),
        ));
    }
    if stress[1] / strain[1] <= 0.0 {
        return Err(VoxsimError::Validation(
            "first segment of series must have positive slope".into(),
        ));
    }
    Ok(())
}

impl StressStrainSeries {
    /// Validates and builds a series.
    pub fn new(strain: Vec<f64>, stress: Vec<f64>) -> VoxsimResult<Self> {
        validate_series(&strain, &stress)?;

        let elastic_modulus = stress[1] / strain[1];
        let yield_stress = offset_yield(&strain, &stress, elastic_modulus);

        Ok(Self {
            strain,
            stress,
            elastic_modulus,
            yield_stress,
        })
    }

    pub fn strain(&self) -> &[f64] {
        &self.strain
    }

    pub fn stress(&self) -> &[f64] {
        &self.stress
    }

    pub fn len(&self) -> usize {
        self.strain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strain.is_empty()
    }

    pub fn elastic_modulus(&self) -> f64 {
        self.elastic_modulus
    }

    pub fn yield_stress(&self) -> f64 {
        self.yield_stress
    }

    /// Strain of the last data point; the series fails at or beyond it.
    pub fn failure_strain(&self) -> f64 {
        self.strain[self.strain.len() - 1]
    }

    /// True if the last segment slopes downward.
    pub fn is_softening(&self) -> bool {
        let n = self.stress.len();
        self.stress[n - 1] < self.stress[n - 2]
    }

    /// Slope of the last segment.
    pub fn final_slope(&self) -> f64 {
        let n = self.strain.len();
        (self.stress[n - 1] - self.stress[n - 2]) / (self.strain[n - 1] - self.strain[n - 2])
    }

    /// Piecewise-linear interpolation. Strains below zero extrapolate the
    /// first segment. Returns `None` at or beyond the last point.
    pub fn interpolate(&self, strain: f64) -> Option<(f64, f64)> {
        if strain >= self.failure_strain() {
            return None;
        }
        for i in 0..self.strain.len() - 1 {
            if self.strain[i + 1] > strain {
                let perc = (strain - self.strain[i]) / (self.strain[i + 1] - self.strain[i]);
                let stress = self.stress[i] + perc * (self.stress[i + 1] - self.stress[i]);
                let slope =
                    (self.stress[i + 1] - self.stress[i]) / (self.strain[i + 1] - self.strain[i]);
                return Some((stress, slope));
            }
        }
        None
    }
}

/// Yield stress from the 0.2% offset line `σ = E(ε − 0.002)`. Falls back to
/// the last stress when the line never crosses the curve.
fn offset_yield(strain: &[f64], stress: &[f64], modulus: f64) -> f64 {
    let mo = modulus;
    let bo = -YIELD_OFFSET_STRAIN * modulus;
    let n = strain.len();

    for i in 1..n.saturating_sub(1) {
        let (x1, x2) = (strain[i], strain[i + 1]);
        let (y1, y2) = (stress[i], stress[i + 1]);
        let mt = (y2 - y1) / (x2 - x1);
        let bt = y1 - mt * x1;

        if mo != mt {
            let x_int = (bt - bo) / (mo - mt);
            if x_int > x1 && x_int < x2 {
                let perc = (x_int - x1) / (x2 - x1);
                return y1 + perc * (y2 - y1);
            }
        }
    }
    stress[n - 1]
}
