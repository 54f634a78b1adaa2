//! Physical properties of a leaf material.

use serde::{Deserialize, Serialize};
use voxsim_types::VoxsimResult;

use crate::model::{BilinearModel, DataModel, LinearFailModel, LinearModel, MaterialModel};
use crate::series::StressStrainSeries;

/// Which stress/strain law a leaf uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ModelKind {
    #[default]
    Linear,
    LinearFail,
    Bilinear,
    Data,
}

impl ModelKind {
    /// Numeric tag used in documents.
    pub fn code(&self) -> i32 {
        match self {
            ModelKind::Linear => 0,
            ModelKind::LinearFail => 1,
            ModelKind::Bilinear => 2,
            ModelKind::Data => 3,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            1 => ModelKind::LinearFail,
            2 => ModelKind::Bilinear,
            3 => ModelKind::Data,
            _ => ModelKind::Linear,
        }
    }
}

/// Failure criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailureMode {
    #[default]
    MaxStress,
    MaxStrain,
}

impl FailureMode {
    pub fn code(&self) -> i32 {
        match self {
            FailureMode::MaxStress => 0,
            FailureMode::MaxStrain => 1,
        }
    }

    pub fn from_code(code: i32) -> Self {
        if code == 1 {
            FailureMode::MaxStrain
        } else {
            FailureMode::MaxStress
        }
    }
}

/// Mechanical, thermal and frictional properties of a leaf material.
///
/// | Field | Unit |
/// |---|---|
/// | `elastic_modulus`, `plastic_modulus`, `yield_stress`, `fail_stress` | Pa |
/// | `fail_strain` | dimensionless |
/// | `density` | kg/m³ |
/// | `cte` | 1/°C |
/// | `temp_phase` | radians |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafProperties {
    pub model_kind: ModelKind,
    pub failure_mode: FailureMode,

    // ─── Mechanical ───
    pub elastic_modulus: f64,
    /// Post-yield slope for the bilinear model.
    pub plastic_modulus: f64,
    pub yield_stress: f64,
    pub fail_stress: f64,
    pub fail_strain: f64,
    pub poissons_ratio: f64,
    pub density: f64,

    // ─── Thermal ───
    /// Coefficient of thermal expansion.
    pub cte: f64,
    /// Phase offset of this material's response to a cycling temperature.
    pub temp_phase: f64,

    // ─── Friction ───
    pub static_friction: f64,
    pub dynamic_friction: f64,

    /// Data points for [`ModelKind::Data`].
    pub series: Option<StressStrainSeries>,
}

impl LeafProperties {
    /// A linear material with the palette defaults for everything else.
    pub fn new(elastic_modulus: f64, poissons_ratio: f64) -> Self {
        Self {
            model_kind: ModelKind::Linear,
            failure_mode: FailureMode::MaxStress,
            elastic_modulus,
            plastic_modulus: 0.0,
            yield_stress: 0.0,
            fail_stress: 0.0,
            fail_strain: 0.0,
            poissons_ratio,
            density: 1.0,
            cte: 0.0,
            temp_phase: 0.0,
            static_friction: 1.0,
            dynamic_friction: 0.5,
            series: None,
        }
    }

    /// All-zero properties, as left by a document missing its mechanical section.
    pub fn zeroed() -> Self {
        Self {
            elastic_modulus: 0.0,
            poissons_ratio: 0.0,
            density: 0.0,
            static_friction: 0.0,
            dynamic_friction: 0.0,
            ..Self::new(0.0, 0.0)
        }
    }

    /// Installs a stress/strain series and switches to the data model.
    ///
    /// On error the current model and its parameters are left untouched.
    pub fn set_series(&mut self, strain: Vec<f64>, stress: Vec<f64>) -> VoxsimResult<()> {
        let series = StressStrainSeries::new(strain, stress)?;
        self.elastic_modulus = series.elastic_modulus();
        self.plastic_modulus = series.elastic_modulus();
        self.yield_stress = series.yield_stress();
        self.fail_stress = 0.0;
        self.fail_strain = series.failure_strain();
        self.failure_mode = FailureMode::MaxStrain;
        self.model_kind = ModelKind::Data;
        self.series = Some(series);
        Ok(())
    }

    /// Builds the constitutive model described by these properties.
    ///
    /// A data model without a series falls back to linear.
    pub fn model(&self) -> MaterialModel {
        match (self.model_kind, &self.series) {
            (ModelKind::Linear, _) => MaterialModel::Linear(LinearModel {
                modulus: self.elastic_modulus,
            }),
            (ModelKind::LinearFail, _) => MaterialModel::LinearFail(LinearFailModel {
                modulus: self.elastic_modulus,
                mode: self.failure_mode,
                fail_stress: self.fail_stress,
                fail_strain: self.fail_strain,
            }),
            (ModelKind::Bilinear, _) => MaterialModel::Bilinear(BilinearModel {
                modulus: self.elastic_modulus,
                plastic_modulus: self.plastic_modulus,
                yield_stress: self.yield_stress,
                mode: self.failure_mode,
                fail_stress: self.fail_stress,
                fail_strain: self.fail_strain,
            }),
            (ModelKind::Data, Some(series)) => MaterialModel::Data(DataModel {
                series: series.clone(),
            }),
            (ModelKind::Data, None) => MaterialModel::Linear(LinearModel {
                modulus: self.elastic_modulus,
            }),
        }
    }

    /// Nominal shear modulus `E / (2(1+ν))`.
    pub fn shear_modulus(&self) -> f64 {
        self.elastic_modulus / (2.0 * (1.0 + self.poissons_ratio))
    }
}

impl Default for LeafProperties {
    fn default() -> Self {
        Self::new(1.0e6, 0.35)
    }
}
