//! Benchmark scenarios: object, boundary regions and physics for each case.
//!
//! Two canonical scenarios for regression testing:
//! 1. **Fixed block**: a 10×10×10 block fixed at its bottom face with a
//!    downward force on its top face
//! 2. **Tensile bar**: a 20×4×4 bar fixed at one end and pulled 1% at the other

use serde::{Deserialize, Serialize};

use voxsim_boundary::{BoundaryRegion, BoundarySet, Primitive};
use voxsim_lattice::generators::block;
use voxsim_lattice::Lattice;
use voxsim_material::{Palette, VoxelObject};
use voxsim_math::DVec3;
use voxsim_solver::{Feature, FeatureSet, PhysicsConfig};
use voxsim_types::VoxsimResult;

/// Edge length of every scenario voxel (m).
pub const VOXEL_SIZE: f64 = 0.001;

/// Which benchmark scenario to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioKind {
    FixedBlock,
    TensileBar,
}

impl ScenarioKind {
    pub fn all() -> &'static [ScenarioKind] {
        &[ScenarioKind::FixedBlock, ScenarioKind::TensileBar]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::FixedBlock => "fixed_block",
            ScenarioKind::TensileBar => "tensile_bar",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.name() == name)
    }
}

/// A fully specified benchmark scenario.
pub struct Scenario {
    pub kind: ScenarioKind,
    pub object: VoxelObject,
    pub boundaries: BoundarySet,
    pub config: PhysicsConfig,
    /// Integration steps to run.
    pub steps: u64,
}

impl Scenario {
    /// 1000 voxels of a 1 MPa material. The bottom face is fixed and a
    /// 1 N downward load is spread over the top face.
    pub fn fixed_block() -> VoxsimResult<Self> {
        let object = single_material_object(10, 10, 10, 1.0e6)?;
        let boundaries = BoundarySet::from_regions(vec![
            BoundaryRegion::fixed(
                Primitive::new_box(DVec3::ZERO, DVec3::new(1.0, 1.0, 0.01)),
                DVec3::ZERO,
            ),
            BoundaryRegion::forced(
                Primitive::new_box(DVec3::new(0.0, 0.0, 0.99), DVec3::new(1.0, 1.0, 0.01)),
                DVec3::new(0.0, 0.0, -1.0),
                DVec3::ZERO,
            ),
        ]);
        Ok(Self {
            kind: ScenarioKind::FixedBlock,
            object,
            boundaries,
            config: PhysicsConfig {
                features: FeatureSet::standard(),
                ..Default::default()
            },
            steps: 500,
        })
    }

    /// A 20 mm bar. The -X face is fixed, the +X face is held and moved
    /// 0.2 mm along X.
    pub fn tensile_bar() -> VoxsimResult<Self> {
        let object = single_material_object(20, 4, 4, 5.0e6)?;
        let boundaries = BoundarySet::from_regions(vec![
            BoundaryRegion::fixed(
                Primitive::new_box(DVec3::ZERO, DVec3::new(0.01, 1.0, 1.0)),
                DVec3::ZERO,
            ),
            BoundaryRegion::fixed(
                Primitive::new_box(DVec3::new(0.99, 0.0, 0.0), DVec3::new(0.01, 1.0, 1.0)),
                DVec3::new(0.2 * VOXEL_SIZE, 0.0, 0.0),
            ),
        ]);
        let mut features = FeatureSet::standard();
        features.set(Feature::Gravity, false);
        Ok(Self {
            kind: ScenarioKind::TensileBar,
            object,
            boundaries,
            config: PhysicsConfig {
                features,
                ..Default::default()
            },
            steps: 1000,
        })
    }

    pub fn from_kind(kind: ScenarioKind) -> VoxsimResult<Self> {
        match kind {
            ScenarioKind::FixedBlock => Self::fixed_block(),
            ScenarioKind::TensileBar => Self::tensile_bar(),
        }
    }
}

fn single_material_object(x: usize, y: usize, z: usize, modulus: f64) -> VoxsimResult<VoxelObject> {
    let mut palette = Palette::new();
    let mat = palette.add_leaf("Bench", modulus, 0.35)?;
    VoxelObject::from_parts(Lattice::cubic(VOXEL_SIZE), palette, block(x, y, z, mat))
}
