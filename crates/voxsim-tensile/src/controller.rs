//! Quasi-static tensile test controller.
//!
//! Each strain increment scales every prescribed boundary input to
//! `(i + 1) / N` of its full value and then runs the integrator until the
//! structure settles. Once settled, failure is switched on for a single
//! step; if any bond breaks the increment is settled again, until the broken
//! count stops changing. The reaction force on every displaced region is
//! then recorded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use voxsim_boundary::BoundarySet;
use voxsim_material::VoxelObject;
use voxsim_math::Axis;
use voxsim_solver::{Feature, PhysicsConfig, Simulator, StopCondition};
use voxsim_types::{VoxsimError, VoxsimResult};

use crate::blend::{blend_object, BlendSettings};
use crate::convergence::Convergence;
use crate::results::{BasicTensile, RegionReading, TensileResults, TensileRow};

/// Integrator steps between two convergence checks.
pub const MIN_STEPS_PER_CHECK: u64 = 5;

/// Default cap on the steps one increment may take to settle.
pub const DEFAULT_MAX_STEPS_PER_INCREMENT: u64 = 200_000;

/// Effects that have no place in a tensile test.
const DISABLED_FEATURES: [Feature; 7] = [
    Feature::Gravity,
    Feature::Floor,
    Feature::Temperature,
    Feature::VaryTemperature,
    Feature::SelfCollision,
    Feature::Plasticity,
    Feature::Failure,
];

/// Parameters of one tensile test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TensileParams {
    /// Number of strain increments.
    pub steps: usize,
    pub convergence: Convergence,
    pub blend: BlendSettings,
    pub max_steps_per_increment: u64,
}

impl Default for TensileParams {
    fn default() -> Self {
        Self {
            steps: 10,
            convergence: Convergence::default(),
            blend: BlendSettings::none(),
            max_steps_per_increment: DEFAULT_MAX_STEPS_PER_INCREMENT,
        }
    }
}

impl TensileParams {
    pub fn validate(&self) -> VoxsimResult<()> {
        if self.steps == 0 {
            return Err(VoxsimError::InvalidConfig(
                "tensile test needs at least one strain increment".into(),
            ));
        }
        if self.max_steps_per_increment < MIN_STEPS_PER_CHECK {
            return Err(VoxsimError::InvalidConfig(format!(
                "max_steps_per_increment must be at least {MIN_STEPS_PER_CHECK}"
            )));
        }
        self.convergence.validate()?;
        self.blend.validate()
    }
}

/// Tracks the motion threshold while it is still being determined.
#[derive(Debug, Clone, Copy)]
struct MotionThreshold {
    /// Divisor applied to the first motion peak, auto mode only.
    divisor: Option<f64>,
    value: Option<f64>,
    last_motion: f64,
}

impl MotionThreshold {
    fn for_mode(convergence: Convergence) -> Self {
        let (divisor, value) = match convergence {
            Convergence::Auto { preset } => (Some(preset.divisor()), None),
            Convergence::Threshold { value } => (None, Some(value)),
            Convergence::Manual { .. } => (None, None),
        };
        Self {
            divisor,
            value,
            last_motion: 0.0,
        }
    }

    /// Called after each batch of steps. The first batch in which
    /// equilibrium mode zeroed the motion fixes the threshold from the peak
    /// motion seen just before it.
    fn observe(&mut self, motion_zeroed: bool, motion: f64) {
        let (Some(divisor), None) = (self.divisor, self.value) else {
            return;
        };
        if motion_zeroed {
            let t = self.last_motion / divisor;
            info!(threshold = t, "auto convergence threshold set");
            self.value = Some(t);
        } else {
            self.last_motion = motion;
        }
    }
}

/// Runs tensile tests with one set of parameters.
#[derive(Debug, Clone)]
pub struct TensileTest {
    params: TensileParams,
    cancel: Arc<AtomicBool>,
}

impl TensileTest {
    pub fn new(params: TensileParams) -> VoxsimResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn params(&self) -> &TensileParams {
        &self.params
    }

    /// Setting the returned flag ends the test after the current batch of
    /// steps. Rows recorded so far are kept.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Builds the simulator a test runs on: blended if requested, with the
    /// environment reduced to the mechanical effects and equilibrium mode on.
    pub fn prepare(
        &self,
        object: &VoxelObject,
        boundaries: &BoundarySet,
        physics: &PhysicsConfig,
    ) -> VoxsimResult<(Simulator, VoxelObject)> {
        check_boundaries(boundaries, self.params.steps, object.lattice.lattice_dim)?;

        let object = if self.params.blend.is_enabled() {
            blend_object(object, &self.params.blend)?
        } else {
            object.clone()
        };

        let mut config = physics.clone();
        for f in DISABLED_FEATURES {
            config.features.disable(f);
        }
        config.features.enable(Feature::Equilibrium);
        config.stop = StopCondition::none();

        let mut sim = Simulator::new(config);
        sim.import(&object, boundaries)?;
        Ok((sim, object))
    }

    /// Runs the whole test on a private copy of `object`.
    pub fn run(
        &self,
        object: &VoxelObject,
        boundaries: &BoundarySet,
        physics: &PhysicsConfig,
    ) -> VoxsimResult<TensileResults> {
        let (mut sim, object) = self.prepare(object, boundaries, physics)?;
        self.run_on(&mut sim, &object)
    }

    /// Runs the test on an imported simulator. `object` is the object the
    /// simulator was imported from.
    pub fn run_on(
        &self,
        sim: &mut Simulator,
        object: &VoxelObject,
    ) -> VoxsimResult<TensileResults> {
        let basic = detect_basic(object, sim.boundaries());
        let n = self.params.steps;
        let mut threshold = MotionThreshold::for_mode(self.params.convergence);
        let mut results = TensileResults {
            basic,
            threshold: None,
            rows: Vec::with_capacity(n),
        };
        let mut previous: Option<(f64, f64)> = None;

        info!(
            increments = n,
            convergence = %self.params.convergence,
            basic = basic.is_some(),
            "tensile test started"
        );
        sim.start()?;

        for i in 0..n {
            if self.is_cancelled() {
                break;
            }
            let scale = (i + 1) as f64 / n as f64;
            sim.set_input_scale(scale);
            sim.clear_histories();

            let mut steps = 0;
            let mut converged = true;
            let mut last_broken = None;
            while last_broken != Some(sim.broken_bond_count()) {
                last_broken = Some(sim.broken_bond_count());
                sim.set_feature(Feature::Failure, false);
                let (taken, settled) = self.settle(sim, &mut threshold)?;
                steps += taken;
                converged &= settled;
                if self.is_cancelled() {
                    break;
                }
                sim.set_feature(Feature::Failure, true);
                sim.step()?;
                steps += 1;
            }
            sim.set_feature(Feature::Failure, false);
            if self.is_cancelled() {
                warn!(increment = i, "tensile test cancelled");
                break;
            }

            let mut readings = Vec::new();
            for (ri, region) in sim.boundaries().iter().enumerate() {
                if region.displace().length_squared() == 0.0 {
                    continue;
                }
                let displacement = region.displace().length() * scale;
                let force = -sim.sum_force_dir(ri)?;
                let mut reading = RegionReading {
                    region: ri,
                    displacement,
                    force,
                    strain: None,
                    stress: None,
                    modulus: None,
                };
                if let Some(b) = basic.filter(|b| b.displaced_region == ri) {
                    let stress = force / b.cross_section;
                    let strain = displacement / b.initial_length;
                    reading.strain = Some(strain);
                    reading.stress = Some(stress);
                    reading.modulus = previous.map(|(e0, s0)| (stress - s0) / (strain - e0));
                    previous = Some((strain, stress));
                }
                readings.push(reading);
            }

            let broken = sim.broken_bond_count();
            info!(
                increment = i + 1,
                of = n,
                steps,
                broken_bonds = broken,
                converged,
                "tensile increment complete"
            );
            results.rows.push(TensileRow {
                increment: i,
                readings,
                steps,
                broken_bonds: broken,
                converged,
            });
        }

        sim.stop();
        results.threshold = threshold.value;
        Ok(results)
    }

    /// Steps until the motion threshold is met, or for the fixed count in
    /// manual mode. Returns the steps taken and whether the increment settled
    /// before the step cap.
    fn settle(
        &self,
        sim: &mut Simulator,
        threshold: &mut MotionThreshold,
    ) -> VoxsimResult<(u64, bool)> {
        if let Convergence::Manual { iterations } = self.params.convergence {
            for _ in 0..iterations {
                sim.step()?;
            }
            return Ok((iterations, true));
        }

        let cap = self.params.max_steps_per_increment;
        let mut taken = 0;
        loop {
            if let Some(t) = threshold.value {
                if sim.is_stop_met(StopCondition::min_max_move(t)) {
                    debug!(steps = taken, threshold = t, "increment settled");
                    return Ok((taken, true));
                }
            }
            if taken >= cap {
                warn!(
                    steps = taken,
                    max_move = sim.stats().max_move,
                    threshold = threshold.value,
                    "increment not converging, consider a larger threshold"
                );
                return Ok((taken, false));
            }
            let mut zeroed = false;
            for _ in 0..MIN_STEPS_PER_CHECK {
                if self.is_cancelled() {
                    return Ok((taken, false));
                }
                sim.step()?;
                zeroed |= sim.motion_zeroed();
                taken += 1;
            }
            threshold.observe(zeroed, sim.stats().max_voxel_velocity * sim.dt());
        }
    }
}

/// Rejects boundary sets that cannot drive a tensile test.
pub fn check_boundaries(
    boundaries: &BoundarySet,
    steps: usize,
    lattice_dim: f64,
) -> VoxsimResult<()> {
    let max_disp = boundaries
        .iter()
        .map(|r| r.displace().length())
        .fold(0.0, f64::max);
    if max_disp == 0.0 {
        return Err(VoxsimError::Validation(
            "At least one fixed boundary conditions must have non-zero displacement.".into(),
        ));
    }
    if steps > 0 && max_disp / steps as f64 > lattice_dim {
        warn!(
            step_displacement = max_disp / steps as f64,
            lattice_dim,
            "displacement steps are larger than the voxel size, the test may be unstable"
        );
    }
    Ok(())
}

/// Recognises a basic tensile test: a full box with exactly two fully fixed
/// box regions, one still and one displaced along a single axis, each a thin
/// slab covering one end face.
pub fn detect_basic(object: &VoxelObject, boundaries: &BoundarySet) -> Option<BasicTensile> {
    let regions = boundaries.regions();
    if regions.len() != 2 {
        return None;
    }
    if !regions.iter().all(|r| r.dof_fixed().is_all_fixed() && r.is_box()) {
        return None;
    }
    if object.voxel_count() != object.structure.len() {
        return None;
    }
    let moving: Vec<usize> = (0..2).filter(|&i| regions[i].has_displacement()).collect();
    let &[displaced] = moving.as_slice() else {
        return None;
    };

    let d = regions[displaced].displace().to_array();
    let mut nonzero = Axis::ALL.into_iter().filter(|a| d[a.index()] != 0.0);
    let axis = nonzero.next()?;
    if nonzero.next().is_some() {
        return None;
    }

    let a = axis.index();
    let dims = object.structure.dims();
    let n = dims[a] as f64;
    for r in regions {
        let pos = r.primitive.position.to_array();
        let size = r.primitive.size.to_array();
        if !(pos[a] == 0.0 || pos[a] > 1.0 - 1.0 / n) || size[a] >= 1.0 / n {
            return None;
        }
        for o in (0..3).filter(|&o| o != a) {
            if pos[o] != 0.0 || size[o] != 1.0 {
                return None;
            }
        }
    }

    let ws = object.workspace().to_array();
    let cross_section: f64 = (0..3).filter(|&o| o != a).map(|o| ws[o]).product();
    Some(BasicTensile {
        axis,
        displaced_region: displaced,
        cross_section,
        initial_length: ws[a] * (n - 1.0) / n,
    })
}
