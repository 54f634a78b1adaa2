//! The dynamics integrator and its run-state machine.
//!
//! ```text
//! Idle ──start──▶ Running ◀──resume── Paused
//!  ▲                │  └────pause────▶  │
//!  │                ▼                   │
//!  └─────reset──── Ended ◀────stop──────┘
//! ```
//!
//! Importing builds the voxel model (masses, bonds, constraints) and leaves
//! the simulator Idle. Kinematic buffers exist only between `start` and
//! `reset`.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use voxsim_boundary::BoundarySet;
use voxsim_contact::{CollisionBody, Floor, FloorBody, SelfCollision};
use voxsim_lattice::{BondDir, Topology};
use voxsim_material::VoxelObject;
use voxsim_math::rotation::{from_rotation_vector, integrate};
use voxsim_math::{Axis, DQuat, DVec3};
use voxsim_telemetry::{EventBus, EventKind, HistoryPoint, SimulationEvent, StatsHistory};
use voxsim_types::{Dof, VoxsimError, VoxsimResult};

use crate::bond::{Bond, BondConstants, BondContext};
use crate::config::PhysicsConfig;
use crate::features::Feature;
use crate::state::{SimMaterial, VoxelState};
use crate::stats::SimStats;
use crate::stop::{Histories, StopCondition, StopContext};

/// Bond damping used while equilibrium mode is on.
pub const EQUILIBRIUM_BOND_DAMPING: f64 = 0.1;

/// Energy events are emitted every this many steps.
const ENERGY_EVENT_STRIDE: u64 = 100;

/// Lifecycle of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Idle,
    Running,
    Paused,
    Ended,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Paused => "paused",
            RunState::Ended => "ended",
        };
        f.write_str(s)
    }
}

/// Damping settings saved when equilibrium mode takes over.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SavedDamping {
    bond_damping: f64,
    slow_damping: f64,
    velocity_clamp: bool,
}

/// Explicit dynamics simulator for one voxel object.
pub struct Simulator {
    config: PhysicsConfig,
    state: RunState,

    voxels: VoxelState,
    materials: Vec<SimMaterial>,
    bonds: Vec<Bond>,
    boundaries: BoundarySet,
    /// Simulated voxels touched by each boundary region.
    region_voxels: Vec<Vec<u32>>,
    collision: Option<SelfCollision>,
    collision_forces: Vec<DVec3>,

    dt: f64,
    max_stable_dt: f64,
    time: f64,
    step: u64,
    input_scale: f64,
    motion_zeroed: bool,

    stats: SimStats,
    histories: Histories,
    stats_history: StatsHistory,
    bus: Option<EventBus>,
    saved_damping: Option<SavedDamping>,
}

impl Simulator {
    /// An Idle simulator with no object loaded.
    pub fn new(config: PhysicsConfig) -> Self {
        let mut features = config.features.clone();
        let equilibrium = features.disable(Feature::Equilibrium);
        let mut sim = Self {
            config: PhysicsConfig {
                features,
                ..config.clamped()
            },
            state: RunState::Idle,
            voxels: VoxelState::default(),
            materials: Vec::new(),
            bonds: Vec::new(),
            boundaries: BoundarySet::new(),
            region_voxels: Vec::new(),
            collision: None,
            collision_forces: Vec::new(),
            dt: 0.0,
            max_stable_dt: 0.0,
            time: 0.0,
            step: 0,
            input_scale: 1.0,
            motion_zeroed: false,
            stats: SimStats::default(),
            histories: Histories::new(),
            stats_history: StatsHistory::default(),
            bus: None,
            saved_damping: None,
        };
        if equilibrium {
            sim.set_feature(Feature::Equilibrium, true);
        }
        sim
    }

    /// Builds the voxel model for `object` under `boundaries`.
    ///
    /// Fails on an object with no occupied voxels, on any voxel whose
    /// material does not resolve to a leaf, or while a run is in progress.
    pub fn import(&mut self, object: &VoxelObject, boundaries: &BoundarySet) -> VoxsimResult<()> {
        if matches!(self.state, RunState::Running | RunState::Paused) {
            return Err(VoxsimError::InvalidState(format!(
                "cannot import while {}",
                self.state
            )));
        }
        if object.voxel_count() == 0 {
            return Err(VoxsimError::InvalidState(
                "object has no voxels to simulate".into(),
            ));
        }

        let topology = Topology::build(&object.structure);
        let constraints = boundaries.assign(&object.structure, &object.lattice);
        let (voxels, materials) = VoxelState::build(object, &constraints, &topology)?;

        let mut bonds = Vec::with_capacity(topology.bond_count());
        for pair in &topology.bonds {
            let (Some(a), Some(b)) = (voxels.sim_index(pair.neg), voxels.sim_index(pair.pos)) else {
                continue;
            };
            let ma = &materials[voxels.material[a.index()]];
            let mb = &materials[voxels.material[b.index()]];
            let (ea, eb) = (voxels.elastic_modulus[a.index()], voxels.elastic_modulus[b.index()]);
            let constants = BondConstants::new(
                ea,
                ma.poissons_ratio,
                ma.cte,
                eb,
                mb.poissons_ratio,
                mb.cte,
                ma.index == mb.index,
                voxels.nominal_size,
            );
            bonds.push(Bond::new(a.0, b.0, pair.axis, constants));
        }

        let region_voxels = (0..boundaries.len())
            .map(|ri| {
                boundaries
                    .touching(ri, &object.structure, &object.lattice)
                    .into_iter()
                    .filter_map(|vi| voxels.sim_index(vi).map(|s| s.0))
                    .collect()
            })
            .collect();

        let loose = boundaries.disconnected(&object.structure, &object.lattice);
        if !boundaries.is_empty() && !loose.is_empty() {
            warn!(voxels = loose.len(), "voxels not connected to a fixed region");
        }

        self.voxels = voxels;
        self.materials = materials;
        self.bonds = bonds;
        self.boundaries = boundaries.clone();
        self.region_voxels = region_voxels;
        self.collision_forces = vec![DVec3::ZERO; self.voxels.count];
        self.max_stable_dt = self.compute_max_stable_dt();
        self.dt = self.config.dt_frac * self.max_stable_dt;
        self.rebuild_collision();
        self.transition(RunState::Idle);
        self.voxels.release();

        info!(
            voxels = self.voxels.count,
            bonds = self.bonds.len(),
            materials = self.materials.len(),
            dt = self.dt,
            "simulation imported"
        );
        Ok(())
    }

    // ─── Run control ─────────────────────────────────────────

    /// Idle → Running allocates fresh kinematics; Paused → Running resumes.
    pub fn start(&mut self) -> VoxsimResult<()> {
        match self.state {
            RunState::Running => Ok(()),
            RunState::Paused => {
                self.transition(RunState::Running);
                Ok(())
            }
            RunState::Idle => {
                if self.voxels.count == 0 {
                    return Err(VoxsimError::InvalidState("no object imported".into()));
                }
                self.voxels.reset();
                for b in &mut self.bonds {
                    b.reset();
                }
                self.time = 0.0;
                self.step = 0;
                self.histories.clear();
                self.stats_history.clear();
                if self.config.features.is_enabled(Feature::LockCenterOfMass) {
                    let anchored = self.anchored_axes();
                    if anchored.iter().any(|&a| a) {
                        warn!(
                            ?anchored,
                            "translation constraints anchor the centre of mass on some axes"
                        );
                    }
                }
                self.stats = SimStats::compute(&self.voxels, &self.bonds);
                self.transition(RunState::Running);
                Ok(())
            }
            RunState::Ended => Err(VoxsimError::InvalidState(
                "run has ended; reset before starting again".into(),
            )),
        }
    }

    pub fn pause(&mut self) -> VoxsimResult<()> {
        match self.state {
            RunState::Running => {
                self.transition(RunState::Paused);
                Ok(())
            }
            RunState::Paused => Ok(()),
            s => Err(VoxsimError::InvalidState(format!("cannot pause while {s}"))),
        }
    }

    pub fn resume(&mut self) -> VoxsimResult<()> {
        match self.state {
            RunState::Paused => {
                self.transition(RunState::Running);
                Ok(())
            }
            RunState::Running => Ok(()),
            s => Err(VoxsimError::InvalidState(format!("cannot resume while {s}"))),
        }
    }

    /// Ends the run, keeping the final kinematic state for inspection.
    pub fn stop(&mut self) {
        if matches!(self.state, RunState::Running | RunState::Paused) {
            self.transition(RunState::Ended);
        }
    }

    /// Drops kinematic state and returns to Idle. The imported model stays.
    pub fn reset(&mut self) {
        self.voxels.release();
        self.time = 0.0;
        self.step = 0;
        self.histories.clear();
        self.stats = SimStats::default();
        self.motion_zeroed = false;
        self.transition(RunState::Idle);
        info!("simulation reset");
    }

    /// Runs until the stop condition is met, `max_steps` have been taken,
    /// or the run is otherwise ended. Starts the run if Idle.
    ///
    /// Returns the number of steps taken.
    pub fn run_until_stop(&mut self, max_steps: Option<u64>) -> VoxsimResult<u64> {
        if self.state != RunState::Running {
            self.start()?;
        }
        let mut taken = 0;
        while self.state == RunState::Running {
            if max_steps.is_some_and(|m| taken >= m) {
                break;
            }
            self.step()?;
            taken += 1;
        }
        self.flush_events();
        Ok(taken)
    }

    // ─── Stepping ────────────────────────────────────────────

    /// Advances one step. Returns true if the stop condition was reached.
    pub fn step(&mut self) -> VoxsimResult<bool> {
        if self.state != RunState::Running {
            return Err(VoxsimError::InvalidState(format!(
                "cannot step while {}",
                self.state
            )));
        }
        let f = &self.config.features;
        let temperature = f.is_enabled(Feature::Temperature);
        let ctx = BondContext {
            dt: self.dt,
            bond_damping: self.config.bond_damping,
            plasticity: f.is_enabled(Feature::Plasticity),
            failure: f.is_enabled(Feature::Failure),
            volume_effects: f.is_enabled(Feature::VolumeEffects),
            temperature,
        };
        let broken_before = self.stats.broken_bonds;

        self.update_temperature(temperature);

        for b in &mut self.bonds {
            b.update(&self.voxels, &self.materials, &ctx);
        }
        self.update_voxel_strains(ctx.volume_effects);
        self.update_collisions()?;
        self.integrate_voxels(&ctx);

        if self.config.features.is_enabled(Feature::LockCenterOfMass) {
            self.lock_center_of_mass();
        }

        self.time += self.dt;
        self.step += 1;
        self.stats = SimStats::compute(&self.voxels, &self.bonds);
        self.record_history();

        self.motion_zeroed =
            self.config.features.is_enabled(Feature::Equilibrium)
                && self.histories.kinetic_energy_decreasing();
        if self.motion_zeroed {
            self.voxels.zero_motion();
        }

        self.emit_step_events(broken_before);
        Ok(self.check_stop())
    }

    fn update_temperature(&mut self, enabled: bool) {
        let v = &mut self.voxels;
        if !enabled {
            for i in 0..v.count {
                v.scale[i] = v.nominal_size;
                v.delta_temp[i] = 0.0;
            }
            return;
        }
        let env = self.config.environment;
        let varying = self.config.features.is_enabled(Feature::VaryTemperature);
        for i in 0..v.count {
            let m = &self.materials[v.material[i]];
            let t = env.temperature(self.time, v.temp_phase[i], varying);
            let dt = t - env.base_temp;
            v.delta_temp[i] = dt;
            v.scale[i] = v.nominal_size * (1.0 + m.cte * dt);
        }
    }

    /// Averages bond strains onto voxels and, with volume effects, writes
    /// lateral strains and cross sections back to the bonds.
    fn update_voxel_strains(&mut self, volume_effects: bool) {
        let v = &mut self.voxels;
        let bonds = &mut self.bonds;
        let nominal_area = v.nominal_size * v.nominal_size;

        for i in 0..v.count {
            let slots = v.bonds[i];
            let mut strain = [0.0; 3];
            let mut present = [false; 3];
            for axis in Axis::ALL {
                let (pos, neg) = match axis {
                    Axis::X => (BondDir::PosX, BondDir::NegX),
                    Axis::Y => (BondDir::PosY, BondDir::NegY),
                    Axis::Z => (BondDir::PosZ, BondDir::NegZ),
                };
                let read = |dir: BondDir| {
                    slots[dir.slot()]
                        .map(|id| &bonds[id as usize])
                        .filter(|b| !b.broken)
                        .map(|b| b.strain_for(i as u32))
                };
                let a = axis.index();
                match (read(pos), read(neg)) {
                    (Some(p), Some(n)) => {
                        strain[a] = 0.5 * (p + n);
                        present[a] = true;
                    }
                    (Some(s), None) | (None, Some(s)) => {
                        strain[a] = s;
                        present[a] = true;
                    }
                    (None, None) => {}
                }
            }

            let nu = self.materials[v.material[i]].poissons_ratio;
            if volume_effects {
                fill_lateral_strains(&mut strain, present, nu);
            } else if !present.iter().any(|&p| p) {
                strain = [0.0; 3];
            }
            let e = DVec3::from_array(strain);
            v.strain[i] = e;

            let d = 1.0 - 2.0 * nu;
            v.pressure[i] = if d > 0.0 {
                -v.elastic_modulus[i] * (e.x + e.y + e.z) / (3.0 * d)
            } else {
                0.0
            };

            for dir in BondDir::ALL {
                let Some(id) = slots[dir.slot()] else {
                    continue;
                };
                let b = &mut bonds[id as usize];
                let (lateral, area) = if volume_effects {
                    match dir.axis() {
                        Axis::X => (e.y + e.z, (1.0 + e.y) * (1.0 + e.z) * nominal_area),
                        Axis::Y => (e.x + e.z, (1.0 + e.x) * (1.0 + e.z) * nominal_area),
                        Axis::Z => (e.x + e.y, (1.0 + e.x) * (1.0 + e.y) * nominal_area),
                    }
                } else {
                    (0.0, nominal_area)
                };
                if b.v1 == i as u32 {
                    b.lateral_strain1 = lateral;
                    b.cs_area1 = area;
                } else {
                    b.lateral_strain2 = lateral;
                    b.cs_area2 = area;
                }
            }
        }
    }

    fn update_collisions(&mut self) -> VoxsimResult<()> {
        for f in &mut self.collision_forces {
            *f = DVec3::ZERO;
        }
        let Some(collision) = self.collision.as_mut() else {
            return Ok(());
        };
        let v = &self.voxels;
        let bodies: Vec<CollisionBody> = (0..v.count)
            .map(|i| CollisionBody {
                position: v.pos[i],
                velocity: v.vel[i],
                mass: v.mass[i],
                size: v.scale[i],
                elastic_modulus: v.elastic_modulus[i],
            })
            .collect();
        let bonds = &self.bonds;
        let bonded = |a: u32, b: u32| {
            v.bonds[a as usize].iter().flatten().any(|&id| {
                let bond = &bonds[id as usize];
                !bond.broken && (bond.v1 == b || bond.v2 == b)
            })
        };
        collision.accumulate(&bodies, bonded, &mut self.collision_forces)?;
        Ok(())
    }

    fn integrate_voxels(&mut self, ctx: &BondContext) {
        let f = &self.config.features;
        let gravity = f.is_enabled(Feature::Gravity);
        let floor = f
            .is_enabled(Feature::Floor)
            .then(|| Floor::sloped(self.config.environment.floor_slope));
        let clamp = f.is_enabled(Feature::VelocityClamp);
        let g = self.config.environment.gravity_accel;
        let slow = self.config.slow_damping;
        let coll_damping = self.config.collision_damping;
        let max_step = self.config.max_velocity_limit * self.voxels.nominal_size;
        let scale_in = self.input_scale;
        let dt = self.dt;

        let v = &mut self.voxels;
        let bonds = &self.bonds;

        for i in 0..v.count {
            let c = v.constraint[i];
            let old = v.pos[i];

            // Internal loads, gathered for fully fixed voxels too so that
            // reaction forces can be read back.
            let mut force = DVec3::ZERO;
            let mut moment = DVec3::ZERO;
            for id in v.bonds[i].iter().flatten() {
                let b = &bonds[*id as usize];
                if b.broken {
                    continue;
                }
                if b.v1 == i as u32 {
                    force += b.force1;
                    moment -= b.moment1;
                } else {
                    force += b.force2;
                    moment -= b.moment2;
                }
            }

            if c.dof.is_all_fixed() && !ctx.volume_effects {
                v.force[i] = force;
                v.moment[i] = moment;
                v.pos[i] = v.nominal_pos[i] + c.displace * scale_in;
                v.orientation[i] = from_rotation_vector(c.ang_displace * scale_in);
                v.lin_mom[i] = DVec3::ZERO;
                v.ang_mom[i] = DVec3::ZERO;
                v.vel[i] = DVec3::ZERO;
                v.ang_vel[i] = DVec3::ZERO;
                v.kinetic_energy[i] = 0.0;
                v.static_friction[i] = false;
                v.touching_floor[i] = false;
                v.last_move[i] = (v.pos[i] - old).length();
                continue;
            }

            // ─── Translation ───
            let (m, inertia) = (v.mass[i], v.inertia[i]);
            force -= v.vel[i] * (slow * v.translational_damping(i));
            force += self.collision_forces[i];
            if gravity {
                force.z += m * g;
            }
            force += c.force * scale_in;

            v.static_friction[i] = false;
            v.touching_floor[i] = false;
            if let Some(floor) = &floor {
                let mat = &self.materials[v.material[i]];
                let body = FloorBody {
                    position: v.pos[i],
                    velocity: v.vel[i],
                    mass: m,
                    size: v.scale[i],
                    stiffness: v.elastic_modulus[i] * v.nominal_size,
                    critical_damping: v.translational_damping(i),
                    static_friction: mat.static_friction,
                    dynamic_friction: mat.dynamic_friction,
                };
                let r = floor.respond(&body, force, coll_damping, dt);
                if r.is_touching() {
                    v.touching_floor[i] = true;
                    force += r.force;
                    if r.static_friction {
                        force.x = 0.0;
                        force.y = 0.0;
                        v.static_friction[i] = true;
                    }
                    if r.halt_lateral {
                        v.lin_mom[i].x = 0.0;
                        v.lin_mom[i].y = 0.0;
                    }
                }
            }
            v.force[i] = force;

            v.lin_mom[i] += force * dt;
            let mut disp = if m > 0.0 { v.lin_mom[i] * (dt / m) } else { DVec3::ZERO };
            if clamp {
                let len = disp.length();
                if len > max_step {
                    disp *= max_step / len;
                }
            }
            v.pos[i] += disp;
            for dof in [Dof::X, Dof::Y, Dof::Z] {
                if c.dof.is_fixed(dof) {
                    let a = dof.axis();
                    v.pos[i][a] = v.nominal_pos[i][a] + scale_in * c.displace[a];
                    v.lin_mom[i][a] = 0.0;
                }
            }

            // ─── Rotation ───
            moment += c.torque * scale_in;
            for dof in [Dof::Tx, Dof::Ty, Dof::Tz] {
                if c.dof.is_fixed(dof) {
                    moment[dof.axis()] = 0.0;
                }
            }
            v.moment[i] = moment;

            v.ang_mom[i] += moment * dt;
            if ctx.volume_effects {
                v.ang_mom[i] /= 1.01;
            } else if inertia > 0.0 {
                let k = 1.0 - 10.0 * slow * v.rotational_damping(i) * dt / inertia;
                v.ang_mom[i] *= k.max(0.0);
            }
            if inertia > 0.0 {
                v.orientation[i] = integrate(v.orientation[i], v.ang_mom[i] / inertia, dt);
            }
            if c.dof.is_rotation_fixed() {
                v.orientation[i] = from_rotation_vector(c.ang_displace * scale_in);
                v.ang_mom[i] = DVec3::ZERO;
            }

            // ─── Derived ───
            v.vel[i] = if m > 0.0 { v.lin_mom[i] / m } else { DVec3::ZERO };
            v.ang_vel[i] = if inertia > 0.0 { v.ang_mom[i] / inertia } else { DVec3::ZERO };
            v.kinetic_energy[i] =
                0.5 * m * v.vel[i].length_squared() + 0.5 * inertia * v.ang_vel[i].length_squared();
            v.last_move[i] = (v.pos[i] - old).length();
        }
    }

    /// Per axis, whether some voxel has that translation fixed.
    fn anchored_axes(&self) -> [bool; 3] {
        let mut anchored = [false; 3];
        for c in &self.voxels.constraint {
            for (axis, dof) in [Dof::X, Dof::Y, Dof::Z].into_iter().enumerate() {
                anchored[axis] |= c.dof.is_fixed(dof);
            }
        }
        anchored
    }

    /// Translates the whole body so its centre of mass sits at the origin.
    ///
    /// Axes anchored by a translation constraint are left alone, so the
    /// shift is rigid and never strains a bond.
    fn lock_center_of_mass(&mut self) {
        let anchored = self.anchored_axes();
        let com = self.voxels.center_of_mass();
        let mut shift = -com;
        for (axis, &fixed) in anchored.iter().enumerate() {
            if fixed {
                shift[axis] = 0.0;
            }
        }
        if shift == DVec3::ZERO {
            return;
        }
        for p in &mut self.voxels.pos {
            *p += shift;
        }
    }

    fn record_history(&mut self) {
        let s = &self.stats;
        self.histories
            .push(s.total_kinetic_energy, s.total_energy(), s.max_move);
        self.stats_history.push(HistoryPoint {
            step: self.step,
            time: self.time,
            kinetic_energy: s.total_kinetic_energy,
            strain_energy: s.total_strain_energy,
            max_move: s.max_move,
            max_velocity: s.max_voxel_velocity,
            center_of_mass: s.center_of_mass.to_array(),
        });
    }

    /// Evaluates `stop` against the current histories without ending the run.
    pub fn is_stop_met(&self, stop: StopCondition) -> bool {
        let features = &self.config.features;
        let varying = features.is_enabled(Feature::Temperature)
            && features.is_enabled(Feature::VaryTemperature);
        let ctx = StopContext {
            step: self.step,
            time: self.time,
            temp_period: varying.then_some(self.config.environment.temp_period),
            voxel_count: self.voxels.count,
            histories: &self.histories,
        };
        stop.is_met(&ctx)
    }

    fn check_stop(&mut self) -> bool {
        let stop = self.config.stop;
        if !self.is_stop_met(stop) {
            return false;
        }
        info!(
            condition = %stop.kind,
            value = stop.value,
            step = self.step,
            time = self.time,
            "stop condition reached"
        );
        self.emit(EventKind::StopConditionReached {
            condition: stop.kind.to_string(),
            value: stop.value,
        });
        self.transition(RunState::Ended);
        true
    }

    // ─── Configuration ───────────────────────────────────────

    /// Enables or disables a feature.
    ///
    /// Equilibrium mode saves the current bond damping, slow damping and
    /// velocity clamp, replaces them, and restores them when turned off.
    pub fn set_feature(&mut self, feature: Feature, enabled: bool) {
        let changed = self.config.features.set(feature, enabled);
        if !changed {
            return;
        }
        debug!(feature = %feature, enabled, "feature toggled");
        match feature {
            Feature::Equilibrium if enabled => {
                self.saved_damping = Some(SavedDamping {
                    bond_damping: self.config.bond_damping,
                    slow_damping: self.config.slow_damping,
                    velocity_clamp: self.config.features.is_enabled(Feature::VelocityClamp),
                });
                self.config.bond_damping = EQUILIBRIUM_BOND_DAMPING;
                self.config.slow_damping = 0.0;
                self.config.features.disable(Feature::VelocityClamp);
            }
            Feature::Equilibrium => {
                if let Some(saved) = self.saved_damping.take() {
                    self.config.bond_damping = saved.bond_damping;
                    self.config.slow_damping = saved.slow_damping;
                    self.config.features.set(Feature::VelocityClamp, saved.velocity_clamp);
                }
            }
            Feature::SelfCollision => self.rebuild_collision(),
            _ => {}
        }
    }

    /// Sets a feature by name.
    pub fn set_feature_named(&mut self, name: &str, enabled: bool) -> VoxsimResult<()> {
        let feature: Feature = name.parse()?;
        self.set_feature(feature, enabled);
        Ok(())
    }

    pub fn is_feature_enabled(&self, feature: Feature) -> bool {
        self.config.features.is_enabled(feature)
    }

    pub fn set_stop_condition(&mut self, stop: StopCondition) {
        debug!(kind = %stop.kind, value = stop.value, "stop condition set");
        self.config.stop = stop;
    }

    pub fn stop_condition(&self) -> StopCondition {
        self.config.stop
    }

    /// Bond damping, clamped to [0, 1].
    pub fn set_bond_damping(&mut self, z: f64) {
        self.config.bond_damping = z;
        self.config = self.config.clamped();
    }

    /// Slow damping, clamped to [0, 1].
    pub fn set_slow_damping(&mut self, z: f64) {
        self.config.slow_damping = z;
        self.config = self.config.clamped();
    }

    /// Collision damping, clamped to [0, 1].
    pub fn set_collision_damping(&mut self, z: f64) {
        self.config.collision_damping = z;
        self.config = self.config.clamped();
        if let Some(c) = self.collision.as_mut() {
            c.set_damping(self.config.collision_damping);
        }
    }

    /// Fraction of the stable time step, clamped to (0, 1].
    pub fn set_dt_frac(&mut self, frac: f64) {
        self.config.dt_frac = frac;
        self.config = self.config.clamped();
        self.dt = self.config.dt_frac * self.max_stable_dt;
    }

    /// Scales every prescribed displacement, force and torque.
    pub fn set_input_scale(&mut self, scale: f64) {
        self.input_scale = if scale.is_finite() { scale } else { 1.0 };
    }

    pub fn input_scale(&self) -> f64 {
        self.input_scale
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    fn rebuild_collision(&mut self) {
        if !self.config.features.is_enabled(Feature::SelfCollision) || self.voxels.count == 0 {
            self.collision = None;
            return;
        }
        self.collision = Some(SelfCollision::new(
            self.voxels.nominal_size,
            self.config.collision_damping,
        ));
    }

    fn compute_max_stable_dt(&self) -> f64 {
        let v = &self.voxels;
        let mut dt = f64::INFINITY;
        for b in &self.bonds {
            dt = dt.min(b.max_stable_dt(v.mass[b.v1 as usize], v.mass[b.v2 as usize]));
        }
        // Unbonded voxels still need a stable floor contact.
        for i in 0..v.count {
            let k = v.elastic_modulus[i] * v.nominal_size;
            if k > 0.0 && v.mass[i] > 0.0 {
                dt = dt.min(1.0 / (2.0 * std::f64::consts::PI * (k / v.mass[i]).sqrt()));
            }
        }
        if dt.is_finite() {
            dt
        } else {
            0.0
        }
    }

    // ─── Queries ─────────────────────────────────────────────

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Largest stable step before `dt_frac` is applied.
    pub fn max_stable_dt(&self) -> f64 {
        self.max_stable_dt
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn step_count(&self) -> u64 {
        self.step
    }

    /// True if equilibrium mode zeroed all motion on the last step.
    pub fn motion_zeroed(&self) -> bool {
        self.motion_zeroed
    }

    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    pub fn histories(&self) -> &Histories {
        &self.histories
    }

    /// Shared handle to the bounded statistics history.
    pub fn stats_history(&self) -> StatsHistory {
        self.stats_history.clone()
    }

    pub fn voxels(&self) -> &VoxelState {
        &self.voxels
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn materials(&self) -> &[SimMaterial] {
        &self.materials
    }

    pub fn boundaries(&self) -> &BoundarySet {
        &self.boundaries
    }

    pub fn voxel_count(&self) -> usize {
        self.voxels.count
    }

    pub fn broken_bond_count(&self) -> usize {
        self.bonds.iter().filter(|b| b.broken).count()
    }

    pub fn yielded_bond_count(&self) -> usize {
        self.bonds.iter().filter(|b| b.yielded).count()
    }

    /// Simulated voxels touched by boundary region `region`.
    pub fn region_voxels(&self, region: usize) -> &[u32] {
        self.region_voxels.get(region).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Sum of the forces acting on the voxels of `region`.
    pub fn sum_force(&self, region: usize) -> VoxsimResult<DVec3> {
        let voxels = self.region_checked(region)?;
        if !self.voxels.is_allocated() {
            return Ok(DVec3::ZERO);
        }
        Ok(voxels.iter().map(|&i| self.voxels.force[i as usize]).sum())
    }

    /// [`Self::sum_force`] projected on the region's prescribed
    /// displacement direction, or its force direction if it has none.
    pub fn sum_force_dir(&self, region: usize) -> VoxsimResult<f64> {
        let total = self.sum_force(region)?;
        let Some(r) = self.boundaries.get(region) else {
            return Ok(0.0);
        };
        let dir = if r.displace().length_squared() > 0.0 {
            r.displace().normalize()
        } else if r.force().length_squared() > 0.0 {
            r.force().normalize()
        } else {
            return Ok(total.length());
        };
        Ok(total.dot(dir))
    }

    /// Mean displacement of the voxels of `region`.
    pub fn average_displacement(&self, region: usize) -> VoxsimResult<DVec3> {
        let voxels = self.region_checked(region)?;
        if voxels.is_empty() || !self.voxels.is_allocated() {
            return Ok(DVec3::ZERO);
        }
        let sum: DVec3 = voxels.iter().map(|&i| self.voxels.displacement(i as usize)).sum();
        Ok(sum / voxels.len() as f64)
    }

    fn region_checked(&self, region: usize) -> VoxsimResult<&[u32]> {
        self.region_voxels
            .get(region)
            .map(|v| v.as_slice())
            .ok_or_else(|| {
                VoxsimError::Validation(format!(
                    "boundary region {region} out of range ({} regions)",
                    self.region_voxels.len()
                ))
            })
    }

    pub fn center_of_mass(&self) -> DVec3 {
        if self.voxels.is_allocated() {
            self.voxels.center_of_mass()
        } else {
            DVec3::ZERO
        }
    }

    pub fn positions(&self) -> &[DVec3] {
        &self.voxels.pos
    }

    pub fn orientations(&self) -> &[DQuat] {
        &self.voxels.orientation
    }

    pub fn velocities(&self) -> &[DVec3] {
        &self.voxels.vel
    }

    /// Zeros every voxel's momentum, keeping its pose.
    pub fn zero_all_motion(&mut self) {
        if self.voxels.is_allocated() {
            self.voxels.zero_motion();
        }
    }

    pub fn clear_histories(&mut self) {
        self.histories.clear();
        self.stats_history.clear();
    }

    // ─── Telemetry ───────────────────────────────────────────

    pub fn attach_bus(&mut self, bus: EventBus) {
        self.bus = Some(bus);
    }

    pub fn detach_bus(&mut self) -> Option<EventBus> {
        self.bus.take()
    }

    pub fn bus_mut(&mut self) -> Option<&mut EventBus> {
        self.bus.as_mut()
    }

    /// Delivers pending events to the bus sinks.
    pub fn flush_events(&mut self) {
        if let Some(bus) = self.bus.as_mut() {
            bus.flush();
        }
    }

    fn emit(&self, kind: EventKind) {
        if let Some(bus) = &self.bus {
            bus.emit(SimulationEvent::new(self.step, kind));
        }
    }

    fn emit_step_events(&self, broken_before: usize) {
        if self.bus.is_none() {
            return;
        }
        self.emit(EventKind::StepCompleted {
            sim_time: self.time,
            dt: self.dt,
        });
        if self.step % ENERGY_EVENT_STRIDE == 0 {
            self.emit(EventKind::Energy {
                kinetic: self.stats.total_kinetic_energy,
                strain: self.stats.total_strain_energy,
            });
        }
        if self.stats.broken_bonds > broken_before {
            self.emit(EventKind::BondFailure {
                broken: (self.stats.broken_bonds - broken_before) as u32,
            });
        }
    }

    fn transition(&mut self, to: RunState) {
        if self.state == to {
            return;
        }
        let from = self.state;
        self.state = to;
        debug!(%from, %to, "run state changed");
        self.emit(EventKind::StateChanged {
            from: from.to_string(),
            to: to.to_string(),
        });
    }
}

/// Fills strains on unbonded axes from the bonded ones through Poisson's ratio.
fn fill_lateral_strains(e: &mut [f64; 3], present: [bool; 3], nu: f64) {
    let lateral = |s: f64| (1.0 + s).powf(-nu) - 1.0;
    match present {
        [false, false, false] => *e = [0.0; 3],
        [false, true, true] => e[0] = lateral(e[1] + e[2]),
        [true, false, true] => e[1] = lateral(e[0] + e[2]),
        [true, true, false] => e[2] = lateral(e[0] + e[1]),
        [false, false, true] => {
            e[0] = lateral(e[2]);
            e[1] = e[0];
        }
        [false, true, false] => {
            e[0] = lateral(e[1]);
            e[2] = e[0];
        }
        [true, false, false] => {
            e[1] = lateral(e[0]);
            e[2] = e[1];
        }
        [true, true, true] => {}
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}
