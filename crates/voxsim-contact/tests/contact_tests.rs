//! Integration tests for voxsim-contact.

use voxsim_contact::{
    BroadPhase, CandidatePair, CollisionBody, Floor, FloorBody, NullBroadPhase, SelfCollision,
    SpatialHash,
};
use voxsim_math::DVec3;

fn resting_body(z: f64) -> FloorBody {
    FloorBody {
        position: DVec3::new(0.0, 0.0, z),
        velocity: DVec3::ZERO,
        mass: 1e-3,
        size: 0.001,
        stiffness: 1e6 * 0.001,
        critical_damping: 2.0 * (1e-3_f64 * 1e6 * 0.001).sqrt(),
        static_friction: 1.0,
        dynamic_friction: 0.5,
    }
}

fn body(x: f64) -> CollisionBody {
    CollisionBody {
        position: DVec3::new(x, 0.0, 0.0),
        velocity: DVec3::ZERO,
        mass: 1e-3,
        size: 0.001,
        elastic_modulus: 1e6,
    }
}

// ─── Floor Tests ─────────────────────────────────────────────

#[test]
fn clear_of_floor_has_no_force() {
    let floor = Floor::flat();
    let r = floor.respond(&resting_body(0.001), DVec3::ZERO, 0.5, 1e-4);
    assert!(!r.is_touching());
    assert_eq!(r.force, DVec3::ZERO);
}

#[test]
fn penetration_gives_stiffness_times_depth() {
    let floor = Floor::flat();
    let b = resting_body(0.0004);
    let r = floor.respond(&b, DVec3::ZERO, 0.0, 1e-4);
    assert!((r.penetration - 0.0001).abs() < 1e-12);
    assert!((r.force.z - b.stiffness * 0.0001).abs() < 1e-9);
}

#[test]
fn static_friction_holds_small_lateral_loads() {
    let floor = Floor::flat();
    let b = resting_body(0.0004);
    let normal = b.stiffness * 0.0001;
    let small = floor.respond(&b, DVec3::new(0.5 * normal, 0.0, 0.0), 0.0, 1e-4);
    assert!(small.static_friction);
    let large = floor.respond(&b, DVec3::new(2.0 * normal, 0.0, 0.0), 0.0, 1e-4);
    assert!(!large.static_friction);
}

#[test]
fn dynamic_friction_opposes_sliding() {
    let floor = Floor::flat();
    let mut b = resting_body(0.0004);
    b.velocity = DVec3::new(1.0, 0.0, 0.0);
    let r = floor.respond(&b, DVec3::ZERO, 0.0, 1e-6);
    assert!(r.force.x < 0.0);
    assert!(r.force.y.abs() < 1e-12);
    assert!(!r.halt_lateral);

    // A slow voxel stops within the step instead of reversing.
    b.velocity = DVec3::new(1e-9, 0.0, 0.0);
    let r = floor.respond(&b, DVec3::ZERO, 0.0, 1e-3);
    assert!(r.halt_lateral);
}

#[test]
fn sloped_floor_rises_with_x() {
    let floor = Floor::sloped(45.0);
    assert!((floor.height_at(0.002) - 0.002).abs() < 1e-12);
    let p = floor.penetration(DVec3::new(0.002, 0.0, 0.002), 0.001);
    assert!((p - 0.0005).abs() < 1e-12);
}

// ─── Broad Phase Tests ───────────────────────────────────────

#[test]
fn spatial_hash_pairs_neighbours_once() {
    let mut hash = SpatialHash::new(1.0);
    let positions = [
        DVec3::new(0.1, 0.1, 0.1),
        DVec3::new(1.2, 0.1, 0.1),
        DVec3::new(5.0, 5.0, 5.0),
    ];
    hash.update(&positions).unwrap();
    let pairs = hash.query_pairs();
    assert_eq!(pairs, vec![CandidatePair::new(0, 1)]);
    assert_eq!(hash.body_count(), 3);
    assert_eq!(hash.name(), "spatial_hash");
}

#[test]
fn null_broad_phase_is_empty() {
    let mut null = NullBroadPhase;
    null.update(&[DVec3::ZERO, DVec3::ZERO]).unwrap();
    assert!(null.query_pairs().is_empty());
}

// ─── Self-Collision Tests ────────────────────────────────────

#[test]
fn overlapping_voxels_repel_equally() {
    let mut sc = SelfCollision::new(0.001, 0.0);
    let bodies = [body(0.0), body(0.001)];
    let mut forces = vec![DVec3::ZERO; 2];
    let r = sc.accumulate(&bodies, |_, _| false, &mut forces).unwrap();
    assert_eq!(r.resolved_count, 1);
    assert!((r.max_penetration - 0.0005).abs() < 1e-12);
    assert!(forces[0].x < 0.0);
    assert!((forces[0] + forces[1]).length() < 1e-12);
    // k = E·L = 1e3 N/m over 0.5 mm.
    assert!((forces[1].x - 0.5).abs() < 1e-9);
}

#[test]
fn bonded_pairs_are_skipped() {
    let mut sc = SelfCollision::new(0.001, 0.5);
    let bodies = [body(0.0), body(0.001)];
    let mut forces = vec![DVec3::ZERO; 2];
    let r = sc.accumulate(&bodies, |_, _| true, &mut forces).unwrap();
    assert_eq!(r.resolved_count, 0);
    assert_eq!(forces[0], DVec3::ZERO);
}

#[test]
fn mismatched_force_buffer_is_rejected() {
    let mut sc = SelfCollision::new(0.001, 0.5);
    let mut forces = vec![DVec3::ZERO; 1];
    assert!(sc.accumulate(&[body(0.0), body(0.001)], |_, _| false, &mut forces).is_err());
}

#[test]
fn damping_is_clamped() {
    let mut sc = SelfCollision::new(0.001, 4.0);
    assert_eq!(sc.damping(), 1.0);
    sc.set_damping(-1.0);
    assert_eq!(sc.damping(), 0.0);
}
