//! Integration tests for voxsim-lattice.

use voxsim_lattice::generators::{block, checkerboard, layered, sphere};
use voxsim_lattice::{AuxField, BondDir, Lattice, Structure, Topology};
use voxsim_math::Axis;
use voxsim_types::{MaterialIndex, VoxelIndex};

const M1: MaterialIndex = MaterialIndex(1);
const M2: MaterialIndex = MaterialIndex(2);

// ─── Structure Tests ─────────────────────────────────────────

#[test]
fn index_round_trip_over_grid() {
    let s = Structure::new(3, 4, 5);
    for z in 0..5 {
        for y in 0..4 {
            for x in 0..3 {
                let i = s.index_of(x, y, z).unwrap();
                assert_eq!(s.coords_of(i), Some([x as usize, y as usize, z as usize]));
            }
        }
    }
    for i in 0..s.len() as u32 {
        let [x, y, z] = s.coords_of(VoxelIndex(i)).unwrap();
        assert_eq!(s.index_of(x as i64, y as i64, z as i64), Some(VoxelIndex(i)));
    }
}

#[test]
fn index_storage_order_is_x_fastest() {
    let s = Structure::new(3, 4, 5);
    assert_eq!(s.index_of(1, 0, 0), Some(VoxelIndex(1)));
    assert_eq!(s.index_of(0, 1, 0), Some(VoxelIndex(3)));
    assert_eq!(s.index_of(0, 0, 1), Some(VoxelIndex(12)));
}

#[test]
fn out_of_range_yields_sentinel() {
    let s = Structure::new(2, 2, 2);
    assert_eq!(s.index_of(-1, 0, 0), None);
    assert_eq!(s.index_of(2, 0, 0), None);
    assert_eq!(s.coords_of(VoxelIndex(8)), None);
    assert!(s.get_at(5, 5, 5).is_empty());
}

#[test]
fn set_outside_grid_errors() {
    let mut s = Structure::new(2, 2, 2);
    assert!(s.set(VoxelIndex(100), M1).is_err());
    assert!(s.set_at(0, 0, 2, M1).is_err());
}

#[test]
fn from_data_checks_length() {
    assert!(Structure::from_data([2, 2, 2], vec![0; 7]).is_err());
    assert!(Structure::from_data([2, 2, 2], vec![1; 8]).is_ok());
}

#[test]
fn resize_preserves_overlap() {
    let mut s = Structure::new(3, 3, 3);
    s.set_at(1, 1, 1, M1).unwrap();
    s.set_at(2, 2, 2, M2).unwrap();
    s.resize(2, 2, 4);
    assert_eq!(s.dims(), [2, 2, 4]);
    assert_eq!(s.get_at(1, 1, 1), M1);
    assert_eq!(s.occupied_count(), 1);
}

#[test]
fn shift_moves_voxels_and_drops_overflow() {
    let mut s = Structure::new(3, 1, 1);
    s.set_at(0, 0, 0, M1).unwrap();
    s.set_at(2, 0, 0, M2).unwrap();
    s.shift(1, 0, 0);
    assert_eq!(s.get_at(1, 0, 0), M1);
    assert!(s.get_at(0, 0, 0).is_empty());
    assert_eq!(s.occupied_count(), 1);
}

#[test]
fn replace_material_renumbers_when_requested() {
    let mut s = Structure::from_data([4, 1, 1], vec![1, 2, 3, 0]).unwrap();
    s.replace_material(MaterialIndex(2), MaterialIndex::EMPTY, true);
    assert_eq!(s.data(), &[1, 0, 2, 0]);
}

#[test]
fn aux_arrays_must_match_length() {
    let mut s = block(2, 2, 1, M1);
    assert!(s.set_aux(AuxField::Stiffness, vec![1.0; 3]).is_err());
    s.set_aux(AuxField::Stiffness, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    assert_eq!(s.aux_at(AuxField::Stiffness, VoxelIndex(2)), Some(3.0));
    assert_eq!(s.aux(AuxField::PhaseOffset), None);
}

#[test]
fn aux_tags_round_trip() {
    for f in AuxField::ALL {
        assert_eq!(AuxField::from_tag(f.tag()), Some(f));
    }
    assert_eq!(AuxField::from_tag("Nope"), None);
}

// ─── Lattice Tests ───────────────────────────────────────────

#[test]
fn cubic_workspace_matches_dims() {
    let lat = Lattice::cubic(0.001);
    let ws = lat.workspace([10, 5, 2]);
    assert!((ws.x - 0.010).abs() < 1e-12);
    assert!((ws.y - 0.005).abs() < 1e-12);
    assert!((ws.z - 0.002).abs() < 1e-12);
}

#[test]
fn cubic_position_is_cell_center() {
    let lat = Lattice::cubic(0.002);
    let p = lat.position(1, 0, 2);
    assert!((p.x - 0.003).abs() < 1e-12);
    assert!((p.y - 0.001).abs() < 1e-12);
    assert!((p.z - 0.005).abs() < 1e-12);
}

#[test]
fn line_offset_shifts_odd_rows() {
    let mut lat = Lattice::cubic(1.0);
    lat.x_line_offset = 0.5;
    let p0 = lat.position(0, 0, 0);
    let p1 = lat.position(0, 1, 0);
    assert!((p1.x - p0.x - 0.5).abs() < 1e-5);
    assert!(lat.max_offset_x(2, 1) > 0.49);
    assert!(lat.workspace([4, 2, 1]).x > 4.4);
}

#[test]
fn rectangular_adjacency_is_face_only() {
    let lat = Lattice::cubic(1.0);
    let a = lat.position(0, 0, 0);
    assert!(lat.are_adjacent(a, lat.position(1, 0, 0)));
    assert!(lat.are_adjacent(a, lat.position(0, 0, 1)));
    assert!(!lat.are_adjacent(a, lat.position(1, 1, 0)));
    assert!(!lat.are_adjacent(a, lat.position(2, 0, 0)));
}

#[test]
fn hex_lattice_is_not_rectangular() {
    assert!(Lattice::cubic(1.0).is_rectangular());
    assert!(!Lattice::hex_close_packed(1.0).is_rectangular());
}

// ─── Topology Tests ──────────────────────────────────────────

#[test]
fn block_bond_count() {
    // 3 axes * (n-1) * n * n
    let s = block(3, 3, 3, M1);
    let topo = Topology::build(&s);
    assert_eq!(topo.bond_count(), 3 * 2 * 3 * 3);
}

#[test]
fn diagonal_contact_never_bonds() {
    let mut s = Structure::new(2, 2, 1);
    s.set_at(0, 0, 0, M1).unwrap();
    s.set_at(1, 1, 0, M1).unwrap();
    assert_eq!(Topology::build(&s).bond_count(), 0);
}

#[test]
fn bond_slots_are_symmetric() {
    let s = block(2, 1, 1, M1);
    let topo = Topology::build(&s);
    assert_eq!(topo.bonds[0].axis, Axis::X);
    let a = topo.voxel_bonds[0][BondDir::PosX.slot()];
    let b = topo.voxel_bonds[1][BondDir::NegX.slot()];
    assert!(a.is_some());
    assert_eq!(a, b);
}

#[test]
fn interior_voxel_is_not_surface() {
    let s = block(3, 3, 3, M1);
    let topo = Topology::build(&s);
    let surface = topo.surface_voxels(&s);
    assert_eq!(surface.len(), 26);
    assert!(!surface.contains(&s.index_of(1, 1, 1).unwrap()));
}

// ─── Generator Tests ─────────────────────────────────────────

#[test]
fn generators_fill_expected_cells() {
    assert_eq!(block(2, 3, 4, M1).occupied_count(), 24);
    let l = layered(2, 2, 3, &[M1, M2]);
    assert_eq!(l.get_at(0, 0, 1), M2);
    assert_eq!(l.get_at(1, 1, 2), M1);
    let c = checkerboard(2, 2, 2, M1, M2);
    assert_eq!(c.count_of(M1), 4);
    let sp = sphere(2, M1);
    assert!(!sp.get_at(2, 2, 2).is_empty());
    assert!(sp.get_at(0, 0, 0).is_empty());
}
