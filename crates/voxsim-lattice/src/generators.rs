//! Procedural structure generators.

use voxsim_types::MaterialIndex;

use crate::structure::Structure;

/// A completely filled `x * y * z` block of one material.
pub fn block(x: usize, y: usize, z: usize, material: MaterialIndex) -> Structure {
    let mut s = Structure::new(x, y, z);
    s.fill(material);
    s
}

/// A block whose Z layers cycle through `layers` bottom to top.
pub fn layered(x: usize, y: usize, z: usize, layers: &[MaterialIndex]) -> Structure {
    let mut s = Structure::new(x, y, z);
    if layers.is_empty() {
        return s;
    }
    let per_layer = x * y;
    for k in 0..z {
        let m = layers[k % layers.len()];
        for cell in 0..per_layer {
            let _ = s.set(voxsim_types::VoxelIndex((cell + per_layer * k) as u32), m);
        }
    }
    s
}

/// A block alternating two materials in a 3D checkerboard.
pub fn checkerboard(x: usize, y: usize, z: usize, a: MaterialIndex, b: MaterialIndex) -> Structure {
    let mut s = Structure::new(x, y, z);
    for k in 0..z as i64 {
        for j in 0..y as i64 {
            for i in 0..x as i64 {
                let m = if (i + j + k) % 2 == 0 { a } else { b };
                let _ = s.set_at(i, j, k, m);
            }
        }
    }
    s
}

/// A voxelized sphere of `radius` voxels centered in its bounding grid.
pub fn sphere(radius: usize, material: MaterialIndex) -> Structure {
    let n = 2 * radius + 1;
    let mut s = Structure::new(n, n, n);
    let c = radius as f64;
    let r2 = (radius as f64 + 0.5).powi(2);
    for k in 0..n {
        for j in 0..n {
            for i in 0..n {
                let d2 = (i as f64 - c).powi(2) + (j as f64 - c).powi(2) + (k as f64 - c).powi(2);
                if d2 <= r2 {
                    let _ = s.set_at(i as i64, j as i64, k as i64, material);
                }
            }
        }
    }
    s
}
