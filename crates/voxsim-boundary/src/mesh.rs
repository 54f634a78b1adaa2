//! Closed triangle soup with inside/outside classification.

use serde::{Deserialize, Serialize};
use voxsim_math::{Aabb, DVec3};

/// Indexed triangle list. Only geometry is kept; normals and colors are
/// display concerns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TriangleSoup {
    pub vertices: Vec<DVec3>,
    pub triangles: Vec<[u32; 3]>,
}

impl TriangleSoup {
    pub fn new(vertices: Vec<DVec3>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            triangles,
        }
    }

    /// The 12-triangle unit cube `[0,1]^3`.
    pub fn unit_cube() -> Self {
        let v = |x: f64, y: f64, z: f64| DVec3::new(x, y, z);
        let vertices = vec![
            v(0.0, 0.0, 0.0),
            v(1.0, 0.0, 0.0),
            v(1.0, 1.0, 0.0),
            v(0.0, 1.0, 0.0),
            v(0.0, 0.0, 1.0),
            v(1.0, 0.0, 1.0),
            v(1.0, 1.0, 1.0),
            v(0.0, 1.0, 1.0),
        ];
        let triangles = vec![
            [0, 2, 1],
            [0, 3, 2],
            [4, 5, 6],
            [4, 6, 7],
            [0, 1, 5],
            [0, 5, 4],
            [2, 3, 7],
            [2, 7, 6],
            [1, 2, 6],
            [1, 6, 5],
            [0, 4, 7],
            [0, 7, 3],
        ];
        Self::new(vertices, triangles)
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter())
    }

    fn corners(&self, t: [u32; 3]) -> Option<[DVec3; 3]> {
        Some([
            *self.vertices.get(t[0] as usize)?,
            *self.vertices.get(t[1] as usize)?,
            *self.vertices.get(t[2] as usize)?,
        ])
    }

    /// Sorted X coordinates where the line `{y, z}` parallel to X crosses
    /// the surface.
    pub fn x_intersections(&self, y: f64, z: f64) -> Vec<f64> {
        let mut hits = Vec::new();
        for &t in &self.triangles {
            let Some([a, b, c]) = self.corners(t) else {
                continue;
            };
            if (a.y < y && b.y < y && c.y < y) || (a.y > y && b.y > y && c.y > y) {
                continue;
            }
            if (a.z < z && b.z < z && c.z < z) || (a.z > z && b.z > z && c.z > z) {
                continue;
            }
            // Barycentric coordinates of (y, z) in the triangle's YZ projection.
            let d = (b.y - a.y) * (c.z - a.z) - (c.y - a.y) * (b.z - a.z);
            if d.abs() < 1e-15 {
                continue;
            }
            let u = ((y - a.y) * (c.z - a.z) - (c.y - a.y) * (z - a.z)) / d;
            let v = ((b.y - a.y) * (z - a.z) - (y - a.y) * (b.z - a.z)) / d;
            if u < 0.0 || v < 0.0 || u + v > 1.0 {
                continue;
            }
            hits.push(a.x + u * (b.x - a.x) + v * (c.x - a.x));
        }
        hits.sort_by(f64::total_cmp);
        hits.dedup_by(|p, q| (*p - *q).abs() < 1e-12);
        hits
    }

    /// True if `p` lies inside the closed surface (odd crossing count).
    pub fn is_inside(&self, p: DVec3) -> bool {
        let crossings = self
            .x_intersections(p.y, p.z)
            .into_iter()
            .take_while(|&x| x <= p.x)
            .count();
        crossings % 2 == 1
    }
}
