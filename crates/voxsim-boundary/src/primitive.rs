//! Region primitives.
//!
//! Position, size and radius are stored as fractions of the workspace
//! envelope. Every test receives the envelope and converts on the fly.

use serde::{Deserialize, Serialize};
use voxsim_math::DVec3;

use crate::mesh::TriangleSoup;

/// Default fractional extent of a newly created primitive.
const DEFAULT_EXTENT: f64 = 0.001;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Box,
    /// Axis is the first nonzero component of `size`.
    Cylinder,
    Sphere,
    Mesh(TriangleSoup),
}

impl PrimitiveKind {
    /// Numeric tag used in documents.
    pub fn code(&self) -> i32 {
        match self {
            PrimitiveKind::Box => 0,
            PrimitiveKind::Cylinder => 1,
            PrimitiveKind::Sphere => 2,
            PrimitiveKind::Mesh(_) => 3,
        }
    }
}

/// A shape in envelope-fraction coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    pub kind: PrimitiveKind,
    /// Minimum corner (box, mesh), axis start (cylinder) or center (sphere).
    pub position: DVec3,
    pub size: DVec3,
    /// Radius as a fraction of the largest envelope dimension.
    pub radius: f64,
}

impl Primitive {
    pub fn new_box(position: DVec3, size: DVec3) -> Self {
        Self {
            kind: PrimitiveKind::Box,
            position,
            size,
            radius: 0.0,
        }
    }

    pub fn cylinder(position: DVec3, size: DVec3, radius: f64) -> Self {
        Self {
            kind: PrimitiveKind::Cylinder,
            position,
            size,
            radius,
        }
    }

    pub fn sphere(center: DVec3, radius: f64) -> Self {
        Self {
            kind: PrimitiveKind::Sphere,
            position: center,
            size: DVec3::ZERO,
            radius,
        }
    }

    /// Fits `mesh` (uniformly scaled) into the box at `position`/`size`.
    pub fn mesh(mesh: TriangleSoup, position: DVec3, size: DVec3) -> Self {
        Self {
            kind: PrimitiveKind::Mesh(mesh),
            position,
            size,
            radius: 0.0,
        }
    }

    /// A default-sized primitive of the given document code.
    pub fn default_for_code(code: i32) -> Self {
        let ext = DVec3::splat(DEFAULT_EXTENT);
        match code {
            1 => Self::cylinder(DVec3::ZERO, DVec3::new(0.0, 0.0, DEFAULT_EXTENT), DEFAULT_EXTENT),
            2 => Self::sphere(DVec3::ZERO, DEFAULT_EXTENT),
            3 => Self::mesh(TriangleSoup::default(), DVec3::ZERO, ext),
            _ => Self::new_box(DVec3::ZERO, ext),
        }
    }

    /// Whether the physical point `p` lies strictly inside.
    pub fn is_in(&self, p: DVec3, envelope: DVec3) -> bool {
        match &self.kind {
            PrimitiveKind::Box => {
                let ps = p / envelope;
                let lo = self.position;
                let hi = self.position + self.size;
                ps.x > lo.x
                    && ps.x < hi.x
                    && ps.y > lo.y
                    && ps.y < hi.y
                    && ps.z > lo.z
                    && ps.z < hi.z
            }
            PrimitiveKind::Cylinder => self.in_cylinder(p, envelope, 0.0),
            PrimitiveKind::Sphere => {
                let c = self.position * envelope;
                p.distance(c) < self.radius * envelope.max_element()
            }
            PrimitiveKind::Mesh(mesh) => self.in_mesh(mesh, p, envelope),
        }
    }

    /// Whether a sphere of physical radius `dist` around `p` overlaps the region.
    pub fn is_touching(&self, p: DVec3, dist: f64, envelope: DVec3) -> bool {
        match &self.kind {
            PrimitiveKind::Box => {
                let lo = self.position * envelope;
                let hi = lo + self.size * envelope;
                p.x + dist > lo.x
                    && p.x - dist < hi.x
                    && p.y + dist > lo.y
                    && p.y - dist < hi.y
                    && p.z + dist > lo.z
                    && p.z - dist < hi.z
            }
            PrimitiveKind::Cylinder => self.in_cylinder(p, envelope, dist),
            PrimitiveKind::Sphere => {
                let c = self.position * envelope;
                p.distance(c) < self.radius * envelope.max_element() + dist
            }
            PrimitiveKind::Mesh(mesh) => self.in_mesh(mesh, p, envelope),
        }
    }

    /// Like [`Primitive::is_touching`] with a per-axis half extent.
    pub fn is_touching_box(&self, p: DVec3, half: DVec3, envelope: DVec3) -> bool {
        match &self.kind {
            PrimitiveKind::Box => {
                let ps = p / envelope;
                let ds = half / envelope;
                let lo = self.position;
                let hi = self.position + self.size;
                ps.x + ds.x > lo.x
                    && ps.x - ds.x < hi.x
                    && ps.y + ds.y > lo.y
                    && ps.y - ds.y < hi.y
                    && ps.z + ds.z > lo.z
                    && ps.z - ds.z < hi.z
            }
            PrimitiveKind::Sphere => self.is_touching(p, half.length(), envelope),
            PrimitiveKind::Cylinder => self.in_cylinder(p, envelope, 0.0),
            PrimitiveKind::Mesh(mesh) => self.in_mesh(mesh, p, envelope),
        }
    }

    fn in_cylinder(&self, p: DVec3, envelope: DVec3, dist: f64) -> bool {
        let pos = self.position * envelope;
        let size = self.size * envelope;
        let rad = self.radius * envelope.max_element() + dist;
        let (along, lo, len, a, b, ca, cb) = if self.size.x != 0.0 {
            (p.x, pos.x, size.x, p.y, p.z, pos.y, pos.z)
        } else if self.size.y != 0.0 {
            (p.y, pos.y, size.y, p.x, p.z, pos.x, pos.z)
        } else if self.size.z != 0.0 {
            (p.z, pos.z, size.z, p.x, p.y, pos.x, pos.y)
        } else {
            return false;
        };
        let (lo, hi) = if len >= 0.0 { (lo, lo + len) } else { (lo + len, lo) };
        along > lo - dist
            && along < hi + dist
            && ((a - ca).powi(2) + (b - cb).powi(2)).sqrt() < rad
    }

    fn in_mesh(&self, mesh: &TriangleSoup, p: DVec3, envelope: DVec3) -> bool {
        let bounds = mesh.bounds();
        if bounds.is_empty() {
            return false;
        }
        let extent = bounds.size();
        if extent.min_element() <= 0.0 {
            return false;
        }
        let scale = (self.size * envelope / extent).min_element();
        if scale <= 0.0 {
            return false;
        }
        let local = (p - self.position * envelope) / scale + bounds.min;
        mesh.is_inside(local)
    }

    /// Rescales fractional parameters when the envelope changes from `old`
    /// to `new`, keeping the region's absolute placement.
    pub fn scale_to(&mut self, old: DVec3, new: DVec3) {
        let ratio = new / old;
        self.position *= ratio;
        self.size *= ratio;
        self.radius *= ratio.x;
    }
}
