//! # Bounding cube
//!
//! A cube that serves two purposes:
//!
//! - the reflective boundary of the simulated volume, which may be rotated
//!   freely together with the rest of the world;
//! - the drawable outline of an octree node (always axis-aligned), see
//!   [`crate::simulation::barnes_hut::SpatialTree::node_boxes`].
//!
//! The cube keeps its 8 vertices, 3 unit face normals (its local x/y/z axes)
//! and, per axis, a *near* and a *far* reference vertex. The far vertex of
//! axis `k` lies on the face whose outward normal is `+n_k`, the near vertex
//! on the opposite face, so the face a moving point can cross along axis `k`
//! is picked from the sign of `direction · n_k` alone.

use super::vector::{NVec3, VectorExt};

/// Vertex index pairs forming the 12 edges. Vertex `i` sits at
/// `center + Σ_k (bit k of i ? +h : -h) · n_k`.
pub const EDGES: [(usize, usize); 12] = [
    (0, 1), (2, 3), (4, 5), (6, 7), // along axis 0
    (0, 2), (1, 3), (4, 6), (5, 7), // along axis 1
    (0, 4), (1, 5), (2, 6), (3, 7), // along axis 2
];

/// Tolerance used when testing containment, relative to the half extent.
const CONTAINS_EPS: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox {
    center: NVec3,
    half_size: f64,
    vertices: [NVec3; 8],
    normals: [NVec3; 3],
    near: [NVec3; 3],
    far: [NVec3; 3],
}

/// Where a segment leaves the box.
#[derive(Debug, Clone, Copy)]
pub struct BoxHit {
    /// Fraction of the segment travelled before the hit, in `[0, 1]`.
    pub t: f64,
    pub point: NVec3,
    /// Outward unit normal of the face that was hit.
    pub normal: NVec3,
}

impl BoundingBox {
    /// Axis-aligned cube centered at `center` with half edge `half_size`.
    ///
    /// # Panics
    /// If `half_size` is not a positive finite number.
    pub fn new(center: NVec3, half_size: f64) -> Self {
        assert!(
            half_size.is_finite() && half_size > 0.0,
            "bounding box half size must be positive and finite, got {half_size}"
        );
        let mut bbox = Self {
            center,
            half_size,
            vertices: [NVec3::zeros(); 8],
            normals: [NVec3::x(), NVec3::y(), NVec3::z()],
            near: [NVec3::zeros(); 3],
            far: [NVec3::zeros(); 3],
        };
        bbox.refresh_geometry();
        bbox
    }

    /// Axis-aligned cube from its minimum corner and edge length (octree node).
    pub fn from_cube(origin: NVec3, edge_length: f64) -> Self {
        let half = 0.5 * edge_length;
        Self::new(origin + NVec3::new(half, half, half), half)
    }

    pub fn center(&self) -> NVec3 {
        self.center
    }

    pub fn half_size(&self) -> f64 {
        self.half_size
    }

    pub fn vertices(&self) -> &[NVec3; 8] {
        &self.vertices
    }

    pub fn normals(&self) -> &[NVec3; 3] {
        &self.normals
    }

    /// The 12 edges as segment endpoints, for debug drawing.
    pub fn edges(&self) -> impl Iterator<Item = (NVec3, NVec3)> + '_ {
        EDGES.iter().map(move |&(a, b)| (self.vertices[a], self.vertices[b]))
    }

    /// Coordinates of `p` in the box's local frame, relative to its center.
    fn local(&self, p: &NVec3) -> NVec3 {
        let rel = p - self.center;
        NVec3::new(rel.dot(&self.normals[0]), rel.dot(&self.normals[1]), rel.dot(&self.normals[2]))
    }

    pub fn contains(&self, p: &NVec3) -> bool {
        if !p.is_valid() {
            return false;
        }
        let limit = self.half_size * (1.0 + CONTAINS_EPS);
        self.local(p).iter().all(|c| c.abs() <= limit)
    }

    /// Project `p` onto the closest point inside the box.
    pub fn clamp(&self, p: &NVec3) -> NVec3 {
        let local = self.local(p);
        let mut out = self.center;
        for k in 0..3 {
            let c = local[k].clamp(-self.half_size, self.half_size);
            out.scale_add(&self.normals[k], c);
        }
        out
    }

    /// Axis-aligned cube `(origin, edge_length)` enclosing the box in any
    /// orientation. Used as the octree root.
    pub fn enclosing_cube(&self) -> (NVec3, f64) {
        let mut min = NVec3::repeat(f64::INFINITY);
        let mut max = NVec3::repeat(f64::NEG_INFINITY);
        for v in &self.vertices {
            min = min.inf(v);
            max = max.sup(v);
        }
        let extent = max - min;
        let edge = extent.x.max(extent.y).max(extent.z);
        let mid = (min + max) * 0.5;
        (mid - NVec3::repeat(0.5 * edge), edge)
    }

    /// Parameter `t` at which the line `start + t·dir` meets the plane through
    /// `plane_point` with normal `normal`, or `None` when they are parallel.
    pub fn plane_intersection(start: &NVec3, dir: &NVec3, plane_point: &NVec3, normal: &NVec3) -> Option<f64> {
        let denom = dir.dot(normal);
        if denom == 0.0 {
            return None;
        }
        Some((plane_point - start).dot(normal) / denom)
    }

    /// First face crossed by the segment `start → start + displacement`.
    ///
    /// Only faces the segment moves towards are considered (outward along
    /// the face normal), so a point sitting on a face and moving inwards
    /// does not register a hit.
    pub fn intersect_segment(&self, start: &NVec3, displacement: &NVec3) -> Option<BoxHit> {
        let mut best: Option<BoxHit> = None;

        for k in 0..3 {
            let n = self.normals[k];
            let along = displacement.dot(&n);
            if along == 0.0 {
                continue;
            }
            // Moving towards +n_k can only cross the far face, and vice versa
            let (plane_point, normal) = if along > 0.0 { (self.far[k], n) } else { (self.near[k], -n) };

            let Some(t) = Self::plane_intersection(start, displacement, &plane_point, &normal) else {
                continue;
            };
            let t = t.max(0.0);
            if t > 1.0 {
                continue;
            }
            if best.map_or(true, |b| t < b.t) {
                best = Some(BoxHit {
                    t,
                    point: start + displacement * t,
                    normal,
                });
            }
        }

        best
    }

    /// Rotate the box about the world origin by `alpha`, `beta`, `gamma`
    /// around x, y and z, in that order.
    pub fn rotate(&mut self, alpha: f64, beta: f64, gamma: f64) {
        let rotate = |v: &mut NVec3| {
            v.rotate_around_x(alpha);
            v.rotate_around_y(beta);
            v.rotate_around_z(gamma);
        };
        rotate(&mut self.center);
        for n in self.normals.iter_mut() {
            rotate(n);
            n.normalize_safe();
        }
        self.refresh_geometry();
    }

    /// Scale the half extent about the center, keeping orientation.
    ///
    /// # Panics
    /// If the resulting half size is not positive and finite.
    pub fn set_half_size(&mut self, half_size: f64) {
        assert!(
            half_size.is_finite() && half_size > 0.0,
            "bounding box half size must be positive and finite, got {half_size}"
        );
        self.half_size = half_size;
        self.refresh_geometry();
    }

    fn refresh_geometry(&mut self) {
        let h = self.half_size;
        for (i, vertex) in self.vertices.iter_mut().enumerate() {
            let mut v = self.center;
            for k in 0..3 {
                let sign = if i & (1 << k) != 0 { h } else { -h };
                v.scale_add(&self.normals[k], sign);
            }
            *vertex = v;
        }
        for k in 0..3 {
            self.near[k] = self.center - self.normals[k] * h;
            self.far[k] = self.center + self.normals[k] * h;
        }
    }
}
