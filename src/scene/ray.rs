//! Rays and triangle intersection for picking

use super::object::ObjectId;
use glam::{Mat4, Vec3};

const EPSILON: f32 = 1e-7;

/// A ray with a normalized direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Map the ray through an affine matrix without renormalizing.
    ///
    /// Parameters along the result stay equal to parameters along `self`, so a
    /// hit distance found in object space is also the world-space distance.
    pub fn transformed(&self, matrix: &Mat4) -> Ray {
        Ray {
            origin: matrix.transform_point3(self.origin),
            direction: matrix.transform_vector3(self.direction),
        }
    }

    /// Möller–Trumbore. Both faces count as hits.
    ///
    /// The parallel test is relative to the ray and edge lengths, so tiny
    /// triangles and unnormalized object-space rays still register.
    pub fn intersect_triangle(&self, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
        let edge1 = b - a;
        let edge2 = c - a;
        let p = self.direction.cross(edge2);
        let det = edge1.dot(p);
        let scale = self.direction.length() * edge1.length() * edge2.length();
        if det.abs() <= EPSILON * scale {
            return None;
        }
        let inv_det = 1.0 / det;
        let s = self.origin - a;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(edge1);
        let v = self.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = edge2.dot(q) * inv_det;
        (t > EPSILON).then_some(t)
    }
}

/// Nearest mesh hit returned by [`SceneGraph::raycast`](super::SceneGraph::raycast)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub object: ObjectId,
    pub submesh: usize,
    pub triangle: usize,
    pub distance: f32,
    pub point: Vec3,
    /// World-space face normal
    pub normal: Vec3,
}
