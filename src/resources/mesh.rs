//! Mesh geometry split into per-material submeshes

use super::assets::MaterialId;
use crate::backend::types::Vertex;
use crate::error::MeshError;
use crate::scene::{Aabb, Ray};
use glam::{Vec2, Vec3};

/// Vertex and index data drawn with a single material
#[derive(Debug, Clone)]
pub struct SubMesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    pub material: Option<MaterialId>,
}

impl SubMesh {
    /// Validates that `indices` is a triangle list referencing existing vertices
    pub fn new(
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        material: Option<MaterialId>,
    ) -> Result<Self, MeshError> {
        if indices.len() % 3 != 0 {
            return Err(MeshError::NotTriangles(indices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertex_count: vertices.len(),
            });
        }
        Ok(Self {
            vertices,
            indices,
            material,
        })
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Corner positions of triangle `index`
    pub fn triangle(&self, index: usize) -> Option<[Vec3; 3]> {
        let tri = self.indices.get(index * 3..index * 3 + 3)?;
        Some([
            self.vertices[tri[0] as usize].position,
            self.vertices[tri[1] as usize].position,
            self.vertices[tri[2] as usize].position,
        ])
    }

    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.vertices.iter().map(|v| v.position))
    }
}

/// Nearest triangle hit in mesh space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshHit {
    pub submesh: usize,
    pub triangle: usize,
    /// Ray parameter of the hit
    pub distance: f32,
    /// Face normal, flipped to face the ray origin
    pub normal: Vec3,
}

/// A mesh made of one or more submeshes
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,
    submeshes: Vec<SubMesh>,
}

impl Mesh {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            submeshes: Vec::new(),
        }
    }

    /// Append a submesh and return its index
    pub fn add_submesh(
        &mut self,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        material: Option<MaterialId>,
    ) -> Result<usize, MeshError> {
        self.submeshes.push(SubMesh::new(vertices, indices, material)?);
        Ok(self.submeshes.len() - 1)
    }

    pub fn submeshes(&self) -> &[SubMesh] {
        &self.submeshes
    }

    /// Assign the material of one submesh. Returns `false` if the index is out of range.
    pub fn set_material(&mut self, submesh: usize, material: Option<MaterialId>) -> bool {
        match self.submeshes.get_mut(submesh) {
            Some(sm) => {
                sm.material = material;
                true
            }
            None => false,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.submeshes.iter().map(|s| s.vertices.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.submeshes.iter().map(SubMesh::triangle_count).sum()
    }

    /// Local-space bounds over every submesh; `None` when there is no geometry
    pub fn bounds(&self) -> Option<Aabb> {
        self.submeshes
            .iter()
            .fold(None, |acc, sm| Aabb::merge(acc, sm.bounds()))
    }

    /// Test `ray` (in mesh space) against every triangle and return the nearest hit
    pub fn intersect_ray(&self, ray: &Ray) -> Option<MeshHit> {
        let mut best: Option<MeshHit> = None;
        for (submesh_index, submesh) in self.submeshes.iter().enumerate() {
            for triangle in 0..submesh.triangle_count() {
                let Some([a, b, c]) = submesh.triangle(triangle) else {
                    continue;
                };
                let Some(t) = ray.intersect_triangle(a, b, c) else {
                    continue;
                };
                if best.map_or(true, |hit| t < hit.distance) {
                    let mut normal = (b - a).cross(c - a).normalize_or_zero();
                    if normal.dot(ray.direction) > 0.0 {
                        normal = -normal;
                    }
                    best = Some(MeshHit {
                        submesh: submesh_index,
                        triangle,
                        distance: t,
                        normal,
                    });
                }
            }
        }
        best
    }

    // Built-in primitives

    /// Axis-aligned cube with edge length `size`, centered at the origin
    pub fn cube(size: f32, material: Option<MaterialId>) -> Self {
        // (normal, u, v) with u x v == normal so each quad winds counter-clockwise
        const FACES: [(Vec3, Vec3, Vec3); 6] = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];
        let h = size * 0.5;
        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        for (normal, u, v) in FACES {
            let base = vertices.len() as u32;
            let center = normal * h;
            let corners = [
                (center - u * h - v * h, Vec2::new(0.0, 1.0)),
                (center + u * h - v * h, Vec2::new(1.0, 1.0)),
                (center + u * h + v * h, Vec2::new(1.0, 0.0)),
                (center - u * h + v * h, Vec2::new(0.0, 0.0)),
            ];
            for (position, uv) in corners {
                vertices.push(Vertex::new(position, normal, uv));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self::single("cube", vertices, indices, material)
    }

    /// Grid on the XZ plane facing +Y
    pub fn plane(width: f32, depth: f32, subdivisions: u32, material: Option<MaterialId>) -> Self {
        let n = subdivisions.max(1);
        let row = n + 1;
        let mut vertices = Vec::with_capacity((row * row) as usize);
        let mut indices = Vec::with_capacity((n * n * 6) as usize);

        for r in 0..=n {
            let fv = r as f32 / n as f32;
            for c in 0..=n {
                let fu = c as f32 / n as f32;
                let position = Vec3::new((fu - 0.5) * width, 0.0, (0.5 - fv) * depth);
                vertices.push(Vertex::new(position, Vec3::Y, Vec2::new(fu, 1.0 - fv)));
            }
        }
        for r in 0..n {
            for c in 0..n {
                let i0 = r * row + c;
                let i1 = i0 + 1;
                let i2 = i1 + row;
                let i3 = i0 + row;
                indices.extend_from_slice(&[i0, i1, i2, i0, i2, i3]);
            }
        }

        Self::single("plane", vertices, indices, material)
    }

    /// UV sphere
    pub fn sphere(radius: f32, segments: u32, rings: u32, material: Option<MaterialId>) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut vertices = Vec::with_capacity(((segments + 1) * (rings + 1)) as usize);
        let mut indices = Vec::with_capacity((segments * rings * 6) as usize);

        for ring in 0..=rings {
            let phi = std::f32::consts::PI * ring as f32 / rings as f32;
            for segment in 0..=segments {
                let theta = std::f32::consts::TAU * segment as f32 / segments as f32;
                let normal = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
                let uv = Vec2::new(
                    segment as f32 / segments as f32,
                    ring as f32 / rings as f32,
                );
                vertices.push(Vertex::new(normal * radius, normal, uv));
            }
        }
        for ring in 0..rings {
            for segment in 0..segments {
                let current = ring * (segments + 1) + segment;
                let next = current + segments + 1;
                indices.extend_from_slice(&[
                    current,
                    current + 1,
                    next,
                    current + 1,
                    next + 1,
                    next,
                ]);
            }
        }

        Self::single("sphere", vertices, indices, material)
    }

    fn single(name: &str, vertices: Vec<Vertex>, indices: Vec<u32>, material: Option<MaterialId>) -> Self {
        // Generators only emit in-range triangle lists.
        Self {
            name: name.to_string(),
            submeshes: vec![SubMesh {
                vertices,
                indices,
                material,
            }],
        }
    }
}
