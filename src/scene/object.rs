//! Scene graph nodes

use super::bounds::Aabb;
use super::transform::Transform;
use crate::resources::{MaterialId, MeshId};
use glam::Mat4;

slotmap::new_key_type! {
    /// Handle to an object in a [`SceneGraph`](super::SceneGraph)
    pub struct ObjectId;
}

/// Mesh instance placed in the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshRenderer {
    pub mesh: MeshId,
    /// Replaces the material of every submesh when set
    pub material_override: Option<MaterialId>,
}

impl MeshRenderer {
    pub fn new(mesh: MeshId) -> Self {
        Self {
            mesh,
            material_override: None,
        }
    }
}

/// What an object contributes to the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Grouping node with no geometry of its own
    Empty,
    /// Leaf node drawing a mesh
    Mesh(MeshRenderer),
}

/// A node in the scene graph.
///
/// The world matrix and bounds are caches owned by the graph; they are kept in
/// sync on every mutation, so reading them never triggers work.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub(crate) name: String,
    pub(crate) transform: Transform,
    pub(crate) kind: ObjectKind,
    pub(crate) visible: bool,
    pub(crate) parent: Option<ObjectId>,
    pub(crate) children: Vec<ObjectId>,
    pub(crate) world_matrix: Mat4,
    pub(crate) local_bounds: Option<Aabb>,
    pub(crate) world_bounds: Option<Aabb>,
}

impl SceneObject {
    pub(crate) fn new(name: &str, transform: Transform, kind: ObjectKind) -> Self {
        Self {
            name: name.to_string(),
            transform,
            kind,
            visible: true,
            parent: None,
            children: Vec::new(),
            world_matrix: transform.matrix(),
            local_bounds: None,
            world_bounds: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    pub fn mesh_renderer(&self) -> Option<&MeshRenderer> {
        match &self.kind {
            ObjectKind::Mesh(renderer) => Some(renderer),
            ObjectKind::Empty => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, ObjectKind::Mesh(_))
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    pub fn world_matrix(&self) -> &Mat4 {
        &self.world_matrix
    }

    /// Geometry bounds in object space (mesh objects only)
    pub fn local_bounds(&self) -> Option<Aabb> {
        self.local_bounds
    }

    /// Bounds of this object and all descendants in world space
    pub fn world_bounds(&self) -> Option<Aabb> {
        self.world_bounds
    }

    /// Own geometry bounds in world space, excluding children
    pub fn own_world_bounds(&self) -> Option<Aabb> {
        self.local_bounds
            .map(|bounds| bounds.transformed(&self.world_matrix))
    }
}
