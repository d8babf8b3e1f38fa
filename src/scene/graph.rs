//! Retained-mode scene graph
//!
//! The graph owns every [`SceneObject`] and keeps each object's world matrix
//! and world bounds current. A mutation recomputes the world matrices of the
//! affected subtree, re-aggregates bounds bottom-up, then walks up the
//! ancestors until an ancestor's bounds stop changing.

use super::bounds::Aabb;
use super::events::{EventQueue, SceneEvent};
use super::object::{MeshRenderer, ObjectId, ObjectKind, SceneObject};
use super::ray::{Ray, RayHit};
use super::transform::Transform;
use crate::error::SceneError;
use crate::resources::{Assets, MaterialId, MeshId};
use glam::Mat4;
use slotmap::SlotMap;

pub type SceneResult<T> = Result<T, SceneError>;

/// How [`SceneGraph::set_parent`] treats the moved object's transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReparentMode {
    /// Keep the local transform; the object moves with its new parent
    #[default]
    KeepLocal,
    /// Rewrite the local transform so the world placement is unchanged
    KeepWorld,
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    objects: SlotMap<ObjectId, SceneObject>,
    roots: Vec<ObjectId>,
    events: EventQueue,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(id)
    }

    /// Top-level objects in display order
    pub fn roots(&self) -> &[ObjectId] {
        &self.roots
    }

    pub fn children(&self, id: ObjectId) -> &[ObjectId] {
        self.objects
            .get(id)
            .map(|obj| obj.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: ObjectId) -> Option<ObjectId> {
        self.objects.get(id).and_then(|obj| obj.parent)
    }

    pub fn world_matrix(&self, id: ObjectId) -> Option<Mat4> {
        self.objects.get(id).map(|obj| obj.world_matrix)
    }

    pub fn world_bounds(&self, id: ObjectId) -> Option<Aabb> {
        self.objects.get(id).and_then(|obj| obj.world_bounds)
    }

    /// Bounds of everything in the scene
    pub fn scene_bounds(&self) -> Option<Aabb> {
        self.roots
            .iter()
            .fold(None, |acc, id| Aabb::merge(acc, self.world_bounds(*id)))
    }

    /// First object with the given name in depth-first order
    pub fn find_by_name(&self, name: &str) -> Option<ObjectId> {
        self.depth_first()
            .find(|(_, obj)| obj.name == name)
            .map(|(id, _)| id)
    }

    /// Pre-order traversal following sibling order
    pub fn depth_first(&self) -> DepthFirst<'_> {
        DepthFirst {
            graph: self,
            stack: self.roots.iter().rev().copied().collect(),
            skip_hidden: false,
        }
    }

    /// Mesh objects whose whole ancestor chain is visible
    pub fn visible_meshes(&self) -> impl Iterator<Item = (ObjectId, &SceneObject, &MeshRenderer)> {
        DepthFirst {
            graph: self,
            stack: self.roots.iter().rev().copied().collect(),
            skip_hidden: true,
        }
        .filter_map(|(id, obj)| obj.mesh_renderer().map(|renderer| (id, obj, renderer)))
    }

    // Construction

    /// Add a grouping object
    pub fn add_empty(
        &mut self,
        name: &str,
        transform: Transform,
        parent: Option<ObjectId>,
    ) -> SceneResult<ObjectId> {
        self.insert(SceneObject::new(name, transform, ObjectKind::Empty), parent)
    }

    /// Add a mesh object. Its local bounds are read from the registered mesh.
    pub fn add_mesh(
        &mut self,
        assets: &Assets,
        mesh: MeshId,
        name: &str,
        transform: Transform,
        parent: Option<ObjectId>,
    ) -> SceneResult<ObjectId> {
        let local_bounds = assets
            .mesh(mesh)
            .ok_or(SceneError::MeshNotFound(mesh))?
            .bounds();
        let mut object = SceneObject::new(
            name,
            transform,
            ObjectKind::Mesh(MeshRenderer::new(mesh)),
        );
        object.local_bounds = local_bounds;
        self.insert(object, parent)
    }

    fn insert(&mut self, mut object: SceneObject, parent: Option<ObjectId>) -> SceneResult<ObjectId> {
        let parent_world = match parent {
            Some(parent_id) => {
                let parent_obj = self
                    .objects
                    .get(parent_id)
                    .ok_or(SceneError::ObjectNotFound(parent_id))?;
                if parent_obj.is_leaf() {
                    return Err(SceneError::LeafParent(parent_id));
                }
                Some(parent_obj.world_matrix)
            }
            None => None,
        };

        object.parent = parent;
        object.world_matrix = object.transform.world_matrix(parent_world.as_ref());
        object.world_bounds = object.own_world_bounds();
        let has_bounds = object.world_bounds.is_some();

        let id = self.objects.insert(object);
        match parent {
            Some(parent_id) => self.objects[parent_id].children.push(id),
            None => self.roots.push(id),
        }
        log::trace!("SceneGraph: added {:?} under {:?}", id, parent);
        self.events.push(SceneEvent::Added(id));
        if has_bounds {
            self.refresh_ancestor_bounds(parent);
        }
        Ok(id)
    }

    /// Remove an object and its whole subtree. Returns the number of removed objects.
    pub fn remove(&mut self, id: ObjectId) -> SceneResult<usize> {
        let parent = self
            .objects
            .get(id)
            .ok_or(SceneError::ObjectNotFound(id))?
            .parent;
        self.detach(id, parent);

        let subtree = self.collect_subtree(id);
        for removed in subtree.iter().rev() {
            self.objects.remove(*removed);
            self.events.push(SceneEvent::Removed(*removed));
        }
        self.refresh_ancestor_bounds(parent);
        log::debug!("SceneGraph: removed {} objects rooted at {:?}", subtree.len(), id);
        Ok(subtree.len())
    }

    /// Remove every object
    pub fn clear(&mut self) {
        for root in self.roots.clone() {
            for id in self.collect_subtree(root).into_iter().rev() {
                self.events.push(SceneEvent::Removed(id));
            }
        }
        self.objects.clear();
        self.roots.clear();
    }

    // Hierarchy

    /// Move `id` under `new_parent` (or to the root list), appended after existing children
    pub fn set_parent(
        &mut self,
        id: ObjectId,
        new_parent: Option<ObjectId>,
        mode: ReparentMode,
    ) -> SceneResult<()> {
        let (old_parent, old_world) = {
            let obj = self.objects.get(id).ok_or(SceneError::ObjectNotFound(id))?;
            (obj.parent, obj.world_matrix)
        };

        if let Some(parent_id) = new_parent {
            let parent_obj = self
                .objects
                .get(parent_id)
                .ok_or(SceneError::ObjectNotFound(parent_id))?;
            if parent_id == id || self.is_ancestor(id, parent_id) {
                return Err(SceneError::CyclicParent {
                    child: id,
                    parent: parent_id,
                });
            }
            if parent_obj.is_leaf() {
                return Err(SceneError::LeafParent(parent_id));
            }
            if mode == ReparentMode::KeepWorld && !parent_obj.world_matrix.inverse().is_finite() {
                return Err(SceneError::SingularParent(parent_id));
            }
        }

        if old_parent == new_parent {
            return Ok(());
        }

        self.detach(id, old_parent);
        match new_parent {
            Some(parent_id) => self.objects[parent_id].children.push(id),
            None => self.roots.push(id),
        }
        self.objects[id].parent = new_parent;

        if mode == ReparentMode::KeepWorld {
            let parent_world = new_parent
                .map(|p| self.objects[p].world_matrix)
                .unwrap_or(Mat4::IDENTITY);
            let local = parent_world.inverse() * old_world;
            self.objects[id].transform = Transform::from_matrix(local);
        }

        self.events.push(SceneEvent::Reparented {
            object: id,
            old_parent,
            new_parent,
        });
        if mode == ReparentMode::KeepWorld {
            self.events.push(SceneEvent::TransformChanged(id));
        }

        self.propagate_subtree(id);
        self.refresh_ancestor_bounds(old_parent);
        self.refresh_ancestor_bounds(new_parent);
        Ok(())
    }

    /// Move `id` to `index` among its siblings. Out-of-range indices clamp to the end.
    pub fn set_sibling_index(&mut self, id: ObjectId, index: usize) -> SceneResult<()> {
        let parent = self
            .objects
            .get(id)
            .ok_or(SceneError::ObjectNotFound(id))?
            .parent;
        let siblings = match parent {
            Some(parent_id) => &mut self.objects[parent_id].children,
            None => &mut self.roots,
        };
        let Some(current) = siblings.iter().position(|&s| s == id) else {
            return Err(SceneError::ObjectNotFound(id));
        };
        siblings.remove(current);
        let index = index.min(siblings.len());
        siblings.insert(index, id);
        if index != current {
            self.events.push(SceneEvent::Reordered(id));
        }
        Ok(())
    }

    /// Position of `id` among its siblings
    pub fn sibling_index(&self, id: ObjectId) -> Option<usize> {
        let siblings = match self.objects.get(id)?.parent {
            Some(parent_id) => self.children(parent_id),
            None => &self.roots,
        };
        siblings.iter().position(|&s| s == id)
    }

    /// Whether `ancestor` appears on the parent chain of `id`
    pub fn is_ancestor(&self, ancestor: ObjectId, id: ObjectId) -> bool {
        let mut current = self.parent(id);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    // Mutation

    pub fn set_transform(&mut self, id: ObjectId, transform: Transform) -> SceneResult<()> {
        self.update_transform(id, |t| *t = transform)
    }

    /// Edit the local transform in place
    pub fn update_transform<F>(&mut self, id: ObjectId, edit: F) -> SceneResult<()>
    where
        F: FnOnce(&mut Transform),
    {
        let obj = self
            .objects
            .get_mut(id)
            .ok_or(SceneError::ObjectNotFound(id))?;
        edit(&mut obj.transform);
        let parent = obj.parent;
        self.events.push(SceneEvent::TransformChanged(id));
        self.propagate_subtree(id);
        self.refresh_ancestor_bounds(parent);
        Ok(())
    }

    pub fn set_visible(&mut self, id: ObjectId, visible: bool) -> SceneResult<()> {
        let obj = self
            .objects
            .get_mut(id)
            .ok_or(SceneError::ObjectNotFound(id))?;
        if obj.visible != visible {
            obj.visible = visible;
            self.events.push(SceneEvent::VisibilityChanged(id));
        }
        Ok(())
    }

    pub fn set_name(&mut self, id: ObjectId, name: &str) -> SceneResult<()> {
        let obj = self
            .objects
            .get_mut(id)
            .ok_or(SceneError::ObjectNotFound(id))?;
        obj.name = name.to_string();
        Ok(())
    }

    /// Set the material override of a mesh object. Returns `false` for non-mesh objects.
    pub fn set_material_override(
        &mut self,
        id: ObjectId,
        material: Option<MaterialId>,
    ) -> SceneResult<bool> {
        let obj = self
            .objects
            .get_mut(id)
            .ok_or(SceneError::ObjectNotFound(id))?;
        match &mut obj.kind {
            ObjectKind::Mesh(renderer) => {
                renderer.material_override = material;
                Ok(true)
            }
            ObjectKind::Empty => Ok(false),
        }
    }

    /// Re-read local bounds for every object drawing `mesh` after its geometry changed.
    /// Returns the number of objects updated.
    pub fn refresh_mesh_bounds(&mut self, assets: &Assets, mesh: MeshId) -> SceneResult<usize> {
        let local_bounds = assets
            .mesh(mesh)
            .ok_or(SceneError::MeshNotFound(mesh))?
            .bounds();
        let users: Vec<ObjectId> = self
            .objects
            .iter()
            .filter(|(_, obj)| obj.mesh_renderer().map(|r| r.mesh) == Some(mesh))
            .map(|(id, _)| id)
            .collect();
        for id in &users {
            self.objects[*id].local_bounds = local_bounds;
            if self.recompute_bounds(*id) {
                let parent = self.objects[*id].parent;
                self.refresh_ancestor_bounds(parent);
            }
        }
        Ok(users.len())
    }

    // Picking

    /// Nearest visible mesh triangle hit by `ray`
    pub fn raycast(&self, assets: &Assets, ray: &Ray) -> Option<RayHit> {
        let mut best: Option<RayHit> = None;
        for (id, obj, renderer) in self.visible_meshes() {
            let Some((entry, _)) = obj.world_bounds.and_then(|b| b.intersect_ray(ray)) else {
                continue;
            };
            if best.is_some_and(|hit| entry > hit.distance) {
                continue;
            }
            let Some(mesh) = assets.mesh(renderer.mesh) else {
                continue;
            };
            let to_local = obj.world_matrix.inverse();
            if !to_local.is_finite() {
                continue;
            }
            let Some(hit) = mesh.intersect_ray(&ray.transformed(&to_local)) else {
                continue;
            };
            if best.map_or(true, |b| hit.distance < b.distance) {
                let normal = to_local
                    .transpose()
                    .transform_vector3(hit.normal)
                    .normalize_or_zero();
                best = Some(RayHit {
                    object: id,
                    submesh: hit.submesh,
                    triangle: hit.triangle,
                    distance: hit.distance,
                    point: ray.at(hit.distance),
                    normal,
                });
            }
        }
        best
    }

    // Events

    /// Take all queued change events
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        self.events.drain()
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Turn event recording on or off. Turning it off drops queued events.
    pub fn set_event_tracking(&mut self, enabled: bool) {
        self.events.set_enabled(enabled);
    }

    pub fn event_tracking(&self) -> bool {
        self.events.is_enabled()
    }

    // Internals

    fn detach(&mut self, id: ObjectId, parent: Option<ObjectId>) {
        match parent {
            Some(parent_id) => {
                if let Some(parent_obj) = self.objects.get_mut(parent_id) {
                    parent_obj.children.retain(|&c| c != id);
                }
            }
            None => self.roots.retain(|&r| r != id),
        }
    }

    /// Pre-order list of `id` and its descendants
    fn collect_subtree(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(obj) = self.objects.get(current) {
                out.push(current);
                stack.extend(obj.children.iter().rev());
            }
        }
        out
    }

    /// Recompute world matrices below and including `id`, then bounds bottom-up
    fn propagate_subtree(&mut self, id: ObjectId) {
        let subtree = self.collect_subtree(id);

        for &current in &subtree {
            let parent_world = self.objects[current]
                .parent
                .and_then(|p| self.objects.get(p))
                .map(|p| p.world_matrix);
            let obj = &mut self.objects[current];
            obj.world_matrix = obj.transform.world_matrix(parent_world.as_ref());
        }

        // Reverse pre-order visits every child before its parent.
        for &current in subtree.iter().rev() {
            self.recompute_bounds(current);
        }
    }

    /// Returns whether the cached bounds changed
    fn recompute_bounds(&mut self, id: ObjectId) -> bool {
        let Some(obj) = self.objects.get(id) else {
            return false;
        };
        let bounds = obj.children.iter().fold(obj.own_world_bounds(), |acc, child| {
            Aabb::merge(acc, self.objects.get(*child).and_then(|c| c.world_bounds))
        });

        let obj = &mut self.objects[id];
        if obj.world_bounds == bounds {
            return false;
        }
        obj.world_bounds = bounds;
        self.events.push(SceneEvent::BoundsChanged(id));
        true
    }

    fn refresh_ancestor_bounds(&mut self, start: Option<ObjectId>) {
        let mut current = start;
        while let Some(id) = current {
            if !self.recompute_bounds(id) {
                break;
            }
            current = self.objects[id].parent;
        }
    }
}

/// Pre-order iterator over a [`SceneGraph`]
pub struct DepthFirst<'a> {
    graph: &'a SceneGraph,
    stack: Vec<ObjectId>,
    skip_hidden: bool,
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = (ObjectId, &'a SceneObject);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            let Some(obj) = self.graph.objects.get(id) else {
                continue;
            };
            if self.skip_hidden && !obj.visible {
                continue;
            }
            self.stack.extend(obj.children.iter().rev());
            return Some((id, obj));
        }
        None
    }
}
