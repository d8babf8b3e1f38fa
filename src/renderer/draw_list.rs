//! Draw items collected from the scene and sorted for submission

use super::stats::FrameStats;
use crate::resources::{Assets, MaterialId, MeshId, RenderQueue, ShaderId};
use crate::scene::{Camera, ObjectId, SceneGraph};
use glam::Mat4;
use std::cmp::Ordering;

/// One submesh of one object, with its material resolved
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub object: ObjectId,
    pub mesh: MeshId,
    pub submesh: usize,
    pub material: MaterialId,
    pub shader: ShaderId,
    pub queue: RenderQueue,
    pub world_matrix: Mat4,
    /// View-space depth of the object's bounds center
    pub distance: f32,
}

/// Sorted list of draw items for one frame
#[derive(Debug, Default)]
pub struct DrawList {
    items: Vec<DrawItem>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[DrawItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Walk the visible meshes and append one item per drawable submesh
    pub fn collect(
        &mut self,
        scene: &SceneGraph,
        assets: &Assets,
        camera: &Camera,
        frustum_culling: bool,
        stats: &mut FrameStats,
    ) {
        let frustum = camera.frustum();

        for (id, object, renderer) in scene.visible_meshes() {
            stats.objects_visited += 1;

            let bounds = object.world_bounds();
            if frustum_culling && bounds.is_some_and(|b| !frustum.intersects_aabb(&b)) {
                stats.objects_culled += 1;
                continue;
            }

            let Some(mesh) = assets.mesh(renderer.mesh) else {
                log::warn!("Object '{}' refers to a missing mesh", object.name());
                stats.submeshes_skipped += 1;
                continue;
            };

            let world_matrix = *object.world_matrix();
            let center = bounds
                .map(|b| b.center())
                .unwrap_or_else(|| world_matrix.w_axis.truncate());
            let distance = camera.view_depth(center);

            for (index, submesh) in mesh.submeshes().iter().enumerate() {
                if submesh.indices().is_empty() {
                    continue;
                }
                let Some(material_id) = renderer.material_override.or(submesh.material) else {
                    log::warn!(
                        "Object '{}' submesh {} has no material, skipping",
                        object.name(),
                        index
                    );
                    stats.submeshes_skipped += 1;
                    continue;
                };
                let Some(material) = assets.material(material_id) else {
                    log::warn!(
                        "Object '{}' submesh {} uses a missing material, skipping",
                        object.name(),
                        index
                    );
                    stats.submeshes_skipped += 1;
                    continue;
                };
                if assets.shader(material.shader).is_none() {
                    log::warn!(
                        "Material '{}' uses a missing shader, skipping",
                        material.name
                    );
                    stats.submeshes_skipped += 1;
                    continue;
                }

                self.items.push(DrawItem {
                    object: id,
                    mesh: renderer.mesh,
                    submesh: index,
                    material: material_id,
                    shader: material.shader,
                    queue: material.render_queue(),
                    world_matrix,
                    distance,
                });
            }
        }
    }

    /// Order by queue. Opaque queues group by shader, material and mesh;
    /// transparent queues draw back-to-front.
    pub fn sort(&mut self, opaque_front_to_back: bool) {
        // Stable, so equal keys keep scene order.
        self.items.sort_by(|a, b| {
            a.queue.cmp(&b.queue).then_with(|| {
                if a.queue.is_transparent() {
                    b.distance
                        .partial_cmp(&a.distance)
                        .unwrap_or(Ordering::Equal)
                } else {
                    let by_state = a
                        .shader
                        .cmp(&b.shader)
                        .then_with(|| a.material.cmp(&b.material));
                    let by_distance = || {
                        a.distance
                            .partial_cmp(&b.distance)
                            .unwrap_or(Ordering::Equal)
                    };
                    if opaque_front_to_back {
                        by_state.then_with(by_distance)
                    } else {
                        by_state
                            .then_with(|| a.mesh.cmp(&b.mesh))
                            .then_with(|| a.submesh.cmp(&b.submesh))
                    }
                }
            })
        });
    }
}
