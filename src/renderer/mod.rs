//! Single-pass forward renderer
//!
//! Each frame the renderer collects one [`DrawItem`] per visible submesh,
//! sorts them by render queue and state, and submits them through a
//! [`RenderBackend`] while skipping redundant state changes.

mod draw_list;
mod gpu_cache;
mod state;
mod stats;

pub use draw_list::*;
pub use gpu_cache::*;
pub use state::*;
pub use stats::*;

use crate::backend::{FrameTarget, RenderBackend};
use crate::error::RenderError;
use crate::resources::{Assets, Material, Shader, UniformValue};
use crate::scene::{Camera, CameraUniformData, SceneGraph};
use crate::RendererConfig;
use glam::Mat4;

/// Forward renderer for the preview pane
#[derive(Debug)]
pub struct Renderer {
    config: RendererConfig,
    draw_list: DrawList,
    cache: GpuCache,
    width: u32,
    height: u32,
    frame_index: u64,
    last_stats: FrameStats,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        log::info!(
            "Creating preview renderer (frustum culling: {})",
            config.frustum_culling
        );
        Self {
            config,
            draw_list: DrawList::new(),
            cache: GpuCache::new(),
            width: 1,
            height: 1,
            frame_index: 0,
            last_stats: FrameStats::default(),
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut RendererConfig {
        &mut self.config
    }

    /// Set the output size in pixels
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        log::debug!("Preview resized to {}x{}", width, height);
        self.width = width;
        self.height = height;
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Stats of the last completed frame
    pub fn last_stats(&self) -> &FrameStats {
        &self.last_stats
    }

    /// Draw list of the last frame, in submission order
    pub fn draw_list(&self) -> &DrawList {
        &self.draw_list
    }

    pub fn gpu_cache(&self) -> &GpuCache {
        &self.cache
    }

    /// Render one frame of `scene` as seen from `camera`
    pub fn render<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        scene: &SceneGraph,
        assets: &Assets,
        camera: &Camera,
    ) -> Result<FrameStats, RenderError> {
        let mut stats = FrameStats::default();

        self.draw_list.clear();
        self.draw_list.collect(
            scene,
            assets,
            camera,
            self.config.frustum_culling,
            &mut stats,
        );
        self.draw_list.sort(self.config.sort_opaque_by_distance);
        self.cache.evict_removed(backend, assets);

        let target = FrameTarget {
            width: self.width,
            height: self.height,
            clear_color: self.config.clear_color,
        };
        backend.begin_frame(&target)?;
        let submitted = self.submit(backend, assets, camera, &mut stats);
        // The frame is closed even when submission failed.
        let ended = backend.end_frame();
        submitted?;
        ended?;

        self.frame_index += 1;
        let interval = self.config.stats_log_interval;
        if interval > 0 && self.frame_index % interval == 0 {
            log::info!("Frame {}: {}", self.frame_index, stats);
        }
        self.last_stats = stats.clone();
        Ok(stats)
    }

    fn submit<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        assets: &Assets,
        camera: &Camera,
        stats: &mut FrameStats,
    ) -> Result<(), RenderError> {
        let camera_data = camera.uniform_data();
        let mut state = StateCache::new();

        for item in self.draw_list.items() {
            let material = assets
                .material(item.material)
                .ok_or(RenderError::MissingMaterial(item.material))?;
            let shader = assets
                .shader(item.shader)
                .ok_or(RenderError::MissingShader(item.shader))?;

            let program = self.cache.program(backend, assets, item.shader)?;
            if state.set_program(backend, program, stats) {
                bind_camera(backend, shader, &camera_data);
            }
            if state.set_material(item.material, stats) {
                bind_material(backend, &mut self.cache, assets, material)?;
            }
            state.set_blend(backend, material.blend.blend_state(), stats);
            state.set_depth(backend, material.depth_state(), stats);
            state.set_cull(backend, material.cull, stats);

            let gpu_mesh = self.cache.mesh(backend, assets, item.mesh)?;
            let Some(submesh) = gpu_mesh.submeshes.get(item.submesh).copied() else {
                log::warn!("Submesh {} missing from uploaded mesh", item.submesh);
                continue;
            };
            state.set_buffers(backend, submesh.vertex_buffer, submesh.index_buffer, stats);

            bind_object(backend, shader, item.world_matrix);
            backend.draw_indexed(0..submesh.index_count, 0);

            stats.draw_calls += 1;
            stats.triangles += submesh.index_count as usize / 3;
            *stats.queue_draws.entry(item.queue).or_default() += 1;
        }
        Ok(())
    }

    /// Destroy every GPU resource the renderer created
    pub fn release<B: RenderBackend>(&mut self, backend: &mut B) {
        self.cache.release(backend);
        self.draw_list.clear();
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(RendererConfig::default())
    }
}

fn bind_camera<B: RenderBackend>(backend: &mut B, shader: &Shader, camera: &CameraUniformData) {
    let values = [
        ("view", UniformValue::Mat4(camera.view)),
        ("projection", UniformValue::Mat4(camera.projection)),
        ("view_projection", UniformValue::Mat4(camera.view_projection)),
        ("camera_position", UniformValue::Vec4(camera.position)),
    ];
    for (name, value) in &values {
        if shader.has_uniform(name) {
            backend.set_uniform(name, value);
        }
    }
}

fn bind_object<B: RenderBackend>(backend: &mut B, shader: &Shader, world_matrix: Mat4) {
    if shader.has_uniform("model") {
        backend.set_uniform("model", &UniformValue::Mat4(world_matrix));
    }
    if shader.has_uniform("normal_matrix") {
        let normal_matrix = world_matrix.inverse().transpose();
        backend.set_uniform("normal_matrix", &UniformValue::Mat4(normal_matrix));
    }
}

fn bind_material<B: RenderBackend>(
    backend: &mut B,
    cache: &mut GpuCache,
    assets: &Assets,
    material: &Material,
) -> Result<(), RenderError> {
    for (name, value) in material.uniforms() {
        backend.set_uniform(name, value);
    }
    for (name, texture_id) in material.textures() {
        match cache.texture(backend, assets, texture_id)? {
            Some(texture) => backend.bind_texture(name, texture),
            None => log::warn!(
                "Material '{}': texture '{}' is not registered",
                material.name,
                name
            ),
        }
    }
    Ok(())
}
