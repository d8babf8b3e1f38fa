//! Tracks bound backend state so redundant changes are not issued

use super::stats::FrameStats;
use crate::backend::{
    BlendState, BufferHandle, CullMode, DepthState, IndexFormat, ProgramHandle, RenderBackend,
};
use crate::resources::MaterialId;

/// Last state set on the backend during the current frame
#[derive(Debug, Default)]
pub struct StateCache {
    program: Option<ProgramHandle>,
    material: Option<MaterialId>,
    blend: Option<Option<BlendState>>,
    depth: Option<DepthState>,
    cull: Option<CullMode>,
    vertex_buffer: Option<BufferHandle>,
    index_buffer: Option<BufferHandle>,
}

impl StateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything, e.g. at frame start
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Returns `true` if the program changed. A program switch invalidates the bound material.
    pub fn set_program<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        program: ProgramHandle,
        stats: &mut FrameStats,
    ) -> bool {
        if self.program == Some(program) {
            return false;
        }
        backend.set_program(program);
        self.program = Some(program);
        self.material = None;
        stats.program_switches += 1;
        true
    }

    /// Returns `true` if the material has to be bound
    pub fn set_material(&mut self, material: MaterialId, stats: &mut FrameStats) -> bool {
        if self.material == Some(material) {
            return false;
        }
        self.material = Some(material);
        stats.material_binds += 1;
        true
    }

    pub fn set_blend<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        blend: Option<BlendState>,
        stats: &mut FrameStats,
    ) {
        if self.blend != Some(blend) {
            backend.set_blend_state(blend);
            self.blend = Some(blend);
            stats.blend_changes += 1;
        }
    }

    pub fn set_depth<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        depth: DepthState,
        stats: &mut FrameStats,
    ) {
        if self.depth != Some(depth) {
            backend.set_depth_state(depth);
            self.depth = Some(depth);
            stats.depth_changes += 1;
        }
    }

    pub fn set_cull<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        cull: CullMode,
        stats: &mut FrameStats,
    ) {
        if self.cull != Some(cull) {
            backend.set_cull_mode(cull);
            self.cull = Some(cull);
            stats.cull_changes += 1;
        }
    }

    pub fn set_buffers<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        vertex_buffer: BufferHandle,
        index_buffer: BufferHandle,
        stats: &mut FrameStats,
    ) {
        if self.vertex_buffer != Some(vertex_buffer) {
            backend.set_vertex_buffer(0, vertex_buffer);
            self.vertex_buffer = Some(vertex_buffer);
            stats.buffer_binds += 1;
        }
        if self.index_buffer != Some(index_buffer) {
            backend.set_index_buffer(index_buffer, IndexFormat::Uint32);
            self.index_buffer = Some(index_buffer);
            stats.buffer_binds += 1;
        }
    }
}
