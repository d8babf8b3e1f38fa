//! Recording backend for headless rendering and tests.
//!
//! This backend performs no GPU work. Every call is appended to a command
//! list that can be inspected after the frame.

use std::collections::HashSet;

use super::traits::*;
use super::types::*;
use crate::resources::{Shader, TextureData, UniformValue};

/// A single recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    BeginFrame(FrameTarget),
    EndFrame,
    CreateBuffer {
        handle: BufferHandle,
        label: Option<String>,
        size: usize,
    },
    CreateProgram {
        handle: ProgramHandle,
        name: String,
    },
    CreateTexture {
        handle: TextureHandle,
        name: String,
        width: u32,
        height: u32,
    },
    SetProgram(ProgramHandle),
    SetBlendState(Option<BlendState>),
    SetDepthState(DepthState),
    SetCullMode(CullMode),
    SetUniform {
        name: String,
        value: UniformValue,
    },
    BindTexture {
        name: String,
        texture: TextureHandle,
    },
    SetVertexBuffer {
        slot: u32,
        buffer: BufferHandle,
    },
    SetIndexBuffer {
        buffer: BufferHandle,
        format: IndexFormat,
    },
    DrawIndexed {
        first_index: u32,
        index_count: u32,
        base_vertex: i32,
    },
    DestroyBuffer(BufferHandle),
    DestroyProgram(ProgramHandle),
    DestroyTexture(TextureHandle),
}

/// Backend that records commands instead of executing them
#[derive(Debug, Default)]
pub struct RecordingBackend {
    commands: Vec<RenderCommand>,
    next_handle: u64,
    in_frame: bool,
    frames: u64,
    buffers: HashSet<BufferHandle>,
    programs: HashSet<ProgramHandle>,
    textures: HashSet<TextureHandle>,
    fail_buffers: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Take the recorded commands, leaving the list empty
    pub fn take_commands(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Number of completed frames
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::DrawIndexed { .. }))
            .count()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Make subsequent buffer creation fail, to exercise error paths
    pub fn set_fail_buffer_creation(&mut self, fail: bool) {
        self.fail_buffers = fail;
    }

    fn next(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn record(&mut self, command: RenderCommand) {
        log::trace!("RecordingBackend: {:?}", command);
        self.commands.push(command);
    }
}

impl RenderBackend for RecordingBackend {
    fn name(&self) -> &str {
        "Recording Backend"
    }

    fn begin_frame(&mut self, target: &FrameTarget) -> BackendResult<()> {
        if self.in_frame {
            return Err(BackendError::FrameInProgress);
        }
        self.in_frame = true;
        self.record(RenderCommand::BeginFrame(*target));
        Ok(())
    }

    fn end_frame(&mut self) -> BackendResult<()> {
        if !self.in_frame {
            return Err(BackendError::NoFrame);
        }
        self.in_frame = false;
        self.frames += 1;
        self.record(RenderCommand::EndFrame);
        Ok(())
    }

    fn create_buffer_init(
        &mut self,
        desc: &BufferDescriptor,
        data: &[u8],
    ) -> BackendResult<BufferHandle> {
        if self.fail_buffers {
            return Err(BackendError::BufferCreationFailed(format!(
                "{:?}: creation disabled",
                desc.label
            )));
        }
        let handle = BufferHandle(self.next());
        self.buffers.insert(handle);
        self.record(RenderCommand::CreateBuffer {
            handle,
            label: desc.label.clone(),
            size: data.len(),
        });
        Ok(handle)
    }

    fn create_program(&mut self, shader: &Shader) -> BackendResult<ProgramHandle> {
        let handle = ProgramHandle(self.next());
        self.programs.insert(handle);
        self.record(RenderCommand::CreateProgram {
            handle,
            name: shader.name().to_string(),
        });
        Ok(handle)
    }

    fn create_texture(&mut self, texture: &TextureData) -> BackendResult<TextureHandle> {
        if texture.width == 0 || texture.height == 0 {
            return Err(BackendError::TextureCreationFailed(format!(
                "{}: empty texture",
                texture.name
            )));
        }
        let handle = TextureHandle(self.next());
        self.textures.insert(handle);
        self.record(RenderCommand::CreateTexture {
            handle,
            name: texture.name.clone(),
            width: texture.width,
            height: texture.height,
        });
        Ok(handle)
    }

    fn set_program(&mut self, program: ProgramHandle) {
        self.record(RenderCommand::SetProgram(program));
    }

    fn set_blend_state(&mut self, blend: Option<BlendState>) {
        self.record(RenderCommand::SetBlendState(blend));
    }

    fn set_depth_state(&mut self, depth: DepthState) {
        self.record(RenderCommand::SetDepthState(depth));
    }

    fn set_cull_mode(&mut self, cull: CullMode) {
        self.record(RenderCommand::SetCullMode(cull));
    }

    fn set_uniform(&mut self, name: &str, value: &UniformValue) {
        self.record(RenderCommand::SetUniform {
            name: name.to_string(),
            value: *value,
        });
    }

    fn bind_texture(&mut self, name: &str, texture: TextureHandle) {
        self.record(RenderCommand::BindTexture {
            name: name.to_string(),
            texture,
        });
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferHandle) {
        self.record(RenderCommand::SetVertexBuffer { slot, buffer });
    }

    fn set_index_buffer(&mut self, buffer: BufferHandle, format: IndexFormat) {
        self.record(RenderCommand::SetIndexBuffer { buffer, format });
    }

    fn draw_indexed(&mut self, indices: std::ops::Range<u32>, base_vertex: i32) {
        self.record(RenderCommand::DrawIndexed {
            first_index: indices.start,
            index_count: indices.end.saturating_sub(indices.start),
            base_vertex,
        });
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        if !self.buffers.remove(&buffer) {
            log::warn!("RecordingBackend: destroying unknown buffer {:?}", buffer);
        }
        self.record(RenderCommand::DestroyBuffer(buffer));
    }

    fn destroy_program(&mut self, program: ProgramHandle) {
        if !self.programs.remove(&program) {
            log::warn!("RecordingBackend: destroying unknown program {:?}", program);
        }
        self.record(RenderCommand::DestroyProgram(program));
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        if !self.textures.remove(&texture) {
            log::warn!("RecordingBackend: destroying unknown texture {:?}", texture);
        }
        self.record(RenderCommand::DestroyTexture(texture));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_pairing_is_enforced() {
        let mut backend = RecordingBackend::new();
        assert_eq!(backend.end_frame(), Err(BackendError::NoFrame));
        backend.begin_frame(&FrameTarget::new(4, 4)).unwrap();
        assert_eq!(
            backend.begin_frame(&FrameTarget::new(4, 4)),
            Err(BackendError::FrameInProgress)
        );
        backend.end_frame().unwrap();
        assert_eq!(backend.frames(), 1);
    }

    #[test]
    fn tracks_live_buffers() {
        let mut backend = RecordingBackend::new();
        let desc = BufferDescriptor {
            label: Some("vb".into()),
            usage: BufferUsage::VERTEX,
        };
        let a = backend.create_buffer_init(&desc, &[0u8; 16]).unwrap();
        let b = backend.create_buffer_init(&desc, &[0u8; 8]).unwrap();
        assert_ne!(a, b);
        assert_eq!(backend.live_buffers(), 2);
        backend.destroy_buffer(a);
        assert_eq!(backend.live_buffers(), 1);

        backend.set_fail_buffer_creation(true);
        assert!(matches!(
            backend.create_buffer_init(&desc, &[]),
            Err(BackendError::BufferCreationFailed(_))
        ));
    }

    #[test]
    fn rejects_empty_textures() {
        let mut backend = RecordingBackend::new();
        let empty = TextureData {
            name: "empty".into(),
            width: 0,
            height: 0,
            data: Vec::new(),
        };
        assert!(backend.create_texture(&empty).is_err());
        let solid = TextureData::solid_color([255, 0, 0, 255], "red");
        backend.create_texture(&solid).unwrap();
        assert_eq!(backend.live_textures(), 1);
    }
}
