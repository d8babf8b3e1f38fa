//! Core backend abstraction traits
//!
//! The host UI implements [`RenderBackend`] against its own graphics context.

use crate::backend::types::*;
use crate::resources::{Shader, TextureData, UniformValue};
use thiserror::Error;

/// Backend error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Failed to create buffer: {0}")]
    BufferCreationFailed(String),
    #[error("Failed to create texture: {0}")]
    TextureCreationFailed(String),
    #[error("Failed to create program: {0}")]
    ProgramCreationFailed(String),
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),
    #[error("Frame already in progress")]
    FrameInProgress,
    #[error("No frame in progress")]
    NoFrame,
    #[error("Device lost")]
    DeviceLost,
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Handle to a GPU buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub(crate) u64);

/// Handle to a GPU texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub(crate) u64);

/// Handle to a compiled shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub(crate) u64);

macro_rules! handle_ctor {
    ($($name:ident),*) => {
        $(impl $name {
            /// Wrap a backend-specific id
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn raw(&self) -> u64 {
                self.0
            }
        })*
    };
}

handle_ctor!(BufferHandle, TextureHandle, ProgramHandle);

/// Immediate-mode state and draw interface used by the renderer
pub trait RenderBackend {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Begin a new frame and clear the target
    fn begin_frame(&mut self, target: &FrameTarget) -> BackendResult<()>;

    /// End and present the frame
    fn end_frame(&mut self) -> BackendResult<()>;

    // Resource creation

    /// Create a buffer with initial data
    fn create_buffer_init(
        &mut self,
        desc: &BufferDescriptor,
        data: &[u8],
    ) -> BackendResult<BufferHandle>;

    /// Compile a validated shader
    fn create_program(&mut self, shader: &Shader) -> BackendResult<ProgramHandle>;

    /// Upload RGBA8 texture data
    fn create_texture(&mut self, texture: &TextureData) -> BackendResult<TextureHandle>;

    // State

    fn set_program(&mut self, program: ProgramHandle);

    /// `None` disables blending
    fn set_blend_state(&mut self, blend: Option<BlendState>);

    fn set_depth_state(&mut self, depth: DepthState);

    fn set_cull_mode(&mut self, cull: CullMode);

    /// Set a named uniform on the current program
    fn set_uniform(&mut self, name: &str, value: &UniformValue);

    /// Bind a texture to the named sampler slot of the current program
    fn bind_texture(&mut self, name: &str, texture: TextureHandle);

    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferHandle);

    fn set_index_buffer(&mut self, buffer: BufferHandle, format: IndexFormat);

    /// Draw indexed primitives
    fn draw_indexed(&mut self, indices: std::ops::Range<u32>, base_vertex: i32);

    // Resource cleanup

    fn destroy_buffer(&mut self, buffer: BufferHandle);

    fn destroy_program(&mut self, program: ProgramHandle);

    fn destroy_texture(&mut self, texture: TextureHandle);
}
