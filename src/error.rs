//! Error types for the preview renderer.

use crate::backend::BackendError;
use crate::resources::{MaterialId, MeshId, ShaderId};
use crate::scene::ObjectId;
use thiserror::Error;

/// Errors raised by scene graph mutations and queries
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("scene object {0:?} does not exist")]
    ObjectNotFound(ObjectId),
    #[error("cannot parent {child:?} under {parent:?}: it would create a cycle")]
    CyclicParent { child: ObjectId, parent: ObjectId },
    #[error("mesh object {0:?} is a leaf and cannot have children")]
    LeafParent(ObjectId),
    #[error("mesh {0:?} is not registered")]
    MeshNotFound(MeshId),
    #[error("parent {0:?} has a singular world matrix, world placement cannot be kept")]
    SingularParent(ObjectId),
}

/// Errors raised while building mesh geometry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    #[error("index count {0} is not a multiple of 3")]
    NotTriangles(usize),
    #[error("index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
}

/// Errors raised while compiling a shader
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShaderError {
    #[error("failed to parse shader '{name}': {message}")]
    Parse { name: String, message: String },
    #[error("shader '{name}' failed validation: {message}")]
    Validation { name: String, message: String },
    #[error("shader '{name}' has no {stage} entry point")]
    MissingEntryPoint { name: String, stage: &'static str },
}

/// Errors raised while loading textures
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("failed to decode image '{name}': {source}")]
    Decode {
        name: String,
        #[source]
        source: image::ImageError,
    },
}

/// Errors raised while rendering a frame
#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("material {0:?} is not registered")]
    MissingMaterial(MaterialId),
    #[error("shader {0:?} is not registered")]
    MissingShader(ShaderId),
    #[error("mesh {0:?} is not registered")]
    MissingMesh(MeshId),
}

/// Errors raised while loading renderer configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid renderer config: {0}")]
    Parse(#[from] ron::error::SpannedError),
}
