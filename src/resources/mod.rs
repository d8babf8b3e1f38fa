//! Resource management
//!
//! Meshes, materials, shaders and textures, owned by [`Assets`] and
//! referenced by generational ids.

mod assets;
mod material;
mod mesh;
mod shader;
mod texture;

pub use assets::*;
pub use material::*;
pub use mesh::*;
pub use shader::*;
pub use texture::*;
