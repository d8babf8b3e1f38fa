//! Lazily created GPU resources keyed by asset id

use crate::backend::{
    BufferDescriptor, BufferHandle, BufferUsage, ProgramHandle, RenderBackend, TextureHandle,
};
use crate::error::RenderError;
use crate::resources::{Assets, Mesh, MeshId, ShaderId, TextureId};
use std::collections::HashMap;

/// Buffers for one submesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuSubMesh {
    pub vertex_buffer: BufferHandle,
    pub index_buffer: BufferHandle,
    pub index_count: u32,
}

/// Uploaded mesh, tagged with the asset revision it was built from
#[derive(Debug, Clone)]
pub struct GpuMesh {
    pub revision: u64,
    pub submeshes: Vec<GpuSubMesh>,
}

impl GpuMesh {
    fn destroy<B: RenderBackend>(&self, backend: &mut B) {
        for sm in &self.submeshes {
            backend.destroy_buffer(sm.vertex_buffer);
            backend.destroy_buffer(sm.index_buffer);
        }
    }
}

fn upload_mesh<B: RenderBackend>(
    backend: &mut B,
    mesh: &Mesh,
    revision: u64,
) -> Result<GpuMesh, RenderError> {
    let mut gpu = GpuMesh {
        revision,
        submeshes: Vec::with_capacity(mesh.submeshes().len()),
    };
    for (index, sm) in mesh.submeshes().iter().enumerate() {
        let vertices = BufferDescriptor {
            label: Some(format!("{}[{}] vertices", mesh.name, index)),
            usage: BufferUsage::VERTEX,
        };
        let vertex_buffer = match backend.create_buffer_init(&vertices, sm.vertex_bytes()) {
            Ok(buffer) => buffer,
            Err(err) => {
                gpu.destroy(backend);
                return Err(err.into());
            }
        };
        let indices = BufferDescriptor {
            label: Some(format!("{}[{}] indices", mesh.name, index)),
            usage: BufferUsage::INDEX,
        };
        let index_buffer = match backend.create_buffer_init(&indices, sm.index_bytes()) {
            Ok(buffer) => buffer,
            Err(err) => {
                backend.destroy_buffer(vertex_buffer);
                gpu.destroy(backend);
                return Err(err.into());
            }
        };
        gpu.submeshes.push(GpuSubMesh {
            vertex_buffer,
            index_buffer,
            index_count: sm.indices().len() as u32,
        });
    }
    Ok(gpu)
}

/// GPU-side copies of meshes, shader programs and textures
#[derive(Debug, Default)]
pub struct GpuCache {
    meshes: HashMap<MeshId, GpuMesh>,
    programs: HashMap<ShaderId, ProgramHandle>,
    textures: HashMap<TextureId, TextureHandle>,
}

impl GpuCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Buffers for `id`, uploading on first use or after the mesh changed
    pub fn mesh<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        assets: &Assets,
        id: MeshId,
    ) -> Result<&GpuMesh, RenderError> {
        let mesh = assets.mesh(id).ok_or(RenderError::MissingMesh(id))?;
        let revision = assets.mesh_revision(id).unwrap_or(0);

        let stale = self.meshes.get(&id).is_some_and(|gpu| gpu.revision != revision);
        if stale {
            if let Some(old) = self.meshes.remove(&id) {
                log::debug!("Mesh '{}' changed, re-uploading", mesh.name);
                old.destroy(backend);
            }
        }

        if !self.meshes.contains_key(&id) {
            let gpu = upload_mesh(backend, mesh, revision)?;
            log::trace!("Uploaded mesh '{}' ({} submeshes)", mesh.name, gpu.submeshes.len());
            self.meshes.insert(id, gpu);
        }

        self.meshes.get(&id).ok_or(RenderError::MissingMesh(id))
    }

    /// Program for `id`, compiled on first use
    pub fn program<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        assets: &Assets,
        id: ShaderId,
    ) -> Result<ProgramHandle, RenderError> {
        if let Some(&program) = self.programs.get(&id) {
            return Ok(program);
        }
        let shader = assets.shader(id).ok_or(RenderError::MissingShader(id))?;
        let program = backend.create_program(shader)?;
        log::debug!("Created program for shader '{}'", shader.name());
        self.programs.insert(id, program);
        Ok(program)
    }

    /// Texture for `id`, uploaded on first use
    pub fn texture<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        assets: &Assets,
        id: TextureId,
    ) -> Result<Option<TextureHandle>, RenderError> {
        if let Some(&texture) = self.textures.get(&id) {
            return Ok(Some(texture));
        }
        let Some(data) = assets.texture(id) else {
            return Ok(None);
        };
        let texture = backend.create_texture(data)?;
        self.textures.insert(id, texture);
        Ok(Some(texture))
    }

    /// Destroy resources whose asset has been removed
    pub fn evict_removed<B: RenderBackend>(&mut self, backend: &mut B, assets: &Assets) {
        self.meshes.retain(|id, gpu| {
            let alive = assets.mesh(*id).is_some();
            if !alive {
                gpu.destroy(backend);
            }
            alive
        });
        self.programs.retain(|id, program| {
            let alive = assets.shader(*id).is_some();
            if !alive {
                backend.destroy_program(*program);
            }
            alive
        });
        self.textures.retain(|id, texture| {
            let alive = assets.texture(*id).is_some();
            if !alive {
                backend.destroy_texture(*texture);
            }
            alive
        });
    }

    /// Destroy everything
    pub fn release<B: RenderBackend>(&mut self, backend: &mut B) {
        log::debug!(
            "Releasing {} meshes, {} programs, {} textures",
            self.meshes.len(),
            self.programs.len(),
            self.textures.len()
        );
        for (_, gpu) in self.meshes.drain() {
            gpu.destroy(backend);
        }
        for (_, program) in self.programs.drain() {
            backend.destroy_program(program);
        }
        for (_, texture) in self.textures.drain() {
            backend.destroy_texture(texture);
        }
    }
}
