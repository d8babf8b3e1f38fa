//! Registry of meshes, materials, shaders and textures

use super::{Material, Mesh, Shader, TextureData};
use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Key of a mesh in [`Assets`]
    pub struct MeshId;
    /// Key of a material in [`Assets`]
    pub struct MaterialId;
    /// Key of a shader in [`Assets`]
    pub struct ShaderId;
    /// Key of a texture in [`Assets`]
    pub struct TextureId;
}

#[derive(Debug)]
struct MeshEntry {
    mesh: Mesh,
    revision: u64,
}

/// Owns every resource the scene and renderer refer to by id
#[derive(Debug, Default)]
pub struct Assets {
    meshes: SlotMap<MeshId, MeshEntry>,
    materials: SlotMap<MaterialId, Material>,
    shaders: SlotMap<ShaderId, Shader>,
    textures: SlotMap<TextureId, TextureData>,
}

impl Assets {
    pub fn new() -> Self {
        Self::default()
    }

    // Meshes

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        log::debug!(
            "Adding mesh '{}' ({} submeshes, {} triangles)",
            mesh.name,
            mesh.submeshes().len(),
            mesh.triangle_count()
        );
        self.meshes.insert(MeshEntry { mesh, revision: 0 })
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id).map(|e| &e.mesh)
    }

    /// Mutable access; bumps the revision so cached GPU buffers are rebuilt
    pub fn mesh_mut(&mut self, id: MeshId) -> Option<&mut Mesh> {
        self.meshes.get_mut(id).map(|e| {
            e.revision += 1;
            &mut e.mesh
        })
    }

    pub fn mesh_revision(&self, id: MeshId) -> Option<u64> {
        self.meshes.get(id).map(|e| e.revision)
    }

    pub fn remove_mesh(&mut self, id: MeshId) -> Option<Mesh> {
        self.meshes.remove(id).map(|e| e.mesh)
    }

    pub fn meshes(&self) -> impl Iterator<Item = (MeshId, &Mesh)> {
        self.meshes.iter().map(|(id, e)| (id, &e.mesh))
    }

    // Materials

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        match self.shaders.get(material.shader) {
            Some(shader) => {
                for (name, _) in material.uniforms() {
                    if !shader.has_uniform(name) {
                        log::warn!(
                            "Material '{}': shader '{}' declares no uniform '{}'",
                            material.name,
                            shader.name(),
                            name
                        );
                    }
                }
                for (name, _) in material.textures() {
                    if !shader.has_texture(name) {
                        log::warn!(
                            "Material '{}': shader '{}' declares no texture '{}'",
                            material.name,
                            shader.name(),
                            name
                        );
                    }
                }
            }
            None => log::warn!("Material '{}' refers to an unknown shader", material.name),
        }
        self.materials.insert(material)
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id)
    }

    pub fn remove_material(&mut self, id: MaterialId) -> Option<Material> {
        self.materials.remove(id)
    }

    // Shaders

    pub fn add_shader(&mut self, shader: Shader) -> ShaderId {
        self.shaders.insert(shader)
    }

    pub fn shader(&self, id: ShaderId) -> Option<&Shader> {
        self.shaders.get(id)
    }

    pub fn remove_shader(&mut self, id: ShaderId) -> Option<Shader> {
        self.shaders.remove(id)
    }

    // Textures

    pub fn add_texture(&mut self, texture: TextureData) -> TextureId {
        self.textures.insert(texture)
    }

    pub fn texture(&self, id: TextureId) -> Option<&TextureData> {
        self.textures.get(id)
    }

    pub fn remove_texture(&mut self, id: TextureId) -> Option<TextureData> {
        self.textures.remove(id)
    }
}
