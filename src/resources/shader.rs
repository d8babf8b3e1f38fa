//! WGSL shaders, validated and reflected with naga

use crate::error::ShaderError;

/// Entry point names every preview shader must define
pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Built-in flat-shaded colour shader
pub const UNLIT_WGSL: &str = r#"
struct Camera {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    view_projection: mat4x4<f32>,
    camera_position: vec4<f32>,
}

struct Object {
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
}

struct MaterialParams {
    color: vec4<f32>,
}

@group(0) @binding(0) var<uniform> camera: Camera;
@group(1) @binding(0) var<uniform> object: Object;
@group(2) @binding(0) var<uniform> material: MaterialParams;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
    @location(1) uv: vec2<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var output: VertexOutput;
    let world_position = object.model * vec4<f32>(input.position, 1.0);
    output.clip_position = camera.view_projection * world_position;
    output.world_normal = normalize((object.normal_matrix * vec4<f32>(input.normal, 0.0)).xyz);
    output.uv = input.uv;
    return output;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let key = normalize(vec3<f32>(0.3, 1.0, 0.5));
    let shade = 0.4 + 0.6 * max(dot(normalize(input.world_normal), key), 0.0);
    return vec4<f32>(material.color.rgb * shade, material.color.a);
}
"#;

/// Uniform member reflected from a `var<uniform>` struct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformInfo {
    pub name: String,
    /// Name of the global the member belongs to
    pub block: String,
    pub group: u32,
    pub binding: u32,
}

/// Texture binding reflected from the module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureBinding {
    pub name: String,
    pub group: u32,
    pub binding: u32,
}

/// A validated WGSL shader program
#[derive(Debug, Clone)]
pub struct Shader {
    name: String,
    source: String,
    uniforms: Vec<UniformInfo>,
    textures: Vec<TextureBinding>,
}

impl Shader {
    /// Parse, validate and reflect a WGSL module
    pub fn from_wgsl(name: &str, source: &str) -> Result<Self, ShaderError> {
        let module = naga::front::wgsl::parse_str(source).map_err(|e| ShaderError::Parse {
            name: name.to_string(),
            message: e.emit_to_string(source),
        })?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| ShaderError::Validation {
                name: name.to_string(),
                message: e.emit_to_string(source),
            })?;

        for (stage, entry) in [
            (naga::ShaderStage::Vertex, VERTEX_ENTRY),
            (naga::ShaderStage::Fragment, FRAGMENT_ENTRY),
        ] {
            let found = module
                .entry_points
                .iter()
                .any(|ep| ep.stage == stage && ep.name == entry);
            if !found {
                return Err(ShaderError::MissingEntryPoint {
                    name: name.to_string(),
                    stage: entry,
                });
            }
        }

        let mut uniforms = Vec::new();
        let mut textures = Vec::new();
        for (_, global) in module.global_variables.iter() {
            let Some(binding) = &global.binding else {
                continue;
            };
            let global_name = global.name.clone().unwrap_or_default();
            match (global.space, &module.types[global.ty].inner) {
                (naga::AddressSpace::Uniform, naga::TypeInner::Struct { members, .. }) => {
                    uniforms.extend(members.iter().filter_map(|m| {
                        Some(UniformInfo {
                            name: m.name.clone()?,
                            block: global_name.clone(),
                            group: binding.group,
                            binding: binding.binding,
                        })
                    }));
                }
                (naga::AddressSpace::Uniform, _) => uniforms.push(UniformInfo {
                    name: global_name.clone(),
                    block: global_name,
                    group: binding.group,
                    binding: binding.binding,
                }),
                (naga::AddressSpace::Handle, naga::TypeInner::Image { .. }) => {
                    textures.push(TextureBinding {
                        name: global_name,
                        group: binding.group,
                        binding: binding.binding,
                    })
                }
                _ => {}
            }
        }

        log::debug!(
            "Shader '{}': {} uniforms, {} textures",
            name,
            uniforms.len(),
            textures.len()
        );

        Ok(Self {
            name: name.to_string(),
            source: source.to_string(),
            uniforms,
            textures,
        })
    }

    /// The built-in unlit shader
    pub fn unlit() -> Result<Self, ShaderError> {
        Self::from_wgsl("unlit", UNLIT_WGSL)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn uniforms(&self) -> &[UniformInfo] {
        &self.uniforms
    }

    pub fn textures(&self) -> &[TextureBinding] {
        &self.textures
    }

    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniforms.iter().any(|u| u.name == name)
    }

    pub fn has_texture(&self, name: &str) -> bool {
        self.textures.iter().any(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlit_reflects_uniforms() {
        let shader = Shader::unlit().unwrap();
        for name in ["view_projection", "camera_position", "model", "normal_matrix", "color"] {
            assert!(shader.has_uniform(name), "missing {name}");
        }
        let color = shader.uniforms().iter().find(|u| u.name == "color").unwrap();
        assert_eq!(color.block, "material");
        assert_eq!(color.group, 2);
        assert!(shader.textures().is_empty());
    }

    #[test]
    fn reflects_textures() {
        let src = r#"
@group(0) @binding(0) var albedo: texture_2d<f32>;
@group(0) @binding(1) var albedo_sampler: sampler;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return textureSample(albedo, albedo_sampler, vec2<f32>(0.5, 0.5));
}
"#;
        let shader = Shader::from_wgsl("textured", src).unwrap();
        assert!(shader.has_texture("albedo"));
        assert_eq!(shader.textures().len(), 1);
    }

    #[test]
    fn parse_error() {
        let err = Shader::from_wgsl("broken", "fn vs_main( {").unwrap_err();
        assert!(matches!(err, ShaderError::Parse { .. }));
    }

    #[test]
    fn validation_error() {
        // Parses fine, but a vertex stage must write a clip position.
        let src = r#"
struct VertexOutput {
    @location(0) color: vec4<f32>,
}

@vertex
fn vs_main() -> VertexOutput {
    var output: VertexOutput;
    output.color = vec4<f32>(1.0);
    return output;
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0);
}
"#;
        let err = Shader::from_wgsl("no_position", src).unwrap_err();
        assert!(
            matches!(&err, ShaderError::Validation { name, .. } if name == "no_position"),
            "{err:?}"
        );
    }

    #[test]
    fn missing_fragment_entry() {
        let src = r#"
@vertex
fn vs_main() -> @builtin(position) vec4<f32> {
    return vec4<f32>(0.0);
}
"#;
        let err = Shader::from_wgsl("vs_only", src).unwrap_err();
        assert_eq!(
            err,
            ShaderError::MissingEntryPoint {
                name: "vs_only".into(),
                stage: FRAGMENT_ENTRY
            }
        );
    }
}
