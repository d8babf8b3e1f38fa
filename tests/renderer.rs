//! Renderer integration tests against the recording backend.

mod common;

use common::{front_camera, Stage};
use glam::{Mat4, Vec3, Vec4};
use qplayer_preview::backend::{BackendError, RenderCommand};
use qplayer_preview::resources::{Material, Mesh, RenderQueue, Shader, TextureData, UniformValue};
use qplayer_preview::{
    RecordingBackend, RenderError, Renderer, RendererConfig, SceneGraph, Transform,
};
use rstest::rstest;

fn count(backend: &RecordingBackend, pred: impl Fn(&RenderCommand) -> bool) -> usize {
    backend.commands().iter().filter(|&c| pred(c)).count()
}

/// Translation of every `model` uniform, in submission order
fn model_positions(backend: &RecordingBackend) -> Vec<Vec3> {
    backend
        .commands()
        .iter()
        .filter_map(|c| match c {
            RenderCommand::SetUniform {
                name,
                value: UniformValue::Mat4(m),
            } if name == "model" => Some(m.w_axis.truncate()),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Frame structure
// ============================================================================

#[test]
fn empty_scene_clears_and_presents() {
    let stage = Stage::new();
    let scene = SceneGraph::new();
    let mut backend = RecordingBackend::new();
    let config = RendererConfig {
        clear_color: [0.0, 0.5, 0.0, 1.0],
        ..Default::default()
    };
    let mut renderer = Renderer::new(config);
    renderer.resize(640, 480);

    let stats = renderer
        .render(&mut backend, &scene, &stage.assets, &front_camera())
        .unwrap();

    assert_eq!(stats.draw_calls, 0);
    assert_eq!(backend.frames(), 1);
    match backend.commands() {
        [RenderCommand::BeginFrame(target), RenderCommand::EndFrame] => {
            assert_eq!((target.width, target.height), (640, 480));
            assert_eq!(target.clear_color, [0.0, 0.5, 0.0, 1.0]);
        }
        other => panic!("unexpected commands: {other:?}"),
    }
    assert_eq!(renderer.frame_index(), 1);
}

// ============================================================================
// Batching and state changes
// ============================================================================

#[test]
fn draws_are_grouped_by_queue_and_material() {
    let stage = Stage::new();
    let mut scene = SceneGraph::new();
    // Interleave materials so sorting has work to do.
    let meshes = [
        stage.cube,
        stage.sphere,
        stage.glass_cube,
        stage.cube,
        stage.sphere,
        stage.glass_cube,
        stage.cube,
    ];
    for (i, mesh) in meshes.into_iter().enumerate() {
        scene
            .add_mesh(
                &stage.assets,
                mesh,
                &format!("obj{i}"),
                Transform::from_xyz(i as f32 - 3.0, 0.0, 0.0),
                None,
            )
            .unwrap();
    }

    let mut backend = RecordingBackend::new();
    let mut renderer = Renderer::default();
    let stats = renderer
        .render(&mut backend, &scene, &stage.assets, &front_camera())
        .unwrap();

    assert_eq!(stats.objects_visited, 7);
    assert_eq!(stats.draw_calls, 7);
    assert_eq!(backend.draw_count(), 7);
    assert_eq!(stats.program_switches, 1);
    assert_eq!(stats.material_binds, 3);
    assert_eq!(stats.blend_changes, 2);
    assert_eq!(stats.depth_changes, 2);
    assert_eq!(stats.draws_in_queue(RenderQueue::GEOMETRY), 5);
    assert_eq!(stats.draws_in_queue(RenderQueue::TRANSPARENT), 2);

    // Opaque items first, transparent last.
    let items = renderer.draw_list().items();
    assert!(items[..5].iter().all(|i| i.queue == RenderQueue::GEOMETRY));
    assert!(items[5..].iter().all(|i| i.material == stage.glass));

    // Camera uniforms are set once per program switch.
    let view_projection = count(&backend, |c| {
        matches!(c, RenderCommand::SetUniform { name, .. } if name == "view_projection")
    });
    assert_eq!(view_projection, stats.program_switches);
    assert_eq!(
        count(&backend, |c| matches!(c, RenderCommand::SetProgram(_))),
        1
    );
}

#[test]
fn transparent_objects_draw_back_to_front() {
    let stage = Stage::new();
    let mut scene = SceneGraph::new();
    for z in [2.0, -5.0, 0.0] {
        scene
            .add_mesh(
                &stage.assets,
                stage.glass_cube,
                "glass",
                Transform::from_xyz(0.0, 0.0, z),
                None,
            )
            .unwrap();
    }
    scene
        .add_mesh(&stage.assets, stage.cube, "solid", Transform::from_xyz(0.0, 0.0, 4.0), None)
        .unwrap();

    let mut backend = RecordingBackend::new();
    let mut renderer = Renderer::default();
    renderer
        .render(&mut backend, &scene, &stage.assets, &front_camera())
        .unwrap();

    let z: Vec<f32> = model_positions(&backend).iter().map(|p| p.z).collect();
    assert_eq!(z, vec![4.0, -5.0, 0.0, 2.0]);

    // Blended draws test depth without writing it.
    let depth_writes: Vec<bool> = backend
        .commands()
        .iter()
        .filter_map(|c| match c {
            RenderCommand::SetDepthState(d) => Some(d.write),
            _ => None,
        })
        .collect();
    assert_eq!(depth_writes, vec![true, false]);
}

#[test]
fn material_override_replaces_submesh_material() {
    let stage = Stage::new();
    let mut scene = SceneGraph::new();
    let id = scene
        .add_mesh(&stage.assets, stage.cube, "cube", Transform::IDENTITY, None)
        .unwrap();
    assert!(scene.set_material_override(id, Some(stage.blue)).unwrap());

    let mut backend = RecordingBackend::new();
    let mut renderer = Renderer::default();
    renderer
        .render(&mut backend, &scene, &stage.assets, &front_camera())
        .unwrap();

    assert_eq!(renderer.draw_list().items()[0].material, stage.blue);
    let colors: Vec<_> = backend
        .commands()
        .iter()
        .filter_map(|c| match c {
            RenderCommand::SetUniform {
                name,
                value: UniformValue::Vec4(v),
            } if name == "color" => Some(*v),
            _ => None,
        })
        .collect();
    assert_eq!(colors, vec![Vec4::new(0.0, 0.0, 1.0, 1.0)]);
}

#[test]
fn per_draw_uniforms_carry_world_matrix() {
    let stage = Stage::new();
    let mut scene = SceneGraph::new();
    let group = scene
        .add_empty("group", Transform::from_xyz(1.0, 2.0, 0.0).with_scale(2.0), None)
        .unwrap();
    let cube = scene
        .add_mesh(&stage.assets, stage.cube, "cube", Transform::from_xyz(0.5, 0.0, 0.0), Some(group))
        .unwrap();

    let mut backend = RecordingBackend::new();
    let mut renderer = Renderer::default();
    renderer
        .render(&mut backend, &scene, &stage.assets, &front_camera())
        .unwrap();

    let expected = scene.world_matrix(cube).unwrap();
    let normal = expected.inverse().transpose();
    let uniforms: Vec<(String, Mat4)> = backend
        .commands()
        .iter()
        .filter_map(|c| match c {
            RenderCommand::SetUniform {
                name,
                value: UniformValue::Mat4(m),
            } if name == "model" || name == "normal_matrix" => Some((name.clone(), *m)),
            _ => None,
        })
        .collect();
    assert_eq!(
        uniforms,
        vec![("model".to_string(), expected), ("normal_matrix".to_string(), normal)]
    );
    assert_eq!(model_positions(&backend), vec![Vec3::new(2.0, 2.0, 0.0)]);
}

// ============================================================================
// Visibility and culling
// ============================================================================

#[rstest]
#[case::culling_on(true, 1, 1)]
#[case::culling_off(false, 2, 0)]
fn frustum_culling(#[case] enabled: bool, #[case] draws: usize, #[case] culled: usize) {
    let stage = Stage::new();
    let mut scene = SceneGraph::new();
    scene
        .add_mesh(&stage.assets, stage.cube, "in view", Transform::IDENTITY, None)
        .unwrap();
    scene
        .add_mesh(&stage.assets, stage.cube, "behind", Transform::from_xyz(0.0, 0.0, 20.0), None)
        .unwrap();

    let config = RendererConfig {
        frustum_culling: enabled,
        ..Default::default()
    };
    let mut backend = RecordingBackend::new();
    let mut renderer = Renderer::new(config);
    let stats = renderer
        .render(&mut backend, &scene, &stage.assets, &front_camera())
        .unwrap();

    assert_eq!(stats.objects_visited, 2);
    assert_eq!(stats.draw_calls, draws);
    assert_eq!(stats.objects_culled, culled);
}

#[test]
fn hidden_subtrees_are_not_drawn() {
    let stage = Stage::new();
    let mut scene = SceneGraph::new();
    let group = scene.add_empty("group", Transform::IDENTITY, None).unwrap();
    for x in [-1.0, 1.0] {
        scene
            .add_mesh(&stage.assets, stage.cube, "cube", Transform::from_xyz(x, 0.0, 0.0), Some(group))
            .unwrap();
    }
    scene
        .add_mesh(&stage.assets, stage.sphere, "sphere", Transform::IDENTITY, None)
        .unwrap();
    scene.set_visible(group, false).unwrap();

    let mut backend = RecordingBackend::new();
    let mut renderer = Renderer::default();
    let stats = renderer
        .render(&mut backend, &scene, &stage.assets, &front_camera())
        .unwrap();

    assert_eq!(stats.objects_visited, 1);
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(renderer.draw_list().items()[0].mesh, stage.sphere);
}

#[test]
fn submesh_without_material_is_skipped() {
    let mut stage = Stage::new();
    let bare = stage.assets.add_mesh(Mesh::cube(1.0, None));
    let mut scene = SceneGraph::new();
    scene
        .add_mesh(&stage.assets, bare, "bare", Transform::IDENTITY, None)
        .unwrap();
    scene
        .add_mesh(&stage.assets, stage.cube, "dressed", Transform::from_xyz(2.0, 0.0, 0.0), None)
        .unwrap();

    let mut backend = RecordingBackend::new();
    let mut renderer = Renderer::default();
    let stats = renderer
        .render(&mut backend, &scene, &stage.assets, &front_camera())
        .unwrap();

    assert_eq!(stats.submeshes_skipped, 1);
    assert_eq!(stats.draw_calls, 1);
}

#[test]
fn material_with_missing_shader_is_skipped() {
    let mut stage = Stage::new();
    let mut scene = SceneGraph::new();
    scene
        .add_mesh(&stage.assets, stage.cube, "cube", Transform::IDENTITY, None)
        .unwrap();
    stage.assets.remove_shader(stage.shader);

    let mut backend = RecordingBackend::new();
    let mut renderer = Renderer::default();
    let stats = renderer
        .render(&mut backend, &scene, &stage.assets, &front_camera())
        .unwrap();

    assert_eq!(stats.draw_calls, 0);
    assert_eq!(stats.submeshes_skipped, 1);
}

// ============================================================================
// GPU resource cache
// ============================================================================

#[test]
fn buffers_are_uploaded_once_and_rebuilt_on_edit() {
    let mut stage = Stage::new();
    let mut scene = SceneGraph::new();
    for x in [-2.0, 2.0] {
        scene
            .add_mesh(&stage.assets, stage.cube, "cube", Transform::from_xyz(x, 0.0, 0.0), None)
            .unwrap();
    }
    let camera = front_camera();
    let mut backend = RecordingBackend::new();
    let mut renderer = Renderer::default();
    let is_create = |c: &RenderCommand| matches!(c, RenderCommand::CreateBuffer { .. });

    renderer
        .render(&mut backend, &scene, &stage.assets, &camera)
        .unwrap();
    // One vertex and one index buffer shared by both objects.
    assert_eq!(count(&backend, is_create), 2);
    assert_eq!(backend.live_buffers(), 2);
    assert_eq!(renderer.gpu_cache().mesh_count(), 1);
    assert_eq!(renderer.gpu_cache().program_count(), 1);

    backend.clear_commands();
    renderer
        .render(&mut backend, &scene, &stage.assets, &camera)
        .unwrap();
    assert_eq!(count(&backend, is_create), 0);
    assert_eq!(
        count(&backend, |c| matches!(c, RenderCommand::CreateProgram { .. })),
        0
    );

    stage.assets.mesh_mut(stage.cube).unwrap().name = "edited".into();
    backend.clear_commands();
    renderer
        .render(&mut backend, &scene, &stage.assets, &camera)
        .unwrap();
    assert_eq!(count(&backend, is_create), 2);
    assert_eq!(
        count(&backend, |c| matches!(c, RenderCommand::DestroyBuffer(_))),
        2
    );
    assert_eq!(backend.live_buffers(), 2);
}

#[test]
fn removed_assets_are_evicted() {
    let mut stage = Stage::new();
    let mut scene = SceneGraph::new();
    let sphere = scene
        .add_mesh(&stage.assets, stage.sphere, "sphere", Transform::IDENTITY, None)
        .unwrap();
    let camera = front_camera();
    let mut backend = RecordingBackend::new();
    let mut renderer = Renderer::default();

    renderer
        .render(&mut backend, &scene, &stage.assets, &camera)
        .unwrap();
    assert_eq!(backend.live_buffers(), 2);

    scene.remove(sphere).unwrap();
    stage.assets.remove_mesh(stage.sphere);
    renderer
        .render(&mut backend, &scene, &stage.assets, &camera)
        .unwrap();
    assert_eq!(backend.live_buffers(), 0);
    assert_eq!(renderer.gpu_cache().mesh_count(), 0);
}

#[test]
fn release_destroys_everything() {
    let stage = Stage::new();
    let mut scene = SceneGraph::new();
    scene
        .add_mesh(&stage.assets, stage.cube, "cube", Transform::IDENTITY, None)
        .unwrap();
    scene
        .add_mesh(&stage.assets, stage.sphere, "sphere", Transform::from_xyz(2.0, 0.0, 0.0), None)
        .unwrap();
    let mut backend = RecordingBackend::new();
    let mut renderer = Renderer::default();
    renderer
        .render(&mut backend, &scene, &stage.assets, &front_camera())
        .unwrap();
    assert_eq!(backend.live_buffers(), 4);
    assert_eq!(backend.live_programs(), 1);

    renderer.release(&mut backend);
    assert_eq!(backend.live_buffers(), 0);
    assert_eq!(backend.live_programs(), 0);
    assert_eq!(renderer.gpu_cache().mesh_count(), 0);
}

// ============================================================================
// Custom shaders and textures
// ============================================================================

const TEXTURED_WGSL: &str = r#"
struct Camera {
    view_projection: mat4x4<f32>,
}

struct Object {
    model: mat4x4<f32>,
}

@group(0) @binding(0) var<uniform> camera: Camera;
@group(1) @binding(0) var<uniform> object: Object;
@group(2) @binding(0) var albedo: texture_2d<f32>;
@group(2) @binding(1) var albedo_sampler: sampler;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(2) uv: vec2<f32>) -> VertexOutput {
    var output: VertexOutput;
    output.clip_position = camera.view_projection * object.model * vec4<f32>(position, 1.0);
    output.uv = uv;
    return output;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(albedo, albedo_sampler, input.uv);
}
"#;

// Screen-space overlay: no per-object block.
const FLAT_WGSL: &str = r#"
struct Camera {
    view_projection: mat4x4<f32>,
}

struct MaterialParams {
    color: vec4<f32>,
}

@group(0) @binding(0) var<uniform> camera: Camera;
@group(2) @binding(0) var<uniform> material: MaterialParams;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return camera.view_projection * vec4<f32>(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return material.color;
}
"#;

fn uniform_names(backend: &RecordingBackend) -> Vec<String> {
    backend
        .commands()
        .iter()
        .filter_map(|c| match c {
            RenderCommand::SetUniform { name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn material_textures_are_uploaded_bound_and_released() {
    let mut stage = Stage::new();
    let shader = stage
        .assets
        .add_shader(Shader::from_wgsl("textured", TEXTURED_WGSL).unwrap());
    let checker = stage.assets.add_texture(TextureData::checkerboard(
        8,
        2,
        [255, 255, 255, 255],
        [0, 0, 0, 255],
    ));
    let material = stage
        .assets
        .add_material(Material::new("checker", shader).with_texture("albedo", checker));
    let mesh = stage.assets.add_mesh(Mesh::cube(1.0, Some(material)));

    let mut scene = SceneGraph::new();
    for x in [-2.0, 0.0] {
        scene
            .add_mesh(&stage.assets, mesh, "checker", Transform::from_xyz(x, 0.0, 0.0), None)
            .unwrap();
    }
    scene
        .add_mesh(&stage.assets, stage.cube, "red", Transform::from_xyz(2.0, 0.0, 0.0), None)
        .unwrap();

    let camera = front_camera();
    let mut backend = RecordingBackend::new();
    let mut renderer = Renderer::default();
    let is_create = |c: &RenderCommand| matches!(c, RenderCommand::CreateTexture { .. });
    let is_bind = |c: &RenderCommand| matches!(c, RenderCommand::BindTexture { .. });
    let is_destroy = |c: &RenderCommand| matches!(c, RenderCommand::DestroyTexture(_));

    let stats = renderer
        .render(&mut backend, &scene, &stage.assets, &camera)
        .unwrap();
    assert_eq!(stats.draw_calls, 3);
    assert_eq!(stats.material_binds, 2);
    assert_eq!(count(&backend, is_create), 1);
    assert_eq!(count(&backend, is_bind), 1);
    assert!(backend.commands().iter().any(|c| matches!(
        c,
        RenderCommand::BindTexture { name, .. } if name == "albedo"
    )));
    assert_eq!(renderer.gpu_cache().texture_count(), 1);

    // Cached across frames, rebound with the material.
    backend.clear_commands();
    renderer
        .render(&mut backend, &scene, &stage.assets, &camera)
        .unwrap();
    assert_eq!(count(&backend, is_create), 0);
    assert_eq!(count(&backend, is_bind), 1);

    backend.clear_commands();
    renderer.release(&mut backend);
    assert_eq!(count(&backend, is_destroy), 1);
    assert_eq!(backend.live_textures(), 0);

    // Removing the texture asset evicts it; the material still draws without it.
    renderer
        .render(&mut backend, &scene, &stage.assets, &camera)
        .unwrap();
    assert_eq!(backend.live_textures(), 1);
    stage.assets.remove_texture(checker);
    backend.clear_commands();
    let stats = renderer
        .render(&mut backend, &scene, &stage.assets, &camera)
        .unwrap();
    assert_eq!(count(&backend, is_destroy), 1);
    assert_eq!(count(&backend, is_bind), 0);
    assert_eq!(stats.draw_calls, 3);
    assert_eq!(backend.live_textures(), 0);
    assert_eq!(renderer.gpu_cache().texture_count(), 0);
}

#[test]
fn only_declared_uniforms_are_set() {
    let mut stage = Stage::new();
    let shader = stage
        .assets
        .add_shader(Shader::from_wgsl("flat", FLAT_WGSL).unwrap());
    let material = stage
        .assets
        .add_material(Material::unlit_color(shader, Vec4::new(0.0, 1.0, 0.0, 1.0)));
    let mesh = stage.assets.add_mesh(Mesh::plane(2.0, 2.0, 1, Some(material)));
    let mut scene = SceneGraph::new();
    scene
        .add_mesh(&stage.assets, mesh, "overlay", Transform::IDENTITY, None)
        .unwrap();

    let mut backend = RecordingBackend::new();
    let mut renderer = Renderer::default();
    let stats = renderer
        .render(&mut backend, &scene, &stage.assets, &front_camera())
        .unwrap();

    assert_eq!(stats.draw_calls, 1);
    assert_eq!(uniform_names(&backend), vec!["view_projection", "color"]);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn backend_failure_still_closes_the_frame() {
    let stage = Stage::new();
    let mut scene = SceneGraph::new();
    scene
        .add_mesh(&stage.assets, stage.cube, "cube", Transform::IDENTITY, None)
        .unwrap();
    let camera = front_camera();
    let mut backend = RecordingBackend::new();
    let mut renderer = Renderer::default();

    backend.set_fail_buffer_creation(true);
    let err = renderer
        .render(&mut backend, &scene, &stage.assets, &camera)
        .unwrap_err();
    assert!(matches!(
        err,
        RenderError::Backend(BackendError::BufferCreationFailed(_))
    ));
    assert_eq!(backend.frames(), 1);
    assert_eq!(backend.live_buffers(), 0);

    backend.set_fail_buffer_creation(false);
    let stats = renderer
        .render(&mut backend, &scene, &stage.assets, &camera)
        .unwrap();
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(backend.frames(), 2);
}

#[test]
fn config_from_ron_drives_renderer() {
    let config = RendererConfig::from_ron_str(
        "(clear_color: (1.0, 1.0, 1.0, 1.0), frustum_culling: false, stats_log_interval: 1)",
    )
    .unwrap();
    let renderer = Renderer::new(config.clone());
    assert_eq!(renderer.config(), &config);
    assert!(!renderer.config().frustum_culling);
    assert!(!renderer.config().sort_opaque_by_distance);
}
