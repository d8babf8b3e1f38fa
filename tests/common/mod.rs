//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use glam::{Vec3, Vec4};
use qplayer_preview::resources::{BlendMode, Material, MaterialId, Mesh, MeshId, Shader, ShaderId};
use qplayer_preview::{Assets, Camera};

/// Route `log` output to the test harness. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Assets for a small stage: an unlit shader, an opaque and a blended material,
/// and cube/sphere meshes bound to them
pub struct Stage {
    pub assets: Assets,
    pub shader: ShaderId,
    pub red: MaterialId,
    pub blue: MaterialId,
    pub glass: MaterialId,
    pub cube: MeshId,
    pub glass_cube: MeshId,
    pub sphere: MeshId,
}

impl Stage {
    pub fn new() -> Self {
        init_logging();
        let mut assets = Assets::new();
        let shader = assets.add_shader(Shader::unlit().expect("built-in shader is valid"));
        let red = assets.add_material(Material::unlit_color(shader, Vec4::new(1.0, 0.0, 0.0, 1.0)));
        let blue = assets.add_material(Material::unlit_color(shader, Vec4::new(0.0, 0.0, 1.0, 1.0)));
        let glass = assets.add_material(
            Material::unlit_color(shader, Vec4::new(1.0, 1.0, 1.0, 0.4))
                .with_blend(BlendMode::AlphaBlend),
        );
        let cube = assets.add_mesh(Mesh::cube(1.0, Some(red)));
        let glass_cube = assets.add_mesh(Mesh::cube(1.0, Some(glass)));
        let sphere = assets.add_mesh(Mesh::sphere(0.5, 16, 8, Some(blue)));
        Self {
            assets,
            shader,
            red,
            blue,
            glass,
            cube,
            glass_cube,
            sphere,
        }
    }
}

/// Camera on +Z looking at the origin
pub fn front_camera() -> Camera {
    let mut camera = Camera::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
    camera.set_viewport(800, 600);
    camera
}

pub fn approx_eq(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < 1e-4
}
