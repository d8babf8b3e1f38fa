//! Headless preview dump
//!
//! Builds a small stage scene, renders it with the recording backend and
//! prints per-frame statistics and a pick result.
//!
//! ```text
//! cargo run --example preview_dump -- --frames 3 --orbit 30 --pick 640,360
//! ```

use clap::Parser;
use glam::{Vec3, Vec4};
use qplayer_preview::backend::RenderCommand;
use qplayer_preview::resources::{BlendMode, Material, Mesh, Shader};
use qplayer_preview::scene::ReparentMode;
use qplayer_preview::{
    Assets, Camera, RecordingBackend, Renderer, RendererConfig, SceneGraph, Transform,
};

/// QPlayer preview renderer dump.
#[derive(Parser, Debug)]
#[command(
    name = "preview_dump",
    about = "Render a demo stage headlessly and print frame statistics",
    version
)]
struct Args {
    /// Renderer config file (RON).
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Viewport width in pixels.
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Viewport height in pixels.
    #[arg(long, default_value = "720")]
    height: u32,

    /// Number of frames to render.
    #[arg(long, default_value = "1")]
    frames: u32,

    /// Degrees the camera orbits between frames.
    #[arg(long, default_value = "0")]
    orbit: f32,

    /// Pixel to pick after the last frame, as `x,y`.
    #[arg(long, value_parser = parse_pixel)]
    pick: Option<(f32, f32)>,

    /// Print every recorded backend command.
    #[arg(long)]
    commands: bool,

    /// Disable frustum culling.
    #[arg(long)]
    no_culling: bool,
}

fn parse_pixel(s: &str) -> Result<(f32, f32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got '{s}'"))?;
    let x = x.trim().parse().map_err(|e| format!("bad x: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad y: {e}"))?;
    Ok((x, y))
}

fn build_stage(assets: &mut Assets) -> Result<SceneGraph, Box<dyn std::error::Error>> {
    let unlit = assets.add_shader(Shader::unlit()?);
    let floor_mat =
        assets.add_material(Material::unlit_color(unlit, Vec4::new(0.3, 0.3, 0.35, 1.0)));
    let prop_mat =
        assets.add_material(Material::unlit_color(unlit, Vec4::new(0.8, 0.2, 0.2, 1.0)));
    let haze_mat = assets.add_material(
        Material::unlit_color(unlit, Vec4::new(0.6, 0.7, 1.0, 0.35))
            .with_blend(BlendMode::AlphaBlend),
    );

    let floor = assets.add_mesh(Mesh::plane(20.0, 12.0, 4, Some(floor_mat)));
    let cube = assets.add_mesh(Mesh::cube(1.0, Some(prop_mat)));
    let sphere = assets.add_mesh(Mesh::sphere(0.75, 24, 12, Some(haze_mat)));

    let mut scene = SceneGraph::new();
    scene.add_mesh(assets, floor, "Stage Floor", Transform::IDENTITY, None)?;

    let rig = scene.add_empty("Truss", Transform::from_xyz(0.0, 4.0, 0.0), None)?;
    for i in 0..4 {
        let x = -4.5 + 3.0 * i as f32;
        scene.add_mesh(
            assets,
            cube,
            &format!("Fixture {i}"),
            Transform::from_xyz(x, 0.0, 0.0).with_scale(0.4),
            Some(rig),
        )?;
    }

    let props = scene.add_empty("Props", Transform::IDENTITY, None)?;
    let crate_a = scene.add_mesh(
        assets,
        cube,
        "Crate A",
        Transform::from_xyz(-2.0, 0.5, 1.0),
        Some(props),
    )?;
    scene.add_mesh(
        assets,
        cube,
        "Crate B",
        Transform::from_xyz(2.0, 0.5, -1.0).with_euler_degrees(Vec3::new(0.0, 30.0, 0.0)),
        Some(props),
    )?;
    scene.add_mesh(
        assets,
        sphere,
        "Haze",
        Transform::from_xyz(0.0, 1.5, 0.0),
        None,
    )?;

    // Move a crate under the truss without changing where it sits.
    let hanging = scene.add_empty("Hanging", Transform::from_xyz(0.0, -1.0, 2.0), Some(rig))?;
    scene.set_parent(crate_a, Some(hanging), ReparentMode::KeepWorld)?;

    log::info!(
        "Stage built: {} objects, bounds {:?}",
        scene.len(),
        scene.scene_bounds()
    );
    scene.drain_events();
    Ok(scene)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => RendererConfig::load(path)?,
        None => RendererConfig::default(),
    };
    if args.no_culling {
        config.frustum_culling = false;
    }

    let mut assets = Assets::new();
    let scene = build_stage(&mut assets)?;

    let mut camera = Camera::new(Vec3::new(0.0, 5.0, 14.0), Vec3::new(0.0, 1.5, 0.0));
    camera.set_viewport(args.width, args.height);

    let mut backend = RecordingBackend::new();
    let mut renderer = Renderer::new(config);
    renderer.resize(args.width, args.height);

    for frame in 0..args.frames {
        let stats = renderer.render(&mut backend, &scene, &assets, &camera)?;
        println!("frame {frame}: {stats}");
        for (queue, draws) in &stats.queue_draws {
            println!("  queue {:>4}: {} draws", queue.0, draws);
        }
        if args.commands {
            for command in backend.commands() {
                println!("  {:?}", command);
            }
        }
        let draws = backend
            .take_commands()
            .iter()
            .filter(|c| matches!(c, RenderCommand::DrawIndexed { .. }))
            .count();
        debug_assert_eq!(draws, stats.draw_calls);

        let orbit = glam::Quat::from_rotation_y(args.orbit.to_radians());
        camera.position = camera.target + orbit * (camera.position - camera.target);
    }

    if let Some((x, y)) = args.pick {
        let ray = camera.screen_point_to_ray(x, y, args.width as f32, args.height as f32);
        match scene.raycast(&assets, &ray) {
            Some(hit) => {
                let name = scene.get(hit.object).map(|o| o.name()).unwrap_or("?");
                println!(
                    "pick ({x}, {y}): '{}' at {:.2} (point {:?}, normal {:?})",
                    name, hit.distance, hit.point, hit.normal
                );
            }
            None => println!("pick ({x}, {y}): nothing"),
        }
    }

    renderer.release(&mut backend);
    println!(
        "released: {} buffers, {} programs, {} textures still live",
        backend.live_buffers(),
        backend.live_programs(),
        backend.live_textures()
    );
    Ok(())
}
