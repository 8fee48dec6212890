use std::env;
use std::path::Path;

use paradise_core::{NodeId, SceneDescription, SceneGraph};
use paradise_math::gl_math::to_degrees;

/// Aspect ratio used to resolve camera field of view without a window.
const INSPECT_ASPECT: f32 = 16.0 / 9.0;

fn main() {
    let _ = tracing_subscriber::fmt().with_target(false).try_init();

    let Some(path) = env::args().nth(1) else {
        eprintln!("Usage: scene_inspector <path/to/scene.toml>");
        std::process::exit(2);
    };

    if let Err(err) = run(Path::new(&path)) {
        eprintln!("scene_inspector error: {err}");
        std::process::exit(1);
    }
}

fn run(path: &Path) -> Result<(), String> {
    let description = SceneDescription::load(path)
        .map_err(|err| format!("failed to open {}: {err}", path.display()))?;
    let (scene, warnings) = SceneGraph::build(&description, INSPECT_ASPECT)
        .map_err(|err| format!("failed to build {}: {err}", path.display()))?;

    println!("Scene: {}", description.name.as_deref().unwrap_or("<unnamed>"));
    println!("Source: {}", path.display());
    println!(
        "Nodes: {}  Meshes: {}  Objects: {}  Lights: {}",
        scene.nodes.len(),
        scene.meshes().len(),
        scene.objects().len(),
        scene.lights().len()
    );

    let camera = &scene.camera;
    println!(
        "Camera @ {}  fov_y {:.1}°  near {}  far {}",
        camera.transform.position,
        to_degrees(camera.fov_y()),
        camera.near(),
        camera.far()
    );

    println!("Hierarchy:");
    for root in scene.nodes.roots() {
        print_node(&scene, root, 1);
    }

    println!("Portal links: {}", scene.portals.len());
    for (index, (link, frames)) in scene
        .portals
        .links()
        .iter()
        .zip(scene.link_frames())
        .enumerate()
    {
        let name = |id| scene.object(id).map_or("?", |object| object.name.as_str());
        match frames {
            Some(frames) => println!(
                "  [{index}] {} -> {}  radius {:.3}  normal {}",
                name(link.master),
                name(link.link),
                frames.master.radius,
                frames.master.normal
            ),
            None => println!(
                "  [{index}] {} -> {}  (degenerate transform)",
                name(link.master),
                name(link.link)
            ),
        }
    }

    println!("Warnings: {}", warnings.len());
    for warning in &warnings {
        println!("  {warning}");
    }

    Ok(())
}

fn print_node(scene: &SceneGraph, id: NodeId, depth: usize) {
    let Some(node) = scene.nodes.get(id) else {
        return;
    };
    let position = scene
        .nodes
        .world_matrix(id)
        .map(|world| world.position())
        .unwrap_or(node.transform.position);
    println!("{}{} @ {position}", "  ".repeat(depth), node.name);
    for &child in node.children() {
        print_node(scene, child, depth + 1);
    }
}
