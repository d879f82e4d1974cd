//! Headless glTF inspector.
//!
//! Loads an asset through the recording backend, plays its first animation
//! for a few frames and prints the resulting draw lists.
//!
//! ```text
//! cargo run --example marionette-inspect -- path/to/model.glb [frames] [settings.json]
//! ```

use anyhow::{Context, bail};
use marionette::{Engine, EngineSettings, FrameClock, HeadlessBackend};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        bail!("usage: marionette-inspect <model.gltf|model.glb> [frames] [settings.json]");
    };
    let frames: u32 = match args.next() {
        Some(arg) => arg.parse().context("frame count must be an integer")?,
        None => 4,
    };
    let settings = match args.next() {
        Some(settings_path) => EngineSettings::from_json_file(&settings_path)
            .with_context(|| format!("failed to read settings {settings_path}"))?,
        None => EngineSettings::default(),
    };

    let mut engine = Engine::new(HeadlessBackend::new(), settings)?;
    engine
        .load(&path)
        .with_context(|| format!("failed to load {path}"))?;

    if let Some(asset) = engine.active_asset() {
        println!(
            "{path}: {} nodes, {} scenes, {} meshes, {} materials, {} textures, {} animations",
            asset.graph().nodes().len(),
            asset.graph().scenes().len(),
            asset.meshes().len(),
            asset.materials().len(),
            asset.textures().len(),
            asset.animations().len(),
        );
        for (index, animation) in asset.animations().iter().enumerate() {
            println!(
                "  animation {index}: {:?} ({} channels, {:.3}s)",
                animation.name,
                animation.channels.len(),
                animation.duration()
            );
        }
    }

    let mut clock = FrameClock::fixed_rate(30.0);
    for _ in 0..frames {
        let dt = clock.tick();
        let Some(draw_list) = engine.frame(dt) else {
            println!("frame {}: skipped", engine.frame_count());
            continue;
        };

        println!(
            "frame {} (t = {:.3}s): {} draws",
            engine.frame_count(),
            engine.time(),
            draw_list.len()
        );
        for command in &draw_list {
            let position = command.world.w_axis;
            println!(
                "  node {:>3} mesh {:>3}.{:<2} at ({:.3}, {:.3}, {:.3}) color {:?}",
                command.node,
                command.mesh,
                command.submesh,
                position.x,
                position.y,
                position.z,
                command.base_color.to_array(),
            );
        }
    }

    let gpu = engine.shutdown();
    println!(
        "{} GPU objects created, {} still live after shutdown",
        gpu.created_count(),
        gpu.live_resources()
    );
    Ok(())
}
