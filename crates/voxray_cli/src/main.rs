use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use voxray_renderer::{render, Camera, RenderConfig, Scene};

mod cli;

use cli::Args;

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(args.log_level.into())
        .init();

    let start = Instant::now();

    let desc = voxray_core::load_scene(&args.scene)
        .with_context(|| format!("Failed to load scene {}", args.scene.display()))?;
    let width = args.width.unwrap_or(desc.image.width);
    let height = args.height.unwrap_or(desc.image.height);
    anyhow::ensure!(width > 0 && height > 0, "Image size {width}x{height} must be non-zero");

    let scene = Scene::from_description(&desc)
        .with_context(|| format!("Failed to build scene {}", args.scene.display()))?;
    let camera = Camera::from_description(&desc.camera, width, height);
    let config = RenderConfig::from(&desc);
    log::info!(
        "Scene ready in {:.2?}: {} geometries, {} lights",
        start.elapsed(),
        scene.len(),
        scene.lights().len()
    );

    let image = render(&camera, &scene, &config);
    image
        .save_png(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    log::info!("Wrote {} in {:.2?}", args.output.display(), start.elapsed());
    Ok(())
}
