//! Example: Render a single frame of a model to stdout
//!
//! Usage: cargo run --example snapshot -- path/to/model.glb [columns] [rows]

use std::env;
use std::io::{self, Write};

use anyhow::Result;
use lodview_core::{
    builder, load_model, BundleLoader, CameraState, FsLoader, LodTiers, Rasterizer, RenderConfig,
};
use lodview_terminal::AsciiSurface;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let columns = args.get(2).and_then(|v| v.parse().ok()).unwrap_or(80);
    let rows = args.get(3).and_then(|v| v.parse().ok()).unwrap_or(30);

    let tiers = LodTiers::default();
    let model = match args.get(1) {
        Some(path) => load_model(&FsLoader::new("."), path, &tiers)?,
        None => {
            eprintln!("No model given, using the built-in cube...");
            let loader = BundleLoader::new().with("cube.glb", builder::cube(2.0));
            load_model(&loader, "cube.glb", &tiers)?
        }
    };

    let mut camera = CameraState::default();
    camera.rotate(0.6, 0.4, std::f32::consts::PI, std::f32::consts::FRAC_PI_3);

    let mut surface = AsciiSurface::new(columns, rows);
    let mut rasterizer = Rasterizer::new(RenderConfig::default());
    let stats = rasterizer.render(&model, &camera, 0.0, &mut surface)?;

    let mut stdout = io::stdout();
    surface.draw(&mut stdout)?;
    writeln!(stdout)?;
    println!(
        "{}: {} of {} faces drawn, {} culled",
        model.name(),
        stats.faces_drawn,
        model.original_face_count(),
        stats.faces_culled
    );
    Ok(())
}
