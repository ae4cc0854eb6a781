//! lodview terminal viewer
//!
//! Opens a model container and renders it as colored ASCII.
//! Controls:
//!   - Mouse drag / Arrow keys: Rotate
//!   - Scroll / +/-: Zoom
//!   - Space: Toggle auto-rotation
//!   - R: Reset camera
//!   - L: Reload the model
//!   - Q/ESC: Quit

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use lodview_core::{builder, AssetLoader, BundleLoader, FsLoader, ModelView, ViewerConfig};
use lodview_terminal::{logging, TerminalApp};
use tracing::info;

const DEMO_PATH: &str = "demo-cube.glb";

#[derive(Debug, Parser)]
#[command(name = "lodview-terminal", version, about = "Render 3D model containers in the terminal")]
struct Args {
    /// Model container to open; a built-in cube is shown when omitted
    path: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Render exactly this many faces, overriding the size tiers
    #[arg(long)]
    faces: Option<usize>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_logging(args.log_file.as_deref())?;

    let mut config = match &args.config {
        Some(path) => ViewerConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    if let Some(faces) = args.faces {
        config.lod.fixed_faces = Some(faces);
    }

    let (loader, request): (Arc<dyn AssetLoader>, String) = match &args.path {
        Some(path) => (
            Arc::new(FsLoader::new(".")),
            path.to_string_lossy().into_owned(),
        ),
        None => (
            Arc::new(BundleLoader::new().with(DEMO_PATH, builder::cube(2.0))),
            DEMO_PATH.to_string(),
        ),
    };
    info!(path = %request, "opening model");

    let mut view = ModelView::new(loader, config);
    view.request_load(request);

    let mut app = TerminalApp::new(view)?;
    app.run()?;
    Ok(())
}
