//! The view/controller pair: holds the current model, the camera, the
//! rasterizer and at most one in-flight load.

use std::sync::Arc;

use tracing::{info, warn};

use crate::camera::CameraController;
use crate::config::ViewerConfig;
use crate::geometry::ModelAsset;
use crate::loader::AssetLoader;
use crate::pipeline::{self, PendingLoad};
use crate::raster::{FrameStats, Rasterizer, Surface};

/// User-visible load status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Empty,
    Loading { path: String },
    Ready,
    Failed { path: String, reason: String },
}

pub struct ModelView {
    loader: Arc<dyn AssetLoader>,
    config: ViewerConfig,
    camera: CameraController,
    rasterizer: Rasterizer,
    model: Option<Arc<ModelAsset>>,
    pending: Option<PendingLoad>,
    last_path: Option<String>,
    state: ViewState,
}

impl ModelView {
    pub fn new(loader: Arc<dyn AssetLoader>, config: ViewerConfig) -> Self {
        Self {
            loader,
            camera: CameraController::new(config.camera.clone()),
            rasterizer: Rasterizer::new(config.render.clone()),
            config,
            model: None,
            pending: None,
            last_path: None,
            state: ViewState::Empty,
        }
    }

    /// Start loading `path` in the background. Any load still in flight is
    /// abandoned, so only the most recent request can replace the model.
    pub fn request_load(&mut self, path: impl Into<String>) {
        let path = path.into();
        if let Some(previous) = self.pending.take() {
            info!(previous = previous.path(), next = %path, "superseding pending load");
        }
        self.pending = Some(pipeline::spawn_load(
            Arc::clone(&self.loader),
            path.clone(),
            self.config.lod.clone(),
        ));
        self.last_path = Some(path.clone());
        self.state = ViewState::Loading { path };
    }

    /// Explicitly retry the most recent request
    pub fn reload(&mut self) -> bool {
        match self.last_path.clone() {
            Some(path) => {
                self.request_load(path);
                true
            }
            None => false,
        }
    }

    /// Collect a finished background load, if any. Returns true when the
    /// state changed.
    pub fn poll(&mut self) -> bool {
        let Some(result) = self.pending.as_ref().and_then(PendingLoad::poll) else {
            return false;
        };
        let Some(pending) = self.pending.take() else {
            return false;
        };

        match result {
            Ok(model) => {
                self.model = Some(Arc::new(model));
                self.state = ViewState::Ready;
            }
            Err(e) => {
                warn!(path = pending.path(), "load failed: {}", e);
                self.state = ViewState::Failed {
                    path: pending.path().to_string(),
                    reason: e.to_string(),
                };
            }
        }
        true
    }

    /// Advance the clock, pick up finished loads and paint the current model.
    /// Returns `None` when nothing was drawn.
    pub fn frame(&mut self, dt: f32, surface: &mut dyn Surface) -> Option<FrameStats> {
        self.poll();
        self.camera.tick(dt);
        let model = self.model.as_ref()?;
        self.rasterizer
            .draw_frame(model, self.camera.state(), self.camera.auto_angle(), surface)
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn model(&self) -> Option<&Arc<ModelAsset>> {
        self.model.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraController {
        &mut self.camera
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }
}
