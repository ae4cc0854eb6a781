//! lodview Web - canvas 2D host for the software rasterizer
//!
//! The page hands container bytes to [`WebViewer::load_bytes`] (fetched
//! however it likes), forwards pointer events as gestures and calls
//! [`WebViewer::frame`] from `requestAnimationFrame`. Loads run inline:
//! there are no worker threads here.
use std::sync::Arc;

use lodview_core::{
    build_model, CameraController, Color, FrameStats, ModelAsset, Rasterizer, Surface,
    ViewerConfig,
};
use nalgebra::Point2;
use tracing::{info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

/// CSS color string for a canvas style
pub fn css_color(color: Color) -> String {
    format!(
        "rgba({}, {}, {}, {:.3})",
        color.r,
        color.g,
        color.b,
        color.a as f32 / 255.0
    )
}

/// A [`Surface`] over a 2D canvas context
pub struct CanvasSurface {
    context: CanvasRenderingContext2d,
    width: f32,
    height: f32,
}

impl CanvasSurface {
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Self, JsValue> {
        let context = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self {
            context,
            width: canvas.width() as f32,
            height: canvas.height() as f32,
        })
    }

    pub fn clear(&self) {
        self.context
            .clear_rect(0.0, 0.0, self.width as f64, self.height as f64);
    }

    fn trace_path(&self, points: &[Point2<f32>]) {
        self.context.begin_path();
        for (i, p) in points.iter().enumerate() {
            if i == 0 {
                self.context.move_to(p.x as f64, p.y as f64);
            } else {
                self.context.line_to(p.x as f64, p.y as f64);
            }
        }
        self.context.close_path();
    }
}

impl Surface for CanvasSurface {
    fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn fill_polygon(&mut self, points: &[Point2<f32>], color: Color) {
        self.trace_path(points);
        self.context.set_fill_style_str(&css_color(color));
        self.context.fill();
    }

    fn stroke_polygon(&mut self, points: &[Point2<f32>], color: Color, width: f32) {
        self.trace_path(points);
        self.context.set_stroke_style_str(&css_color(color));
        self.context.set_line_width(width as f64);
        self.context.stroke();
    }
}

/// Model, camera and status, independent of any canvas
pub struct ViewerState {
    config: ViewerConfig,
    camera: CameraController,
    rasterizer: Rasterizer,
    model: Option<Arc<ModelAsset>>,
    error: Option<String>,
}

impl ViewerState {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            camera: CameraController::new(config.camera.clone()),
            rasterizer: Rasterizer::new(config.render.clone()),
            config,
            model: None,
            error: None,
        }
    }

    /// Build a model from container bytes. On failure the previous model
    /// stays and the error is kept for display.
    pub fn load_bytes(&mut self, name: &str, bytes: &[u8]) -> bool {
        match build_model(bytes, name, &self.config.lod) {
            Ok(model) => {
                info!(
                    name,
                    faces = model.face_count(),
                    original_faces = model.original_face_count(),
                    "model loaded"
                );
                self.model = Some(Arc::new(model));
                self.error = None;
                true
            }
            Err(e) => {
                warn!(name, "load failed: {}", e);
                self.error = Some(format!("failed to load {}: {}", name, e));
                false
            }
        }
    }

    pub fn frame(&mut self, dt: f32, surface: &mut dyn Surface) -> Option<FrameStats> {
        self.camera.tick(dt);
        let model = self.model.as_ref()?;
        self.rasterizer
            .draw_frame(model, self.camera.state(), self.camera.auto_angle(), surface)
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraController {
        &mut self.camera
    }

    pub fn model(&self) -> Option<&Arc<ModelAsset>> {
        self.model.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[wasm_bindgen]
pub struct WebViewer {
    state: ViewerState,
    surface: CanvasSurface,
}

#[wasm_bindgen]
impl WebViewer {
    /// Attach to the canvas element with the given id
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str) -> Result<WebViewer, JsValue> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str(&format!("no element with id {}", canvas_id)))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| JsValue::from_str(&format!("{} is not a canvas", canvas_id)))?;

        Ok(WebViewer {
            state: ViewerState::new(ViewerConfig::default()),
            surface: CanvasSurface::new(&canvas)?,
        })
    }

    /// Decode, extract and simplify a container held in memory
    #[wasm_bindgen(js_name = loadBytes)]
    pub fn load_bytes(&mut self, name: &str, bytes: &[u8]) -> bool {
        self.state.load_bytes(name, bytes)
    }

    /// Last load error, if any
    pub fn error(&self) -> Option<String> {
        self.state.error().map(str::to_string)
    }

    #[wasm_bindgen(js_name = gestureStart)]
    pub fn gesture_start(&mut self, x: f32, y: f32) {
        self.state.camera_mut().gesture_start(x, y);
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.state.camera_mut().pan(dx, dy);
    }

    pub fn pinch(&mut self, factor: f32) {
        self.state.camera_mut().pinch(factor);
    }

    #[wasm_bindgen(js_name = gestureEnd)]
    pub fn gesture_end(&mut self) {
        self.state.camera_mut().gesture_end();
    }

    pub fn reset(&mut self) {
        self.state.camera_mut().reset();
    }

    /// Advance `dt` seconds and repaint. Returns the number of faces drawn.
    pub fn frame(&mut self, dt: f32) -> u32 {
        self.surface.clear();
        self.state
            .frame(dt, &mut self.surface)
            .map(|stats| stats.faces_drawn as u32)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodview_core::{builder, RecordingSurface};

    #[test]
    fn test_css_color() {
        assert_eq!(css_color(Color::RED), "rgba(255, 0, 0, 1.000)");
        assert_eq!(css_color(Color::rgba(0, 0, 0, 0)), "rgba(0, 0, 0, 0.000)");
    }

    #[test]
    fn test_load_and_frame() {
        let mut state = ViewerState::new(ViewerConfig::default());
        let mut surface = RecordingSurface::new(200.0, 100.0);
        assert!(state.frame(0.016, &mut surface).is_none());

        assert!(state.load_bytes("cube", &builder::cube(1.0)));
        let stats = state.frame(0.016, &mut surface).unwrap();
        assert_eq!(stats.faces_drawn, 12);
        assert_eq!(surface.fills.len(), 12);
    }

    #[test]
    fn test_failed_load_keeps_model() {
        let mut state = ViewerState::new(ViewerConfig::default());
        assert!(state.load_bytes("cube", &builder::cube(1.0)));
        assert!(!state.load_bytes("junk", b"junk"));
        assert!(state.error().unwrap().contains("junk"));
        assert_eq!(state.model().unwrap().name(), "cube");
    }

    #[test]
    fn test_gestures_reach_camera() {
        let mut state = ViewerState::new(ViewerConfig::default());
        state.camera_mut().gesture_start(10.0, 10.0);
        assert!(!state.camera().is_auto_rotating());
        state.camera_mut().pinch(10.0);
        assert_eq!(state.camera().state().scale, 3.0);
    }
}
