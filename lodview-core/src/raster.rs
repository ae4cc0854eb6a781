//! Painter's-algorithm rasterizer.
//!
//! Faces are depth-sorted by mean camera-space Z (farthest first) and painted
//! through a [`Surface`], which only needs to fill and stroke polygons. There
//! is no depth buffer, so interpenetrating or strongly concave geometry can
//! draw in the wrong order.

use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::camera::CameraState;
use crate::error::{ConfigError, RuntimeError};
use crate::geometry::{Color, ModelAsset};
use crate::projection::Projection;

/// Drawing target supplied by the host UI
pub trait Surface {
    /// Width and height in device-independent pixels
    fn size(&self) -> (f32, f32);

    fn fill_polygon(&mut self, points: &[Point2<f32>], color: Color);

    fn stroke_polygon(&mut self, points: &[Point2<f32>], color: Color, width: f32);
}

/// Rasterizer tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Share of the smaller surface dimension the unit-radius model spans
    pub fit_fraction: f32,
    pub outline_alpha: f32,
    pub outline_width: f32,
    /// Maximum relative brightness/saturation change applied per face
    pub jitter: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fit_fraction: 0.4,
            outline_alpha: 0.15,
            outline_width: 0.5,
            jitter: 0.12,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fit_fraction.is_finite() && self.fit_fraction > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "render: fit_fraction {} must be positive",
                self.fit_fraction
            )));
        }
        if !(0.0..=1.0).contains(&self.outline_alpha) {
            return Err(ConfigError::Invalid(format!(
                "render: outline_alpha {} must be within 0..=1",
                self.outline_alpha
            )));
        }
        if !(self.outline_width.is_finite() && self.outline_width >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "render: outline_width {} must be non-negative",
                self.outline_width
            )));
        }
        if !(self.jitter.is_finite() && self.jitter >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "render: jitter {} must be non-negative",
                self.jitter
            )));
        }
        Ok(())
    }
}

/// What one frame drew
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub faces_drawn: usize,
    pub faces_culled: usize,
}

/// Deterministic value in [-1, 1] derived from a face index
fn face_noise(index: usize) -> f32 {
    let h = (index as u32).wrapping_mul(0x9E37_79B1) >> 16;
    (h & 0xFFFF) as f32 / 32767.5 - 1.0
}

/// Perturb brightness and saturation of `color` by up to `amount`, keyed on
/// the face index so the pattern is stable across frames.
pub fn shade(color: Color, index: usize, amount: f32) -> Color {
    let n = face_noise(index);
    let brightness = 1.0 + n * amount;
    let saturation = 1.0 - n * amount * 0.5;
    let grey = color.luminance() * 255.0;
    let channel = |c: u8| {
        let saturated = grey + (c as f32 - grey) * saturation;
        (saturated * brightness).round().clamp(0.0, 255.0) as u8
    };
    Color::rgba(channel(color.r), channel(color.g), channel(color.b), color.a)
}

/// Projects, sorts and paints models. Scratch buffers are reused across frames.
#[derive(Debug, Default)]
pub struct Rasterizer {
    config: RenderConfig,
    camera_space: Vec<Point3<f32>>,
    order: Vec<(usize, f32)>,
}

impl Rasterizer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            camera_space: Vec::new(),
            order: Vec::new(),
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    fn validate(
        model: &ModelAsset,
        camera: &CameraState,
        width: f32,
        height: f32,
    ) -> Result<(), RuntimeError> {
        if model.vertex_count() == 0 || model.face_count() == 0 {
            return Err(RuntimeError::EmptyModel);
        }
        let vertex_count = model.vertex_count();
        if let Some((face, index)) = model
            .faces()
            .iter()
            .map(|face| face.max_index())
            .enumerate()
            .find(|&(_, index)| index as usize >= vertex_count)
        {
            return Err(RuntimeError::IndexOutOfRange {
                face,
                index,
                vertex_count,
            });
        }
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(RuntimeError::InvalidSurface { width, height });
        }
        if !(camera.distance.is_finite() && camera.distance > 0.0) {
            return Err(RuntimeError::InvalidCamera("distance must be positive"));
        }
        if !(camera.scale.is_finite() && camera.scale > 0.0) {
            return Err(RuntimeError::InvalidCamera("scale must be positive"));
        }
        if !(camera.pitch.is_finite() && camera.yaw.is_finite()) {
            return Err(RuntimeError::InvalidCamera("angles must be finite"));
        }
        Ok(())
    }

    /// Transform every vertex and order faces farthest first. Returns the
    /// sorted face indices with their mean camera-space Z.
    pub fn depth_order(&mut self, model: &ModelAsset, projection: &Projection) -> &[(usize, f32)] {
        self.camera_space.clear();
        self.camera_space.extend(
            model
                .vertices()
                .iter()
                .map(|vertex| projection.to_camera(&vertex.position)),
        );

        let camera_space = &self.camera_space;
        self.order.clear();
        self.order.extend(model.faces().iter().enumerate().map(|(i, face)| {
            let [a, b, c] = face.indices();
            (i, (camera_space[a].z + camera_space[b].z + camera_space[c].z) / 3.0)
        }));
        // Stable, so equal depths keep face order
        self.order.sort_by(|a, b| b.1.total_cmp(&a.1));
        &self.order
    }

    /// Draw one frame of `model`
    pub fn render(
        &mut self,
        model: &ModelAsset,
        camera: &CameraState,
        auto_angle: f32,
        surface: &mut dyn Surface,
    ) -> Result<FrameStats, RuntimeError> {
        let (width, height) = surface.size();
        Self::validate(model, camera, width, height)?;

        let projection = Projection::new(
            model.bounds(),
            camera,
            auto_angle,
            width,
            height,
            self.config.fit_fraction,
        );
        self.depth_order(model, &projection);

        let outline = Color::BLACK.with_alpha(self.config.outline_alpha);
        let faces = model.faces();
        let colors = model.colors();
        let mut stats = FrameStats::default();

        for &(index, _) in &self.order {
            let [a, b, c] = faces[index].indices();
            let projected = [
                projection.to_screen(&self.camera_space[a]),
                projection.to_screen(&self.camera_space[b]),
                projection.to_screen(&self.camera_space[c]),
            ];
            let [Some(pa), Some(pb), Some(pc)] = projected else {
                stats.faces_culled += 1;
                continue;
            };
            let points = [pa, pb, pc];

            surface.fill_polygon(&points, shade(colors[index], index, self.config.jitter));
            surface.stroke_polygon(&points, outline, self.config.outline_width);
            stats.faces_drawn += 1;
        }

        Ok(stats)
    }

    /// Frame-boundary wrapper around [`render`](Self::render): a bad frame is
    /// logged and skipped instead of propagating.
    pub fn draw_frame(
        &mut self,
        model: &ModelAsset,
        camera: &CameraState,
        auto_angle: f32,
        surface: &mut dyn Surface,
    ) -> Option<FrameStats> {
        match self.render(model, camera, auto_angle, surface) {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!(model = model.name(), "skipping frame: {}", e);
                None
            }
        }
    }
}

/// A surface that records draw calls; useful for tests and headless hosts
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub width: f32,
    pub height: f32,
    pub fills: Vec<([Point2<f32>; 3], Color)>,
    pub strokes: usize,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn fill_polygon(&mut self, points: &[Point2<f32>], color: Color) {
        if let [a, b, c] = points {
            self.fills.push(([*a, *b, *c], color));
        }
    }

    fn stroke_polygon(&mut self, _points: &[Point2<f32>], _color: Color, _width: f32) {
        self.strokes += 1;
    }
}
