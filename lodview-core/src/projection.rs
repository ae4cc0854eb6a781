//! View transform and perspective projection onto a 2D surface

use nalgebra::{Matrix4, Point2, Point3, Vector3};

use crate::camera::CameraState;
use crate::geometry::BoundingBox;

/// Smallest allowed `distance + z` before a point counts as behind the eye
const MIN_DEPTH: f32 = 1e-3;

/// Model rotation for the given camera angles.
///
/// Composition order is yaw, then pitch, then the auto-rotation angle, as a
/// canvas transform stack would apply them: the auto-rotation spins the model
/// about its own vertical axis before the user's tilt is applied.
pub fn rotation_matrix(state: &CameraState, auto_angle: f32) -> Matrix4<f32> {
    let yaw = Matrix4::new_rotation(Vector3::new(0.0, state.yaw, 0.0));
    let pitch = Matrix4::new_rotation(Vector3::new(state.pitch, 0.0, 0.0));
    let auto = Matrix4::new_rotation(Vector3::new(0.0, auto_angle, 0.0));
    yaw * pitch * auto
}

/// Matrix moving a model's bounding box center to the origin and fitting it
/// to unit radius
pub fn fit_matrix(bounds: &BoundingBox) -> Matrix4<f32> {
    let radius = bounds.radius();
    let fit = if radius > f32::EPSILON { 1.0 / radius } else { 1.0 };
    Matrix4::new_scaling(fit) * Matrix4::new_translation(&-bounds.center().coords)
}

/// Everything needed to take a model-space point to surface coordinates
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    /// Model space to camera space
    pub model_view: Matrix4<f32>,
    pub distance: f32,
    /// Pixels per camera-space unit at zero depth, including the zoom scale
    pub pixels_per_unit: f32,
    pub center: Point2<f32>,
}

impl Projection {
    /// `fit_fraction` is the share of the smaller surface dimension a unit
    /// length spans at zero depth.
    pub fn new(
        bounds: &BoundingBox,
        state: &CameraState,
        auto_angle: f32,
        width: f32,
        height: f32,
        fit_fraction: f32,
    ) -> Self {
        Self {
            model_view: rotation_matrix(state, auto_angle) * fit_matrix(bounds),
            distance: state.distance,
            pixels_per_unit: width.min(height) * fit_fraction * state.scale,
            center: Point2::new(width / 2.0, height / 2.0),
        }
    }

    /// Model space to camera space
    pub fn to_camera(&self, point: &Point3<f32>) -> Point3<f32> {
        self.model_view.transform_point(point)
    }

    /// Perspective-divide a camera-space point onto the surface. Returns
    /// `None` for points at or behind the eye.
    pub fn to_screen(&self, point: &Point3<f32>) -> Option<Point2<f32>> {
        let depth = self.distance + point.z;
        if depth <= MIN_DEPTH {
            return None;
        }
        let factor = self.distance / depth * self.pixels_per_unit;
        Some(Point2::new(
            self.center.x + point.x * factor,
            self.center.y - point.y * factor,
        ))
    }
}
