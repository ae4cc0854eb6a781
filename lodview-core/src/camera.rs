//! Camera state and the gesture/tick driven controller that owns it

use std::f32::consts::{PI, TAU};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::ConfigError;

/// A unit-radius fit keeps every corner within this distance of the center
const FITTED_CORNER: f32 = 1.732_050_8;

/// Camera tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Initial camera distance from the model (model is fitted to unit radius)
    pub distance: f32,
    /// Radians of rotation per unit of drag
    pub sensitivity: f32,
    /// Auto-rotation speed in radians per second
    pub auto_rotate_speed: f32,
    /// Whether auto-rotation runs when the view opens
    pub auto_rotate: bool,
    /// Seconds after a gesture ends before auto-rotation resumes; never when unset
    pub resume_after: Option<f32>,
    /// Pitch is clamped to [-pitch_limit, pitch_limit]
    pub pitch_limit: f32,
    /// Yaw is clamped to [-yaw_limit, yaw_limit]
    pub yaw_limit: f32,
    pub min_scale: f32,
    pub max_scale: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            distance: 4.0,
            sensitivity: 0.01,
            auto_rotate_speed: 0.5,
            auto_rotate: true,
            resume_after: None,
            pitch_limit: PI / 3.0,
            yaw_limit: PI,
            min_scale: 0.5,
            max_scale: 3.0,
        }
    }
}

impl CameraConfig {
    /// Reject limits the controller cannot clamp against and a starting
    /// distance that puts part of the fitted model behind the eye.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(format!("camera: {msg}")));
        let finite = [
            ("distance", self.distance),
            ("sensitivity", self.sensitivity),
            ("auto_rotate_speed", self.auto_rotate_speed),
            ("pitch_limit", self.pitch_limit),
            ("yaw_limit", self.yaw_limit),
            ("min_scale", self.min_scale),
            ("max_scale", self.max_scale),
        ];
        if let Some((name, _)) = finite.iter().find(|(_, value)| !value.is_finite()) {
            return invalid(format!("{name} must be finite"));
        }
        if self.distance <= FITTED_CORNER {
            return invalid(format!("distance {} must exceed {FITTED_CORNER}", self.distance));
        }
        if self.pitch_limit <= 0.0 || self.yaw_limit <= 0.0 {
            return invalid("pitch_limit and yaw_limit must be positive".into());
        }
        if self.min_scale <= 0.0 || self.min_scale > self.max_scale {
            return invalid(format!(
                "scale range {}..{} is empty",
                self.min_scale, self.max_scale
            ));
        }
        if let Some(delay) = self.resume_after {
            if !(delay.is_finite() && delay >= 0.0) {
                return invalid(format!("resume_after {delay} must be a non-negative number"));
            }
        }
        Ok(())
    }
}

/// Orbit camera parameters (angles in radians)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub scale: f32,
}

impl CameraState {
    pub fn new(distance: f32) -> Self {
        Self {
            distance,
            pitch: 0.0,
            yaw: 0.0,
            scale: 1.0,
        }
    }

    /// Rotate by delta amounts, clamping to the given limits
    pub fn rotate(&mut self, d_yaw: f32, d_pitch: f32, yaw_limit: f32, pitch_limit: f32) {
        self.yaw = (self.yaw + d_yaw).clamp(-yaw_limit, yaw_limit);
        self.pitch = (self.pitch + d_pitch).clamp(-pitch_limit, pitch_limit);
    }

    pub fn zoom(&mut self, factor: f32, min_scale: f32, max_scale: f32) {
        self.scale = (self.scale * factor).clamp(min_scale, max_scale);
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self::new(CameraConfig::default().distance)
    }
}

/// One pointer/gesture update from the host UI
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GestureUpdate {
    /// Drag delta in device-independent pixels
    pub dx: f32,
    pub dy: f32,
    /// Number of active pointers
    pub pointers: u32,
    /// Pinch scale factor relative to the previous update
    pub pinch: Option<f32>,
}

impl GestureUpdate {
    pub fn drag(dx: f32, dy: f32) -> Self {
        Self {
            dx,
            dy,
            pointers: 1,
            pinch: None,
        }
    }

    pub fn pinch(factor: f32) -> Self {
        Self {
            pointers: 2,
            pinch: Some(factor),
            ..Self::default()
        }
    }
}

/// Owns the camera state and reacts to gestures and clock ticks.
///
/// Framework agnostic: hosts translate their own input events into
/// [`gesture_start`](Self::gesture_start), [`gesture_update`](Self::gesture_update),
/// [`gesture_end`](Self::gesture_end) and [`tick`](Self::tick).
#[derive(Debug, Clone)]
pub struct CameraController {
    config: CameraConfig,
    state: CameraState,
    auto_angle: f32,
    auto_rotating: bool,
    focal_point: Option<(f32, f32)>,
    idle: f32,
    /// Set when rotation was switched off explicitly; idle resume only
    /// follows gestures
    user_paused: bool,
}

impl CameraController {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            state: CameraState::new(config.distance),
            auto_rotating: config.auto_rotate,
            auto_angle: 0.0,
            focal_point: None,
            idle: 0.0,
            user_paused: !config.auto_rotate,
            config,
        }
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Current auto-rotation angle in [0, 2π)
    pub fn auto_angle(&self) -> f32 {
        self.auto_angle
    }

    pub fn is_auto_rotating(&self) -> bool {
        self.auto_rotating
    }

    pub fn focal_point(&self) -> Option<(f32, f32)> {
        self.focal_point
    }

    pub fn set_auto_rotate(&mut self, enabled: bool) {
        self.auto_rotating = enabled;
        self.user_paused = !enabled;
        self.idle = 0.0;
    }

    /// Begin a gesture at the given surface position. Auto-rotation stops
    /// advancing; the camera state is left as is.
    pub fn gesture_start(&mut self, x: f32, y: f32) {
        self.focal_point = Some((x, y));
        self.auto_rotating = false;
        self.user_paused = false;
        self.idle = 0.0;
        trace!(x, y, "gesture start");
    }

    pub fn gesture_update(&mut self, update: GestureUpdate) {
        if let Some(factor) = update.pinch {
            self.pinch(factor);
        } else if update.pointers == 1 {
            self.pan(update.dx, update.dy);
        }
    }

    pub fn gesture_end(&mut self) {
        self.focal_point = None;
        self.idle = 0.0;
        trace!("gesture end");
    }

    /// Drag rotation: horizontal delta turns yaw, vertical delta tilts pitch
    pub fn pan(&mut self, dx: f32, dy: f32) {
        if !dx.is_finite() || !dy.is_finite() {
            return;
        }
        let s = self.config.sensitivity;
        self.state
            .rotate(dx * s, dy * s, self.config.yaw_limit, self.config.pitch_limit);
    }

    pub fn pinch(&mut self, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            debug!(factor, "ignoring invalid pinch factor");
            return;
        }
        self.state
            .zoom(factor, self.config.min_scale, self.config.max_scale);
    }

    /// Advance the clock by `dt` seconds
    pub fn tick(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }

        if !self.auto_rotating && !self.user_paused && self.focal_point.is_none() {
            if let Some(resume_after) = self.config.resume_after {
                self.idle += dt;
                if self.idle >= resume_after {
                    self.auto_rotating = true;
                    debug!("auto-rotation resumed");
                }
            }
        }

        if self.auto_rotating {
            self.auto_angle = (self.auto_angle + self.config.auto_rotate_speed * dt).rem_euclid(TAU);
        }
    }

    /// Restore the initial camera and re-enable auto-rotation
    pub fn reset(&mut self) {
        self.state = CameraState::new(self.config.distance);
        self.auto_angle = 0.0;
        self.auto_rotating = true;
        self.focal_point = None;
        self.idle = 0.0;
        self.user_paused = false;
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_clamped(camera: &CameraController) {
        let state = camera.state();
        assert!(state.pitch >= -PI / 3.0 && state.pitch <= PI / 3.0);
        assert!(state.yaw >= -PI && state.yaw <= PI);
        assert!(state.scale >= 0.5 && state.scale <= 3.0);
    }

    #[test]
    fn test_pan_rotates() {
        let mut camera = CameraController::default();
        camera.pan(10.0, -5.0);
        assert!((camera.state().yaw - 0.1).abs() < 1e-6);
        assert!((camera.state().pitch + 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_clamps_hold_under_extreme_gestures() {
        let mut camera = CameraController::default();
        let gestures = [
            GestureUpdate::drag(1e4, 1e4),
            GestureUpdate::pinch(100.0),
            GestureUpdate::drag(-3e4, -2e4),
            GestureUpdate::pinch(0.001),
            GestureUpdate::drag(500.0, 0.0),
            GestureUpdate::pinch(1.5),
        ];
        for gesture in gestures {
            camera.gesture_update(gesture);
            assert_clamped(&camera);
        }
        camera.pinch(1e9);
        assert_eq!(camera.state().scale, 3.0);
        camera.pinch(1e-9);
        assert_eq!(camera.state().scale, 0.5);
    }

    #[test]
    fn test_invalid_input_ignored() {
        let mut camera = CameraController::default();
        camera.pinch(f32::NAN);
        camera.pinch(-2.0);
        camera.pan(f32::INFINITY, 1.0);
        assert_eq!(*camera.state(), CameraState::new(4.0));
    }

    #[test]
    fn test_multi_pointer_without_pinch_is_ignored() {
        let mut camera = CameraController::default();
        camera.gesture_update(GestureUpdate {
            dx: 5.0,
            dy: 5.0,
            pointers: 2,
            pinch: None,
        });
        assert_eq!(camera.state().yaw, 0.0);
    }

    #[test]
    fn test_gesture_stops_auto_rotation_without_reset() {
        let mut camera = CameraController::default();
        camera.tick(1.0);
        camera.pan(20.0, 0.0);
        let angle = camera.auto_angle();
        assert!(angle > 0.0);

        camera.gesture_start(50.0, 50.0);
        assert_eq!(camera.focal_point(), Some((50.0, 50.0)));
        camera.tick(1.0);
        assert_eq!(camera.auto_angle(), angle);
        assert!((camera.state().yaw - 0.2).abs() < 1e-6);

        camera.gesture_end();
        camera.tick(10.0);
        assert_eq!(camera.auto_angle(), angle);
        assert!(!camera.is_auto_rotating());
    }

    #[test]
    fn test_resume_after_idle() {
        let mut camera = CameraController::new(CameraConfig {
            resume_after: Some(2.0),
            ..CameraConfig::default()
        });
        camera.gesture_start(0.0, 0.0);
        camera.tick(5.0);
        assert!(!camera.is_auto_rotating());
        camera.gesture_end();
        camera.tick(1.0);
        assert!(!camera.is_auto_rotating());
        camera.tick(1.0);
        assert!(camera.is_auto_rotating());
    }

    #[test]
    fn test_explicit_pause_is_not_resumed() {
        let mut camera = CameraController::new(CameraConfig {
            resume_after: Some(2.0),
            ..CameraConfig::default()
        });
        camera.set_auto_rotate(false);
        camera.tick(10.0);
        assert!(!camera.is_auto_rotating());
        assert_eq!(camera.auto_angle(), 0.0);

        // A later gesture arms the idle resume again
        camera.gesture_start(0.0, 0.0);
        camera.gesture_end();
        camera.tick(2.0);
        assert!(camera.is_auto_rotating());
    }

    #[test]
    fn test_disabled_at_start_stays_off() {
        let mut camera = CameraController::new(CameraConfig {
            auto_rotate: false,
            resume_after: Some(1.0),
            ..CameraConfig::default()
        });
        camera.tick(5.0);
        assert!(!camera.is_auto_rotating());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(CameraConfig::default().validate().is_ok());
        let bad = CameraConfig {
            min_scale: 4.0,
            ..CameraConfig::default()
        };
        assert!(matches!(bad.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_auto_angle_wraps() {
        let mut camera = CameraController::default();
        for _ in 0..100 {
            camera.tick(1.0);
            assert!(camera.auto_angle() >= 0.0 && camera.auto_angle() < TAU);
        }
    }

    #[test]
    fn test_reset() {
        let mut camera = CameraController::default();
        camera.gesture_start(1.0, 1.0);
        camera.pan(30.0, 30.0);
        camera.pinch(2.0);
        camera.reset();
        assert_eq!(*camera.state(), CameraState::new(4.0));
        assert!(camera.is_auto_rotating());
        assert_eq!(camera.focal_point(), None);
    }
}
