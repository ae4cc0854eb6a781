//! Viewer configuration, loaded from TOML. Every field has a default, so an
//! empty document is a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::camera::CameraConfig;
use crate::error::ConfigError;
use crate::lod::LodTiers;
use crate::raster::RenderConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub lod: LodTiers,
    pub camera: CameraConfig,
    pub render: RenderConfig,
}

impl ViewerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.camera.validate()?;
        self.render.validate()
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(ViewerConfig::from_toml_str("").unwrap(), ViewerConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = ViewerConfig::from_toml_str(
            r#"
            [lod]
            default_faces = 800
            tiers = [{ min_bytes = 100, faces = 10 }]

            [camera]
            sensitivity = 0.02
            resume_after = 3.0

            [render]
            jitter = 0.0
            "#,
        )
        .unwrap();
        assert_eq!(config.lod.default_faces, 800);
        assert_eq!(config.lod.target_for(101), 10);
        assert_eq!(config.lod.target_for(100), 800);
        assert_eq!(config.camera.sensitivity, 0.02);
        assert_eq!(config.camera.resume_after, Some(3.0));
        assert_eq!(config.camera.distance, CameraConfig::default().distance);
        assert_eq!(config.render.jitter, 0.0);
        assert_eq!(config.render.fit_fraction, RenderConfig::default().fit_fraction);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            ViewerConfig::from_toml_str("[camera]\ndistance = \"far\""),
            Err(ConfigError::Parse(_))
        ));
    }

    fn invalid(text: &str) -> String {
        match ViewerConfig::from_toml_str(text) {
            Err(ConfigError::Invalid(msg)) => msg,
            other => panic!("expected an invalid config, got {:?}", other),
        }
    }

    #[test]
    fn test_camera_limits_validated() {
        assert!(invalid("[camera]\npitch_limit = -1.0").contains("pitch_limit"));
        assert!(invalid("[camera]\nyaw_limit = 0.0").contains("yaw_limit"));
        assert!(invalid("[camera]\nmin_scale = 4.0").contains("scale range"));
        assert!(invalid("[camera]\nsensitivity = nan").contains("sensitivity"));
        assert!(invalid("[camera]\ndistance = 1.0").contains("distance"));
        assert!(invalid("[camera]\nresume_after = -2.0").contains("resume_after"));
    }

    #[test]
    fn test_render_values_validated() {
        assert!(invalid("[render]\nfit_fraction = 0.0").contains("fit_fraction"));
        assert!(invalid("[render]\noutline_alpha = 1.5").contains("outline_alpha"));
        assert!(invalid("[render]\njitter = inf").contains("jitter"));
    }

    #[test]
    fn test_validated_limits_keep_gestures_safe() {
        let config = ViewerConfig::from_toml_str(
            "[camera]\npitch_limit = 0.2\nyaw_limit = 0.3\nmin_scale = 1.0\nmax_scale = 1.0",
        )
        .unwrap();
        let mut camera = crate::CameraController::new(config.camera);
        camera.pan(1e6, -1e6);
        camera.pinch(1.1);
        assert_eq!(camera.state().yaw, 0.3);
        assert_eq!(camera.state().pitch, -0.2);
        assert_eq!(camera.state().scale, 1.0);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.toml");
        std::fs::write(&path, "[camera]\nauto_rotate = false\n").unwrap();
        let config = ViewerConfig::from_file(&path).unwrap();
        assert!(!config.camera.auto_rotate);

        assert!(matches!(
            ViewerConfig::from_file(&dir.path().join("missing.toml")),
            Err(ConfigError::Io(..))
        ));
    }
}
