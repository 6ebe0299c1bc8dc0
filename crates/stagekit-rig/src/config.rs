//! Runtime configuration for ingestion, IK and posing.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level stage configuration.
///
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct StageConfig {
    /// Height in world units that ingested avatars are scaled to.
    pub target_height: f64,
    /// Environment-map intensity applied to every material that exposes it.
    pub env_map_intensity: f32,
    /// IK solver settings.
    pub ik: IkConfig,
    /// Neutral pose applied after ingestion.
    pub neutral_pose: NeutralPoseConfig,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            target_height: 5.0,
            env_map_intensity: 0.5,
            ik: IkConfig::default(),
            neutral_pose: NeutralPoseConfig::default(),
        }
    }
}

impl StageConfig {
    /// Parses a config from JSON and checks its values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    /// Reads a config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if !(self.target_height.is_finite() && self.target_height > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "target_height",
                message: format!("must be positive, got {}", self.target_height),
            });
        }
        if self.ik.iterations == 0 {
            return Err(ConfigError::InvalidValue {
                field: "ik.iterations",
                message: "must be at least 1".to_string(),
            });
        }
        if !(self.ik.min_angle >= 0.0 && self.ik.min_angle <= self.ik.max_angle) {
            return Err(ConfigError::InvalidValue {
                field: "ik.min_angle",
                message: format!(
                    "must satisfy 0 <= min_angle <= max_angle, got {}..{}",
                    self.ik.min_angle, self.ik.max_angle
                ),
            });
        }
        Ok(())
    }
}

/// CCD solver settings shared by every chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct IkConfig {
    /// Maximum solver iterations per update.
    pub iterations: usize,
    /// Lower clamp on the per-link rotation angle (radians).
    pub min_angle: f32,
    /// Upper clamp on the per-link rotation angle (radians).
    pub max_angle: f32,
    /// Whether debug helper nodes start visible.
    pub show_helpers: bool,
}

impl Default for IkConfig {
    fn default() -> Self {
        Self {
            iterations: 15,
            min_angle: 0.0,
            max_angle: 1.0,
            show_helpers: false,
        }
    }
}

/// Neutral arm pose offsets, in degrees, added to the upper-arm rest rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct NeutralPoseConfig {
    pub enabled: bool,
    /// X offset for both upper arms.
    pub arm_bend: f64,
    /// Z offset; positive on the left arm, mirrored on the right.
    pub arm_spread: f64,
}

impl Default for NeutralPoseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            arm_bend: 80.0,
            arm_spread: 22.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = StageConfig::from_json("{}").unwrap();
        assert_eq!(config, StageConfig::default());
        assert_eq!(config.ik.iterations, 15);
        assert_eq!(config.neutral_pose.arm_bend, 80.0);
    }

    #[test]
    fn test_partial_config_merges() {
        let config =
            StageConfig::from_json(r#"{"target_height": 1.8, "ik": {"show_helpers": true}}"#)
                .unwrap();
        assert_eq!(config.target_height, 1.8);
        assert!(config.ik.show_helpers);
        assert_eq!(config.ik.max_angle, 1.0);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = StageConfig::from_json(r#"{"target_heigth": 2.0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_bad_values_rejected() {
        assert!(matches!(
            StageConfig::from_json(r#"{"target_height": 0}"#),
            Err(ConfigError::InvalidValue { field: "target_height", .. })
        ));
        assert!(matches!(
            StageConfig::from_json(r#"{"ik": {"iterations": 0}}"#),
            Err(ConfigError::InvalidValue { field: "ik.iterations", .. })
        ));
        assert!(matches!(
            StageConfig::from_json(r#"{"ik": {"min_angle": 2.0}}"#),
            Err(ConfigError::InvalidValue { field: "ik.min_angle", .. })
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stage.json");
        std::fs::write(&path, r#"{"env_map_intensity": 0.8}"#).unwrap();
        let config = StageConfig::from_file(&path).unwrap();
        assert_eq!(config.env_map_intensity, 0.8);
    }
}
