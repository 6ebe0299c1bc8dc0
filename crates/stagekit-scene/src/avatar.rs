//! Serializable avatar records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The serializable portion of an avatar placed in a scene.
///
/// Live scene-graph handles are never part of this type; they are attached
/// separately once the avatar's source asset has been ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct AvatarData {
    /// Opaque unique id, stable for the avatar's lifetime.
    pub id: String,
    /// Origin reference (file name or URL). Display-only.
    pub src: String,
    /// World-space position.
    #[serde(default)]
    pub position: [f64; 3],
    /// World-space rotation as XYZ Euler angles in radians.
    #[serde(default)]
    pub rotation_euler: [f64; 3],
    /// Uniform scale, relative to the auto-scale applied at ingestion.
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Bone name to local rotation quaternion `[x, y, z, w]`.
    #[serde(default)]
    pub pose: BTreeMap<String, [f64; 4]>,
    /// IK chain name to target world position. Present only for rigged avatars.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ik_targets: Option<BTreeMap<String, [f64; 3]>>,
    /// Morph target name to weight in `[0, 1]`.
    #[serde(default)]
    pub morphs: BTreeMap<String, f64>,
}

fn default_scale() -> f64 {
    1.0
}

impl AvatarData {
    /// Creates a record at the origin with unit scale and empty pose/morph maps.
    pub fn new(id: impl Into<String>, src: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            src: src.into(),
            position: [0.0; 3],
            rotation_euler: [0.0; 3],
            scale: 1.0,
            pose: BTreeMap::new(),
            ik_targets: None,
            morphs: BTreeMap::new(),
        }
    }

    /// Sets the position.
    pub fn with_position(mut self, position: [f64; 3]) -> Self {
        self.position = position;
        self
    }

    /// Sets the uniform scale.
    pub fn with_scale(mut self, scale: impl Into<ScaleInput>) -> Self {
        self.scale = scale.into().uniform();
        self
    }

    /// Sets a morph weight, clamped to `[0, 1]`.
    pub fn with_morph(mut self, name: impl Into<String>, weight: f64) -> Self {
        self.morphs.insert(name.into(), clamp_weight(weight));
        self
    }

    /// Sets an IK target position.
    pub fn with_ik_target(mut self, chain: impl Into<String>, position: [f64; 3]) -> Self {
        self.ik_targets
            .get_or_insert_with(BTreeMap::new)
            .insert(chain.into(), position);
        self
    }
}

/// Clamps a morph weight into `[0, 1]`. NaN becomes 0.
pub fn clamp_weight(weight: f64) -> f64 {
    if weight.is_nan() {
        0.0
    } else {
        weight.clamp(0.0, 1.0)
    }
}

/// A scale value as produced by a transform gizmo, which may be anisotropic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleInput {
    /// Same value on every axis.
    Uniform(f64),
    /// Independent X/Y/Z values.
    PerAxis([f64; 3]),
}

impl ScaleInput {
    /// Collapses the input to one uniform value (the max axis).
    pub fn uniform(self) -> f64 {
        match self {
            ScaleInput::Uniform(s) => s,
            ScaleInput::PerAxis([x, y, z]) => x.max(y).max(z),
        }
    }
}

impl From<f64> for ScaleInput {
    fn from(value: f64) -> Self {
        ScaleInput::Uniform(value)
    }
}

impl From<[f64; 3]> for ScaleInput {
    fn from(value: [f64; 3]) -> Self {
        ScaleInput::PerAxis(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_axis_scale_collapses_to_max() {
        assert_eq!(ScaleInput::PerAxis([1.0, 2.5, 0.5]).uniform(), 2.5);
        assert_eq!(ScaleInput::Uniform(0.3).uniform(), 0.3);
        let avatar = AvatarData::new("a", "a.glb").with_scale([0.2, 0.9, 0.4]);
        assert_eq!(avatar.scale, 0.9);
    }

    #[test]
    fn test_weight_clamp() {
        assert_eq!(clamp_weight(1.4), 1.0);
        assert_eq!(clamp_weight(-0.1), 0.0);
        assert_eq!(clamp_weight(f64::NAN), 0.0);
        assert_eq!(clamp_weight(0.7), 0.7);
    }

    #[test]
    fn test_camel_case_keys() {
        let avatar = AvatarData::new("avatar_1", "hero.glb").with_ik_target("leftArm", [0.5, 1.2, 0.3]);
        let value = serde_json::to_value(&avatar).unwrap();
        assert!(value.get("rotationEuler").is_some());
        assert_eq!(value["ikTargets"]["leftArm"], serde_json::json!([0.5, 1.2, 0.3]));
    }

    #[test]
    fn test_ik_targets_omitted_when_absent() {
        let value = serde_json::to_value(AvatarData::new("x", "prop.glb")).unwrap();
        assert!(value.get("ikTargets").is_none());
    }
}
