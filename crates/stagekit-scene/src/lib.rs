//! StageKit Scene Document Library
//!
//! This crate provides the serializable scene model for StageKit: canvas,
//! camera, lighting, background and avatar records, plus strict JSON parsing
//! and range validation.
//!
//! Scene documents never contain live scene-graph data. Avatars are stored as
//! [`AvatarData`] records which the rig layer re-attaches to ingested assets.
//!
//! # Example
//!
//! ```
//! use stagekit_scene::{AvatarData, SceneDocument};
//! use stagekit_scene::validation::validate_document;
//!
//! let mut doc = SceneDocument::default();
//! doc.avatars.push(
//!     AvatarData::new("avatar_1700000000000_k3j9x0a1b", "hero.glb")
//!         .with_position([1.0, 0.0, 0.0])
//!         .with_morph("smile", 0.7),
//! );
//!
//! let result = validate_document(&doc);
//! assert!(result.is_ok());
//!
//! let json = doc.to_json_pretty().unwrap();
//! let (parsed, warnings) = SceneDocument::parse_validated(&json).unwrap();
//! assert_eq!(parsed, doc);
//! assert!(warnings.is_empty());
//! ```
//!
//! # Modules
//!
//! - [`avatar`]: Avatar records and scale coercion
//! - [`error`]: Error and warning types for validation
//! - [`patch`]: Shallow partial updates for scene sub-objects
//! - [`scene`]: Scene document type and its sub-objects
//! - [`validation`]: Document validation functions

pub mod avatar;
pub mod error;
pub mod patch;
pub mod scene;
pub mod validation;

// Re-export commonly used types at the crate root
pub use avatar::{clamp_weight, AvatarData, ScaleInput};
pub use error::{
    ErrorCode, SceneError, ValidationError, ValidationResult, ValidationWarning, WarningCode,
};
pub use patch::{AvatarPatch, BackgroundPatch, CameraPatch, LightingPatch};
pub use scene::{
    ActiveBackground, Background, BackgroundMode, Camera, CameraPreset, Canvas, HdriSettings,
    KeyLight, Lighting, LightingPreset, ManualLighting, PresetLighting, SceneDocument,
    SCENE_VERSION,
};
pub use validation::{is_valid_color, validate_document};

#[cfg(test)]
mod integration_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_full_document_roundtrip() {
        let json = r##"{
            "version": "0.1",
            "canvas": {"width": 1280, "height": 720},
            "camera": {"fov": 35, "position": [0, 1.6, 4], "target": [0, 1, 0]},
            "lighting": {"preset": "dramatic", "keyColor": "#ffddaa", "environmentIntensity": 0.4},
            "background": {"mode": "hdri", "color": "#101010", "hdriPath": "env/sunset.hdr"},
            "avatars": [{
                "id": "avatar_1700000000000_a1b2c3d4e",
                "src": "hero.glb",
                "position": [0, 0.02, 0],
                "rotationEuler": [0, 1.57, 0],
                "scale": 1.2,
                "pose": {"mixamorigLeftArm": [0, 0, 0, 1]},
                "ikTargets": {"leftArm": [0.5, 1.2, 0.3]},
                "morphs": {"smile": 0.7}
            }]
        }"##;

        let (doc, warnings) = SceneDocument::parse_validated(json).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(doc.canvas.width, 1280.0);
        let avatar = doc.avatar("avatar_1700000000000_a1b2c3d4e").unwrap();
        assert_eq!(avatar.ik_targets.as_ref().unwrap()["leftArm"], [0.5, 1.2, 0.3]);
        assert_eq!(avatar.morphs["smile"], 0.7);

        let reparsed = SceneDocument::from_json(&doc.to_json().unwrap()).unwrap();
        assert_eq!(reparsed, doc);
    }

    #[test]
    fn test_unknown_avatar_field_rejected() {
        let json = r##"{
            "version": "0.1",
            "canvas": {"width": 1920, "height": 1080},
            "camera": {"fov": 50, "position": [0, 15, 20], "target": [0, 0, 0]},
            "lighting": {"key": {"intensity": 1, "color": "#ffffff", "azimuth": 45, "elevation": 45}},
            "background": {"mode": "flat", "color": "#000000"},
            "avatars": [{"id": "a", "src": "a.glb", "object": {}}]
        }"##;
        assert!(matches!(
            SceneDocument::parse_validated(json),
            Err(SceneError::JsonParse(_))
        ));
    }
}
