//! Validation tests.

use super::*;
use crate::scene::{HdriSettings, KeyLight, ManualLighting, PresetLighting, LightingPreset};

fn make_valid_document() -> SceneDocument {
    let mut doc = SceneDocument::default();
    doc.avatars.push(
        AvatarData::new("avatar_1700000000000_abcdefghi", "hero.glb")
            .with_scale(2.0)
            .with_morph("smile", 0.7)
            .with_ik_target("leftArm", [0.5, 1.2, 0.3]),
    );
    doc
}

fn has_error(result: &ValidationResult, code: ErrorCode) -> bool {
    result.errors.iter().any(|e| e.code == code)
}

#[test]
fn test_valid_document() {
    let doc = make_valid_document();
    let result = validate_document(&doc);
    assert!(result.is_ok(), "errors: {:?}", result.errors);
    assert!(result.warnings.is_empty());
}

#[test]
fn test_unsupported_version() {
    let mut doc = make_valid_document();
    doc.version = "0.2".to_string();
    let result = validate_document(&doc);
    assert!(has_error(&result, ErrorCode::UnsupportedVersion));
}

#[test]
fn test_fov_bounds() {
    for (fov, ok) in [(10.0, true), (120.0, true), (9.9, false), (121.0, false)] {
        let mut doc = make_valid_document();
        doc.camera.fov = fov;
        let result = validate_document(&doc);
        assert_eq!(result.is_ok(), ok, "fov {}", fov);
    }
}

#[test]
fn test_scale_bounds() {
    let mut doc = make_valid_document();
    doc.avatars[0].scale = 5.5;
    let result = validate_document(&doc);
    assert!(has_error(&result, ErrorCode::ValueOutOfRange));
    assert_eq!(result.errors[0].path.as_deref(), Some("avatars[0].scale"));

    doc.avatars[0].scale = 0.05;
    assert!(!validate_document(&doc).is_ok());
}

#[test]
fn test_morph_weight_bounds() {
    let mut doc = make_valid_document();
    doc.avatars[0].morphs.insert("blink".to_string(), 1.2);
    let result = validate_document(&doc);
    assert!(has_error(&result, ErrorCode::ValueOutOfRange));
}

#[test]
fn test_non_finite_rejected() {
    let mut doc = make_valid_document();
    doc.camera.position[1] = f64::NAN;
    doc.avatars[0]
        .ik_targets
        .as_mut()
        .unwrap()
        .insert("rightArm".to_string(), [f64::INFINITY, 0.0, 0.0]);
    let result = validate_document(&doc);
    assert_eq!(
        result
            .errors
            .iter()
            .filter(|e| e.code == ErrorCode::NonFiniteNumber)
            .count(),
        2
    );
}

#[test]
fn test_duplicate_and_empty_ids() {
    let mut doc = make_valid_document();
    doc.avatars.push(AvatarData::new(doc.avatars[0].id.clone(), "other.glb"));
    doc.avatars.push(AvatarData::new("", "third.glb"));
    let result = validate_document(&doc);
    assert!(has_error(&result, ErrorCode::DuplicateAvatarId));
    assert!(has_error(&result, ErrorCode::EmptyAvatarId));
}

#[test]
fn test_lighting_ranges() {
    let mut doc = make_valid_document();
    doc.lighting = Lighting::Manual(ManualLighting {
        key: KeyLight {
            intensity: 11.0,
            color: "white".to_string(),
            azimuth: 181.0,
            elevation: -91.0,
        },
        hdri: Some(HdriSettings {
            path: None,
            exposure: 6.0,
            enabled: true,
        }),
    });
    let result = validate_document(&doc);
    assert_eq!(
        result
            .errors
            .iter()
            .filter(|e| e.code == ErrorCode::ValueOutOfRange)
            .count(),
        4
    );
    assert!(has_error(&result, ErrorCode::InvalidColor));
}

#[test]
fn test_preset_lighting_validation() {
    let mut doc = make_valid_document();
    doc.lighting = Lighting::Preset(PresetLighting {
        preset: LightingPreset::Outdoor,
        key_color: "#FFCC88".to_string(),
        environment_intensity: 0.6,
    });
    assert!(validate_document(&doc).is_ok());
}

#[test]
fn test_inactive_background_color_not_checked() {
    let mut doc = make_valid_document();
    doc.background.mode = BackgroundMode::Set;
    doc.background.color = "not-a-color".to_string();
    doc.background.set_path = Some("sets/loft.glb".to_string());
    let result = validate_document(&doc);
    assert!(result.is_ok(), "errors: {:?}", result.errors);
}

#[test]
fn test_missing_background_payload_warns() {
    let mut doc = make_valid_document();
    doc.background.mode = BackgroundMode::Hdri;
    let result = validate_document(&doc);
    assert!(result.is_ok());
    assert_eq!(
        result.warnings[0].code,
        WarningCode::MissingBackgroundPayload
    );
}

#[test]
fn test_unnormalized_pose_warns() {
    let mut doc = make_valid_document();
    doc.avatars[0]
        .pose
        .insert("mixamorigHips".to_string(), [0.0, 0.0, 0.0, 2.0]);
    let result = validate_document(&doc);
    assert!(result.is_ok());
    assert_eq!(
        result.warnings[0].code,
        WarningCode::UnnormalizedPoseQuaternion
    );
}

#[test]
fn test_parse_validated_rejects_wholesale() {
    let mut doc = make_valid_document();
    doc.camera.fov = 200.0;
    let json = doc.to_json().unwrap();
    match SceneDocument::parse_validated(&json) {
        Err(crate::SceneError::ValidationFailed(errors)) => assert_eq!(errors.len(), 1),
        other => panic!("expected validation failure, got {:?}", other),
    }
}

#[test]
fn test_color_pattern() {
    assert!(is_valid_color("#a1B2c3"));
    assert!(!is_valid_color("#abc"));
    assert!(!is_valid_color("a1b2c3"));
}
