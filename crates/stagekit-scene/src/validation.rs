//! Scene document validation logic.
//!
//! Validation is structural and range-based. A document with any error is
//! rejected as a whole; callers never commit a partially valid document.

use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::sync::OnceLock;

use regex::Regex;

use crate::avatar::AvatarData;
use crate::error::{ErrorCode, ValidationError, ValidationResult, ValidationWarning, WarningCode};
use crate::scene::{Background, BackgroundMode, Camera, Canvas, Lighting, SceneDocument, SCENE_VERSION};

/// Allowed camera field of view, in degrees.
pub const FOV_RANGE: RangeInclusive<f64> = 10.0..=120.0;
/// Allowed uniform avatar scale.
pub const SCALE_RANGE: RangeInclusive<f64> = 0.1..=5.0;
/// Allowed morph weight.
pub const MORPH_RANGE: RangeInclusive<f64> = 0.0..=1.0;
/// Allowed key light intensity.
pub const INTENSITY_RANGE: RangeInclusive<f64> = 0.0..=10.0;
/// Allowed key light azimuth, in degrees.
pub const AZIMUTH_RANGE: RangeInclusive<f64> = -180.0..=180.0;
/// Allowed key light elevation, in degrees.
pub const ELEVATION_RANGE: RangeInclusive<f64> = -90.0..=90.0;
/// Allowed HDRI exposure.
pub const EXPOSURE_RANGE: RangeInclusive<f64> = -5.0..=5.0;
/// Allowed preset environment intensity.
pub const ENVIRONMENT_RANGE: RangeInclusive<f64> = 0.0..=10.0;

const COLOR_PATTERN: &str = r"^#[0-9a-fA-F]{6}$";

static COLOR_REGEX: OnceLock<Regex> = OnceLock::new();

fn color_regex() -> &'static Regex {
    COLOR_REGEX.get_or_init(|| Regex::new(COLOR_PATTERN).expect("invalid regex pattern"))
}

/// Returns true if `color` is a `#rrggbb` hex string.
pub fn is_valid_color(color: &str) -> bool {
    color_regex().is_match(color)
}

/// Validates a scene document and returns a validation result.
///
/// # Example
/// ```
/// use stagekit_scene::SceneDocument;
/// use stagekit_scene::validation::validate_document;
///
/// let doc = SceneDocument::default();
/// assert!(validate_document(&doc).is_ok());
/// ```
pub fn validate_document(doc: &SceneDocument) -> ValidationResult {
    let mut result = ValidationResult::default();

    validate_version(doc, &mut result);
    validate_canvas(&doc.canvas, &mut result);
    validate_camera(&doc.camera, &mut result);
    validate_lighting(&doc.lighting, &mut result);
    validate_background(&doc.background, &mut result);
    validate_avatars(&doc.avatars, &mut result);

    result
}

fn validate_version(doc: &SceneDocument, result: &mut ValidationResult) {
    if doc.version != SCENE_VERSION {
        result.add_error(ValidationError::with_path(
            ErrorCode::UnsupportedVersion,
            format!("version must be \"{}\", got \"{}\"", SCENE_VERSION, doc.version),
            "version",
        ));
    }
}

fn validate_canvas(canvas: &Canvas, result: &mut ValidationResult) {
    for (value, field) in [(canvas.width, "width"), (canvas.height, "height")] {
        let path = format!("canvas.{}", field);
        if check_finite(value, &path, result) && value <= 0.0 {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidCanvas,
                format!("canvas {} must be positive, got {}", field, value),
                path,
            ));
        }
    }
}

fn validate_camera(camera: &Camera, result: &mut ValidationResult) {
    check_range(camera.fov, &FOV_RANGE, "camera.fov", result);
    check_vector(&camera.position, "camera.position", result);
    check_vector(&camera.target, "camera.target", result);
}

fn validate_lighting(lighting: &Lighting, result: &mut ValidationResult) {
    match lighting {
        Lighting::Manual(manual) => {
            let key = &manual.key;
            check_range(key.intensity, &INTENSITY_RANGE, "lighting.key.intensity", result);
            check_color(&key.color, "lighting.key.color", result);
            check_range(key.azimuth, &AZIMUTH_RANGE, "lighting.key.azimuth", result);
            check_range(key.elevation, &ELEVATION_RANGE, "lighting.key.elevation", result);
            if let Some(ref hdri) = manual.hdri {
                check_range(hdri.exposure, &EXPOSURE_RANGE, "lighting.hdri.exposure", result);
            }
        }
        Lighting::Preset(preset) => {
            check_color(&preset.key_color, "lighting.keyColor", result);
            check_range(
                preset.environment_intensity,
                &ENVIRONMENT_RANGE,
                "lighting.environmentIntensity",
                result,
            );
        }
    }
}

fn validate_background(background: &Background, result: &mut ValidationResult) {
    match background.mode {
        BackgroundMode::Flat => check_color(&background.color, "background.color", result),
        BackgroundMode::Hdri if background.hdri_path.is_none() => {
            result.add_warning(ValidationWarning::with_path(
                WarningCode::MissingBackgroundPayload,
                "background mode is hdri but no hdriPath is set",
                "background.hdriPath",
            ));
        }
        BackgroundMode::Set if background.set_path.is_none() => {
            result.add_warning(ValidationWarning::with_path(
                WarningCode::MissingBackgroundPayload,
                "background mode is set but no setPath is set",
                "background.setPath",
            ));
        }
        _ => {}
    }
}

fn validate_avatars(avatars: &[AvatarData], result: &mut ValidationResult) {
    let mut seen = HashSet::new();

    for (i, avatar) in avatars.iter().enumerate() {
        let base = format!("avatars[{}]", i);

        if avatar.id.is_empty() {
            result.add_error(ValidationError::with_path(
                ErrorCode::EmptyAvatarId,
                "avatar id cannot be empty",
                format!("{}.id", base),
            ));
        } else if !seen.insert(avatar.id.as_str()) {
            result.add_error(ValidationError::with_path(
                ErrorCode::DuplicateAvatarId,
                format!("duplicate avatar id: {}", avatar.id),
                format!("{}.id", base),
            ));
        }

        if avatar.src.is_empty() {
            result.add_warning(ValidationWarning::with_path(
                WarningCode::MissingAvatarSource,
                "avatar has no source reference and cannot be re-ingested",
                format!("{}.src", base),
            ));
        }

        check_vector(&avatar.position, &format!("{}.position", base), result);
        check_vector(&avatar.rotation_euler, &format!("{}.rotationEuler", base), result);
        check_range(avatar.scale, &SCALE_RANGE, &format!("{}.scale", base), result);

        for (bone, quat) in &avatar.pose {
            let path = format!("{}.pose.{}", base, bone);
            check_key(bone, &path, result);
            if quat.iter().all(|c| check_finite(*c, &path, result)) {
                let len = quat.iter().map(|c| c * c).sum::<f64>().sqrt();
                if (len - 1.0).abs() > 1e-3 {
                    result.add_warning(ValidationWarning::with_path(
                        WarningCode::UnnormalizedPoseQuaternion,
                        format!("pose quaternion has length {:.4}", len),
                        path,
                    ));
                }
            }
        }

        if let Some(ref targets) = avatar.ik_targets {
            for (chain, position) in targets {
                let path = format!("{}.ikTargets.{}", base, chain);
                check_key(chain, &path, result);
                check_vector(position, &path, result);
            }
        }

        for (morph, weight) in &avatar.morphs {
            let path = format!("{}.morphs.{}", base, morph);
            check_key(morph, &path, result);
            check_range(*weight, &MORPH_RANGE, &path, result);
        }
    }
}

fn check_finite(value: f64, path: &str, result: &mut ValidationResult) -> bool {
    if value.is_finite() {
        true
    } else {
        result.add_error(ValidationError::with_path(
            ErrorCode::NonFiniteNumber,
            format!("value must be finite, got {}", value),
            path,
        ));
        false
    }
}

fn check_range(value: f64, range: &RangeInclusive<f64>, path: &str, result: &mut ValidationResult) {
    if check_finite(value, path, result) && !range.contains(&value) {
        result.add_error(ValidationError::with_path(
            ErrorCode::ValueOutOfRange,
            format!(
                "value must be within {}..={}, got {}",
                range.start(),
                range.end(),
                value
            ),
            path,
        ));
    }
}

fn check_vector(values: &[f64; 3], path: &str, result: &mut ValidationResult) {
    for (i, value) in values.iter().enumerate() {
        check_finite(*value, &format!("{}[{}]", path, i), result);
    }
}

fn check_color(color: &str, path: &str, result: &mut ValidationResult) {
    if !is_valid_color(color) {
        result.add_error(ValidationError::with_path(
            ErrorCode::InvalidColor,
            format!("color must be #rrggbb, got \"{}\"", color),
            path,
        ));
    }
}

fn check_key(key: &str, path: &str, result: &mut ValidationResult) {
    if key.is_empty() {
        result.add_error(ValidationError::with_path(
            ErrorCode::EmptyKey,
            "map key cannot be empty",
            path,
        ));
    }
}

#[cfg(test)]
mod tests;
