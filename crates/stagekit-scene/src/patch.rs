//! Partial updates merged shallowly into scene sub-objects.
//!
//! Every patch field is optional; `None` leaves the target field untouched.

use crate::avatar::{AvatarData, ScaleInput};
use crate::scene::{
    Background, BackgroundMode, Camera, CameraPreset, HdriSettings, KeyLight, Lighting,
    LightingPreset,
};

/// Partial camera update.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraPatch {
    pub fov: Option<f64>,
    pub position: Option<[f64; 3]>,
    pub target: Option<[f64; 3]>,
}

impl CameraPatch {
    /// A patch that moves the camera to a preset framing.
    pub fn from_preset(preset: CameraPreset) -> Self {
        let (position, target) = preset.placement();
        Self {
            fov: None,
            position: Some(position),
            target: Some(target),
        }
    }

    pub fn apply(&self, camera: &mut Camera) {
        if let Some(fov) = self.fov {
            camera.fov = fov;
        }
        if let Some(position) = self.position {
            camera.position = position;
        }
        if let Some(target) = self.target {
            camera.target = target;
        }
    }
}

/// Partial lighting update.
///
/// Fields belong to one of the two lighting shapes; fields for the shape that
/// is not active are ignored. Use a full [`Lighting`] value to switch shapes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightingPatch {
    pub key: Option<KeyLight>,
    pub hdri: Option<Option<HdriSettings>>,
    pub preset: Option<LightingPreset>,
    pub key_color: Option<String>,
    pub environment_intensity: Option<f64>,
}

impl LightingPatch {
    /// Applies the patch, returning the number of fields that were ignored
    /// because they belong to the inactive shape.
    pub fn apply(&self, lighting: &mut Lighting) -> usize {
        let mut ignored = 0;
        match lighting {
            Lighting::Manual(manual) => {
                if let Some(ref key) = self.key {
                    manual.key = key.clone();
                }
                if let Some(ref hdri) = self.hdri {
                    manual.hdri = hdri.clone();
                }
                ignored += usize::from(self.preset.is_some())
                    + usize::from(self.key_color.is_some())
                    + usize::from(self.environment_intensity.is_some());
            }
            Lighting::Preset(preset) => {
                if let Some(p) = self.preset {
                    preset.preset = p;
                }
                if let Some(ref color) = self.key_color {
                    preset.key_color = color.clone();
                }
                if let Some(intensity) = self.environment_intensity {
                    preset.environment_intensity = intensity;
                }
                ignored += usize::from(self.key.is_some()) + usize::from(self.hdri.is_some());
            }
        }
        ignored
    }
}

/// Partial background update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackgroundPatch {
    pub mode: Option<BackgroundMode>,
    pub color: Option<String>,
    pub hdri_path: Option<String>,
    pub set_path: Option<String>,
}

impl BackgroundPatch {
    pub fn apply(&self, background: &mut Background) {
        if let Some(mode) = self.mode {
            background.mode = mode;
        }
        if let Some(ref color) = self.color {
            background.color = color.clone();
        }
        if let Some(ref path) = self.hdri_path {
            background.hdri_path = Some(path.clone());
        }
        if let Some(ref path) = self.set_path {
            background.set_path = Some(path.clone());
        }
    }
}

/// Partial avatar transform update, as produced by a transform gizmo or a
/// programmatic reset.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AvatarPatch {
    pub position: Option<[f64; 3]>,
    pub rotation_euler: Option<[f64; 3]>,
    pub scale: Option<ScaleInput>,
}

impl AvatarPatch {
    pub fn position(position: [f64; 3]) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    pub fn scale(scale: impl Into<ScaleInput>) -> Self {
        Self {
            scale: Some(scale.into()),
            ..Self::default()
        }
    }

    /// Merges the patch. Scale is always stored uniform.
    pub fn apply(&self, avatar: &mut AvatarData) {
        if let Some(position) = self.position {
            avatar.position = position;
        }
        if let Some(rotation) = self.rotation_euler {
            avatar.rotation_euler = rotation;
        }
        if let Some(scale) = self.scale {
            avatar.scale = scale.uniform();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ManualLighting, PresetLighting};

    #[test]
    fn test_camera_patch_is_shallow() {
        let mut camera = Camera::default();
        CameraPatch {
            fov: Some(35.0),
            ..CameraPatch::default()
        }
        .apply(&mut camera);
        assert_eq!(camera.fov, 35.0);
        assert_eq!(camera.position, [0.0, 15.0, 20.0]);
    }

    #[test]
    fn test_lighting_patch_ignores_inactive_shape() {
        let mut lighting = Lighting::Manual(ManualLighting::default());
        let ignored = LightingPatch {
            key_color: Some("#ff0000".to_string()),
            hdri: Some(None),
            ..LightingPatch::default()
        }
        .apply(&mut lighting);
        assert_eq!(ignored, 1);
        assert!(matches!(lighting, Lighting::Manual(ref m) if m.hdri.is_none()));

        let mut preset = Lighting::Preset(PresetLighting {
            preset: LightingPreset::Soft,
            key_color: "#ffffff".to_string(),
            environment_intensity: 1.0,
        });
        let ignored = LightingPatch {
            preset: Some(LightingPreset::Dramatic),
            key: Some(KeyLight::default()),
            ..LightingPatch::default()
        }
        .apply(&mut preset);
        assert_eq!(ignored, 1);
        assert!(matches!(preset, Lighting::Preset(ref p) if p.preset == LightingPreset::Dramatic));
    }

    #[test]
    fn test_avatar_patch_coerces_scale() {
        let mut avatar = AvatarData::new("a", "a.glb");
        AvatarPatch::scale([1.0, 1.5, 1.2]).apply(&mut avatar);
        assert_eq!(avatar.scale, 1.5);
        AvatarPatch::position([1.0, 0.0, -2.0]).apply(&mut avatar);
        assert_eq!(avatar.position, [1.0, 0.0, -2.0]);
        assert_eq!(avatar.scale, 1.5);
    }

    #[test]
    fn test_background_patch_keeps_inactive_payload() {
        let mut bg = Background::default();
        BackgroundPatch {
            set_path: Some("sets/loft.glb".to_string()),
            ..BackgroundPatch::default()
        }
        .apply(&mut bg);
        BackgroundPatch {
            mode: Some(BackgroundMode::Flat),
            color: Some("#202020".to_string()),
            ..BackgroundPatch::default()
        }
        .apply(&mut bg);
        assert_eq!(bg.set_path.as_deref(), Some("sets/loft.glb"));
        assert_eq!(bg.color, "#202020");
    }
}
