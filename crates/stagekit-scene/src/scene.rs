//! Scene document types.

use serde::{Deserialize, Serialize};

use crate::avatar::AvatarData;
use crate::error::SceneError;
use crate::validation::validate_document;
use crate::ValidationWarning;

/// Current scene document version tag.
pub const SCENE_VERSION: &str = "0.1";

/// A complete scene document: the serializable subset of a staged scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneDocument {
    /// Version tag; must be [`SCENE_VERSION`].
    pub version: String,
    /// Output canvas size.
    pub canvas: Canvas,
    /// Camera placement.
    pub camera: Camera,
    /// Lighting configuration.
    pub lighting: Lighting,
    /// Background configuration.
    pub background: Background,
    /// Avatars in stage order.
    #[serde(default)]
    pub avatars: Vec<AvatarData>,
}

impl Default for SceneDocument {
    fn default() -> Self {
        Self {
            version: SCENE_VERSION.to_string(),
            canvas: Canvas::default(),
            camera: Camera::default(),
            lighting: Lighting::default(),
            background: Background::default(),
            avatars: Vec::new(),
        }
    }
}

impl SceneDocument {
    /// Parses a document from a JSON string without range validation.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parses a document from a JSON value without range validation.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Parses and validates a document. Any validation error rejects the
    /// whole document.
    pub fn parse_validated(json: &str) -> Result<(Self, Vec<ValidationWarning>), SceneError> {
        let doc = Self::from_json(json)?;
        let warnings = doc.validated()?;
        Ok((doc, warnings))
    }

    /// Validates this document, returning its warnings on success.
    pub fn validated(&self) -> Result<Vec<ValidationWarning>, SceneError> {
        validate_document(self)
            .into_result()
            .map_err(SceneError::ValidationFailed)
    }

    /// Serializes the document to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes the document to pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Looks up an avatar by id.
    pub fn avatar(&self, id: &str) -> Option<&AvatarData> {
        self.avatars.iter().find(|a| a.id == id)
    }
}

/// Output canvas dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Canvas {
    #[serde(default = "default_canvas_width")]
    pub width: f64,
    #[serde(default = "default_canvas_height")]
    pub height: f64,
}

fn default_canvas_width() -> f64 {
    1920.0
}

fn default_canvas_height() -> f64 {
    1080.0
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: default_canvas_width(),
            height: default_canvas_height(),
        }
    }
}

/// Camera placement: field of view (degrees), eye position and look-at target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Camera {
    #[serde(default = "default_fov")]
    pub fov: f64,
    #[serde(default = "default_camera_position")]
    pub position: [f64; 3],
    #[serde(default)]
    pub target: [f64; 3],
}

fn default_fov() -> f64 {
    50.0
}

fn default_camera_position() -> [f64; 3] {
    [0.0, 15.0, 20.0]
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov: default_fov(),
            position: default_camera_position(),
            target: [0.0, 0.0, 0.0],
        }
    }
}

/// Named camera framings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraPreset {
    /// Straight-on view at eye height.
    Front,
    /// Three-quarter view from the front right.
    ThreeQuarter,
    /// Side profile from the right.
    Profile,
    /// Wide default view of the whole stage.
    FrameAll,
}

impl CameraPreset {
    /// Returns the `(position, target)` pair for this preset.
    pub fn placement(&self) -> ([f64; 3], [f64; 3]) {
        match self {
            CameraPreset::Front => ([0.0, 1.6, 4.0], [0.0, 1.0, 0.0]),
            CameraPreset::ThreeQuarter => ([3.0, 2.5, 3.0], [0.0, 1.0, 0.0]),
            CameraPreset::Profile => ([4.0, 1.6, 0.0], [0.0, 1.0, 0.0]),
            CameraPreset::FrameAll => ([0.0, 15.0, 20.0], [0.0, 0.0, 0.0]),
        }
    }

    /// Returns all presets.
    pub fn all() -> &'static [CameraPreset] {
        &[
            CameraPreset::Front,
            CameraPreset::ThreeQuarter,
            CameraPreset::Profile,
            CameraPreset::FrameAll,
        ]
    }
}

impl std::str::FromStr for CameraPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "front" => Ok(CameraPreset::Front),
            "three_quarter" | "45" => Ok(CameraPreset::ThreeQuarter),
            "profile" => Ok(CameraPreset::Profile),
            "frame_all" => Ok(CameraPreset::FrameAll),
            _ => Err(format!("unknown camera preset: {}", s)),
        }
    }
}

/// Lighting configuration.
///
/// Two shapes are accepted: an explicit key light with optional HDRI
/// settings, or a named preset with a key-light color and environment
/// intensity. Each shape rejects the other's fields, which is what lets the
/// untagged representation pick the right variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Lighting {
    /// Explicit key light.
    Manual(ManualLighting),
    /// Named lighting preset.
    Preset(PresetLighting),
}

impl Default for Lighting {
    fn default() -> Self {
        Lighting::Manual(ManualLighting::default())
    }
}

/// Explicit key light plus optional HDRI environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManualLighting {
    pub key: KeyLight,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hdri: Option<HdriSettings>,
}

impl Default for ManualLighting {
    fn default() -> Self {
        Self {
            key: KeyLight::default(),
            hdri: Some(HdriSettings::default()),
        }
    }
}

/// Key light parameters. Angles are in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyLight {
    #[serde(default = "default_intensity")]
    pub intensity: f64,
    #[serde(default = "default_white")]
    pub color: String,
    #[serde(default = "default_light_angle")]
    pub azimuth: f64,
    #[serde(default = "default_light_angle")]
    pub elevation: f64,
}

fn default_intensity() -> f64 {
    1.0
}

fn default_white() -> String {
    "#ffffff".to_string()
}

fn default_light_angle() -> f64 {
    45.0
}

impl Default for KeyLight {
    fn default() -> Self {
        Self {
            intensity: default_intensity(),
            color: default_white(),
            azimuth: default_light_angle(),
            elevation: default_light_angle(),
        }
    }
}

/// HDRI environment settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HdriSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default = "default_intensity")]
    pub exposure: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for HdriSettings {
    fn default() -> Self {
        Self {
            path: None,
            exposure: 1.0,
            enabled: true,
        }
    }
}

/// Preset-driven lighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct PresetLighting {
    pub preset: LightingPreset,
    #[serde(default = "default_white")]
    pub key_color: String,
    #[serde(default = "default_intensity")]
    pub environment_intensity: f64,
}

/// Named lighting rigs understood by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightingPreset {
    Studio,
    Soft,
    Dramatic,
    Outdoor,
}

/// Background mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundMode {
    /// Flat color fill.
    #[default]
    Flat,
    /// HDRI environment image.
    Hdri,
    /// Named 3D set.
    Set,
}

/// Background configuration. Only the active mode's payload is read; the
/// other fields are kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Background {
    #[serde(default)]
    pub mode: BackgroundMode,
    #[serde(default = "default_black")]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hdri_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_path: Option<String>,
}

fn default_black() -> String {
    "#000000".to_string()
}

impl Default for Background {
    fn default() -> Self {
        Self {
            mode: BackgroundMode::Flat,
            color: default_black(),
            hdri_path: None,
            set_path: None,
        }
    }
}

/// The payload of the active background mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveBackground<'a> {
    Flat { color: &'a str },
    Hdri { path: Option<&'a str> },
    Set { path: Option<&'a str> },
}

impl Background {
    /// Returns the active mode's payload, ignoring inactive fields.
    pub fn active(&self) -> ActiveBackground<'_> {
        match self.mode {
            BackgroundMode::Flat => ActiveBackground::Flat {
                color: &self.color,
            },
            BackgroundMode::Hdri => ActiveBackground::Hdri {
                path: self.hdri_path.as_deref(),
            },
            BackgroundMode::Set => ActiveBackground::Set {
                path: self.set_path.as_deref(),
            },
        }
    }
}
