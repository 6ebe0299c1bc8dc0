//! Error types for avatar ingestion and rigging.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading, decoding or registering an avatar asset.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The file extension is not `.glb` or `.gltf`. Rejected before any read.
    #[error("unsupported asset extension: {path} (expected .glb or .gltf)")]
    UnsupportedExtension { path: PathBuf },

    /// The asset could not be read from disk.
    #[error("failed to read asset: {0}")]
    Io(#[from] std::io::Error),

    /// The asset is not a valid glTF 2.0 document.
    #[error("failed to parse asset: {message}")]
    Parse { message: String },

    /// The blocking decode task did not complete.
    #[error("decode task failed: {0}")]
    Task(String),

    /// A re-ingestion named an avatar id that is not in the store.
    #[error("unknown avatar: {0}")]
    UnknownAvatar(String),
}

impl IngestError {
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        IngestError::Parse {
            message: message.into(),
        }
    }
}

/// Errors raised while building an IK rig for an ingested avatar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IkError {
    /// A resolved chain bone is not present in the avatar graph.
    #[error("chain '{chain}' references missing bone '{bone}'")]
    MissingBone { chain: String, bone: String },

    /// Two chains resolved to the same effector bone.
    #[error("chains '{first}' and '{second}' share effector '{bone}'")]
    SharedEffector {
        first: String,
        second: String,
        bone: String,
    },
}

/// Errors raised while loading runtime configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration JSON is malformed or contains unknown fields.
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A configuration value is out of its allowed range.
    #[error("invalid config value for '{field}': {message}")]
    InvalidValue { field: &'static str, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_extension_message() {
        let err = IngestError::UnsupportedExtension {
            path: PathBuf::from("hero.fbx"),
        };
        assert_eq!(
            err.to_string(),
            "unsupported asset extension: hero.fbx (expected .glb or .gltf)"
        );
    }

    #[test]
    fn test_ik_error_display() {
        let err = IkError::MissingBone {
            chain: "leftArm".to_string(),
            bone: "mixamorigLeftHand".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "chain 'leftArm' references missing bone 'mixamorigLeftHand'"
        );
    }
}
