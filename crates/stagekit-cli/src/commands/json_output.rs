//! JSON output types for machine-readable CLI output.
//!
//! Every command run with `--json` prints exactly one [`CommandOutput`] to
//! stdout.

use serde::{Deserialize, Serialize};
use stagekit_scene::{SceneError, ValidationError, ValidationWarning};

/// Stable error codes for CLI-level failures. Validation failures pass
/// through their own `E0xx` codes.
pub mod error_codes {
    /// File could not be read or written
    pub const FILE_IO: &str = "CLI_001";
    /// Unsupported asset extension
    pub const UNSUPPORTED_EXTENSION: &str = "CLI_002";
    /// Scene JSON could not be parsed
    pub const JSON_PARSE: &str = "CLI_003";
    /// Asset could not be decoded
    pub const ASSET_PARSE: &str = "CLI_004";
    /// Asset for a saved avatar was not found
    pub const ASSET_NOT_FOUND: &str = "CLI_005";
    /// Ingestion failed for another reason
    pub const INGEST: &str = "CLI_006";
}

/// A structured error in JSON output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonError {
    /// Stable error code (e.g., "CLI_001", "E003")
    pub code: String,
    pub message: String,
    /// JSON path to the problematic field (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Source file path (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl JsonError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            path: None,
            file: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

/// A structured warning in JSON output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonWarning {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Envelope printed by every `--json` command.
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutput<T: Serialize> {
    pub success: bool,
    pub errors: Vec<JsonError>,
    pub warnings: Vec<JsonWarning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
}

impl<T: Serialize> CommandOutput<T> {
    pub fn success(result: T, warnings: Vec<JsonWarning>) -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            warnings,
            result: Some(result),
        }
    }

    pub fn failure(errors: Vec<JsonError>, warnings: Vec<JsonWarning>) -> Self {
        Self {
            success: false,
            errors,
            warnings,
            result: None,
        }
    }

    /// Prints the envelope as pretty JSON.
    pub fn print(&self) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(self)?);
        Ok(())
    }
}

impl From<&ValidationError> for JsonError {
    fn from(error: &ValidationError) -> Self {
        Self {
            code: error.code.code().to_string(),
            message: error.message.clone(),
            path: error.path.clone(),
            file: None,
        }
    }
}

impl From<&ValidationWarning> for JsonWarning {
    fn from(warning: &ValidationWarning) -> Self {
        Self {
            code: warning.code.code().to_string(),
            message: warning.message.clone(),
            path: warning.path.clone(),
        }
    }
}

/// Flattens a scene error into JSON errors attributed to `file`.
pub fn scene_error_to_json(error: &SceneError, file: &str) -> Vec<JsonError> {
    match error {
        SceneError::ValidationFailed(errors) => errors
            .iter()
            .map(|e| JsonError::from(e).with_file(file))
            .collect(),
        SceneError::JsonParse(e) => {
            vec![JsonError::new(error_codes::JSON_PARSE, e.to_string()).with_file(file)]
        }
        SceneError::Io(e) => {
            vec![JsonError::new(error_codes::FILE_IO, e.to_string()).with_file(file)]
        }
    }
}
