//! Error types for scene document validation and processing.

use thiserror::Error;

/// Error codes for scene document validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Document errors (E001-E009)
    /// E001: Unsupported document version
    UnsupportedVersion,
    /// E002: Canvas dimensions are not positive
    InvalidCanvas,
    /// E003: Numeric field outside its allowed range
    ValueOutOfRange,
    /// E004: Numeric field is NaN or infinite
    NonFiniteNumber,
    /// E005: Color is not a `#rrggbb` hex string
    InvalidColor,

    // Avatar errors (E010-E019)
    /// E010: Avatar id is empty
    EmptyAvatarId,
    /// E011: Two avatars share the same id
    DuplicateAvatarId,
    /// E012: Morph or bone key is empty
    EmptyKey,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "E001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::UnsupportedVersion => "E001",
            ErrorCode::InvalidCanvas => "E002",
            ErrorCode::ValueOutOfRange => "E003",
            ErrorCode::NonFiniteNumber => "E004",
            ErrorCode::InvalidColor => "E005",
            ErrorCode::EmptyAvatarId => "E010",
            ErrorCode::DuplicateAvatarId => "E011",
            ErrorCode::EmptyKey => "E012",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Warning codes for scene document validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCode {
    /// W001: Active background mode has no payload
    MissingBackgroundPayload,
    /// W002: Pose quaternion is not unit length
    UnnormalizedPoseQuaternion,
    /// W003: Avatar has no source reference
    MissingAvatarSource,
}

impl WarningCode {
    /// Returns the warning code string (e.g., "W001").
    pub fn code(&self) -> &'static str {
        match self {
            WarningCode::MissingBackgroundPayload => "W001",
            WarningCode::UnnormalizedPoseQuaternion => "W002",
            WarningCode::MissingAvatarSource => "W003",
        }
    }
}

impl std::fmt::Display for WarningCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One failed check, located by a JSON path when it applies to a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub code: ErrorCode,
    pub message: String,
    /// e.g. `avatars[0].scale`
    pub path: Option<String>,
}

impl ValidationError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(code: ErrorCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::new(code, message)
        }
    }
}

fn write_coded(
    f: &mut std::fmt::Formatter<'_>,
    code: &dyn std::fmt::Display,
    message: &str,
    path: Option<&str>,
) -> std::fmt::Result {
    match path {
        Some(path) => write!(f, "{}: {} (at {})", code, message, path),
        None => write!(f, "{}: {}", code, message),
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_coded(f, &self.code, &self.message, self.path.as_deref())
    }
}

impl std::error::Error for ValidationError {}

/// A finding that does not reject the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    pub code: WarningCode,
    pub message: String,
    pub path: Option<String>,
}

impl ValidationWarning {
    pub fn with_path(
        code: WarningCode,
        message: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_coded(f, &self.code, &self.message, self.path.as_deref())
    }
}

/// Errors from parsing, reading or validating a scene document.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("scene validation failed with {} error(s)", .0.len())]
    ValidationFailed(Vec<ValidationError>),

    /// Malformed JSON, a wrong type, or an unknown field.
    #[error("invalid scene JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("failed to read scene: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything one validation pass found.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn success() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// True when no check failed. Warnings do not count.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Warnings on success, errors otherwise.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, Vec<ValidationError>> {
        if self.is_ok() {
            Ok(self.warnings)
        } else {
            Err(self.errors)
        }
    }
}
