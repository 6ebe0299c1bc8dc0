//! Command implementations.

pub mod compose;
pub mod inspect;
pub mod json_output;
pub mod restore;
pub mod validate;

use anyhow::{Context, Result};
use colored::Colorize;
use stagekit_rig::{IngestError, IngestReport, StageConfig};

use json_output::{error_codes, JsonError};

/// Loads `--config` if given, otherwise the defaults.
pub fn load_config(path: Option<&str>) -> Result<StageConfig> {
    match path {
        Some(path) => StageConfig::from_file(path)
            .with_context(|| format!("Failed to load config file: {}", path)),
        None => Ok(StageConfig::default()),
    }
}

pub fn ingest_error_to_json(error: &IngestError, file: &str) -> JsonError {
    let code = match error {
        IngestError::UnsupportedExtension { .. } => error_codes::UNSUPPORTED_EXTENSION,
        IngestError::Io(_) => error_codes::FILE_IO,
        IngestError::Parse { .. } => error_codes::ASSET_PARSE,
        IngestError::Task(_) | IngestError::UnknownAvatar(_) => error_codes::INGEST,
    };
    JsonError::new(code, error.to_string()).with_file(file)
}

/// Prints an ingestion report for humans.
pub(crate) fn print_ingest_report(report: &IngestReport) {
    let rig = if report.has_rig {
        "rigged".green()
    } else {
        "static prop".yellow()
    };
    println!("  {} {} ({})", "Avatar:".dimmed(), report.avatar_id, rig);
    println!(
        "  {} {:.3} -> x{:.4} ({:?}), floor offset {:.3}",
        "Scale:".dimmed(),
        report.normalization.source_height,
        report.normalization.factor,
        report.normalization.band,
        report.normalization.floor_offset
    );
    if report.has_rig {
        println!("  {} {}", "Bones:".dimmed(), report.bone_count);
        let chains = if report.chains.is_empty() {
            "none".to_string()
        } else {
            report.chains.join(", ")
        };
        println!("  {} {}", "IK chains:".dimmed(), chains);
    }
    if !report.morph_targets.is_empty() {
        println!(
            "  {} {}",
            "Morphs:".dimmed(),
            report.morph_targets.join(", ")
        );
    }
    for degradation in &report.degradations {
        println!(
            "  {} [{:?}] {}",
            "!".yellow(),
            degradation.step,
            degradation.message
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_error_codes() {
        let err = IngestError::UnsupportedExtension {
            path: "a.fbx".into(),
        };
        assert_eq!(ingest_error_to_json(&err, "a.fbx").code, "CLI_002");

        let err = IngestError::Io(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(ingest_error_to_json(&err, "a.glb").code, "CLI_001");
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        assert!(load_config(None).is_ok());
        assert!(load_config(Some("/nonexistent/stagekit.json")).is_err());
    }
}
