//! Validate command implementation
//!
//! Parses a scene document strictly and checks every range and structural
//! rule.

use anyhow::{Context, Result};
use colored::Colorize;
use stagekit_scene::{validate_document, SceneDocument, ValidationResult};
use std::process::ExitCode;

use super::json_output::{error_codes, CommandOutput, JsonError, JsonWarning};

#[derive(Debug, serde::Serialize)]
struct ValidateResult {
    version: String,
    avatars: usize,
}

/// Run the validate command
///
/// # Returns
/// Exit code: 0 if valid, 1 if invalid
pub fn run(scene_path: &str, json_output: bool) -> Result<ExitCode> {
    if json_output {
        run_json(scene_path)
    } else {
        run_human(scene_path)
    }
}

fn run_human(scene_path: &str) -> Result<ExitCode> {
    println!("{} {}", "Validating:".cyan().bold(), scene_path);

    let json = std::fs::read_to_string(scene_path)
        .with_context(|| format!("Failed to read scene file: {}", scene_path))?;
    let doc = match SceneDocument::from_json(&json) {
        Ok(doc) => doc,
        Err(e) => {
            println!("\n{} {}", "FAILED".red().bold(), e);
            return Ok(ExitCode::from(1));
        }
    };

    let result = validate_document(&doc);
    print_validation_results(&result);

    if result.is_ok() {
        println!(
            "\n{} Scene is valid ({} avatar(s))",
            "SUCCESS".green().bold(),
            doc.avatars.len()
        );
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "\n{} Scene has {} error(s)",
            "FAILED".red().bold(),
            result.errors.len()
        );
        Ok(ExitCode::from(1))
    }
}

fn run_json(scene_path: &str) -> Result<ExitCode> {
    let output = match std::fs::read_to_string(scene_path) {
        Err(e) => CommandOutput::<ValidateResult>::failure(
            vec![JsonError::new(error_codes::FILE_IO, e.to_string()).with_file(scene_path)],
            vec![],
        ),
        Ok(json) => match SceneDocument::from_json(&json) {
            Err(e) => CommandOutput::failure(
                vec![JsonError::new(error_codes::JSON_PARSE, e.to_string()).with_file(scene_path)],
                vec![],
            ),
            Ok(doc) => {
                let result = validate_document(&doc);
                let warnings = result.warnings.iter().map(JsonWarning::from).collect();
                if result.is_ok() {
                    CommandOutput::success(
                        ValidateResult {
                            version: doc.version.clone(),
                            avatars: doc.avatars.len(),
                        },
                        warnings,
                    )
                } else {
                    let errors = result
                        .errors
                        .iter()
                        .map(|e| JsonError::from(e).with_file(scene_path))
                        .collect();
                    CommandOutput::failure(errors, warnings)
                }
            }
        },
    };

    output.print()?;
    if output.success {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

/// Print validation results to the console
fn print_validation_results(result: &ValidationResult) {
    if !result.errors.is_empty() {
        println!("\n{}", "Errors:".red().bold());
        for error in &result.errors {
            println!("  {} {}", "x".red(), error);
        }
    }
    if !result.warnings.is_empty() {
        println!("\n{}", "Warnings:".yellow().bold());
        for warning in &result.warnings {
            println!("  {} {}", "!".yellow(), warning);
        }
    }
}
