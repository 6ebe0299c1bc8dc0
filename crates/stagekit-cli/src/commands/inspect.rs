//! Inspect command implementation
//!
//! Runs one asset through the ingestion pipeline and reports what the stage
//! would make of it: rig, bones, IK chains, morphs, normalization.

use anyhow::Result;
use colored::Colorize;
use stagekit_rig::{ingest, IngestOutcome, SceneStore, StageConfig};
use std::process::ExitCode;

use super::json_output::CommandOutput;
use super::{ingest_error_to_json, print_ingest_report};

/// Run the inspect command
///
/// # Returns
/// Exit code: 0 if the asset ingested, 1 otherwise
pub async fn run(asset_path: &str, config: StageConfig, json_output: bool) -> Result<ExitCode> {
    let mut store = SceneStore::new(config);

    if !json_output {
        println!("{} {}", "Inspecting:".cyan().bold(), asset_path);
    }

    let outcome = ingest::ingest_path(&mut store, asset_path).await;
    match outcome {
        Ok(IngestOutcome::Registered(report)) => {
            if json_output {
                CommandOutput::success(report, vec![]).print()?;
            } else {
                print_ingest_report(&report);
            }
            Ok(ExitCode::SUCCESS)
        }
        // Nothing can reset a private store mid-ingestion.
        Ok(IngestOutcome::Discarded) => Ok(ExitCode::from(1)),
        Err(e) => {
            if json_output {
                CommandOutput::<()>::failure(vec![ingest_error_to_json(&e, asset_path)], vec![])
                    .print()?;
            } else {
                println!("\n{} {}", "FAILED".red().bold(), e);
            }
            Ok(ExitCode::from(1))
        }
    }
}
