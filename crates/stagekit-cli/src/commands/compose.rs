//! Compose command implementation
//!
//! Ingests several assets into one scene, spreads them along X and writes
//! the resulting scene document.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use stagekit_rig::{ingest, persist, IngestOutcome, IngestReport, SceneStore, StageConfig};
use stagekit_scene::{AvatarPatch, CameraPreset, SceneDocument};
use std::process::ExitCode;

use super::json_output::{CommandOutput, JsonError};
use super::{ingest_error_to_json, print_ingest_report};

#[derive(Debug, Serialize)]
struct ComposeResult {
    output: Option<String>,
    avatars: Vec<IngestReport>,
    /// Inlined when no output file was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    scene: Option<SceneDocument>,
}

/// Run the compose command
///
/// Assets that fail to ingest are reported and skipped; the scene is still
/// written with the rest.
///
/// # Returns
/// Exit code: 0 if every asset ingested, 1 otherwise
pub async fn run(
    assets: &[String],
    output: Option<&str>,
    spacing: f64,
    config: StageConfig,
    json_output: bool,
) -> Result<ExitCode> {
    let mut store = SceneStore::new(config);
    store.apply_camera_preset(CameraPreset::FrameAll);

    let mut reports = Vec::new();
    let mut errors: Vec<JsonError> = Vec::new();

    for asset in assets {
        if !json_output {
            println!("{} {}", "Ingesting:".cyan().bold(), asset);
        }
        match ingest::ingest_path(&mut store, asset.as_str()).await {
            Ok(IngestOutcome::Registered(report)) => {
                let x = spacing * reports.len() as f64;
                let y = report.normalization.floor_offset;
                store.update_avatar(&report.avatar_id, AvatarPatch::position([x, y, 0.0]));
                store.snap_ik_targets(&report.avatar_id);
                if !json_output {
                    print_ingest_report(&report);
                }
                reports.push(report);
            }
            Ok(IngestOutcome::Discarded) => {}
            Err(e) => {
                if !json_output {
                    println!("  {} {}", "x".red(), e);
                }
                errors.push(ingest_error_to_json(&e, asset));
            }
        }
    }

    store.tick();
    let doc = persist::export(&store);
    let scene_json = doc.to_json_pretty()?;

    match output {
        Some(path) => std::fs::write(path, &scene_json)
            .with_context(|| format!("Failed to write scene file: {}", path))?,
        None if !json_output => println!("{}", scene_json),
        None => {}
    }

    let ok = errors.is_empty();
    if json_output {
        let result = ComposeResult {
            output: output.map(String::from),
            avatars: reports,
            scene: output.is_none().then(|| doc.clone()),
        };
        let envelope = CommandOutput {
            success: ok,
            errors,
            warnings: vec![],
            result: Some(result),
        };
        envelope.print()?;
    } else if let Some(path) = output {
        let status = if ok {
            "SUCCESS".green().bold()
        } else {
            "PARTIAL".yellow().bold()
        };
        println!(
            "\n{} Wrote {} avatar(s) to {}",
            status,
            doc.avatars.len(),
            path
        );
    }

    if ok {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}
