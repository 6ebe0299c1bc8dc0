//! Restore command implementation
//!
//! Loads a saved scene, re-ingests every avatar from an asset directory and
//! replays its pose, IK targets and morphs.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use stagekit_rig::{ingest, persist, IngestOutcome, RestoreReport, SceneStore, StageConfig};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use walkdir::WalkDir;

use super::json_output::{
    error_codes, scene_error_to_json, CommandOutput, JsonError, JsonWarning,
};
use super::ingest_error_to_json;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RestoredAvatar {
    id: String,
    src: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    asset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<RestoreReport>,
}

#[derive(Debug, Serialize)]
struct RestoreResult {
    output: Option<String>,
    avatars: Vec<RestoredAvatar>,
}

/// Indexes `.glb`/`.gltf` files under `dir` by file name. The first file
/// found wins on duplicates.
pub fn index_assets(dir: &Path) -> HashMap<String, PathBuf> {
    let mut index = HashMap::new();
    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        let supported = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("glb") || e.eq_ignore_ascii_case("gltf"));
        if !supported {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            index
                .entry(name.to_string())
                .or_insert_with(|| path.to_path_buf());
        }
    }
    index
}

/// Run the restore command
///
/// # Returns
/// Exit code: 0 if every avatar was restored, 1 otherwise
pub async fn run(
    scene_path: &str,
    assets_dir: &str,
    output: Option<&str>,
    config: StageConfig,
    json_output: bool,
) -> Result<ExitCode> {
    let json = std::fs::read_to_string(scene_path)
        .with_context(|| format!("Failed to read scene file: {}", scene_path))?;

    let mut store = SceneStore::new(config);
    let warnings = match persist::load_json(&mut store, &json) {
        Ok(warnings) => warnings,
        Err(e) => {
            if json_output {
                CommandOutput::<()>::failure(scene_error_to_json(&e, scene_path), vec![]).print()?;
            } else {
                println!("{} {}", "FAILED".red().bold(), e);
            }
            return Ok(ExitCode::from(1));
        }
    };

    if !json_output {
        println!("{} {}", "Restoring:".cyan().bold(), scene_path);
        for warning in &warnings {
            println!("  {} {}", "!".yellow(), warning);
        }
    }

    let index = index_assets(Path::new(assets_dir));
    let mut errors: Vec<JsonError> = Vec::new();
    let mut avatars = Vec::new();

    for (id, src) in persist::pending_reingestion(&store) {
        let file_name = Path::new(&src)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&src)
            .to_string();
        let Some(asset) = index.get(&file_name) else {
            let message = format!("asset '{}' for avatar {} not found in {}", src, id, assets_dir);
            if !json_output {
                println!("  {} {}", "x".red(), message);
            }
            errors.push(JsonError::new(error_codes::ASSET_NOT_FOUND, message));
            avatars.push(RestoredAvatar {
                id,
                src,
                asset: None,
                report: None,
            });
            continue;
        };

        let asset_str = asset.display().to_string();
        let report = match ingest::reingest_path(&mut store, &id, asset.clone()).await {
            Ok(IngestOutcome::Registered(_)) => persist::restore(&mut store, &id),
            Ok(IngestOutcome::Discarded) => None,
            Err(e) => {
                if !json_output {
                    println!("  {} {}: {}", "x".red(), id, e);
                }
                errors.push(ingest_error_to_json(&e, &asset_str));
                None
            }
        };

        if !json_output {
            if let Some(ref r) = report {
                println!(
                    "  {} {} ({} bones, {} IK targets, {} morphs, {} skipped)",
                    "+".green(),
                    id,
                    r.bones,
                    r.ik_targets,
                    r.morphs,
                    r.skipped.len()
                );
            }
        }
        avatars.push(RestoredAvatar {
            id,
            src,
            asset: Some(asset_str),
            report,
        });
    }

    store.tick();

    if let Some(path) = output {
        let doc = persist::export(&store);
        std::fs::write(path, doc.to_json_pretty()?)
            .with_context(|| format!("Failed to write scene file: {}", path))?;
    }

    let ok = errors.is_empty();
    if json_output {
        CommandOutput {
            success: ok,
            errors,
            warnings: warnings.iter().map(JsonWarning::from).collect(),
            result: Some(RestoreResult {
                output: output.map(String::from),
                avatars,
            }),
        }
        .print()?;
    } else if ok {
        println!("\n{} Scene restored", "SUCCESS".green().bold());
    } else {
        println!(
            "\n{} {} avatar(s) could not be restored",
            "PARTIAL".yellow().bold(),
            errors.len()
        );
    }

    if ok {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_assets_filters_and_recurses() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("hero.glb"), b"").unwrap();
        std::fs::write(dir.path().join("nested").join("prop.GLTF"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let index = index_assets(dir.path());
        assert_eq!(index.len(), 2);
        assert!(index.contains_key("hero.glb"));
        assert!(index["prop.GLTF"].ends_with("nested/prop.GLTF"));
    }

    #[tokio::test]
    async fn test_missing_asset_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = stagekit_scene::SceneDocument::default();
        doc.avatars
            .push(stagekit_scene::AvatarData::new("avatar_1_abc", "gone.glb"));
        let scene = dir.path().join("scene.json");
        std::fs::write(&scene, doc.to_json().unwrap()).unwrap();

        let code = run(
            scene.to_str().unwrap(),
            dir.path().to_str().unwrap(),
            None,
            StageConfig::default(),
            true,
        )
        .await
        .unwrap();
        assert_eq!(code, ExitCode::from(1));
    }
}
