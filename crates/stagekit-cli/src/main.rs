//! StageKit CLI - Command-line interface for avatar scene composition
//!
//! Inspects glTF avatars, validates scene documents, composes scenes from
//! assets and restores saved scenes against an asset directory.

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use stagekit_cli::{commands, logging};

/// StageKit - Avatar scene composition
#[derive(Parser)]
#[command(name = "stagekit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Runtime configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest an asset and report its rig, morphs and normalization
    Inspect {
        /// Path to a .glb or .gltf file
        asset: String,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Validate a scene document
    Validate {
        /// Path to the scene JSON file
        scene: String,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Compose a scene from one or more assets
    Compose {
        /// Paths to .glb or .gltf files
        #[arg(required = true)]
        assets: Vec<String>,

        /// Output scene file (default: stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Distance between avatars along X
        #[arg(long, default_value_t = 2.0)]
        spacing: f64,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Load a scene, re-ingest its avatars and replay their saved state
    Restore {
        /// Path to the scene JSON file
        scene: String,

        /// Directory searched (recursively) for avatar assets by file name
        #[arg(long)]
        assets: String,

        /// Write the restored scene back out
        #[arg(short, long)]
        output: Option<String>,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    fn json(&self) -> bool {
        match self {
            Commands::Inspect { json, .. }
            | Commands::Validate { json, .. }
            | Commands::Compose { json, .. }
            | Commands::Restore { json, .. } => *json,
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = commands::load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Inspect { asset, json } => commands::inspect::run(&asset, config, json).await,
        Commands::Validate { scene, json } => commands::validate::run(&scene, json),
        Commands::Compose {
            assets,
            output,
            spacing,
            json,
        } => commands::compose::run(&assets, output.as_deref(), spacing, config, json).await,
        Commands::Restore {
            scene,
            assets,
            output,
            json,
        } => commands::restore::run(&scene, &assets, output.as_deref(), config, json).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.command.json());

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_compose() {
        let cli = Cli::try_parse_from([
            "stagekit",
            "compose",
            "a.glb",
            "b.gltf",
            "-o",
            "scene.json",
            "--config",
            "stage.json",
        ])
        .unwrap();
        assert_eq!(cli.config.as_deref(), Some("stage.json"));
        match cli.command {
            Commands::Compose {
                assets,
                output,
                spacing,
                json,
            } => {
                assert_eq!(assets, vec!["a.glb", "b.gltf"]);
                assert_eq!(output.as_deref(), Some("scene.json"));
                assert_eq!(spacing, 2.0);
                assert!(!json);
            }
            _ => panic!("expected compose"),
        }
    }

    #[test]
    fn test_cli_requires_assets_dir_for_restore() {
        assert!(Cli::try_parse_from(["stagekit", "restore", "scene.json"]).is_err());
        let cli =
            Cli::try_parse_from(["stagekit", "restore", "scene.json", "--assets", "models", "--json"])
                .unwrap();
        assert!(cli.command.json());
    }

    #[test]
    fn test_cli_compose_needs_an_asset() {
        assert!(Cli::try_parse_from(["stagekit", "compose"]).is_err());
    }
}
