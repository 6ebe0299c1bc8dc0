//! StageKit Rig Library
//!
//! Live side of a StageKit scene: glTF ingestion into an arena scene graph,
//! bone-name resolution across common rig conventions, height normalization
//! and neutral posing, CCD IK chains for the limbs, and the scene state store
//! that ties avatars to their serializable [`stagekit_scene::AvatarData`].
//!
//! # Example
//!
//! ```no_run
//! use stagekit_rig::{ingest, persist, SceneStore, StageConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = SceneStore::new(StageConfig::default());
//! let outcome = ingest::ingest_path(&mut store, "models/hero.glb").await?;
//! if let Some(report) = outcome.report() {
//!     store.update_avatar_morph(&report.avatar_id, "smile", 0.7);
//! }
//! store.tick();
//!
//! let doc = persist::export(&store);
//! println!("{}", doc.to_json_pretty()?);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`bones`]: Rig conventions and limb chain resolution
//! - [`config`]: Runtime configuration
//! - [`error`]: Error types
//! - [`graph`]: Scene graph arena
//! - [`ik`]: CCD solver and IK rig construction
//! - [`ingest`]: Asset decoding and the ingestion pipeline
//! - [`normalize`]: Auto-scale, floor alignment and pose helpers
//! - [`persist`]: Export, load and restore
//! - [`store`]: Scene state store

pub mod bones;
pub mod config;
pub mod error;
pub mod graph;
pub mod ik;
pub mod ingest;
pub mod normalize;
pub mod persist;
pub mod store;

pub use bones::{BoneRole, ChainRole, ResolvedChain, ResolvedRig, RigConvention};
pub use config::{IkConfig, NeutralPoseConfig, StageConfig};
pub use error::{ConfigError, IkError, IngestError};
pub use graph::{Aabb, MeshData, Node, NodeId, NodeKind, SceneGraph};
pub use ik::{CcdSolver, IkChain, IkSetup};
pub use ingest::{AssetSource, DecodedAsset, IngestOutcome, IngestReport, IngestTicket};
pub use normalize::{Normalization, PosePreset, ScaleBand};
pub use persist::{RestoreReport, SkippedKey};
pub use store::{AvatarEntry, LiveAvatar, SceneStore, Tool, TransformMode, UiState};
