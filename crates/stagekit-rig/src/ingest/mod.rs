//! Model ingestion pipeline.
//!
//! Turns a `.glb`/`.gltf` asset into a registered avatar:
//!
//! 1. decode into a [`SceneGraph`] rooted at a group named after the file
//! 2. collect morph names, bones and the first skinned mesh
//! 3. enable shadows and tone down environment reflections
//! 4. auto-scale and drop onto the floor
//! 5. create the avatar record (or reuse a pending one)
//! 6. build the IK rig
//! 7. apply the neutral pose
//! 8. register and select
//!
//! Steps 3 to 7 degrade rather than fail; what went wrong is listed in the
//! [`IngestReport`].

mod accessors;
mod build;

pub use accessors::{declared_bounds, primitive_bounds};
pub use build::build_graph;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use stagekit_scene::AvatarData;

use crate::config::StageConfig;
use crate::error::IngestError;
use crate::graph::{NodeId, SceneGraph};
use crate::normalize::{self, Normalization, ScaleBand};
use crate::store::{LiveAvatar, SceneStore};

/// Supported asset encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetFormat {
    Glb,
    Gltf,
}

/// A path that has passed the extension check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSource {
    path: PathBuf,
    format: AssetFormat,
}

impl AssetSource {
    /// Accepts `.glb` and `.gltf` (any case). Nothing is read.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, IngestError> {
        let path = path.into();
        let format = match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("glb") => AssetFormat::Glb,
            Some("gltf") => AssetFormat::Gltf,
            _ => return Err(IngestError::UnsupportedExtension { path }),
        };
        Ok(Self { path, format })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> AssetFormat {
        self.format
    }

    /// File stem, used as the avatar root's name.
    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("avatar")
            .to_string()
    }

    /// File name, recorded as the avatar's `src`.
    pub fn src(&self) -> String {
        self.path
            .file_name()
            .and_then(|s| s.to_str())
            .map(String::from)
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Decodes already-read bytes. External buffers resolve relative to the
    /// asset's directory.
    pub fn decode(&self, bytes: &[u8]) -> Result<DecodedAsset, IngestError> {
        decode_bytes(&self.name(), &self.src(), bytes, self.path.parent())
    }
}

/// A decoded asset, not yet registered anywhere.
#[derive(Debug, Clone)]
pub struct DecodedAsset {
    pub name: String,
    pub src: String,
    pub graph: SceneGraph,
    pub root: NodeId,
}

/// Decodes glTF bytes into a graph rooted at a group called `name`.
///
/// Buffers that cannot be loaded are treated as empty; bounds then come from
/// accessor min/max only.
pub fn decode_bytes(
    name: &str,
    src: &str,
    bytes: &[u8],
    base: Option<&Path>,
) -> Result<DecodedAsset, IngestError> {
    let gltf = gltf::Gltf::from_slice(bytes).map_err(|e| IngestError::parse(e.to_string()))?;
    let buffers = match gltf::import_buffers(&gltf.document, base, gltf.blob.clone()) {
        Ok(buffers) => buffers,
        Err(e) => {
            warn!(asset = src, error = %e, "could not load buffers, using declared bounds only");
            Vec::new()
        }
    };
    let (graph, root) = build_graph(&gltf.document, &buffers, name)?;
    Ok(DecodedAsset {
        name: name.to_string(),
        src: src.to_string(),
        graph,
        root,
    })
}

/// Reads and decodes an asset. Decoding runs on a blocking task.
pub async fn read_asset(path: impl Into<PathBuf>) -> Result<DecodedAsset, IngestError> {
    let source = AssetSource::from_path(path)?;
    let bytes = tokio::fs::read(source.path()).await?;
    tokio::task::spawn_blocking(move || source.decode(&bytes))
        .await
        .map_err(|e| IngestError::Task(e.to_string()))?
}

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// `avatar_<unix millis>_<9 random base36 chars>`.
pub fn generate_avatar_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("avatar_{}_{}", millis, suffix)
}

/// Pipeline step that can degrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStep {
    Normalize,
    IkRig,
    NeutralPose,
}

/// A step that did not do its job. The avatar is still registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Degradation {
    pub step: IngestStep,
    pub message: String,
}

/// Summary of a completed ingestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub avatar_id: String,
    pub name: String,
    pub has_rig: bool,
    pub bone_count: usize,
    pub morph_targets: Vec<String>,
    pub chains: Vec<String>,
    pub normalization: Normalization,
    pub degradations: Vec<Degradation>,
}

/// Store generation captured when an ingestion starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestTicket {
    epoch: u64,
    reingest: Option<String>,
}

impl IngestTicket {
    /// Ticket for a brand new avatar.
    pub fn new(store: &SceneStore) -> Self {
        Self {
            epoch: store.epoch(),
            reingest: None,
        }
    }

    /// Ticket that binds the result to an existing pending entry.
    pub fn reingest(store: &SceneStore, id: &str) -> Result<Self, IngestError> {
        if store.avatar(id).is_none() {
            return Err(IngestError::UnknownAvatar(id.to_string()));
        }
        Ok(Self {
            epoch: store.epoch(),
            reingest: Some(id.to_string()),
        })
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// What happened to a finished ingestion.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Registered(IngestReport),
    /// The scene was reset or loaded while the asset was in flight.
    Discarded,
}

impl IngestOutcome {
    pub fn report(&self) -> Option<&IngestReport> {
        match self {
            IngestOutcome::Registered(report) => Some(report),
            IngestOutcome::Discarded => None,
        }
    }
}

/// Runs steps 2 to 8 on a decoded asset.
///
/// A ticket from an older epoch discards the asset without touching the
/// store.
pub fn complete_ingest(
    store: &mut SceneStore,
    ticket: IngestTicket,
    asset: DecodedAsset,
) -> Result<IngestOutcome, IngestError> {
    if ticket.epoch != store.epoch() {
        debug!(
            asset = %asset.src,
            started = ticket.epoch,
            current = store.epoch(),
            "scene changed during ingestion, discarding result"
        );
        return Ok(IngestOutcome::Discarded);
    }

    let placement = match ticket.reingest {
        Some(ref id) => Some(
            store
                .avatar(id)
                .map(|entry| entry.data.clone())
                .ok_or_else(|| IngestError::UnknownAvatar(id.clone()))?,
        ),
        None => None,
    };

    let config = store.config().clone();
    let (live, mut degradations) = prepare_live(asset.graph, asset.root, &config);
    let normalization = live.normalization;

    let data = match placement {
        Some(data) => data,
        None => {
            let mut data = AvatarData::new(generate_avatar_id(), asset.src.clone());
            data.position = [0.0, normalization.floor_offset, 0.0];
            data
        }
    };
    let id = data.id.clone();

    if ticket.reingest.is_none() {
        store.add_avatar(data);
    }
    store.attach_live(&id, live);

    // IK and the neutral pose need the final world transform.
    let chains = rig_live_avatar(store, &id, &config, &mut degradations).unwrap_or_default();

    store.select(Some(&id));

    let entry = store
        .avatar(&id)
        .ok_or_else(|| IngestError::UnknownAvatar(id.clone()))?;
    let live = entry.live.as_ref();
    let report = IngestReport {
        avatar_id: id.clone(),
        name: asset.name,
        has_rig: entry.has_rig(),
        bone_count: live.map_or(0, |l| l.bones.len()),
        morph_targets: live.map(|l| l.morph_targets.clone()).unwrap_or_default(),
        chains,
        normalization,
        degradations,
    };
    info!(
        avatar = %report.avatar_id,
        has_rig = report.has_rig,
        bones = report.bone_count,
        morphs = report.morph_targets.len(),
        chains = report.chains.len(),
        "avatar registered"
    );
    Ok(IngestOutcome::Registered(report))
}

/// Steps 2 to 4: inventory, materials, normalization.
fn prepare_live(
    mut graph: SceneGraph,
    root: NodeId,
    config: &StageConfig,
) -> (LiveAvatar, Vec<Degradation>) {
    let mut degradations = Vec::new();
    let mut morph_targets: Vec<String> = Vec::new();
    let mut bones = BTreeMap::new();
    let mut skinned_mesh = None;
    let mut skeleton = Vec::new();

    for id in graph.traverse(root) {
        let Some(node) = graph.get_mut(id) else {
            continue;
        };
        if node.is_bone() {
            bones.entry(node.name.clone()).or_insert(id);
        }
        let Some(mesh) = node.mesh_mut() else {
            continue;
        };
        for name in &mesh.morph_names {
            if !morph_targets.contains(name) {
                morph_targets.push(name.clone());
            }
        }
        if skinned_mesh.is_none() && mesh.is_skinned() {
            skinned_mesh = Some(id);
            skeleton = mesh.skin.clone().unwrap_or_default();
        }

        mesh.cast_shadow = true;
        mesh.receive_shadow = true;
        for material in &mut mesh.materials {
            if let Some(ref mut intensity) = material.env_map_intensity {
                *intensity = config.env_map_intensity;
            }
        }
    }

    if skinned_mesh.is_none() {
        debug!("no skinned mesh, treating asset as a static prop");
    }

    let normalization = normalize::normalize_root(&mut graph, root, config.target_height);
    if normalization.band == ScaleBand::Empty {
        warn!("asset has no measurable height, scale left unchanged");
        degradations.push(Degradation {
            step: IngestStep::Normalize,
            message: "asset has no measurable height".to_string(),
        });
    }

    let live = LiveAvatar {
        graph,
        root,
        bones,
        skeleton,
        morph_targets,
        skinned_mesh,
        ik: None,
        normalization,
    };
    (live, degradations)
}

/// Steps 6 and 7 on an attached avatar. Returns the chain names built.
fn rig_live_avatar(
    store: &mut SceneStore,
    id: &str,
    config: &StageConfig,
    degradations: &mut Vec<Degradation>,
) -> Option<Vec<String>> {
    let ik = match store.build_avatar_ik(id)? {
        Ok(ik) => ik,
        Err(e) => {
            warn!(avatar = id, error = %e, "IK rig not built");
            degradations.push(Degradation {
                step: IngestStep::IkRig,
                message: e.to_string(),
            });
            None
        }
    };
    let chains: Vec<String> = ik
        .as_ref()
        .map(|ik| ik.chain_names().into_iter().map(String::from).collect())
        .unwrap_or_default();
    store.set_avatar_ik(id, ik);

    if config.neutral_pose.enabled {
        let posed = store.apply_neutral_pose(id).unwrap_or(0);
        if posed == 0 {
            warn!(avatar = id, "neutral pose: no upper arm bones resolved");
            degradations.push(Degradation {
                step: IngestStep::NeutralPose,
                message: "no upper arm bones resolved".to_string(),
            });
        }
    }

    Some(chains)
}

/// Reads, decodes and registers a new avatar.
pub async fn ingest_path(
    store: &mut SceneStore,
    path: impl Into<PathBuf>,
) -> Result<IngestOutcome, IngestError> {
    let ticket = IngestTicket::new(store);
    let asset = read_asset(path).await?;
    complete_ingest(store, ticket, asset)
}

/// Reads and decodes an asset for a pending entry, keeping its id and
/// transform.
pub async fn reingest_path(
    store: &mut SceneStore,
    id: &str,
    path: impl Into<PathBuf>,
) -> Result<IngestOutcome, IngestError> {
    let ticket = IngestTicket::reingest(store, id)?;
    let asset = read_asset(path).await?;
    complete_ingest(store, ticket, asset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_check() {
        assert_eq!(
            AssetSource::from_path("models/Hero.GLB").unwrap().format(),
            AssetFormat::Glb
        );
        assert_eq!(
            AssetSource::from_path("hero.gltf").unwrap().format(),
            AssetFormat::Gltf
        );
        assert!(matches!(
            AssetSource::from_path("hero.fbx"),
            Err(IngestError::UnsupportedExtension { .. })
        ));
        assert!(AssetSource::from_path("hero").is_err());
    }

    #[test]
    fn test_source_names() {
        let source = AssetSource::from_path("assets/robot_v2.glb").unwrap();
        assert_eq!(source.name(), "robot_v2");
        assert_eq!(source.src(), "robot_v2.glb");
    }

    #[test]
    fn test_avatar_id_format() {
        let id = generate_avatar_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "avatar");
        assert!(parts[1].parse::<u128>().is_ok());
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert_ne!(id, generate_avatar_id());
    }

    #[test]
    fn test_garbage_bytes_are_a_parse_error() {
        let err = decode_bytes("x", "x.glb", b"not a model", None).unwrap_err();
        assert!(matches!(err, IngestError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_unsupported_extension_does_not_touch_store() {
        let mut store = SceneStore::default();
        let err = ingest_path(&mut store, "avatar.fbx").await.unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedExtension { .. }));
        assert!(store.avatars().is_empty());
        assert_eq!(store.epoch(), 0);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SceneStore::default();
        let err = ingest_path(&mut store, dir.path().join("gone.glb"))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Io(_)));
    }

    #[test]
    fn test_reingest_ticket_requires_entry() {
        let store = SceneStore::default();
        assert!(matches!(
            IngestTicket::reingest(&store, "ghost"),
            Err(IngestError::UnknownAvatar(_))
        ));
    }
}
