//! Scene save, load and restore.
//!
//! Documents only carry [`AvatarData`]. Loading leaves every avatar pending;
//! once its asset has been re-ingested, [`restore`] replays the saved pose,
//! IK targets and morph weights onto the live handles.

use serde::Serialize;
use tracing::{debug, warn};

use stagekit_scene::{AvatarData, SceneDocument, SceneError, ValidationWarning, SCENE_VERSION};

use crate::store::SceneStore;

/// Captures the store as a document. Live IK target positions and bone
/// rotations overwrite the records' `ikTargets` and `pose`.
pub fn export(store: &SceneStore) -> SceneDocument {
    let avatars = store
        .avatars()
        .iter()
        .map(|entry| {
            let mut data = entry.data.clone();
            if let Some(ref live) = entry.live {
                data.pose = live.pose_snapshot();
                if let Some(ref ik) = live.ik {
                    data.ik_targets = Some(ik.target_positions(store.stage()));
                }
            }
            data
        })
        .collect();

    SceneDocument {
        version: SCENE_VERSION.to_string(),
        canvas: *store.canvas(),
        camera: *store.camera(),
        lighting: store.lighting().clone(),
        background: store.background().clone(),
        avatars,
    }
}

/// Validates a document and replaces the store's scene with it.
///
/// An invalid document leaves the store untouched. On success every avatar
/// is pending re-ingestion and in-flight ingestions are invalidated.
pub fn load(
    store: &mut SceneStore,
    document: SceneDocument,
) -> Result<Vec<ValidationWarning>, SceneError> {
    let warnings = document.validated()?;
    for warning in &warnings {
        warn!(code = warning.code.code(), path = ?warning.path, "{}", warning.message);
    }
    let SceneDocument {
        canvas,
        camera,
        lighting,
        background,
        avatars,
        ..
    } = document;
    store.replace_scene(canvas, camera, lighting, background, avatars);
    debug!(avatars = store.avatars().len(), epoch = store.epoch(), "scene loaded");
    Ok(warnings)
}

/// Parses, validates and loads a JSON document.
pub fn load_json(store: &mut SceneStore, json: &str) -> Result<Vec<ValidationWarning>, SceneError> {
    let document = SceneDocument::from_json(json)?;
    load(store, document)
}

/// Avatars still waiting for their asset, as `(id, src)`.
pub fn pending_reingestion(store: &SceneStore) -> Vec<(String, String)> {
    store
        .avatars()
        .iter()
        .filter(|a| a.is_pending())
        .map(|a| (a.data.id.clone(), a.data.src.clone()))
        .collect()
}

/// Which part of a saved avatar a skipped key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreKind {
    Bone,
    IkTarget,
    Morph,
}

/// A saved key that had no counterpart on the live avatar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedKey {
    pub kind: RestoreKind,
    pub name: String,
}

/// What [`restore`] applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreReport {
    pub bones: usize,
    pub ik_targets: usize,
    pub morphs: usize,
    pub skipped: Vec<SkippedKey>,
}

impl RestoreReport {
    fn skip(&mut self, avatar: &str, kind: RestoreKind, name: &str) {
        debug!(avatar, ?kind, name, "saved key has no live counterpart");
        self.skipped.push(SkippedKey {
            kind,
            name: name.to_string(),
        });
    }
}

/// Replays an avatar's saved pose, then IK targets, then morphs.
///
/// Returns `None` if the avatar is unknown or still pending. Names the live
/// avatar lacks are skipped and reported.
pub fn restore(store: &mut SceneStore, id: &str) -> Option<RestoreReport> {
    let entry = store.avatar(id)?;
    entry.live.as_ref()?;
    let saved: AvatarData = entry.data.clone();

    let mut report = RestoreReport::default();

    if let Some(live) = store.avatar_mut(id).and_then(|a| a.live.as_mut()) {
        for (bone, quat) in &saved.pose {
            if live.set_bone_rotation(bone, *quat) {
                report.bones += 1;
            } else {
                report.skip(id, RestoreKind::Bone, bone);
            }
        }
    }

    for (chain, position) in saved.ik_targets.iter().flatten() {
        if store.set_ik_target(id, chain, *position) {
            report.ik_targets += 1;
        } else {
            report.skip(id, RestoreKind::IkTarget, chain);
        }
    }

    if let Some(live) = store.avatar_mut(id).and_then(|a| a.live.as_mut()) {
        for (name, weight) in &saved.morphs {
            if live.set_morph(name, *weight) > 0 {
                report.morphs += 1;
            } else {
                report.skip(id, RestoreKind::Morph, name);
            }
        }
    }

    if !report.skipped.is_empty() {
        warn!(
            avatar = id,
            skipped = report.skipped.len(),
            "some saved keys could not be restored"
        );
    }
    Some(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use stagekit_scene::{CameraPatch, Lighting, LightingPreset, PresetLighting};

    #[test]
    fn test_empty_scene_round_trip() {
        let mut store = SceneStore::default();
        let before = export(&store);
        load(&mut store, before.clone()).unwrap();
        assert_eq!(export(&store), before);
    }

    #[test]
    fn test_load_replaces_state_and_bumps_epoch() {
        let mut store = SceneStore::default();
        store.add_avatar(AvatarData::new("old", "old.glb"));
        store.select(Some("old"));

        let mut doc = SceneDocument::default();
        doc.lighting = Lighting::Preset(PresetLighting {
            preset: LightingPreset::Studio,
            key_color: "#ffffff".to_string(),
            environment_intensity: 1.0,
        });
        doc.avatars.push(
            AvatarData::new("a", "hero.glb")
                .with_position([1.0, 0.0, 0.0])
                .with_morph("smile", 0.7),
        );
        load(&mut store, doc.clone()).unwrap();

        assert_eq!(store.epoch(), 1);
        assert_eq!(store.ui().selected, None);
        assert!(store.avatar("old").is_none());
        assert!(store.avatar("a").unwrap().is_pending());
        assert_eq!(
            pending_reingestion(&store),
            vec![("a".to_string(), "hero.glb".to_string())]
        );
        assert_eq!(export(&store), doc);
    }

    #[test]
    fn test_invalid_document_leaves_store_untouched() {
        let mut store = SceneStore::default();
        store.update_camera(CameraPatch {
            fov: Some(35.0),
            ..CameraPatch::default()
        });
        store.add_avatar(AvatarData::new("keep", "keep.glb"));

        let mut doc = SceneDocument::default();
        doc.camera.fov = 500.0;
        let err = load(&mut store, doc).unwrap_err();
        assert!(matches!(err, SceneError::ValidationFailed(_)));
        assert_eq!(store.camera().fov, 35.0);
        assert!(store.avatar("keep").is_some());
        assert_eq!(store.epoch(), 0);
    }

    #[test]
    fn test_load_json_rejects_unknown_fields() {
        let mut store = SceneStore::default();
        let mut value = serde_json::to_value(SceneDocument::default()).unwrap();
        value["extra"] = serde_json::json!(true);
        let err = load_json(&mut store, &value.to_string()).unwrap_err();
        assert!(matches!(err, SceneError::JsonParse(_)));
    }

    #[test]
    fn test_restore_requires_live_avatar() {
        let mut store = SceneStore::default();
        store.add_avatar(AvatarData::new("a", "a.glb").with_morph("smile", 0.5));
        assert!(restore(&mut store, "a").is_none());
        assert!(restore(&mut store, "ghost").is_none());
    }
}
