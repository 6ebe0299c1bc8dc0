//! Scene state store.
//!
//! One aggregate owns everything a staged scene needs: the serializable
//! scene slices, one entry per avatar (serializable data plus optional live
//! handles), UI state, and the stage graph that holds IK targets.

use std::collections::BTreeMap;

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use stagekit_scene::{
    clamp_weight, AvatarData, AvatarPatch, Background, BackgroundPatch, Camera, CameraPatch,
    CameraPreset, Canvas, Lighting, LightingPatch,
};

use crate::config::StageConfig;
use crate::graph::{NodeId, SceneGraph};
use crate::error::IkError;
use crate::ik::{build_ik_rig, IkSetup};
use crate::normalize::{self, Normalization, PosePreset};

/// Handles into an ingested asset. Never serialized.
#[derive(Debug, Clone)]
pub struct LiveAvatar {
    /// The avatar's own graph; `root` is its single ownership root.
    pub graph: SceneGraph,
    pub root: NodeId,
    /// Bone name to node, for every skin joint.
    pub bones: BTreeMap<String, NodeId>,
    /// Joints of the skinned mesh, in skin order.
    pub skeleton: Vec<NodeId>,
    /// Morph names across all meshes, deduplicated, in traversal order.
    pub morph_targets: Vec<String>,
    pub skinned_mesh: Option<NodeId>,
    pub ik: Option<IkSetup>,
    pub normalization: Normalization,
}

impl LiveAvatar {
    /// True if the skinned mesh has a non-empty skeleton.
    pub fn has_rig(&self) -> bool {
        self.skinned_mesh
            .and_then(|id| self.graph.get(id))
            .and_then(|n| n.mesh())
            .is_some_and(|m| m.is_skinned())
    }

    pub fn bone(&self, name: &str) -> Option<NodeId> {
        self.bones.get(name).copied()
    }

    /// Mirrors an avatar record's transform onto the root node. The record's
    /// scale is relative to the ingestion auto-scale.
    pub fn apply_transform(&mut self, data: &AvatarData) {
        if let Some(root) = self.graph.get_mut(self.root) {
            let [x, y, z] = data.position;
            let [rx, ry, rz] = data.rotation_euler;
            root.translation = Vec3::new(x as f32, y as f32, z as f32);
            root.rotation = Quat::from_euler(EulerRot::XYZ, rx as f32, ry as f32, rz as f32);
            root.scale = Vec3::splat((data.scale * self.normalization.factor) as f32);
        }
    }

    /// Sets a morph influence on every mesh that has it. Returns the number
    /// of meshes updated.
    pub fn set_morph(&mut self, name: &str, weight: f64) -> usize {
        let mut updated = 0;
        for id in self.graph.traverse(self.root) {
            let Some(mesh) = self.graph.get_mut(id).and_then(|n| n.mesh_mut()) else {
                continue;
            };
            if mesh.set_morph(name, weight as f32) {
                updated += 1;
            }
        }
        updated
    }

    /// Influence of a morph on the first mesh that has it.
    pub fn morph_weight(&self, name: &str) -> Option<f64> {
        self.graph
            .traverse(self.root)
            .into_iter()
            .filter_map(|id| self.graph.get(id).and_then(|n| n.mesh()))
            .find_map(|m| m.morph_weight(name))
            .map(f64::from)
    }

    /// Local rotation of every bone, keyed by bone name, as `[x, y, z, w]`.
    pub fn pose_snapshot(&self) -> BTreeMap<String, [f64; 4]> {
        self.bones
            .iter()
            .filter_map(|(name, id)| {
                let q = self.graph.get(*id)?.rotation;
                Some((
                    name.clone(),
                    [q.x as f64, q.y as f64, q.z as f64, q.w as f64],
                ))
            })
            .collect()
    }

    /// Sets a bone's local rotation by name. Returns false if the bone is
    /// unknown.
    pub fn set_bone_rotation(&mut self, name: &str, quat: [f64; 4]) -> bool {
        let Some(node) = self.bone(name).and_then(|id| self.graph.get_mut(id)) else {
            return false;
        };
        let [x, y, z, w] = quat;
        let q = Quat::from_xyzw(x as f32, y as f32, z as f32, w as f32);
        node.rotation = if q.is_finite() && q.length_squared() > 0.0 {
            q.normalize()
        } else {
            Quat::IDENTITY
        };
        true
    }
}

/// One avatar: serializable data and, once ingested, its live handles.
#[derive(Debug, Clone)]
pub struct AvatarEntry {
    pub data: AvatarData,
    pub live: Option<LiveAvatar>,
}

impl AvatarEntry {
    pub fn id(&self) -> &str {
        &self.data.id
    }

    /// True while the entry has no live handles (loaded, not yet ingested).
    pub fn is_pending(&self) -> bool {
        self.live.is_none()
    }

    pub fn has_rig(&self) -> bool {
        self.live.as_ref().is_some_and(|l| l.has_rig())
    }

    /// Releases the entry's IK targets and helpers from the stage.
    pub fn dispose(self, stage: &mut SceneGraph) -> usize {
        self.live
            .and_then(|l| l.ik)
            .map_or(0, |ik| ik.dispose(stage))
    }
}

/// Active editing tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    #[default]
    Select,
    Move,
    Rotate,
    Ik,
}

/// Transform gizmo mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformMode {
    #[default]
    Translate,
    Rotate,
    Scale,
}

/// Selection and tool state. Not part of scene documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiState {
    pub selected: Option<String>,
    pub tool: Tool,
    pub transform_mode: TransformMode,
    pub show_grid: bool,
    pub show_helpers: bool,
    pub screenshot_mode: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            selected: None,
            tool: Tool::Select,
            transform_mode: TransformMode::Translate,
            show_grid: true,
            show_helpers: false,
            screenshot_mode: false,
        }
    }
}

/// The scene state store.
#[derive(Debug, Clone, Default)]
pub struct SceneStore {
    canvas: Canvas,
    camera: Camera,
    lighting: Lighting,
    background: Background,
    avatars: Vec<AvatarEntry>,
    ui: UiState,
    stage: SceneGraph,
    epoch: u64,
    config: StageConfig,
}

impl SceneStore {
    pub fn new(config: StageConfig) -> Self {
        let ui = UiState {
            show_helpers: config.ik.show_helpers,
            ..UiState::default()
        };
        Self {
            ui,
            config,
            ..Self::default()
        }
    }

    // Selectors

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn lighting(&self) -> &Lighting {
        &self.lighting
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    pub fn avatars(&self) -> &[AvatarEntry] {
        &self.avatars
    }

    pub fn avatar(&self, id: &str) -> Option<&AvatarEntry> {
        self.avatars.iter().find(|a| a.data.id == id)
    }

    pub fn avatar_mut(&mut self, id: &str) -> Option<&mut AvatarEntry> {
        self.avatars.iter_mut().find(|a| a.data.id == id)
    }

    pub fn selected_avatar(&self) -> Option<&AvatarEntry> {
        self.avatar(self.ui.selected.as_deref()?)
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    /// The stage graph holding IK targets and helpers.
    pub fn stage(&self) -> &SceneGraph {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut SceneGraph {
        &mut self.stage
    }

    /// Generation counter, bumped whenever the avatar set is replaced.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    // Scene slices

    pub fn set_canvas(&mut self, canvas: Canvas) {
        self.canvas = canvas;
    }

    pub fn update_camera(&mut self, patch: CameraPatch) {
        patch.apply(&mut self.camera);
    }

    pub fn apply_camera_preset(&mut self, preset: CameraPreset) {
        CameraPatch::from_preset(preset).apply(&mut self.camera);
    }

    /// Patches the lighting in its current shape. Returns the number of
    /// patch fields ignored because they belong to the other shape.
    pub fn update_lighting(&mut self, patch: &LightingPatch) -> usize {
        let ignored = patch.apply(&mut self.lighting);
        if ignored > 0 {
            debug!(ignored, "lighting patch fields do not match the active lighting shape");
        }
        ignored
    }

    /// Replaces the lighting, possibly switching shape.
    pub fn set_lighting(&mut self, lighting: Lighting) {
        self.lighting = lighting;
    }

    pub fn update_background(&mut self, patch: &BackgroundPatch) {
        patch.apply(&mut self.background);
    }

    // Avatar lifecycle

    /// Appends an avatar with no live handles.
    pub fn add_avatar(&mut self, data: AvatarData) {
        self.avatars.push(AvatarEntry { data, live: None });
    }

    /// Removes an avatar and returns it. Clears the selection if it pointed
    /// at this avatar. IK resources are not released; call
    /// [`AvatarEntry::dispose`] on the result.
    pub fn remove_avatar(&mut self, id: &str) -> Option<AvatarEntry> {
        let index = self.avatars.iter().position(|a| a.data.id == id)?;
        let entry = self.avatars.remove(index);
        if self.ui.selected.as_deref() == Some(id) {
            self.ui.selected = None;
        }
        Some(entry)
    }

    /// Removes an avatar and releases its stage nodes.
    pub fn delete_avatar(&mut self, id: &str) -> bool {
        match self.remove_avatar(id) {
            Some(entry) => {
                entry.dispose(&mut self.stage);
                true
            }
            None => false,
        }
    }

    /// Binds live handles to a registered avatar, mirroring its transform
    /// onto the live root. Any previous IK setup is disposed.
    pub fn attach_live(&mut self, id: &str, mut live: LiveAvatar) -> bool {
        let Some(entry) = self.avatars.iter_mut().find(|a| a.data.id == id) else {
            return false;
        };
        live.apply_transform(&entry.data);
        if let Some(old) = entry.live.replace(live).and_then(|l| l.ik) {
            old.dispose(&mut self.stage);
        }
        true
    }

    /// Replaces an avatar's IK setup, disposing the previous one.
    pub fn set_avatar_ik(&mut self, id: &str, ik: Option<IkSetup>) -> bool {
        let Some(live) = self
            .avatars
            .iter_mut()
            .find(|a| a.data.id == id)
            .and_then(|a| a.live.as_mut())
        else {
            return false;
        };
        if let Some(old) = std::mem::replace(&mut live.ik, ik) {
            old.dispose(&mut self.stage);
        }
        if let Some(ref ik) = live.ik {
            ik.set_helpers_visible(&mut self.stage, self.ui.show_helpers);
        }
        true
    }

    /// Patches an avatar's transform and mirrors it onto the live root.
    /// Scale is coerced to uniform.
    pub fn update_avatar(&mut self, id: &str, patch: AvatarPatch) -> bool {
        let Some(entry) = self.avatar_mut(id) else {
            return false;
        };
        patch.apply(&mut entry.data);
        if let Some(ref mut live) = entry.live {
            live.apply_transform(&entry.data);
        }
        true
    }

    /// Sets a morph weight, clamped to `[0, 1]`, on both the record and the
    /// live meshes.
    pub fn update_avatar_morph(&mut self, id: &str, name: &str, weight: f64) -> bool {
        let Some(entry) = self.avatar_mut(id) else {
            return false;
        };
        let weight = clamp_weight(weight);
        entry.data.morphs.insert(name.to_string(), weight);
        if let Some(ref mut live) = entry.live {
            if live.set_morph(name, weight) == 0 {
                debug!(avatar = id, morph = name, "no mesh has this morph target");
            }
        }
        true
    }

    /// Rotates a bone to rest plus an XYZ Euler offset in degrees.
    pub fn set_bone_rotation(&mut self, id: &str, bone: &str, offset_deg: [f64; 3]) -> bool {
        let Some(live) = self.live_mut(id) else {
            return false;
        };
        match live.bone(bone) {
            Some(node) => normalize::set_bone_euler_offset(&mut live.graph, node, offset_deg),
            None => false,
        }
    }

    /// Resets the skeleton and applies a pose preset. Returns the number of
    /// bones posed, or `None` if the avatar has no live handles.
    pub fn apply_pose_preset(&mut self, id: &str, preset: PosePreset) -> Option<usize> {
        let live = self.live_mut(id)?;
        Some(normalize::apply_pose_preset(
            &mut live.graph,
            &live.skeleton,
            preset,
        ))
    }

    /// Puts every bone of an avatar back to its rest rotation.
    pub fn reset_pose(&mut self, id: &str) -> bool {
        match self.live_mut(id) {
            Some(live) => {
                normalize::reset_pose(&mut live.graph, &live.skeleton);
                true
            }
            None => false,
        }
    }

    /// Moves an IK target by chain name.
    pub fn set_ik_target(&mut self, id: &str, chain: &str, position: [f64; 3]) -> bool {
        let Some(ik) = self
            .avatars
            .iter()
            .find(|a| a.data.id == id)
            .and_then(|a| a.live.as_ref())
            .and_then(|l| l.ik.as_ref())
        else {
            return false;
        };
        let [x, y, z] = position;
        ik.set_target_position(
            &mut self.stage,
            chain,
            Vec3::new(x as f32, y as f32, z as f32),
        )
    }

    /// Builds IK chains for a live avatar's skeleton into the stage.
    /// `None` if the avatar is unknown, pending or has no skeleton.
    pub fn build_avatar_ik(&mut self, id: &str) -> Option<Result<Option<IkSetup>, IkError>> {
        let live = self
            .avatars
            .iter()
            .find(|a| a.data.id == id)?
            .live
            .as_ref()
            .filter(|l| l.has_rig())?;
        Some(build_ik_rig(
            &live.graph,
            &live.skeleton,
            &mut self.stage,
            &self.config.ik,
        ))
    }

    /// Applies the configured neutral pose and moves IK targets onto the
    /// posed effectors. Returns the number of bones posed.
    pub fn apply_neutral_pose(&mut self, id: &str) -> Option<usize> {
        let live = self
            .avatars
            .iter_mut()
            .find(|a| a.data.id == id)?
            .live
            .as_mut()?;
        let posed =
            normalize::apply_neutral_pose(&mut live.graph, &live.skeleton, &self.config.neutral_pose);
        if let Some(ref ik) = live.ik {
            ik.snap_targets(&live.graph, &mut self.stage);
        }
        Some(posed)
    }

    /// Moves an avatar's IK targets onto its current effector positions.
    pub fn snap_ik_targets(&mut self, id: &str) -> bool {
        let Some((live, ik)) = self
            .avatars
            .iter()
            .find(|a| a.data.id == id)
            .and_then(|a| a.live.as_ref())
            .and_then(|l| Some((l, l.ik.as_ref()?)))
        else {
            return false;
        };
        ik.snap_targets(&live.graph, &mut self.stage);
        true
    }

    fn live_mut(&mut self, id: &str) -> Option<&mut LiveAvatar> {
        self.avatar_mut(id)?.live.as_mut()
    }

    // UI

    /// Selects an avatar by id, or clears the selection. Returns false if
    /// the id is unknown.
    pub fn select(&mut self, id: Option<&str>) -> bool {
        match id {
            Some(id) if self.avatar(id).is_none() => false,
            _ => {
                self.ui.selected = id.map(String::from);
                true
            }
        }
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.ui.tool = tool;
    }

    pub fn set_transform_mode(&mut self, mode: TransformMode) {
        self.ui.transform_mode = mode;
    }

    pub fn set_show_grid(&mut self, show: bool) {
        self.ui.show_grid = show;
    }

    /// Shows or hides every IK helper.
    pub fn set_show_helpers(&mut self, show: bool) {
        self.ui.show_helpers = show;
        for ik in self
            .avatars
            .iter()
            .filter_map(|a| a.live.as_ref())
            .filter_map(|l| l.ik.as_ref())
        {
            ik.set_helpers_visible(&mut self.stage, show);
        }
    }

    pub fn set_screenshot_mode(&mut self, on: bool) {
        self.ui.screenshot_mode = on;
    }

    // Whole-scene

    /// Clears every avatar and restores the default scene. In-flight
    /// ingestions started before the reset are discarded on completion.
    pub fn reset_scene(&mut self) {
        self.dispose_all();
        self.canvas = Canvas::default();
        self.camera = Camera::default();
        self.lighting = Lighting::default();
        self.background = Background::default();
        self.ui = UiState {
            show_helpers: self.config.ik.show_helpers,
            ..UiState::default()
        };
        self.epoch += 1;
    }

    /// Re-solves every IK chain. Call once per frame.
    pub fn tick(&mut self) {
        for live in self.avatars.iter_mut().filter_map(|a| a.live.as_mut()) {
            if let Some(ref ik) = live.ik {
                ik.update(&mut live.graph, &self.stage);
            }
        }
    }

    /// Releases every avatar's IK resources and drops all avatars.
    pub(crate) fn dispose_all(&mut self) {
        for entry in self.avatars.drain(..) {
            entry.dispose(&mut self.stage);
        }
    }

    /// Replaces the serializable state wholesale. Every avatar becomes
    /// pending re-ingestion.
    pub(crate) fn replace_scene(
        &mut self,
        canvas: Canvas,
        camera: Camera,
        lighting: Lighting,
        background: Background,
        avatars: Vec<AvatarData>,
    ) {
        self.dispose_all();
        self.canvas = canvas;
        self.camera = camera;
        self.lighting = lighting;
        self.background = background;
        self.avatars = avatars
            .into_iter()
            .map(|data| AvatarEntry { data, live: None })
            .collect();
        self.ui.selected = None;
        self.epoch += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{MeshData, Node, NodeKind};
    use crate::normalize::ScaleBand;

    fn live_with_morphs() -> LiveAvatar {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(Node::new("prop", NodeKind::Group));
        let mesh = MeshData {
            morph_names: vec!["smile".to_string()],
            morph_influences: vec![0.0],
            ..MeshData::default()
        };
        graph.add_child(root, Node::new("face", NodeKind::Mesh(mesh)));
        LiveAvatar {
            graph,
            root,
            bones: BTreeMap::new(),
            skeleton: Vec::new(),
            morph_targets: vec!["smile".to_string()],
            skinned_mesh: None,
            ik: None,
            normalization: Normalization {
                band: ScaleBand::Normal,
                source_height: 1.0,
                factor: 1.0,
                floor_offset: 0.0,
            },
        }
    }

    #[test]
    fn test_remove_selected_avatar_clears_selection() {
        let mut store = SceneStore::default();
        store.add_avatar(AvatarData::new("a", "a.glb"));
        store.add_avatar(AvatarData::new("b", "b.glb"));
        assert!(store.select(Some("a")));

        let removed = store.remove_avatar("a").unwrap();
        assert_eq!(removed.id(), "a");
        assert_eq!(store.ui().selected, None);
        assert_eq!(store.avatars().len(), 1);
        assert!(store.avatar("a").is_none());
        assert!(store.remove_avatar("a").is_none());
    }

    #[test]
    fn test_remove_other_avatar_keeps_selection() {
        let mut store = SceneStore::default();
        store.add_avatar(AvatarData::new("a", "a.glb"));
        store.add_avatar(AvatarData::new("b", "b.glb"));
        store.select(Some("b"));
        store.remove_avatar("a");
        assert_eq!(store.selected_avatar().unwrap().id(), "b");
    }

    #[test]
    fn test_select_unknown_id() {
        let mut store = SceneStore::default();
        assert!(!store.select(Some("ghost")));
        assert!(store.select(None));
    }

    #[test]
    fn test_update_avatar_coerces_scale_and_mirrors() {
        let mut store = SceneStore::default();
        store.add_avatar(AvatarData::new("a", "a.glb"));
        assert!(store.attach_live("a", live_with_morphs()));
        assert!(store.update_avatar("a", AvatarPatch::scale([1.0, 1.5, 1.2])));

        let entry = store.avatar("a").unwrap();
        assert_eq!(entry.data.scale, 1.5);
        let live = entry.live.as_ref().unwrap();
        assert_eq!(live.graph.get(live.root).unwrap().scale, Vec3::splat(1.5));
        assert!(!store.update_avatar("ghost", AvatarPatch::default()));
    }

    #[test]
    fn test_root_scale_includes_auto_scale() {
        let mut live = live_with_morphs();
        live.normalization.factor = 4.0;
        let mut store = SceneStore::default();
        store.add_avatar(AvatarData::new("a", "a.glb"));
        assert!(store.attach_live("a", live));
        assert!(store.update_avatar("a", AvatarPatch::scale(0.5)));

        let entry = store.avatar("a").unwrap();
        assert_eq!(entry.data.scale, 0.5);
        let live = entry.live.as_ref().unwrap();
        assert_eq!(live.graph.get(live.root).unwrap().scale, Vec3::splat(2.0));
    }

    #[test]
    fn test_bone_rotation_normalizes_input() {
        let mut live = live_with_morphs();
        let bone = live
            .graph
            .add_child(live.root, Node::new("Head", NodeKind::Bone))
            .unwrap();
        live.bones.insert("Head".to_string(), bone);

        assert!(live.set_bone_rotation("Head", [0.0, 0.0, 0.0, 2.0]));
        assert_eq!(live.graph.get(bone).unwrap().rotation, Quat::IDENTITY);
        assert!(live.set_bone_rotation("Head", [0.0, 3.0, 0.0, 4.0]));
        let q = live.graph.get(bone).unwrap().rotation;
        assert!((q.y - 0.6).abs() < 1e-6 && (q.w - 0.8).abs() < 1e-6);

        assert!(live.set_bone_rotation("Head", [0.0, 0.0, 0.0, 0.0]));
        assert_eq!(live.graph.get(bone).unwrap().rotation, Quat::IDENTITY);
        assert!(live.set_bone_rotation("Head", [f64::NAN, 0.0, 0.0, 1.0]));
        assert_eq!(live.graph.get(bone).unwrap().rotation, Quat::IDENTITY);
        assert!(!live.set_bone_rotation("Tail", [0.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_morph_update_clamps_and_syncs() {
        let mut store = SceneStore::default();
        store.add_avatar(AvatarData::new("a", "a.glb"));
        store.attach_live("a", live_with_morphs());

        assert!(store.update_avatar_morph("a", "smile", 1.3));
        let entry = store.avatar("a").unwrap();
        assert_eq!(entry.data.morphs["smile"], 1.0);
        assert_eq!(entry.live.as_ref().unwrap().morph_weight("smile"), Some(1.0));

        // Unknown morphs are still recorded.
        assert!(store.update_avatar_morph("a", "frown", 0.2));
        assert_eq!(store.avatar("a").unwrap().data.morphs["frown"], 0.2);
    }

    #[test]
    fn test_static_prop_has_no_rig() {
        let mut store = SceneStore::default();
        store.add_avatar(AvatarData::new("a", "a.glb"));
        assert!(store.avatar("a").unwrap().is_pending());
        store.attach_live("a", live_with_morphs());
        let entry = store.avatar("a").unwrap();
        assert!(!entry.is_pending());
        assert!(!entry.has_rig());
    }

    #[test]
    fn test_reset_scene_bumps_epoch() {
        let mut store = SceneStore::default();
        store.add_avatar(AvatarData::new("a", "a.glb"));
        store.update_camera(CameraPatch {
            fov: Some(30.0),
            ..CameraPatch::default()
        });
        let epoch = store.epoch();
        store.reset_scene();
        assert_eq!(store.epoch(), epoch + 1);
        assert!(store.avatars().is_empty());
        assert_eq!(store.camera(), &Camera::default());
    }

    #[test]
    fn test_camera_preset() {
        let mut store = SceneStore::default();
        store.apply_camera_preset(CameraPreset::Front);
        assert_eq!(store.camera().position, CameraPreset::Front.placement().0);
        assert_eq!(store.camera().fov, 50.0);
    }

    #[test]
    fn test_ui_actions() {
        let mut store = SceneStore::new(StageConfig::default());
        store.set_tool(Tool::Ik);
        store.set_transform_mode(TransformMode::Scale);
        store.set_show_grid(false);
        store.set_screenshot_mode(true);
        let ui = store.ui();
        assert_eq!(ui.tool, Tool::Ik);
        assert_eq!(ui.transform_mode, TransformMode::Scale);
        assert!(!ui.show_grid);
        assert!(ui.screenshot_mode);
    }
}
