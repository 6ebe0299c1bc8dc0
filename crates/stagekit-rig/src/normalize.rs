//! Scale normalization, floor alignment and pose tools.

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bones::{resolve_rig, BoneRole, ResolvedRig};
use crate::config::NeutralPoseConfig;
use crate::graph::{NodeId, SceneGraph};

/// Which size band a model fell into when it was measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleBand {
    /// Height below 0.01, assumed to be authored in millimeters.
    SubMillimeter,
    /// Height below 1.
    Small,
    /// Height above 20.
    Oversized,
    Normal,
    /// Nothing measurable; scale left at 1.
    Empty,
}

/// A computed scale factor and the band that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoScale {
    pub band: ScaleBand,
    pub factor: f64,
}

/// Computes the uniform scale that brings a model of `height` to `target`.
///
/// Models under 0.01 units tall get an extra factor of 1000.
pub fn compute_auto_scale(height: f64, target: f64) -> AutoScale {
    if !(height.is_finite() && height > 0.0) {
        debug!(height, "model has no measurable height, leaving scale at 1");
        return AutoScale {
            band: ScaleBand::Empty,
            factor: 1.0,
        };
    }

    let ratio = target / height;
    let (band, factor) = if height < 0.01 {
        (ScaleBand::SubMillimeter, ratio * 1000.0)
    } else if height < 1.0 {
        (ScaleBand::Small, ratio)
    } else if height > 20.0 {
        (ScaleBand::Oversized, ratio)
    } else {
        (ScaleBand::Normal, ratio)
    };

    match band {
        ScaleBand::SubMillimeter => {
            info!(height, factor, "very small model, assuming millimeter units")
        }
        ScaleBand::Small => info!(height, factor, target, "small model, scaling up to target"),
        ScaleBand::Oversized => info!(height, factor, "large model, scaling down"),
        _ => debug!(height, factor, target, "scaling model to target height"),
    }

    AutoScale { band, factor }
}

/// What normalization did to an avatar root.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normalization {
    pub band: ScaleBand,
    pub source_height: f64,
    pub factor: f64,
    /// Y translation applied so the lowest point sits at 0.
    pub floor_offset: f64,
}

/// Scales `root` to `target_height` and lifts it onto the floor.
pub fn normalize_root(graph: &mut SceneGraph, root: NodeId, target_height: f64) -> Normalization {
    let source_height = graph
        .world_aabb(root)
        .map(|aabb| aabb.height() as f64)
        .unwrap_or(0.0);
    let AutoScale { band, factor } = compute_auto_scale(source_height, target_height);

    if let Some(node) = graph.get_mut(root) {
        node.scale = Vec3::splat(factor as f32);
    }

    let floor_offset = align_to_floor(graph, root);

    Normalization {
        band,
        source_height,
        factor,
        floor_offset,
    }
}

/// Translates `root` so its world-space minimum Y is 0. Returns the new
/// root Y.
pub fn align_to_floor(graph: &mut SceneGraph, root: NodeId) -> f64 {
    let Some(aabb) = graph.world_aabb(root) else {
        return graph.get(root).map_or(0.0, |n| n.translation.y as f64);
    };
    match graph.get_mut(root) {
        Some(node) => {
            node.translation.y -= aabb.min.y;
            node.translation.y as f64
        }
        None => 0.0,
    }
}

fn bone_names(graph: &SceneGraph, skeleton: &[NodeId]) -> Vec<String> {
    skeleton
        .iter()
        .map(|id| graph.get(*id).map(|n| n.name.clone()).unwrap_or_default())
        .collect()
}

/// Resolves the rig of a skeleton by bone name.
pub fn resolve_skeleton(graph: &SceneGraph, skeleton: &[NodeId]) -> ResolvedRig {
    resolve_rig(&bone_names(graph, skeleton))
}

/// Sets `rotation = euler(rest) + offset`, XYZ order, offsets in degrees.
pub fn set_bone_euler_offset(graph: &mut SceneGraph, bone: NodeId, offset_deg: [f64; 3]) -> bool {
    let Some(node) = graph.get_mut(bone) else {
        return false;
    };
    let (x, y, z) = node.rest_rotation.to_euler(EulerRot::XYZ);
    node.rotation = Quat::from_euler(
        EulerRot::XYZ,
        x + offset_deg[0].to_radians() as f32,
        y + offset_deg[1].to_radians() as f32,
        z + offset_deg[2].to_radians() as f32,
    );
    true
}

/// Current rotation of a bone relative to its rest pose, as XYZ Euler
/// degrees.
pub fn bone_euler_offset(graph: &SceneGraph, bone: NodeId) -> Option<[f64; 3]> {
    let node = graph.get(bone)?;
    let (rx, ry, rz) = node.rest_rotation.to_euler(EulerRot::XYZ);
    let (x, y, z) = node.rotation.to_euler(EulerRot::XYZ);
    Some([
        ((x - rx) as f64).to_degrees(),
        ((y - ry) as f64).to_degrees(),
        ((z - rz) as f64).to_degrees(),
    ])
}

/// Rotates the upper arms down out of the bind pose.
///
/// Only the resolved left and right upper arms are touched. Returns how many
/// bones were posed; running it twice gives the same result.
pub fn apply_neutral_pose(
    graph: &mut SceneGraph,
    skeleton: &[NodeId],
    config: &NeutralPoseConfig,
) -> usize {
    let rig = resolve_skeleton(graph, skeleton);
    let offsets = [
        (BoneRole::LeftUpperArm, [config.arm_bend, 0.0, config.arm_spread]),
        (BoneRole::RightUpperArm, [config.arm_bend, 0.0, -config.arm_spread]),
    ];

    let mut posed = 0;
    for (role, offset) in offsets {
        let Some(bone) = rig.bone(role).and_then(|i| skeleton.get(i)) else {
            debug!(?role, "neutral pose: bone not found");
            continue;
        };
        if set_bone_euler_offset(graph, *bone, offset) {
            posed += 1;
        }
    }
    posed
}

/// Puts every bone back to its rest rotation.
pub fn reset_pose(graph: &mut SceneGraph, skeleton: &[NodeId]) {
    for id in skeleton {
        if let Some(node) = graph.get_mut(*id) {
            node.rotation = node.rest_rotation;
        }
    }
}

/// Named whole-body poses, expressed as Euler offsets from rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PosePreset {
    TPose,
    APose,
    Action,
    Relaxed,
}

impl PosePreset {
    pub fn offsets(&self) -> &'static [(BoneRole, [f64; 3])] {
        match self {
            PosePreset::TPose => &[
                (BoneRole::LeftUpperArm, [0.0, 0.0, 90.0]),
                (BoneRole::RightUpperArm, [0.0, 0.0, -90.0]),
            ],
            PosePreset::APose => &[
                (BoneRole::LeftUpperArm, [0.0, 0.0, 45.0]),
                (BoneRole::RightUpperArm, [0.0, 0.0, -45.0]),
            ],
            PosePreset::Action => &[
                (BoneRole::LeftUpperArm, [-20.0, 0.0, 30.0]),
                (BoneRole::RightUpperArm, [10.0, 0.0, -15.0]),
                (BoneRole::LeftForearm, [0.0, -30.0, 0.0]),
                (BoneRole::RightForearm, [0.0, 20.0, 0.0]),
            ],
            PosePreset::Relaxed => &[
                (BoneRole::LeftUpperArm, [0.0, 0.0, 15.0]),
                (BoneRole::RightUpperArm, [0.0, 0.0, -15.0]),
                (BoneRole::LeftForearm, [0.0, -10.0, 0.0]),
                (BoneRole::RightForearm, [0.0, 10.0, 0.0]),
            ],
        }
    }
}

impl std::str::FromStr for PosePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tpose" | "t_pose" => Ok(PosePreset::TPose),
            "apose" | "a_pose" => Ok(PosePreset::APose),
            "action" => Ok(PosePreset::Action),
            "relaxed" => Ok(PosePreset::Relaxed),
            _ => Err(format!("unknown pose preset: {}", s)),
        }
    }
}

/// Resets the skeleton, then applies a preset. Returns how many bones moved.
pub fn apply_pose_preset(graph: &mut SceneGraph, skeleton: &[NodeId], preset: PosePreset) -> usize {
    reset_pose(graph, skeleton);
    let rig = resolve_skeleton(graph, skeleton);
    preset
        .offsets()
        .iter()
        .filter_map(|(role, offset)| {
            let bone = *skeleton.get(rig.bone(*role)?)?;
            set_bone_euler_offset(graph, bone, *offset).then_some(())
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Aabb, MeshData, Node, NodeKind};

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() <= tol, "{} != {} (tol {})", a, b, tol);
    }

    #[test]
    fn test_band_factors() {
        let s = compute_auto_scale(0.005, 5.0);
        assert_eq!(s.band, ScaleBand::SubMillimeter);
        assert_close(s.factor, 1_000_000.0, 1e-6);

        let s = compute_auto_scale(0.5, 5.0);
        assert_eq!(s.band, ScaleBand::Small);
        assert_close(s.factor, 10.0, 1e-12);

        let s = compute_auto_scale(50.0, 5.0);
        assert_eq!(s.band, ScaleBand::Oversized);
        assert_close(s.factor * 50.0, 5.0, 1e-12);

        let s = compute_auto_scale(1.8, 5.0);
        assert_eq!(s.band, ScaleBand::Normal);
        assert_close(s.factor * 1.8, 5.0, 1e-12);
    }

    #[test]
    fn test_empty_height() {
        for h in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let s = compute_auto_scale(h, 5.0);
            assert_eq!(s.band, ScaleBand::Empty);
            assert_eq!(s.factor, 1.0);
        }
    }

    fn body_graph(min_y: f32, max_y: f32) -> (SceneGraph, NodeId) {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(Node::new("avatar", NodeKind::Group));
        let mesh = MeshData {
            bounds: Some(Aabb::new(Vec3::new(-0.3, min_y, -0.1), Vec3::new(0.3, max_y, 0.1))),
            ..MeshData::default()
        };
        graph.add_child(root, Node::new("body", NodeKind::Mesh(mesh)));
        (graph, root)
    }

    #[test]
    fn test_normalize_root_scales_and_floors() {
        let (mut graph, root) = body_graph(-0.1, 1.7);
        let n = normalize_root(&mut graph, root, 5.0);
        assert_eq!(n.band, ScaleBand::Normal);
        assert_close(n.source_height, 1.8, 1e-5);

        let aabb = graph.world_aabb(root).unwrap();
        assert_close(aabb.height() as f64, 5.0, 1e-4);
        assert_close(aabb.min.y as f64, 0.0, 1e-5);
        assert_close(n.floor_offset, 0.1 * n.factor, 1e-4);
    }

    #[test]
    fn test_normalize_without_meshes() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(Node::new("empty", NodeKind::Group));
        let n = normalize_root(&mut graph, root, 5.0);
        assert_eq!(n.band, ScaleBand::Empty);
        assert_eq!(n.floor_offset, 0.0);
    }

    fn arm_skeleton() -> (SceneGraph, Vec<NodeId>) {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(Node::new("Hips", NodeKind::Bone));
        let l = graph
            .add_child(
                root,
                Node::new("LeftArm", NodeKind::Bone).with_rotation(Quat::from_rotation_y(0.3)),
            )
            .unwrap();
        let lf = graph.add_child(l, Node::new("LeftForeArm", NodeKind::Bone)).unwrap();
        let r = graph.add_child(root, Node::new("RightArm", NodeKind::Bone)).unwrap();
        let rf = graph.add_child(r, Node::new("RightForeArm", NodeKind::Bone)).unwrap();
        (graph, vec![root, l, lf, r, rf])
    }

    #[test]
    fn test_neutral_pose_is_idempotent_and_local() {
        let (mut graph, skeleton) = arm_skeleton();
        let config = NeutralPoseConfig::default();

        assert_eq!(apply_neutral_pose(&mut graph, &skeleton, &config), 2);
        let first: Vec<Quat> = skeleton.iter().map(|id| graph.get(*id).unwrap().rotation).collect();
        assert_eq!(apply_neutral_pose(&mut graph, &skeleton, &config), 2);
        let second: Vec<Quat> = skeleton.iter().map(|id| graph.get(*id).unwrap().rotation).collect();
        assert_eq!(first, second);

        // Forearms and hips are untouched.
        for i in [0, 2, 4] {
            assert_eq!(second[i], Quat::IDENTITY);
        }
        let offset = bone_euler_offset(&graph, skeleton[3]).unwrap();
        assert_close(offset[0], 80.0, 1e-3);
        assert_close(offset[2], -22.0, 1e-3);
    }

    #[test]
    fn test_neutral_pose_without_arms() {
        let mut graph = SceneGraph::new();
        let hips = graph.add_root(Node::new("Hips", NodeKind::Bone));
        assert_eq!(
            apply_neutral_pose(&mut graph, &[hips], &NeutralPoseConfig::default()),
            0
        );
    }

    #[test]
    fn test_pose_preset_resets_first() {
        let (mut graph, skeleton) = arm_skeleton();
        apply_neutral_pose(&mut graph, &skeleton, &NeutralPoseConfig::default());
        assert_eq!(apply_pose_preset(&mut graph, &skeleton, PosePreset::TPose), 2);

        let offset = bone_euler_offset(&graph, skeleton[1]).unwrap();
        assert_close(offset[0], 0.0, 1e-3);
        assert_close(offset[2], 90.0, 1e-3);

        reset_pose(&mut graph, &skeleton);
        assert_eq!(
            graph.get(skeleton[1]).unwrap().rotation,
            Quat::from_rotation_y(0.3)
        );
    }

    #[test]
    fn test_pose_preset_from_str() {
        assert_eq!("tpose".parse::<PosePreset>(), Ok(PosePreset::TPose));
        assert!("dab".parse::<PosePreset>().is_err());
    }
}
