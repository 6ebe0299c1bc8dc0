//! CCD inverse kinematics over avatar limb chains.
//!
//! Chain bones live in the avatar's own graph. Targets and debug helpers
//! live in the stage graph and outlive the avatar graph until
//! [`IkSetup::dispose`] removes them.

use std::collections::BTreeMap;

use glam::{Quat, Vec3};
use tracing::{debug, warn};

use crate::bones::{resolve_rig, ChainRole};
use crate::config::IkConfig;
use crate::error::IkError;
use crate::graph::{HelperData, Node, NodeId, NodeKind, SceneGraph};

/// Chains need at least this many bones (two links plus the effector).
pub const MIN_CHAIN_BONES: usize = 3;

const ANGLE_EPSILON: f32 = 1e-5;

/// Cyclic coordinate descent solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CcdSolver {
    pub iterations: usize,
    pub min_angle: f32,
    pub max_angle: f32,
}

impl Default for CcdSolver {
    fn default() -> Self {
        Self::from(&IkConfig::default())
    }
}

impl From<&IkConfig> for CcdSolver {
    fn from(config: &IkConfig) -> Self {
        Self {
            iterations: config.iterations,
            min_angle: config.min_angle,
            max_angle: config.max_angle,
        }
    }
}

impl CcdSolver {
    /// Rotates `links` (root first) so `effector` approaches `target`.
    ///
    /// Links are visited from the effector side back to the root. Each
    /// rotation is clamped to `[min_angle, max_angle]`. Returns the number of
    /// iterations that changed anything.
    pub fn solve(
        &self,
        graph: &mut SceneGraph,
        links: &[NodeId],
        effector: NodeId,
        target: Vec3,
    ) -> usize {
        let mut active = 0;
        for _ in 0..self.iterations {
            let mut rotated = false;
            for link in links.iter().rev() {
                if self.rotate_link(graph, *link, effector, target) {
                    rotated = true;
                }
            }
            if !rotated {
                break;
            }
            active += 1;
        }
        active
    }

    fn rotate_link(
        &self,
        graph: &mut SceneGraph,
        link: NodeId,
        effector: NodeId,
        target: Vec3,
    ) -> bool {
        let (Some(link_world), Some(effector_pos)) =
            (graph.world_matrix(link), graph.world_position(effector))
        else {
            return false;
        };
        let (_, link_rotation, link_pos) = link_world.to_scale_rotation_translation();
        let inverse = link_rotation.inverse();

        let Some(effector_dir) = (inverse * (effector_pos - link_pos)).try_normalize() else {
            return false;
        };
        let Some(target_dir) = (inverse * (target - link_pos)).try_normalize() else {
            return false;
        };

        let cross = effector_dir.cross(target_dir);
        let angle = cross.length().atan2(effector_dir.dot(target_dir));
        if angle < ANGLE_EPSILON {
            return false;
        }
        let angle = angle.clamp(self.min_angle, self.max_angle);

        let axis = cross
            .try_normalize()
            .unwrap_or_else(|| effector_dir.any_orthonormal_vector());

        match graph.get_mut(link) {
            Some(node) => {
                node.rotation = (node.rotation * Quat::from_axis_angle(axis, angle)).normalize();
                true
            }
            None => false,
        }
    }
}

/// One limb driven by a target node.
#[derive(Debug, Clone, PartialEq)]
pub struct IkChain {
    pub role: ChainRole,
    /// Link bones from chain root to the bone before the effector.
    pub links: Vec<NodeId>,
    pub effector: NodeId,
    /// Target node in the stage graph.
    pub target: NodeId,
    /// Hidden debug helper in the stage graph.
    pub helper: Option<NodeId>,
}

impl IkChain {
    pub fn name(&self) -> &'static str {
        self.role.name()
    }
}

/// Label used for a chain's stage nodes.
fn effector_label(role: ChainRole) -> &'static str {
    match role {
        ChainRole::LeftArm => "LeftHand",
        ChainRole::RightArm => "RightHand",
        ChainRole::LeftLeg => "LeftFoot",
        ChainRole::RightLeg => "RightFoot",
    }
}

/// Every IK chain of one avatar.
#[derive(Debug, Clone, PartialEq)]
pub struct IkSetup {
    chains: Vec<IkChain>,
    solver: CcdSolver,
}

impl IkSetup {
    pub fn chains(&self) -> &[IkChain] {
        &self.chains
    }

    pub fn chain(&self, name: &str) -> Option<&IkChain> {
        self.chains.iter().find(|c| c.name() == name)
    }

    pub fn chain_names(&self) -> Vec<&'static str> {
        self.chains.iter().map(|c| c.name()).collect()
    }

    pub fn solver(&self) -> &CcdSolver {
        &self.solver
    }

    /// Re-solves every chain against its target's current world position.
    pub fn update(&self, avatar: &mut SceneGraph, stage: &SceneGraph) {
        for chain in &self.chains {
            let Some(target) = stage.world_position(chain.target) else {
                continue;
            };
            self.solver.solve(avatar, &chain.links, chain.effector, target);
        }
    }

    /// Moves every target onto its effector's current world position.
    pub fn snap_targets(&self, avatar: &SceneGraph, stage: &mut SceneGraph) {
        for chain in &self.chains {
            if let Some(position) = avatar.world_position(chain.effector) {
                stage.set_world_position(chain.target, position);
            }
        }
    }

    pub fn target_position(&self, stage: &SceneGraph, name: &str) -> Option<Vec3> {
        stage.world_position(self.chain(name)?.target)
    }

    /// Moves a chain's target. Returns false for an unknown chain name.
    pub fn set_target_position(&self, stage: &mut SceneGraph, name: &str, position: Vec3) -> bool {
        match self.chain(name) {
            Some(chain) => stage.set_world_position(chain.target, position),
            None => false,
        }
    }

    /// Target positions keyed by chain name.
    pub fn target_positions(&self, stage: &SceneGraph) -> BTreeMap<String, [f64; 3]> {
        self.chains
            .iter()
            .filter_map(|c| {
                let p = stage.world_position(c.target)?;
                Some((c.name().to_string(), [p.x as f64, p.y as f64, p.z as f64]))
            })
            .collect()
    }

    pub fn set_helpers_visible(&self, stage: &mut SceneGraph, visible: bool) {
        for helper in self.chains.iter().filter_map(|c| c.helper) {
            if let Some(node) = stage.get_mut(helper) {
                node.visible = visible;
            }
        }
    }

    /// Removes every target and helper from the stage. Returns the number of
    /// nodes removed.
    pub fn dispose(self, stage: &mut SceneGraph) -> usize {
        let mut removed = 0;
        for chain in self.chains {
            removed += stage.remove_subtree(chain.target);
            if let Some(helper) = chain.helper {
                removed += stage.remove_subtree(helper);
            }
        }
        removed
    }
}

/// Builds IK chains for a skeleton.
///
/// Returns `Ok(None)` when no limb resolves. On error nothing is left in the
/// stage graph.
pub fn build_ik_rig(
    avatar: &SceneGraph,
    skeleton: &[NodeId],
    stage: &mut SceneGraph,
    config: &IkConfig,
) -> Result<Option<IkSetup>, IkError> {
    let names: Vec<String> = skeleton
        .iter()
        .map(|id| avatar.get(*id).map(|n| n.name.clone()).unwrap_or_default())
        .collect();
    let rig = resolve_rig(&names);

    let mut resolved = Vec::new();
    for chain in rig.chains.values() {
        if chain.bones.len() < MIN_CHAIN_BONES {
            debug!(chain = %chain.role, bones = chain.bones.len(), "chain too short");
            continue;
        }
        let mut ids = Vec::with_capacity(chain.bones.len());
        for index in &chain.bones {
            let id = skeleton
                .get(*index)
                .copied()
                .filter(|id| avatar.contains(*id))
                .ok_or_else(|| IkError::MissingBone {
                    chain: chain.role.name().to_string(),
                    bone: names.get(*index).cloned().unwrap_or_default(),
                })?;
            ids.push(id);
        }
        resolved.push((chain.role, ids));
    }

    for (i, (role, ids)) in resolved.iter().enumerate() {
        let effector = ids.last();
        if let Some((other, _)) = resolved[..i].iter().find(|(_, o)| o.last() == effector) {
            return Err(IkError::SharedEffector {
                first: other.name().to_string(),
                second: role.name().to_string(),
                bone: effector
                    .and_then(|id| avatar.get(*id))
                    .map(|n| n.name.clone())
                    .unwrap_or_default(),
            });
        }
    }

    let mut chains = Vec::new();
    for (role, mut ids) in resolved {
        let Some(effector) = ids.pop() else {
            continue;
        };
        let Some(position) = avatar.world_position(effector) else {
            warn!(chain = %role, "effector has no world transform");
            continue;
        };
        let label = effector_label(role);
        let target = stage.add_root(
            Node::new(format!("{}_IK_Target", label), NodeKind::Target).with_translation(position),
        );
        let mut helper = Node::new(
            format!("{}_IK_Helper", label),
            NodeKind::Helper(HelperData {
                chain: role.name().to_string(),
            }),
        );
        helper.visible = config.show_helpers;
        let helper = stage.add_root(helper);

        chains.push(IkChain {
            role,
            links: ids,
            effector,
            target,
            helper: Some(helper),
        });
    }

    if chains.is_empty() {
        debug!("no IK chains could be created");
        return Ok(None);
    }

    debug!(chains = chains.len(), "IK rig built");
    Ok(Some(IkSetup {
        chains,
        solver: CcdSolver::from(config),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A straight Mixamo left arm along +X, starting at the origin.
    fn straight_arm(with_shoulder: bool) -> (SceneGraph, Vec<NodeId>) {
        let mut graph = SceneGraph::new();
        let hips = graph.add_root(Node::new("mixamorigHips", NodeKind::Bone));
        let mut skeleton = vec![hips];
        let mut parent = hips;
        let mut names = vec!["mixamorigLeftArm", "mixamorigLeftForeArm", "mixamorigLeftHand"];
        if with_shoulder {
            names.insert(0, "mixamorigLeftShoulder");
        }
        for (i, name) in names.into_iter().enumerate() {
            let offset = if i == 0 { Vec3::ZERO } else { Vec3::new(0.5, 0.0, 0.0) };
            let id = graph
                .add_child(parent, Node::new(name, NodeKind::Bone).with_translation(offset))
                .unwrap();
            skeleton.push(id);
            parent = id;
        }
        (graph, skeleton)
    }

    #[test]
    fn test_builds_one_chain_for_four_bone_arm() {
        let (avatar, skeleton) = straight_arm(true);
        let mut stage = SceneGraph::new();
        let setup = build_ik_rig(&avatar, &skeleton, &mut stage, &IkConfig::default())
            .unwrap()
            .unwrap();

        assert_eq!(setup.chain_names(), vec!["leftArm"]);
        let chain = setup.chain("leftArm").unwrap();
        assert_eq!(chain.links.len(), 3);
        assert_eq!(chain.effector, skeleton[4]);

        let target = stage.get(chain.target).unwrap();
        assert_eq!(target.name, "LeftHand_IK_Target");
        assert!((target.translation - Vec3::new(1.5, 0.0, 0.0)).length() < 1e-6);
        assert!(!stage.get(chain.helper.unwrap()).unwrap().visible);
    }

    #[test]
    fn test_short_arm_builds_nothing() {
        let mut graph = SceneGraph::new();
        let arm = graph.add_root(Node::new("mixamorigLeftArm", NodeKind::Bone));
        let fore = graph
            .add_child(arm, Node::new("mixamorigLeftForeArm", NodeKind::Bone))
            .unwrap();
        let mut stage = SceneGraph::new();
        let setup = build_ik_rig(&graph, &[arm, fore], &mut stage, &IkConfig::default()).unwrap();
        assert!(setup.is_none());
        assert!(stage.is_empty());
    }

    #[test]
    fn test_update_moves_effector_toward_target() {
        let (mut avatar, skeleton) = straight_arm(true);
        let mut stage = SceneGraph::new();
        let setup = build_ik_rig(&avatar, &skeleton, &mut stage, &IkConfig::default())
            .unwrap()
            .unwrap();
        let hand = setup.chain("leftArm").unwrap().effector;

        let goal = Vec3::new(0.5, 0.6, 0.2);
        let before = avatar.world_position(hand).unwrap().distance(goal);
        assert!(setup.set_target_position(&mut stage, "leftArm", goal));
        setup.update(&mut avatar, &stage);
        let after = avatar.world_position(hand).unwrap().distance(goal);

        assert!(after < before, "{} !< {}", after, before);
        assert!(after < 0.1, "effector still {} away", after);
    }

    #[test]
    fn test_solver_respects_max_angle() {
        let (mut avatar, skeleton) = straight_arm(false);
        let solver = CcdSolver {
            iterations: 1,
            min_angle: 0.0,
            max_angle: 0.1,
        };
        let links = &skeleton[1..3];
        solver.solve(&mut avatar, links, skeleton[3], Vec3::new(-1.0, 0.0, 0.0));
        for link in links {
            let angle = avatar.get(*link).unwrap().rotation.angle_between(Quat::IDENTITY);
            assert!(angle <= 0.1 + 1e-5, "link rotated {}", angle);
        }
    }

    #[test]
    fn test_solved_chain_stops_early() {
        let (mut avatar, skeleton) = straight_arm(false);
        let hand = skeleton[3];
        let at_rest = avatar.world_position(hand).unwrap();
        let iterations = CcdSolver::default().solve(&mut avatar, &skeleton[1..3], hand, at_rest);
        assert_eq!(iterations, 0);
    }

    #[test]
    fn test_targets_and_dispose() {
        let (avatar, skeleton) = straight_arm(true);
        let mut stage = SceneGraph::new();
        let setup = build_ik_rig(&avatar, &skeleton, &mut stage, &IkConfig::default())
            .unwrap()
            .unwrap();

        assert!(!setup.set_target_position(&mut stage, "tail", Vec3::ONE));
        setup.set_target_position(&mut stage, "leftArm", Vec3::new(0.5, 1.2, 0.3));
        let positions = setup.target_positions(&stage);
        let p = positions["leftArm"];
        assert!((p[0] - 0.5).abs() < 1e-6 && (p[1] - 1.2).abs() < 1e-6 && (p[2] - 0.3).abs() < 1e-6);

        setup.set_helpers_visible(&mut stage, true);
        assert!(stage
            .get(setup.chains()[0].helper.unwrap())
            .unwrap()
            .visible);

        assert_eq!(setup.dispose(&mut stage), 2);
        assert!(stage.is_empty());
    }

    #[test]
    fn test_snap_targets_follows_posed_effector() {
        let (mut avatar, skeleton) = straight_arm(true);
        let mut stage = SceneGraph::new();
        let setup = build_ik_rig(&avatar, &skeleton, &mut stage, &IkConfig::default())
            .unwrap()
            .unwrap();

        avatar.get_mut(skeleton[2]).unwrap().rotation =
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        setup.snap_targets(&avatar, &mut stage);

        let hand = avatar.world_position(skeleton[4]).unwrap();
        let target = setup.target_position(&stage, "leftArm").unwrap();
        assert!(hand.distance(target) < 1e-5);
        assert!((hand - Vec3::new(0.5, 1.0, 0.0)).length() < 1e-5);
    }
}
