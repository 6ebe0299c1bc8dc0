//! Bone resolution across rig naming conventions.
//!
//! Everything here is a pure function over a list of bone names. Results are
//! indices into that list, so callers can map them back to whatever handle
//! type they keep alongside the names.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Skeletal role of a bone, independent of naming convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoneRole {
    Hips,
    Spine,
    Chest,
    UpperChest,
    Neck,
    Head,
    LeftShoulder,
    LeftUpperArm,
    LeftForearm,
    LeftHand,
    RightShoulder,
    RightUpperArm,
    RightForearm,
    RightHand,
    LeftUpperLeg,
    LeftLowerLeg,
    LeftFoot,
    RightUpperLeg,
    RightLowerLeg,
    RightFoot,
}

impl BoneRole {
    pub const ALL: [BoneRole; 20] = [
        BoneRole::Hips,
        BoneRole::Spine,
        BoneRole::Chest,
        BoneRole::UpperChest,
        BoneRole::Neck,
        BoneRole::Head,
        BoneRole::LeftShoulder,
        BoneRole::LeftUpperArm,
        BoneRole::LeftForearm,
        BoneRole::LeftHand,
        BoneRole::RightShoulder,
        BoneRole::RightUpperArm,
        BoneRole::RightForearm,
        BoneRole::RightHand,
        BoneRole::LeftUpperLeg,
        BoneRole::LeftLowerLeg,
        BoneRole::LeftFoot,
        BoneRole::RightUpperLeg,
        BoneRole::RightLowerLeg,
        BoneRole::RightFoot,
    ];
}

/// A limb resolved as an IK chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChainRole {
    #[serde(rename = "leftArm")]
    LeftArm,
    #[serde(rename = "rightArm")]
    RightArm,
    #[serde(rename = "leftLeg")]
    LeftLeg,
    #[serde(rename = "rightLeg")]
    RightLeg,
}

impl ChainRole {
    pub const ALL: [ChainRole; 4] = [
        ChainRole::LeftArm,
        ChainRole::RightArm,
        ChainRole::LeftLeg,
        ChainRole::RightLeg,
    ];

    /// Chain name as used in scene documents.
    pub fn name(&self) -> &'static str {
        match self {
            ChainRole::LeftArm => "leftArm",
            ChainRole::RightArm => "rightArm",
            ChainRole::LeftLeg => "leftLeg",
            ChainRole::RightLeg => "rightLeg",
        }
    }

    pub fn from_name(name: &str) -> Option<ChainRole> {
        ChainRole::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Roles from chain root to effector.
    pub fn roles(&self) -> &'static [BoneRole] {
        match self {
            ChainRole::LeftArm => &[
                BoneRole::LeftShoulder,
                BoneRole::LeftUpperArm,
                BoneRole::LeftForearm,
                BoneRole::LeftHand,
            ],
            ChainRole::RightArm => &[
                BoneRole::RightShoulder,
                BoneRole::RightUpperArm,
                BoneRole::RightForearm,
                BoneRole::RightHand,
            ],
            ChainRole::LeftLeg => &[
                BoneRole::LeftUpperLeg,
                BoneRole::LeftLowerLeg,
                BoneRole::LeftFoot,
            ],
            ChainRole::RightLeg => &[
                BoneRole::RightUpperLeg,
                BoneRole::RightLowerLeg,
                BoneRole::RightFoot,
            ],
        }
    }
}

impl fmt::Display for ChainRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A naming convention: one bone-name pattern per role it covers.
#[derive(Debug)]
pub struct RigConvention {
    pub name: &'static str,
    pub bones: &'static [(BoneRole, &'static str)],
}

impl RigConvention {
    pub fn pattern(&self, role: BoneRole) -> Option<&'static str> {
        self.bones
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, pattern)| *pattern)
    }
}

use BoneRole::*;

pub const MIXAMO: RigConvention = RigConvention {
    name: "mixamo",
    bones: &[
        (Hips, "mixamorigHips"),
        (Spine, "mixamorigSpine"),
        (Chest, "mixamorigSpine1"),
        (UpperChest, "mixamorigSpine2"),
        (Neck, "mixamorigNeck"),
        (Head, "mixamorigHead"),
        (LeftShoulder, "mixamorigLeftShoulder"),
        (LeftUpperArm, "mixamorigLeftArm"),
        (LeftForearm, "mixamorigLeftForeArm"),
        (LeftHand, "mixamorigLeftHand"),
        (RightShoulder, "mixamorigRightShoulder"),
        (RightUpperArm, "mixamorigRightArm"),
        (RightForearm, "mixamorigRightForeArm"),
        (RightHand, "mixamorigRightHand"),
        (LeftUpperLeg, "mixamorigLeftUpLeg"),
        (LeftLowerLeg, "mixamorigLeftLeg"),
        (LeftFoot, "mixamorigLeftFoot"),
        (RightUpperLeg, "mixamorigRightUpLeg"),
        (RightLowerLeg, "mixamorigRightLeg"),
        (RightFoot, "mixamorigRightFoot"),
    ],
};

pub const PASCAL_CASE: RigConvention = RigConvention {
    name: "pascal_case",
    bones: &[
        (Hips, "Hips"),
        (Spine, "Spine"),
        (Chest, "Spine1"),
        (UpperChest, "Spine2"),
        (Neck, "Neck"),
        (Head, "Head"),
        (LeftShoulder, "LeftShoulder"),
        (LeftUpperArm, "LeftArm"),
        (LeftForearm, "LeftForeArm"),
        (LeftHand, "LeftHand"),
        (RightShoulder, "RightShoulder"),
        (RightUpperArm, "RightArm"),
        (RightForearm, "RightForeArm"),
        (RightHand, "RightHand"),
        (LeftUpperLeg, "LeftUpLeg"),
        (LeftLowerLeg, "LeftLeg"),
        (LeftFoot, "LeftFoot"),
        (RightUpperLeg, "RightUpLeg"),
        (RightLowerLeg, "RightLeg"),
        (RightFoot, "RightFoot"),
    ],
};

pub const UNITY_HUMANOID: RigConvention = RigConvention {
    name: "unity_humanoid",
    bones: &[
        (Hips, "Hips"),
        (Spine, "Spine"),
        (Chest, "Chest"),
        (UpperChest, "UpperChest"),
        (Neck, "Neck"),
        (Head, "Head"),
        (LeftShoulder, "LeftShoulder"),
        (LeftUpperArm, "LeftUpperArm"),
        (LeftForearm, "LeftLowerArm"),
        (LeftHand, "LeftHand"),
        (RightShoulder, "RightShoulder"),
        (RightUpperArm, "RightUpperArm"),
        (RightForearm, "RightLowerArm"),
        (RightHand, "RightHand"),
        (LeftUpperLeg, "LeftUpperLeg"),
        (LeftLowerLeg, "LeftLowerLeg"),
        (LeftFoot, "LeftFoot"),
        (RightUpperLeg, "RightUpperLeg"),
        (RightLowerLeg, "RightLowerLeg"),
        (RightFoot, "RightFoot"),
    ],
};

pub const UNDERSCORE: RigConvention = RigConvention {
    name: "underscore",
    bones: &[
        (Hips, "Hips"),
        (Spine, "Spine"),
        (Neck, "Neck"),
        (Head, "Head"),
        (LeftShoulder, "Left_Shoulder"),
        (LeftUpperArm, "Left_Arm"),
        (LeftForearm, "Left_ForeArm"),
        (LeftHand, "Left_Hand"),
        (RightShoulder, "Right_Shoulder"),
        (RightUpperArm, "Right_Arm"),
        (RightForearm, "Right_ForeArm"),
        (RightHand, "Right_Hand"),
        (LeftUpperLeg, "Left_UpLeg"),
        (LeftLowerLeg, "Left_Leg"),
        (LeftFoot, "Left_Foot"),
        (RightUpperLeg, "Right_UpLeg"),
        (RightLowerLeg, "Right_Leg"),
        (RightFoot, "Right_Foot"),
    ],
};

pub const RIGIFY: RigConvention = RigConvention {
    name: "rigify",
    bones: &[
        (Hips, "hips"),
        (Spine, "spine"),
        (Chest, "chest"),
        (Neck, "neck"),
        (Head, "head"),
        (LeftShoulder, "shoulder.L"),
        (LeftUpperArm, "upper_arm.L"),
        (LeftForearm, "forearm.L"),
        (LeftHand, "hand.L"),
        (RightShoulder, "shoulder.R"),
        (RightUpperArm, "upper_arm.R"),
        (RightForearm, "forearm.R"),
        (RightHand, "hand.R"),
        (LeftUpperLeg, "thigh.L"),
        (LeftLowerLeg, "shin.L"),
        (LeftFoot, "foot.L"),
        (RightUpperLeg, "thigh.R"),
        (RightLowerLeg, "shin.R"),
        (RightFoot, "foot.R"),
    ],
};

pub const SUFFIX_LR: RigConvention = RigConvention {
    name: "suffix_lr",
    bones: &[
        (Hips, "Hips"),
        (Spine, "Spine"),
        (Chest, "Chest"),
        (Neck, "Neck"),
        (Head, "Head"),
        (LeftShoulder, "Shoulder_L"),
        (LeftUpperArm, "UpperArm_L"),
        (LeftForearm, "LowerArm_L"),
        (LeftHand, "Hand_L"),
        (RightShoulder, "Shoulder_R"),
        (RightUpperArm, "UpperArm_R"),
        (RightForearm, "LowerArm_R"),
        (RightHand, "Hand_R"),
        (LeftUpperLeg, "UpperLeg_L"),
        (LeftLowerLeg, "LowerLeg_L"),
        (LeftFoot, "Foot_L"),
        (RightUpperLeg, "UpperLeg_R"),
        (RightLowerLeg, "LowerLeg_R"),
        (RightFoot, "Foot_R"),
    ],
};

/// Conventions in priority order.
pub const CONVENTIONS: [&RigConvention; 6] = [
    &MIXAMO,
    &PASCAL_CASE,
    &UNITY_HUMANOID,
    &UNDERSCORE,
    &RIGIFY,
    &SUFFIX_LR,
];

/// Finds the bone a pattern refers to.
///
/// Tries an exact match, then case-insensitive equality, then a
/// case-insensitive substring match where the bone name contains the
/// pattern. Among substring candidates the shortest name wins; ties go to
/// the earlier bone.
pub fn match_pattern<S: AsRef<str>>(pattern: &str, names: &[S]) -> Option<usize> {
    if let Some(i) = names.iter().position(|n| n.as_ref() == pattern) {
        return Some(i);
    }

    let lower = pattern.to_lowercase();
    if let Some(i) = names
        .iter()
        .position(|n| n.as_ref().to_lowercase() == lower)
    {
        return Some(i);
    }

    names
        .iter()
        .enumerate()
        .filter(|(_, n)| n.as_ref().to_lowercase().contains(&lower))
        // min_by_key keeps the first of equal keys
        .min_by_key(|(_, n)| n.as_ref().len())
        .map(|(i, _)| i)
}

/// A chain resolved under one convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedChain {
    pub role: ChainRole,
    pub convention: &'static str,
    /// Bone indices from chain root to effector.
    pub bones: Vec<usize>,
}

impl ResolvedChain {
    pub fn effector(&self) -> Option<usize> {
        self.bones.last().copied()
    }

    /// Every bone except the effector.
    pub fn links(&self) -> &[usize] {
        match self.bones.split_last() {
            Some((_, links)) => links,
            None => &[],
        }
    }
}

/// Resolves one chain. The first convention under which every role of the
/// chain matches a distinct bone wins; conventions are never mixed.
pub fn resolve_chain<S: AsRef<str>>(chain: ChainRole, names: &[S]) -> Option<ResolvedChain> {
    CONVENTIONS
        .iter()
        .find_map(|convention| resolve_chain_with(chain, convention, names))
}

fn resolve_chain_with<S: AsRef<str>>(
    chain: ChainRole,
    convention: &RigConvention,
    names: &[S],
) -> Option<ResolvedChain> {
    let mut bones = Vec::with_capacity(chain.roles().len());
    for role in chain.roles() {
        let index = match_pattern(convention.pattern(*role)?, names)?;
        if bones.contains(&index) {
            return None;
        }
        bones.push(index);
    }
    Some(ResolvedChain {
        role: chain,
        convention: convention.name,
        bones,
    })
}

/// Looks up a single role under the first convention that has it.
pub fn resolve_role<S: AsRef<str>>(role: BoneRole, names: &[S]) -> Option<usize> {
    CONVENTIONS
        .iter()
        .filter_map(|c| c.pattern(role))
        .find_map(|pattern| match_pattern(pattern, names))
}

/// Every chain and single role found in a skeleton.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedRig {
    pub chains: BTreeMap<ChainRole, ResolvedChain>,
    pub roles: BTreeMap<BoneRole, usize>,
}

impl ResolvedRig {
    pub fn bone(&self, role: BoneRole) -> Option<usize> {
        self.roles.get(&role).copied()
    }

    pub fn chain(&self, role: ChainRole) -> Option<&ResolvedChain> {
        self.chains.get(&role)
    }
}

/// Resolves all chains, then every single role.
///
/// Roles that belong to a resolved chain take the chain's bone, so the IK
/// rig and the pose tools always agree on which bone is the upper arm.
pub fn resolve_rig<S: AsRef<str>>(names: &[S]) -> ResolvedRig {
    let mut rig = ResolvedRig::default();

    for chain in ChainRole::ALL {
        if let Some(resolved) = resolve_chain(chain, names) {
            for (role, bone) in chain.roles().iter().zip(&resolved.bones) {
                rig.roles.insert(*role, *bone);
            }
            rig.chains.insert(chain, resolved);
        }
    }

    for role in BoneRole::ALL {
        if rig.roles.contains_key(&role) {
            continue;
        }
        if let Some(bone) = resolve_role(role, names) {
            rig.roles.insert(role, bone);
        }
    }

    rig
}
