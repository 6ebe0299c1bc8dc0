//! Synthetic glTF avatars for integration tests.
//!
//! [`AvatarFixture`] builds a minimal humanoid: an armature named after one
//! of the supported rig conventions, plus a single box-shaped body mesh
//! skinned to it. The body spans `y = -0.1 ..= 1.7` by default, so a fresh
//! ingestion has a known height (1.8) and a known floor offset.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use stagekit_rig::bones::{BoneRole, RigConvention, MIXAMO};
use stagekit_rig::ingest::{decode_bytes, DecodedAsset};

const GLB_MAGIC: &[u8; 4] = b"glTF";
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

const FLOAT: u32 = 5126;
const UNSIGNED_SHORT: u32 = 5123;
const ARRAY_BUFFER: u32 = 34962;
const ELEMENT_ARRAY_BUFFER: u32 = 34963;

/// Parent role and local translation for every bone.
const LAYOUT: [(BoneRole, Option<BoneRole>, [f32; 3]); 20] = [
    (BoneRole::Hips, None, [0.0, 0.95, 0.0]),
    (BoneRole::Spine, Some(BoneRole::Hips), [0.0, 0.1, 0.0]),
    (BoneRole::Chest, Some(BoneRole::Spine), [0.0, 0.15, 0.0]),
    (BoneRole::UpperChest, Some(BoneRole::Chest), [0.0, 0.15, 0.0]),
    (BoneRole::Neck, Some(BoneRole::UpperChest), [0.0, 0.1, 0.0]),
    (BoneRole::Head, Some(BoneRole::Neck), [0.0, 0.1, 0.0]),
    (BoneRole::LeftShoulder, Some(BoneRole::UpperChest), [0.05, 0.05, 0.0]),
    (BoneRole::LeftUpperArm, Some(BoneRole::LeftShoulder), [0.1, 0.0, 0.0]),
    (BoneRole::LeftForearm, Some(BoneRole::LeftUpperArm), [0.25, 0.0, 0.0]),
    (BoneRole::LeftHand, Some(BoneRole::LeftForearm), [0.25, 0.0, 0.0]),
    (BoneRole::RightShoulder, Some(BoneRole::UpperChest), [-0.05, 0.05, 0.0]),
    (BoneRole::RightUpperArm, Some(BoneRole::RightShoulder), [-0.1, 0.0, 0.0]),
    (BoneRole::RightForearm, Some(BoneRole::RightUpperArm), [-0.25, 0.0, 0.0]),
    (BoneRole::RightHand, Some(BoneRole::RightForearm), [-0.25, 0.0, 0.0]),
    (BoneRole::LeftUpperLeg, Some(BoneRole::Hips), [0.1, -0.05, 0.0]),
    (BoneRole::LeftLowerLeg, Some(BoneRole::LeftUpperLeg), [0.0, -0.4, 0.0]),
    (BoneRole::LeftFoot, Some(BoneRole::LeftLowerLeg), [0.0, -0.4, 0.0]),
    (BoneRole::RightUpperLeg, Some(BoneRole::Hips), [-0.1, -0.05, 0.0]),
    (BoneRole::RightLowerLeg, Some(BoneRole::RightUpperLeg), [0.0, -0.4, 0.0]),
    (BoneRole::RightFoot, Some(BoneRole::RightLowerLeg), [0.0, -0.4, 0.0]),
];

/// Builder for a synthetic avatar asset.
#[derive(Debug, Clone)]
pub struct AvatarFixture {
    convention: Option<&'static RigConvention>,
    omit: Vec<BoneRole>,
    morphs: Vec<String>,
    min_y: f32,
    max_y: f32,
}

impl AvatarFixture {
    /// A rigged humanoid named after `convention`.
    pub fn rigged(convention: &'static RigConvention) -> Self {
        Self {
            convention: Some(convention),
            omit: Vec::new(),
            morphs: Vec::new(),
            min_y: -0.1,
            max_y: 1.7,
        }
    }

    /// A Mixamo humanoid with `smile` and `blink` morph targets.
    pub fn mixamo_with_face() -> Self {
        Self::rigged(&MIXAMO).with_morphs(&["smile", "blink"])
    }

    /// A mesh with no skin.
    pub fn static_prop() -> Self {
        Self {
            convention: None,
            omit: Vec::new(),
            morphs: Vec::new(),
            min_y: 0.0,
            max_y: 0.5,
        }
    }

    /// Leaves bones for these roles out of the armature. Children are
    /// reattached to the nearest remaining ancestor.
    pub fn without(mut self, roles: &[BoneRole]) -> Self {
        self.omit.extend_from_slice(roles);
        self
    }

    pub fn with_morphs(mut self, names: &[&str]) -> Self {
        self.morphs = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Overrides the body's vertical extent.
    pub fn with_height_range(mut self, min_y: f32, max_y: f32) -> Self {
        self.min_y = min_y;
        self.max_y = max_y;
        self
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// Names of the bones this fixture will contain, in skin order.
    pub fn bone_names(&self) -> Vec<&'static str> {
        self.bones().into_iter().map(|(_, name)| name).collect()
    }

    fn bones(&self) -> Vec<(BoneRole, &'static str)> {
        let Some(convention) = self.convention else {
            return Vec::new();
        };
        LAYOUT
            .iter()
            .filter(|(role, _, _)| !self.omit.contains(role))
            .filter_map(|(role, _, _)| convention.pattern(*role).map(|name| (*role, name)))
            .collect()
    }

    /// Encodes the fixture as a binary glTF.
    pub fn to_glb(&self) -> Vec<u8> {
        let (document, bin) = self.build(true);
        encode_glb(&document, &bin)
    }

    /// Encodes the fixture as a JSON glTF with no buffers at all. Accessors
    /// only declare their bounds.
    pub fn to_gltf_json(&self) -> String {
        let (document, _) = self.build(false);
        serde_json::to_string_pretty(&document).expect("fixture JSON serializes")
    }

    /// Writes `<dir>/<name>.glb` and returns its path.
    pub fn write_glb(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(format!("{}.glb", name));
        fs::write(&path, self.to_glb()).expect("Failed to write GLB fixture");
        path
    }

    /// Writes `<dir>/<name>.gltf` and returns its path.
    pub fn write_gltf(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(format!("{}.gltf", name));
        fs::write(&path, self.to_gltf_json()).expect("Failed to write glTF fixture");
        path
    }

    /// Decodes the GLB in memory, as if read from `<name>.glb`.
    pub fn decode(&self, name: &str) -> DecodedAsset {
        decode_bytes(name, &format!("{}.glb", name), &self.to_glb(), None)
            .expect("Fixture GLB decodes")
    }

    fn build(&self, with_buffers: bool) -> (Value, Vec<u8>) {
        let mut bin = Vec::new();
        let mut views = Vec::new();
        let mut accessors = Vec::new();

        let (w, d) = (0.3f32, 0.15f32);
        let positions: Vec<[f32; 3]> = (0..8)
            .map(|i| {
                [
                    if i & 1 == 0 { -w } else { w },
                    if i & 2 == 0 { self.min_y } else { self.max_y },
                    if i & 4 == 0 { -d } else { d },
                ]
            })
            .collect();
        accessors.push(vec3_accessor(
            with_buffers.then(|| push_view(&mut bin, &mut views, &flatten(&positions), ARRAY_BUFFER)),
            [-w, self.min_y, -d],
            [w, self.max_y, d],
        ));

        let mut primitive = json!({
            "attributes": { "POSITION": 0 },
            "material": 0
        });

        if with_buffers {
            let indices: [u16; 36] = [
                0, 1, 3, 0, 3, 2, 4, 6, 7, 4, 7, 5, 0, 4, 5, 0, 5, 1, 2, 3, 7, 2, 7, 6, 0, 2, 6,
                0, 6, 4, 1, 5, 7, 1, 7, 3,
            ];
            let bytes: Vec<u8> = indices.iter().flat_map(|i| i.to_le_bytes()).collect();
            let view = push_view(&mut bin, &mut views, &bytes, ELEMENT_ARRAY_BUFFER);
            primitive["indices"] = json!(accessors.len());
            accessors.push(json!({
                "bufferView": view,
                "componentType": UNSIGNED_SHORT,
                "count": indices.len(),
                "type": "SCALAR"
            }));
        }

        if !self.morphs.is_empty() {
            let mut targets = Vec::new();
            for i in 0..self.morphs.len() {
                let deltas: Vec<[f32; 3]> = positions
                    .iter()
                    .map(|p| if p[1] > 1.0 { [0.0, 0.01 * (i + 1) as f32, 0.0] } else { [0.0; 3] })
                    .collect();
                let max_dy = 0.01 * (i + 1) as f32;
                targets.push(json!({ "POSITION": accessors.len() }));
                accessors.push(vec3_accessor(
                    with_buffers
                        .then(|| push_view(&mut bin, &mut views, &flatten(&deltas), ARRAY_BUFFER)),
                    [0.0, 0.0, 0.0],
                    [0.0, max_dy, 0.0],
                ));
            }
            primitive["targets"] = Value::Array(targets);
        }

        let mut mesh = json!({
            "name": "Body",
            "primitives": [primitive]
        });
        if !self.morphs.is_empty() {
            mesh["weights"] = json!(vec![0.0; self.morphs.len()]);
            mesh["extras"] = json!({ "targetNames": self.morphs });
        }

        let bones = self.bones();
        let mut nodes = Vec::new();
        let mut scene_nodes = Vec::new();
        let mut skins = Vec::new();

        if bones.is_empty() {
            scene_nodes.push(0);
            nodes.push(json!({ "name": "Crate", "mesh": 0 }));
        } else {
            // Node 0 is the armature, bones follow in skin order.
            let index_of = |role: BoneRole| bones.iter().position(|(r, _)| *r == role).map(|i| i + 1);
            let mut children: Vec<Vec<usize>> = vec![Vec::new(); bones.len() + 1];
            for (i, (role, _)) in bones.iter().enumerate() {
                let parent = nearest_ancestor(*role, &index_of).unwrap_or(0);
                children[parent].push(i + 1);
            }

            nodes.push(json!({ "name": "Armature", "children": children[0] }));
            for (i, (role, name)) in bones.iter().enumerate() {
                let translation = LAYOUT
                    .iter()
                    .find(|(r, _, _)| r == role)
                    .map(|(_, _, t)| *t)
                    .unwrap_or([0.0; 3]);
                let mut node = json!({ "name": name, "translation": translation });
                if !children[i + 1].is_empty() {
                    node["children"] = json!(children[i + 1]);
                }
                nodes.push(node);
            }

            let body = nodes.len();
            nodes.push(json!({ "name": "Body", "mesh": 0, "skin": 0 }));
            scene_nodes.push(0);
            scene_nodes.push(body);
            skins.push(json!({ "joints": (1..=bones.len()).collect::<Vec<_>>() }));
        }

        let mut document = json!({
            "asset": { "version": "2.0", "generator": "stagekit-tests" },
            "scene": 0,
            "scenes": [{ "nodes": scene_nodes }],
            "nodes": nodes,
            "meshes": [mesh],
            "materials": [{ "name": "Skin" }],
            "accessors": accessors
        });
        if !skins.is_empty() {
            document["skins"] = Value::Array(skins);
        }
        if with_buffers {
            document["buffers"] = json!([{ "byteLength": bin.len() }]);
            document["bufferViews"] = Value::Array(views);
        }
        (document, bin)
    }
}

fn nearest_ancestor(role: BoneRole, index_of: &dyn Fn(BoneRole) -> Option<usize>) -> Option<usize> {
    let mut parent = LAYOUT.iter().find(|(r, _, _)| *r == role)?.1;
    while let Some(p) = parent {
        if let Some(index) = index_of(p) {
            return Some(index);
        }
        parent = LAYOUT.iter().find(|(r, _, _)| *r == p)?.1;
    }
    None
}

fn flatten(values: &[[f32; 3]]) -> Vec<u8> {
    values
        .iter()
        .flatten()
        .flat_map(|v| v.to_le_bytes())
        .collect()
}

/// Appends `bytes` 4-byte aligned and returns the new view's index.
fn push_view(bin: &mut Vec<u8>, views: &mut Vec<Value>, bytes: &[u8], target: u32) -> usize {
    while bin.len() % 4 != 0 {
        bin.push(0);
    }
    views.push(json!({
        "buffer": 0,
        "byteOffset": bin.len(),
        "byteLength": bytes.len(),
        "target": target
    }));
    bin.extend_from_slice(bytes);
    views.len() - 1
}

fn vec3_accessor(view: Option<usize>, min: [f32; 3], max: [f32; 3]) -> Value {
    let mut accessor = json!({
        "componentType": FLOAT,
        "count": 8,
        "type": "VEC3",
        "min": min,
        "max": max
    });
    if let Some(view) = view {
        accessor["bufferView"] = json!(view);
    }
    accessor
}

fn encode_glb(document: &Value, bin: &[u8]) -> Vec<u8> {
    let mut json_chunk = serde_json::to_vec(document).expect("fixture JSON serializes");
    while json_chunk.len() % 4 != 0 {
        json_chunk.push(b' ');
    }
    let mut bin_chunk = bin.to_vec();
    while bin_chunk.len() % 4 != 0 {
        bin_chunk.push(0);
    }

    let total = 12 + 8 + json_chunk.len() + 8 + bin_chunk.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(GLB_MAGIC);
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json_chunk.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(&json_chunk);
    out.extend_from_slice(&(bin_chunk.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
    out.extend_from_slice(&bin_chunk);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagekit_rig::bones::{RIGIFY, UNDERSCORE};

    #[test]
    fn test_glb_header_and_alignment() {
        let glb = AvatarFixture::mixamo_with_face().to_glb();
        assert_eq!(&glb[..4], GLB_MAGIC);
        let total = u32::from_le_bytes([glb[8], glb[9], glb[10], glb[11]]) as usize;
        assert_eq!(total, glb.len());
        assert_eq!(glb.len() % 4, 0);
    }

    #[test]
    fn test_bone_names_follow_convention() {
        let names = AvatarFixture::rigged(&RIGIFY).bone_names();
        assert!(names.contains(&"upper_arm.L"));
        // Rigify has no upper chest bone.
        assert_eq!(names.len(), 19);

        let names = AvatarFixture::rigged(&UNDERSCORE)
            .without(&[BoneRole::LeftHand])
            .bone_names();
        assert!(!names.contains(&"Left_Hand"));
    }

    #[test]
    fn test_orphans_reattach_to_ancestor() {
        let fixture = AvatarFixture::rigged(&MIXAMO).without(&[BoneRole::UpperChest]);
        let (document, _) = fixture.build(true);
        let nodes = document["nodes"].as_array().unwrap();
        let chest = nodes
            .iter()
            .find(|n| n["name"] == "mixamorigSpine1")
            .unwrap();
        let children: Vec<&str> = chest["children"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| nodes[c.as_u64().unwrap() as usize]["name"].as_str().unwrap())
            .collect();
        assert!(children.contains(&"mixamorigNeck"));
        assert!(children.contains(&"mixamorigLeftShoulder"));
    }
}
