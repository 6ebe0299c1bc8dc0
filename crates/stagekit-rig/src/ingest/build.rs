//! Conversion from a glTF document into a [`SceneGraph`].

use std::collections::BTreeSet;

use glam::{Quat, Vec3};
use tracing::{debug, warn};

use super::accessors::{morph_target_names, primitive_bounds};
use crate::error::IngestError;
use crate::graph::{MaterialSettings, MeshData, Node, NodeId, NodeKind, SceneGraph};

/// Builds a graph with a single root group named `root_name` holding the
/// document's default scene (or its first scene).
pub fn build_graph(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    root_name: &str,
) -> Result<(SceneGraph, NodeId), IngestError> {
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| IngestError::parse("document contains no scene"))?;

    let joints: BTreeSet<usize> = document
        .skins()
        .flat_map(|skin| skin.joints().map(|j| j.index()).collect::<Vec<_>>())
        .collect();

    let mut graph = SceneGraph::new();
    let root = graph.add_root(Node::new(root_name, NodeKind::Group));

    // Graph id per glTF node, plus the node carrying its mesh.
    let mut ids: Vec<Option<NodeId>> = vec![None; document.nodes().count()];
    let mut mesh_ids: Vec<Option<NodeId>> = vec![None; ids.len()];

    let mut stack: Vec<(gltf::Node, NodeId)> = scene.nodes().map(|n| (n, root)).collect();
    stack.reverse();
    while let Some((node, parent)) = stack.pop() {
        let index = node.index();
        if ids.get(index).copied().flatten().is_some() {
            warn!(node = index, "node reached twice, skipping");
            continue;
        }

        let name = node
            .name()
            .map(String::from)
            .unwrap_or_else(|| format!("node_{}", index));
        let is_joint = joints.contains(&index);
        let mesh = node.mesh().map(|m| build_mesh(&m, buffers));

        let (kind, attached_mesh) = match (is_joint, mesh) {
            (true, mesh) => (NodeKind::Bone, mesh),
            (false, Some(mesh)) => (NodeKind::Mesh(mesh), None),
            (false, None) => (NodeKind::Group, None),
        };

        let (t, r, s) = node.transform().decomposed();
        let graph_node = Node::new(name.clone(), kind)
            .with_translation(Vec3::from_array(t))
            .with_rotation(Quat::from_array(r))
            .with_scale(Vec3::from_array(s));
        let Some(id) = graph.add_child(parent, graph_node) else {
            continue;
        };
        ids[index] = Some(id);

        mesh_ids[index] = match attached_mesh {
            Some(mesh) => {
                let mesh_node = Node::new(format!("{}_mesh", name), NodeKind::Mesh(mesh));
                graph.add_child(id, mesh_node)
            }
            None if node.mesh().is_some() => Some(id),
            None => None,
        };

        for child in node.children().collect::<Vec<_>>().into_iter().rev() {
            stack.push((child, id));
        }
    }

    for node in document.nodes() {
        let (Some(skin), Some(mesh_id)) = (node.skin(), mesh_ids[node.index()]) else {
            continue;
        };
        let bones: Vec<NodeId> = skin
            .joints()
            .filter_map(|j| ids.get(j.index()).copied().flatten())
            .collect();
        if let Some(mesh) = graph.get_mut(mesh_id).and_then(|n| n.mesh_mut()) {
            mesh.skin = Some(bones);
        }
    }

    debug!(nodes = graph.len(), joints = joints.len(), "scene graph built");
    Ok((graph, root))
}

fn build_mesh(mesh: &gltf::Mesh, buffers: &[gltf::buffer::Data]) -> MeshData {
    let mut bounds = None;
    let mut morph_count = 0;
    let mut materials = Vec::new();

    for primitive in mesh.primitives() {
        if let Some(b) = primitive_bounds(&primitive, buffers) {
            bounds = Some(match bounds {
                Some(existing) => b.union(&existing),
                None => b,
            });
        }
        morph_count = morph_count.max(primitive.morph_targets().count());
        let material = primitive.material();
        materials.push(MaterialSettings {
            name: material.name().map(String::from),
            env_map_intensity: Some(1.0),
        });
    }

    let mut morph_influences = mesh.weights().map(<[f32]>::to_vec).unwrap_or_default();
    morph_influences.resize(morph_count, 0.0);

    MeshData {
        bounds,
        morph_names: morph_target_names(mesh, morph_count),
        morph_influences,
        skin: None,
        materials,
        cast_shadow: false,
        receive_shadow: false,
    }
}
