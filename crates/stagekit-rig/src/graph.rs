//! Scene graph arena.
//!
//! Nodes are addressed by [`NodeId`]. Ids are never reused: once a subtree is
//! removed, every id into it resolves to `None`.

use glam::{Mat4, Quat, Vec3};

/// Handle to a node in a [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Bounds of a point set, or `None` if it is empty.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut aabb = Aabb::new(first, first);
        for p in iter {
            aabb.min = aabb.min.min(p);
            aabb.max = aabb.max.max(p);
        }
        Some(aabb)
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(self.min.min(other.min), self.max.max(other.max))
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Bounds of the eight transformed corners.
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        let (lo, hi) = (self.min, self.max);
        let corners = [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ];
        // Eight corners, never empty.
        Aabb::from_points(corners.iter().map(|c| matrix.transform_point3(*c))).unwrap_or(*self)
    }
}

/// Material properties the stage adjusts after ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialSettings {
    pub name: Option<String>,
    /// `None` for materials with no environment-map control.
    pub env_map_intensity: Option<f32>,
}

/// Renderable mesh attached to a node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    /// Local-space bounds of the vertex positions.
    pub bounds: Option<Aabb>,
    /// Morph target names in index order.
    pub morph_names: Vec<String>,
    /// Morph influences, parallel to `morph_names`.
    pub morph_influences: Vec<f32>,
    /// Skeleton bones in joint order, if skinned.
    pub skin: Option<Vec<NodeId>>,
    pub materials: Vec<MaterialSettings>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl MeshData {
    /// Returns true if the mesh has a non-empty skeleton.
    pub fn is_skinned(&self) -> bool {
        self.skin.as_ref().is_some_and(|s| !s.is_empty())
    }

    pub fn morph_index(&self, name: &str) -> Option<usize> {
        self.morph_names.iter().position(|n| n == name)
    }

    pub fn morph_weight(&self, name: &str) -> Option<f32> {
        self.morph_index(name)
            .and_then(|i| self.morph_influences.get(i).copied())
    }

    /// Sets a morph influence by name. Returns false if the mesh lacks it.
    pub fn set_morph(&mut self, name: &str, weight: f32) -> bool {
        match self.morph_index(name) {
            Some(i) if i < self.morph_influences.len() => {
                self.morph_influences[i] = weight;
                true
            }
            _ => false,
        }
    }
}

/// Debug visual attached to an IK chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperData {
    pub chain: String,
}

/// What a node is.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    Bone,
    Mesh(MeshData),
    /// IK target marker.
    Target,
    Helper(HelperData),
}

/// A node with a local TRS transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    /// Rotation at creation time. Pose operations are relative to this.
    pub rest_rotation: Quat,
    pub visible: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    /// Creates a visible node with an identity transform.
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            rest_rotation: Quat::IDENTITY,
            visible: true,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    /// Sets both the current and the rest rotation.
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self.rest_rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    pub fn mesh(&self) -> Option<&MeshData> {
        match self.kind {
            NodeKind::Mesh(ref mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn mesh_mut(&mut self) -> Option<&mut MeshData> {
        match self.kind {
            NodeKind::Mesh(ref mut mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn is_bone(&self) -> bool {
        matches!(self.kind, NodeKind::Bone)
    }
}

/// Arena-backed node hierarchy.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<Option<Node>>,
    roots: Vec<NodeId>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parentless node.
    pub fn add_root(&mut self, node: Node) -> NodeId {
        let id = self.push(node, None);
        self.roots.push(id);
        id
    }

    /// Adds a node under `parent`. Returns `None` if the parent is dead.
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> Option<NodeId> {
        self.get(parent)?;
        let id = self.push(node, Some(parent));
        if let Some(p) = self.get_mut(parent) {
            p.children.push(id);
        }
        Some(id)
    }

    fn push(&mut self, mut node: Node, parent: Option<NodeId>) -> NodeId {
        node.parent = parent;
        node.children.clear();
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(node));
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(|n| n.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(|n| n.as_mut())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes a node and all its descendants. Returns how many were removed.
    pub fn remove_subtree(&mut self, id: NodeId) -> usize {
        let Some(node) = self.get(id) else {
            return 0;
        };
        match node.parent {
            Some(parent) => {
                if let Some(p) = self.get_mut(parent) {
                    p.children.retain(|c| *c != id);
                }
            }
            None => self.roots.retain(|r| *r != id),
        }

        let doomed = self.traverse(id);
        for d in &doomed {
            self.nodes[d.0] = None;
        }
        doomed.len()
    }

    /// Depth-first pre-order walk of a subtree, children in insertion order.
    pub fn traverse(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            out.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// First node in `root`'s subtree with the given name.
    pub fn find_by_name(&self, root: NodeId, name: &str) -> Option<NodeId> {
        self.traverse(root)
            .into_iter()
            .find(|id| self.get(*id).is_some_and(|n| n.name == name))
    }

    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let node = self.get(id)?;
        let local = node.local_matrix();
        match node.parent {
            Some(parent) => Some(self.world_matrix(parent)? * local),
            None => Some(local),
        }
    }

    pub fn world_position(&self, id: NodeId) -> Option<Vec3> {
        self.world_matrix(id).map(|m| m.w_axis.truncate())
    }

    pub fn world_rotation(&self, id: NodeId) -> Option<Quat> {
        self.world_matrix(id).map(|m| {
            let (_, rotation, _) = m.to_scale_rotation_translation();
            rotation
        })
    }

    /// Moves a node so its world position becomes `position`.
    pub fn set_world_position(&mut self, id: NodeId, position: Vec3) -> bool {
        let parent_world = match self.get(id) {
            Some(node) => match node.parent {
                Some(parent) => self.world_matrix(parent).unwrap_or(Mat4::IDENTITY),
                None => Mat4::IDENTITY,
            },
            None => return false,
        };
        let local = parent_world.inverse().transform_point3(position);
        match self.get_mut(id) {
            Some(node) => {
                node.translation = local;
                true
            }
            None => false,
        }
    }

    /// World-space bounds of every mesh in the subtree.
    pub fn world_aabb(&self, root: NodeId) -> Option<Aabb> {
        let mut result: Option<Aabb> = None;
        for id in self.traverse(root) {
            let Some(bounds) = self.get(id).and_then(|n| n.mesh()).and_then(|m| m.bounds) else {
                continue;
            };
            let Some(world) = self.world_matrix(id) else {
                continue;
            };
            let aabb = bounds.transformed(&world);
            result = Some(match result {
                Some(r) => r.union(&aabb),
                None => aabb,
            });
        }
        result
    }
}
