//! Scene graph
//!
//! A flat arena of node records addressed by stable `NodeId` handles.
//! Nodes always have exactly one parent (except the root), so the graph is a
//! tree and removing a node removes everything beneath it.

pub mod assembler;
pub mod camera;
pub mod geometry;

pub use assembler::{SceneHandles, assemble, tree_prefab};
pub use camera::{Camera, Ray, Viewport};
pub use geometry::{Material, Part, Prefab, Primitive};

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::sim::physics::BodyHandle;

/// Stable handle to a scene node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Local transform relative to the parent node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Light types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightKind {
    Omni,
    Ambient,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub kind: LightKind,
    pub intensity: f32,
}

/// What a node carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeContent {
    /// Grouping node
    Empty,
    Camera(Camera),
    Light(Light),
    Geometry {
        primitive: Primitive,
        material: Material,
    },
    /// Box volume that spawns decorative particles
    Emitter { half_extents: Vec3 },
}

/// A scene node record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub parent: Option<NodeId>,
    pub transform: Transform,
    pub content: NodeContent,
    /// Hidden nodes (and their descendants) are not drawn
    pub hidden: bool,
    /// Physics body currently attached, if any
    pub body: Option<BodyHandle>,
}

impl Node {
    pub fn new(name: impl Into<String>, content: NodeContent) -> Self {
        Self {
            id: NodeId(0),
            name: name.into(),
            parent: None,
            transform: Transform::default(),
            content,
            hidden: false,
            body: None,
        }
    }

    pub fn geometry(name: impl Into<String>, primitive: Primitive, material: Material) -> Self {
        Self::new(
            name,
            NodeContent::Geometry {
                primitive,
                material,
            },
        )
    }

    pub fn at(mut self, translation: Vec3) -> Self {
        self.transform.translation = translation;
        self
    }

    pub fn rotated(mut self, rotation: Quat) -> Self {
        self.transform.rotation = rotation;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// The scene: root-level mutable state owning every node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// Sorted by id (ids are allocated increasing and never reused)
    nodes: Vec<Node>,
    next_id: u32,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub const ROOT: NodeId = NodeId(0);

    pub fn new() -> Self {
        let mut root = Node::new("root", NodeContent::Empty);
        root.id = Self::ROOT;
        Self {
            nodes: vec![root],
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn index_of(&self, id: NodeId) -> Option<usize> {
        self.nodes.binary_search_by_key(&id, |n| n.id).ok()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        let i = self.index_of(id)?;
        Some(&self.nodes[i])
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let i = self.index_of(id)?;
        Some(&mut self.nodes[i])
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Add `node` under `parent`. A missing parent falls back to the root.
    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        let parent = if self.contains(parent) {
            parent
        } else {
            log::warn!("Parent {:?} missing, attaching '{}' to root", parent, node.name);
            Self::ROOT
        };
        let id = NodeId(self.next_id);
        self.next_id += 1;
        node.id = id;
        node.parent = Some(parent);
        self.nodes.push(node);
        id
    }

    /// Direct children of `id`, in creation order
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter(move |n| n.parent == Some(id))
            .map(|n| n.id)
    }

    /// Remove `id` and all of its descendants, returning the removed records.
    /// The root cannot be removed.
    pub fn remove_subtree(&mut self, id: NodeId) -> Vec<Node> {
        if id == Self::ROOT || !self.contains(id) {
            return Vec::new();
        }

        // Parents always have smaller ids than their children, so one ordered
        // pass collects the whole subtree.
        let mut doomed = vec![id];
        for node in &self.nodes {
            if let Some(parent) = node.parent {
                if doomed.contains(&parent) && !doomed.contains(&node.id) {
                    doomed.push(node.id);
                }
            }
        }

        let (removed, kept): (Vec<Node>, Vec<Node>) = std::mem::take(&mut self.nodes)
            .into_iter()
            .partition(|n| doomed.contains(&n.id));
        self.nodes = kept;
        removed
    }

    /// Clone a prefab under `parent`: one grouping node plus one child per part
    pub fn instantiate(&mut self, prefab: &Prefab, parent: NodeId, translation: Vec3) -> NodeId {
        let group = self.add_child(
            parent,
            Node::new(prefab.name.clone(), NodeContent::Empty).at(translation),
        );
        for (i, part) in prefab.parts.iter().enumerate() {
            self.add_child(
                group,
                Node::geometry(format!("{}.{}", prefab.name, i), part.primitive, part.material)
                    .at(part.offset),
            );
        }
        group
    }

    /// World matrix composed from the root down to `id`
    pub fn world_transform(&self, id: NodeId) -> Option<Mat4> {
        let mut node = self.get(id)?;
        let mut matrix = node.transform.matrix();
        while let Some(parent) = node.parent {
            node = self.get(parent)?;
            matrix = node.transform.matrix() * matrix;
        }
        Some(matrix)
    }

    pub fn world_position(&self, id: NodeId) -> Option<Vec3> {
        self.world_transform(id)
            .map(|m| m.transform_point3(Vec3::ZERO))
    }

    /// True if the node or any ancestor is hidden
    pub fn is_hidden(&self, id: NodeId) -> bool {
        let mut current = self.get(id);
        while let Some(node) = current {
            if node.hidden {
                return true;
            }
            current = node.parent.and_then(|p| self.get(p));
        }
        false
    }

    pub fn set_position(&mut self, id: NodeId, translation: Vec3) {
        if let Some(node) = self.get_mut(id) {
            node.transform.translation = translation;
        }
    }

    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) {
        if let Some(node) = self.get_mut(id) {
            node.hidden = hidden;
        }
    }
}
