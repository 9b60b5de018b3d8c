//! In-memory scene hierarchy driven by the build and test phases.
//!
//! `SceneGraph` is the stand-in for an engine's node tree: nodes own a local
//! pose, optional render colour, optional physics body and piece tags, and are
//! arranged in ordered parent/child lists. The orchestrator only ever talks to
//! the structure through this type, and the physics layer is expected to move
//! or destroy nodes between ticks.

mod hierarchy;
mod pose;
mod tags;
mod template;

pub use hierarchy::{depth_first, walk_depth_first, Hierarchy};
pub use pose::Pose;
pub use tags::{BuildIndex, PieceTags};
pub use template::{Body, BodyKind, NodeTemplate};

use hashbrown::HashMap;
use serde::Serialize;

/// Identifier of a node within a [`SceneGraph`]; never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Returns the raw identifier.
    #[must_use]
    pub const fn into_inner(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    local: Pose,
    tags: PieceTags,
    active: bool,
    color: Option<[f32; 4]>,
    body: Option<Body>,
}

impl Node {
    fn new(name: String, parent: Option<NodeId>) -> Self {
        Self {
            name,
            parent,
            children: Vec::new(),
            local: Pose::IDENTITY,
            tags: PieceTags::default(),
            active: true,
            color: None,
            body: None,
        }
    }
}

/// Arena of scene nodes with ordered parent/child links.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: HashMap<NodeId, Node>,
    next_id: u64,
}

impl SceneGraph {
    /// Creates an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the scene holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds an empty node, appended to `parent`'s children when given.
    ///
    /// A dead `parent` leaves the new node at the top level.
    pub fn spawn(&mut self, name: impl Into<String>, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        let parent = parent.filter(|p| self.nodes.contains_key(p));
        self.nodes.insert(id, Node::new(name.into(), parent));
        if let Some(node) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            node.children.push(id);
        }
        id
    }

    /// Clones `template` and its sub-nodes under `parent`.
    ///
    /// The instance starts inactive so callers can finish positioning and
    /// tagging it before it becomes visible to physics.
    pub fn instantiate(&mut self, template: &NodeTemplate, parent: Option<NodeId>) -> NodeId {
        let root = self.spawn_from(template, parent);
        let mut pending: Vec<(&NodeTemplate, NodeId)> = vec![(template, root)];
        while let Some((current, id)) = pending.pop() {
            for child in &current.children {
                let child_id = self.spawn_from(child, Some(id));
                pending.push((child, child_id));
            }
        }
        self.set_active(root, false);
        root
    }

    fn spawn_from(&mut self, template: &NodeTemplate, parent: Option<NodeId>) -> NodeId {
        let id = self.spawn(template.name.clone(), parent);
        if let Some(node) = self.nodes.get_mut(&id) {
            node.local = template.local;
            node.color = template.color;
            node.body = template.body;
        }
        id
    }

    /// Whether `id` names a node that has not been destroyed.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Name given to the node at creation.
    #[must_use]
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(&id).map(|n| n.name.as_str())
    }

    /// Parent of `id`, if it has one.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    /// Direct children of `id` in order; empty for dead nodes.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
    }

    /// Number of direct children of `id`.
    #[must_use]
    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    /// Pose of `id` relative to its parent.
    #[must_use]
    pub fn local_pose(&self, id: NodeId) -> Option<Pose> {
        self.nodes.get(&id).map(|n| n.local)
    }

    /// Replaces the pose of `id` relative to its parent.
    pub fn set_local_pose(&mut self, id: NodeId, pose: Pose) -> bool {
        self.nodes.get_mut(&id).is_some_and(|n| {
            n.local = pose;
            true
        })
    }

    /// Pose of `id` in world space, composed through every ancestor.
    #[must_use]
    pub fn world_pose(&self, id: NodeId) -> Option<Pose> {
        let mut node = self.nodes.get(&id)?;
        let mut pose = node.local;
        while let Some(parent) = node.parent.and_then(|p| self.nodes.get(&p)) {
            pose = parent.local.mul_pose(pose);
            node = parent;
        }
        Some(pose)
    }

    /// Moves `id` so that its world pose equals `pose`.
    ///
    /// Returns `false` when the node no longer exists.
    pub fn set_world_pose(&mut self, id: NodeId, pose: Pose) -> bool {
        let Some(parent) = self.nodes.get(&id).map(|n| n.parent) else {
            return false;
        };
        let parent_world = parent
            .and_then(|p| self.world_pose(p))
            .unwrap_or(Pose::IDENTITY);
        self.set_local_pose(id, parent_world.inverse().mul_pose(pose))
    }

    /// Piece tags attached to `id`.
    #[must_use]
    pub fn tags(&self, id: NodeId) -> Option<&PieceTags> {
        self.nodes.get(&id).map(|n| &n.tags)
    }

    /// Mutable piece tags attached to `id`.
    pub fn tags_mut(&mut self, id: NodeId) -> Option<&mut PieceTags> {
        self.nodes.get_mut(&id).map(|n| &mut n.tags)
    }

    /// Replaces the tags of `id` wholesale.
    pub fn set_tags(&mut self, id: NodeId, tags: PieceTags) -> bool {
        self.tags_mut(id).is_some_and(|t| {
            *t = tags;
            true
        })
    }

    /// Whether `id` is active; dead nodes report `false`.
    #[must_use]
    pub fn is_active(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(|n| n.active)
    }

    /// Activates or deactivates `id`.
    pub fn set_active(&mut self, id: NodeId, active: bool) -> bool {
        self.nodes.get_mut(&id).is_some_and(|n| {
            n.active = active;
            true
        })
    }

    /// Base colour of `id`, if it renders anything.
    #[must_use]
    pub fn color(&self, id: NodeId) -> Option<[f32; 4]> {
        self.nodes.get(&id).and_then(|n| n.color)
    }

    /// Sets the base colour of `id`.
    pub fn set_color(&mut self, id: NodeId, color: [f32; 4]) -> bool {
        self.nodes.get_mut(&id).is_some_and(|n| {
            n.color = Some(color);
            true
        })
    }

    /// Physical body attached to `id`.
    #[must_use]
    pub fn body(&self, id: NodeId) -> Option<&Body> {
        self.nodes.get(&id).and_then(|n| n.body.as_ref())
    }

    /// Mutable physical body attached to `id`.
    pub fn body_mut(&mut self, id: NodeId) -> Option<&mut Body> {
        self.nodes.get_mut(&id).and_then(|n| n.body.as_mut())
    }

    /// Destroys `id` and its whole subtree, detaching it from its parent.
    ///
    /// Returns the number of nodes removed; destroying a dead node is a no-op.
    pub fn destroy(&mut self, id: NodeId) -> usize {
        let Some(parent) = self.nodes.get(&id).map(|n| n.parent) else {
            return 0;
        };
        if let Some(node) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            node.children.retain(|c| *c != id);
        }
        let mut removed = 0;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                removed += 1;
                stack.extend(node.children);
            }
        }
        removed
    }
}

impl Hierarchy for SceneGraph {
    type Node = NodeId;

    fn child_nodes(&self, node: NodeId) -> Vec<NodeId> {
        self.children(node).to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::POSE_TOLERANCE;
    use glam::{Quat, Vec3};
    use rstest::{fixture, rstest};
    use std::f32::consts::FRAC_PI_2;

    #[fixture]
    fn rotated_root() -> (SceneGraph, NodeId) {
        let mut scene = SceneGraph::new();
        let root = scene.spawn("BridgeRoot", None);
        scene.set_local_pose(
            root,
            Pose::new(Vec3::new(10.0, 1.0, 0.0), Quat::from_rotation_y(FRAC_PI_2)),
        );
        (scene, root)
    }

    #[rstest]
    fn world_pose_composes_parent(rotated_root: (SceneGraph, NodeId)) {
        let (mut scene, root) = rotated_root;
        let child = scene.spawn("Beam", Some(root));
        scene.set_local_pose(child, Pose::from_xyz(0.0, 0.0, 2.0));
        let world = scene.world_pose(child).expect("child should be alive");
        assert!(world
            .translation
            .abs_diff_eq(Vec3::new(12.0, 1.0, 0.0), POSE_TOLERANCE));
    }

    #[rstest]
    fn set_world_pose_round_trips_under_rotated_parent(rotated_root: (SceneGraph, NodeId)) {
        let (mut scene, root) = rotated_root;
        let child = scene.spawn("Deck", Some(root));
        let target = Pose::new(Vec3::new(-3.0, 4.0, 7.0), Quat::from_rotation_z(0.3));
        assert!(scene.set_world_pose(child, target));
        let world = scene.world_pose(child).expect("child should be alive");
        assert!(world.abs_diff_eq(&target, POSE_TOLERANCE));
    }

    #[rstest]
    fn destroy_removes_subtree_and_detaches() {
        let mut scene = SceneGraph::new();
        let root = scene.spawn("root", None);
        let piece = scene.spawn("piece", Some(root));
        let bolt = scene.spawn("bolt", Some(piece));
        let other = scene.spawn("other", Some(root));

        assert_eq!(scene.destroy(piece), 2);
        assert!(!scene.is_alive(piece));
        assert!(!scene.is_alive(bolt));
        assert_eq!(scene.children(root), &[other]);
        assert_eq!(scene.destroy(piece), 0);
    }

    #[rstest]
    fn instantiate_clones_subtree_inactive() {
        let mut scene = SceneGraph::new();
        let root = scene.spawn("root", None);
        let template = NodeTemplate::new("Beam_Runtime")
            .with_body(Body::dynamic(40.0))
            .with_child(NodeTemplate::new("mesh").with_color([1.0, 0.0, 0.0, 1.0]));

        let instance = scene.instantiate(&template, Some(root));

        assert_eq!(scene.parent(instance), Some(root));
        assert!(!scene.is_active(instance));
        assert_eq!(scene.name(instance), Some("Beam_Runtime"));
        assert_eq!(scene.body(instance).map(|b| b.kind), Some(BodyKind::Dynamic));
        let mesh = scene.children(instance).first().copied().expect("mesh child");
        assert_eq!(scene.color(mesh), Some([1.0, 0.0, 0.0, 1.0]));
    }

    #[rstest]
    fn dead_parent_spawns_at_top_level() {
        let mut scene = SceneGraph::new();
        let gone = scene.spawn("gone", None);
        scene.destroy(gone);
        let orphan = scene.spawn("orphan", Some(gone));
        assert_eq!(scene.parent(orphan), None);
    }

    #[rstest]
    fn queries_on_dead_nodes_are_empty() {
        let mut scene = SceneGraph::new();
        let id = scene.spawn("temp", None);
        scene.destroy(id);
        assert!(scene.world_pose(id).is_none());
        assert!(scene.children(id).is_empty());
        assert!(!scene.set_world_pose(id, Pose::IDENTITY));
        assert!(scene.tags(id).is_none());
    }
}
