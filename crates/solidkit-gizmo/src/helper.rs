//! The helper scene: gizmos and other overlays rendered in a separate pass.
//!
//! Nodes live in an arena and refer to their parent by [`NodeId`]. A node is
//! visible when it and all of its ancestors are attached.

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Node {
    name: String,
    parent: Option<NodeId>,
    attached: bool,
}

#[derive(Debug, Default)]
pub struct HelperScene {
    nodes: Vec<Option<Node>>,
}

impl HelperScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached root node.
    pub fn create(&mut self, name: impl Into<String>) -> NodeId {
        self.insert(name.into(), None)
    }

    /// Create an attached child. Returns `None` if `parent` does not exist.
    pub fn create_child(&mut self, parent: NodeId, name: impl Into<String>) -> Option<NodeId> {
        self.node(parent)?;
        let id = self.insert(name.into(), Some(parent));
        self.attach(id);
        Some(id)
    }

    fn insert(&mut self, name: String, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node {
            name,
            parent,
            attached: false,
        }));
        id
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn attach(&mut self, id: NodeId) {
        if let Some(node) = self.node_mut(id) {
            node.attached = true;
        }
    }

    pub fn detach(&mut self, id: NodeId) {
        if let Some(node) = self.node_mut(id) {
            node.attached = false;
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.node(id).map(|n| n.name.as_str())
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| match n {
                Some(node) if node.parent == Some(id) => Some(NodeId(i)),
                _ => None,
            })
            .collect()
    }

    /// Attached root nodes, i.e. what the overlay pass draws.
    pub fn roots(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| match n {
                Some(node) if node.parent.is_none() && node.attached => Some(NodeId(i)),
                _ => None,
            })
            .collect()
    }

    pub fn is_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(id) = current {
            match self.node(id) {
                Some(node) if node.attached => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    /// Remove a node and its whole subtree.
    pub fn remove(&mut self, id: NodeId) {
        for child in self.children(id) {
            self.remove(child);
        }
        if let Some(slot) = self.nodes.get_mut(id.0) {
            *slot = None;
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 2D overlay feedback shown while a gizmo is being dragged.
pub trait GizmoHelper: std::fmt::Debug {
    fn on_start(&mut self, center: Vec2);
    fn on_move(&mut self, position: Vec2);
    fn on_end(&mut self);
}

/// A dashed line from the gizmo's projected center to the pointer.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DashedLineHelper {
    pub from: Option<Vec2>,
    pub to: Option<Vec2>,
}

impl GizmoHelper for DashedLineHelper {
    fn on_start(&mut self, center: Vec2) {
        self.from = Some(center);
        self.to = Some(center);
    }

    fn on_move(&mut self, position: Vec2) {
        if self.from.is_some() {
            self.to = Some(position);
        }
    }

    fn on_end(&mut self) {
        self.from = None;
        self.to = None;
    }
}
