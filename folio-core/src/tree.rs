//! Presentation-facing navigation tree.
//!
//! A [`Tree`] mirrors the structure graph (plus a synthetic root) so that the
//! presentation layer never inspects dialect-specific fields. Nodes live in an
//! arena and refer to each other by [`TreeNodeId`]; the `data` handle on each
//! node points back at the structure it mirrors without owning it.

use serde::{Deserialize, Serialize};

use crate::graph::StructureId;

/// Handle to a node inside a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeNodeId(usize);

impl TreeNodeId {
    /// Arena position.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Whether a node mirrors a manifest-level or a structure-level entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Manifest / manifestation level.
    Manifest,
    /// Structure / range / section level.
    Structure,
}

/// What a node's data handle points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "graph", content = "id", rename_all = "lowercase")]
pub enum NodeTarget {
    /// A structure in the active sequence's structure graph.
    Structure(StructureId),
    /// A node of the legacy manifestation graph.
    Manifestation(StructureId),
    /// The active sequence itself, for documents without structures.
    Sequence(usize),
}

/// Typed, non-owning reference from a tree node to its model entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNodeData {
    /// Level tag.
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Mirrored entity.
    pub target: NodeTarget,
}

impl TreeNodeData {
    /// Data for a manifest-level node.
    #[must_use]
    pub fn manifest(target: NodeTarget) -> Self {
        Self {
            kind: NodeKind::Manifest,
            target,
        }
    }

    /// Data for a structure-level node.
    #[must_use]
    pub fn structure(id: StructureId) -> Self {
        Self {
            kind: NodeKind::Structure,
            target: NodeTarget::Structure(id),
        }
    }
}

/// A labelled tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Display label.
    pub label: String,
    /// Parent node; `None` for the root.
    pub parent: Option<TreeNodeId>,
    /// Children in insertion order.
    pub children: Vec<TreeNodeId>,
    /// Mirrored entity.
    pub data: Option<TreeNodeData>,
    /// Whether the node is selected.
    pub selected: bool,
    /// Whether the node is expanded.
    pub expanded: bool,
}

impl TreeNode {
    fn new(label: impl Into<String>, parent: Option<TreeNodeId>) -> Self {
        Self {
            label: label.into(),
            parent,
            children: Vec::new(),
            data: None,
            selected: false,
            expanded: false,
        }
    }
}

/// Arena-backed n-ary tree with a single root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<TreeNode>,
}

impl Tree {
    /// Create a tree holding only a root with the given label.
    #[must_use]
    pub fn new(root_label: impl Into<String>) -> Self {
        Self {
            nodes: vec![TreeNode::new(root_label, None)],
        }
    }

    /// The root node handle.
    #[must_use]
    pub fn root(&self) -> TreeNodeId {
        TreeNodeId(0)
    }

    /// Append a child under `parent` and return its handle.
    ///
    /// Returns `None` if `parent` does not belong to this tree.
    pub fn add_node(&mut self, parent: TreeNodeId, label: impl Into<String>) -> Option<TreeNodeId> {
        if parent.0 >= self.nodes.len() {
            return None;
        }
        let id = TreeNodeId(self.nodes.len());
        self.nodes.push(TreeNode::new(label, Some(parent)));
        self.nodes[parent.0].children.push(id);
        Some(id)
    }

    /// Node by handle.
    #[must_use]
    pub fn get(&self, id: TreeNodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0)
    }

    /// Mutable node by handle.
    pub fn get_mut(&mut self, id: TreeNodeId) -> Option<&mut TreeNode> {
        self.nodes.get_mut(id.0)
    }

    /// Children of a node.
    pub fn children(&self, id: TreeNodeId) -> impl Iterator<Item = (TreeNodeId, &TreeNode)> {
        self.get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|&child| self.get(child).map(|n| (child, n)))
    }

    /// All nodes in insertion order (the root first).
    pub fn iter(&self) -> impl Iterator<Item = (TreeNodeId, &TreeNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (TreeNodeId(i), n))
    }

    /// Number of ancestors between `id` and the root.
    #[must_use]
    pub fn depth(&self, id: TreeNodeId) -> usize {
        let mut depth = 0;
        let mut current = self.get(id).and_then(|n| n.parent);
        while let Some(parent) = current {
            depth += 1;
            current = self.get(parent).and_then(|n| n.parent);
        }
        depth
    }

    /// Node mirroring the given entity.
    #[must_use]
    pub fn find_by_target(&self, target: NodeTarget) -> Option<TreeNodeId> {
        self.iter()
            .find(|(_, n)| n.data.is_some_and(|d| d.target == target))
            .map(|(id, _)| id)
    }

    /// First selected node.
    #[must_use]
    pub fn selected(&self) -> Option<TreeNodeId> {
        self.iter().find(|(_, n)| n.selected).map(|(id, _)| id)
    }

    /// Number of nodes, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree has at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_node_links_parent_and_child() {
        let mut tree = Tree::new("root");
        let root = tree.root();
        let a = tree.add_node(root, "a").unwrap();
        let b = tree.add_node(a, "b").unwrap();

        assert_eq!(tree.get(b).unwrap().parent, Some(a));
        assert_eq!(tree.get(root).unwrap().children, vec![a]);
        assert_eq!(tree.depth(b), 2);
        assert_eq!(tree.depth(root), 0);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn add_node_rejects_foreign_parent() {
        let mut tree = Tree::new("root");
        assert!(tree.add_node(TreeNodeId(7), "x").is_none());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn children_preserve_insertion_order() {
        let mut tree = Tree::new("root");
        let root = tree.root();
        for label in ["one", "two", "three"] {
            tree.add_node(root, label);
        }
        let labels: Vec<_> = tree.children(root).map(|(_, n)| n.label.as_str()).collect();
        assert_eq!(labels, vec!["one", "two", "three"]);
    }

    #[test]
    fn find_by_target_locates_mirrored_structure() {
        let graph_json = r#"{"structures":[{"id":null,"label":"","structure_type":null,"viewing_hint":null,"path":"","parent":null,"children":[],"canvases":[],"sequence":null}],"root":0}"#;
        let graph: crate::graph::StructureGraph = serde_json::from_str(graph_json).unwrap();
        let root_structure = graph.root().unwrap();

        let mut tree = Tree::new("root");
        let node = tree.add_node(tree.root(), "chapter").unwrap();
        tree.get_mut(node).unwrap().data = Some(TreeNodeData::structure(root_structure));

        assert_eq!(
            tree.find_by_target(NodeTarget::Structure(root_structure)),
            Some(node)
        );
        assert_eq!(
            tree.find_by_target(NodeTarget::Manifestation(root_structure)),
            None
        );
    }

    #[test]
    fn node_data_serializes_with_type_tag() {
        let mut tree = Tree::new("root");
        let root = tree.root();
        let root_node = tree.get_mut(root).unwrap();
        root_node.selected = true;
        root_node.data = Some(TreeNodeData::manifest(NodeTarget::Manifestation(
            serde_json::from_str("0").unwrap(),
        )));
        assert_eq!(tree.selected(), Some(root));

        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["nodes"][0]["label"], "root");
        assert_eq!(json["nodes"][0]["selected"], true);
        assert_eq!(json["nodes"][0]["data"]["type"], "manifest");
        assert_eq!(json["nodes"][0]["data"]["target"]["graph"], "manifestation");
        assert_eq!(json["nodes"][0]["data"]["target"]["id"], 0);
    }
}
