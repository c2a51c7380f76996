//! Structure graph builder.
//!
//! Walks a dialect-neutral description of a structure tree once, assigning
//! every reachable node a path (`""` for the root, then `/ordinal` per level),
//! resolving member canvas references and child references, and recording
//! which structures contain each canvas.
//!
//! Child references may name a node that is reachable from more than one
//! parent (malformed but common in the wild). The policy is first-parent-wins:
//! the first parent to reach a node during traversal adopts it, later
//! references to it are skipped, and every node is visited exactly once.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::Canvas;

/// Handle to a structure inside a [`StructureGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StructureId(usize);

impl StructureId {
    /// Position of the structure in traversal order.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for StructureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A container node (chapter, section, range, manifestation).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    /// Document identifier, when the dialect has one.
    pub id: Option<String>,
    /// Display label.
    pub label: String,
    /// Structure type (legacy `sectionType`, after section mappings).
    pub structure_type: Option<String>,
    /// Viewing hint (e.g. `top`).
    pub viewing_hint: Option<String>,
    /// Position in the tree: `""` for the root, `/0/2` for the third child
    /// of the root's first child.
    pub path: String,
    /// Adopting parent; `None` for the root.
    pub parent: Option<StructureId>,
    /// Adopted children in reference order.
    pub children: Vec<StructureId>,
    /// Member canvas indices; `None` marks a reference that did not resolve.
    pub canvases: Vec<Option<usize>>,
    /// Sequence owned by this node (legacy manifestations).
    pub sequence: Option<usize>,
}

/// The normalized structure tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructureGraph {
    structures: Vec<Structure>,
    root: Option<StructureId>,
}

impl StructureGraph {
    /// Root structure, if the document declares any structure.
    #[must_use]
    pub fn root(&self) -> Option<StructureId> {
        self.root
    }

    /// Structure by handle.
    #[must_use]
    pub fn get(&self, id: StructureId) -> Option<&Structure> {
        self.structures.get(id.0)
    }

    /// All structures in traversal (pre-)order.
    pub fn iter(&self) -> impl Iterator<Item = (StructureId, &Structure)> {
        self.structures
            .iter()
            .enumerate()
            .map(|(i, s)| (StructureId(i), s))
    }

    /// Children of a structure.
    pub fn children(&self, id: StructureId) -> impl Iterator<Item = (StructureId, &Structure)> {
        self.get(id)
            .map(|s| s.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|&child| self.get(child).map(|s| (child, s)))
    }

    /// Structure whose path equals `path`.
    #[must_use]
    pub fn by_path(&self, path: &str) -> Option<StructureId> {
        self.iter().find(|(_, s)| s.path == path).map(|(id, _)| id)
    }

    /// Structure whose document identifier equals `id`.
    #[must_use]
    pub fn by_id(&self, id: &str) -> Option<StructureId> {
        self.iter()
            .find(|(_, s)| s.id.as_deref() == Some(id))
            .map(|(sid, _)| sid)
    }

    /// Structure owning the given sequence index.
    #[must_use]
    pub fn owner_of_sequence(&self, sequence: usize) -> Option<StructureId> {
        self.iter()
            .find(|(_, s)| s.sequence == Some(sequence))
            .map(|(id, _)| id)
    }

    /// Number of reachable structures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.structures.len()
    }

    /// Whether the graph has no structures.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }
}

/// A member canvas reference as written in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberRef {
    /// Canvas identifier.
    Id(String),
    /// Canvas position in the sequence.
    Index(usize),
    /// Something that cannot name a canvas.
    Missing,
}

/// A child structure reference as written in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildRef {
    /// Structure identifier, looked up in the by-id index.
    Id(String),
    /// Position in the raw node list (embedded object).
    Node(usize),
    /// Something that cannot name a structure.
    Missing,
}

/// Dialect-neutral raw structure node fed to the builder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawNode {
    /// Document identifier.
    pub id: Option<String>,
    /// Display label.
    pub label: String,
    /// Structure type.
    pub structure_type: Option<String>,
    /// Viewing hint.
    pub viewing_hint: Option<String>,
    /// Member canvas references.
    pub members: Vec<MemberRef>,
    /// Child structure references.
    pub children: Vec<ChildRef>,
    /// Sequence owned by this node.
    pub sequence: Option<usize>,
}

/// Builds a [`StructureGraph`] from raw nodes in one pass.
#[derive(Debug)]
pub struct GraphBuilder<'a> {
    nodes: &'a [RawNode],
    by_id: HashMap<&'a str, usize>,
    parented: Vec<bool>,
    output: Vec<Structure>,
}

impl<'a> GraphBuilder<'a> {
    /// Create a builder over `nodes`. The first node carrying a given id wins
    /// the by-id index.
    #[must_use]
    pub fn new(nodes: &'a [RawNode]) -> Self {
        let mut by_id = HashMap::new();
        for (i, node) in nodes.iter().enumerate() {
            if let Some(id) = node.id.as_deref() {
                by_id.entry(id).or_insert(i);
            }
        }

        Self {
            nodes,
            by_id,
            parented: vec![false; nodes.len()],
            output: Vec::new(),
        }
    }

    /// Walk the tree from `root`, appending back-references to `canvases`.
    ///
    /// Canvas back-reference lists are cleared first so that repeated builds
    /// over the same canvases produce identical results.
    #[must_use]
    pub fn build(mut self, root: usize, canvases: &mut [Canvas]) -> StructureGraph {
        for canvas in canvases.iter_mut() {
            canvas.structures.clear();
        }

        if root >= self.nodes.len() {
            return StructureGraph::default();
        }

        let mut canvas_ids: HashMap<String, usize> = HashMap::new();
        for (index, canvas) in canvases.iter().enumerate() {
            if let Some(id) = &canvas.id {
                canvas_ids.entry(id.clone()).or_insert(index);
            }
        }

        self.parented[root] = true;
        let root_id = self.visit(root, String::new(), None, &canvas_ids, canvases);

        tracing::debug!(structures = self.output.len(), "structure graph built");

        StructureGraph {
            structures: self.output,
            root: Some(root_id),
        }
    }

    fn visit(
        &mut self,
        node_index: usize,
        path: String,
        parent: Option<StructureId>,
        canvas_ids: &HashMap<String, usize>,
        canvases: &mut [Canvas],
    ) -> StructureId {
        let nodes = self.nodes;
        let node = &nodes[node_index];
        let id = StructureId(self.output.len());

        let members: Vec<Option<usize>> = node
            .members
            .iter()
            .map(|member| resolve_member(member, canvas_ids, canvases.len()))
            .collect();

        for (slot, member) in members.iter().zip(&node.members) {
            match slot {
                Some(index) => canvases[*index].structures.push(id),
                None => tracing::warn!(path = %path, reference = ?member, "unresolved canvas reference"),
            }
        }

        self.output.push(Structure {
            id: node.id.clone(),
            label: node.label.clone(),
            structure_type: node.structure_type.clone(),
            viewing_hint: node.viewing_hint.clone(),
            path: path.clone(),
            parent,
            children: Vec::new(),
            canvases: members,
            sequence: node.sequence,
        });

        for (ordinal, child) in node.children.iter().enumerate() {
            let Some(child_index) = self.resolve_child(child) else {
                tracing::warn!(path = %path, reference = ?child, "unresolved structure reference");
                continue;
            };

            if self.parented[child_index] {
                tracing::debug!(path = %path, ordinal, "structure already has a parent, skipping");
                continue;
            }
            self.parented[child_index] = true;

            let child_path = format!("{path}/{ordinal}");
            let child_id = self.visit(child_index, child_path, Some(id), canvas_ids, canvases);
            self.output[id.0].children.push(child_id);
        }

        id
    }

    fn resolve_child(&self, child: &ChildRef) -> Option<usize> {
        match child {
            ChildRef::Id(id) => self.by_id.get(id.as_str()).copied(),
            ChildRef::Node(index) if *index < self.nodes.len() => Some(*index),
            ChildRef::Node(_) | ChildRef::Missing => None,
        }
    }
}

fn resolve_member(
    member: &MemberRef,
    canvas_ids: &HashMap<String, usize>,
    total: usize,
) -> Option<usize> {
    match member {
        MemberRef::Id(id) => canvas_ids.get(id).copied(),
        MemberRef::Index(index) if *index < total => Some(*index),
        MemberRef::Index(_) | MemberRef::Missing => None,
    }
}
