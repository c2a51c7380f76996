//! Provider for `assetSequences`/`assets`/`rootSection` packages.

use serde_json::Value;

use super::{DocumentProvider, ProviderCore};
use crate::error::{ViewerError, ViewerResult};
use crate::graph::{ChildRef, GraphBuilder, MemberRef, RawNode, StructureGraph, StructureId};
use crate::model::{Canvas, MetadataItem, SequenceModel, Thumb, ViewingDirection};
use crate::schema::{Asset, AssetRef, AssetSequence, Dialect, Document, LegacyPackage, Manifestation, Section};
use crate::settings::{Settings, ViewerContext};
use crate::tree::{NodeTarget, Tree, TreeNodeData, TreeNodeId};

/// `seeAlso.tag` that marks an externally opened resource.
const OPEN_EXTERNAL_TAG: &str = "OpenExternal";

/// Provider over a dialect-B package.
#[derive(Debug)]
pub struct LegacyProvider {
    package: LegacyPackage,
    core: ProviderCore,
}

impl LegacyProvider {
    /// Wrap a package and load `sequence_index`.
    ///
    /// # Errors
    ///
    /// Fails when the sequence index is out of range or still a stub.
    pub fn new(
        package: LegacyPackage,
        settings: Settings,
        context: ViewerContext,
        sequence_index: usize,
    ) -> ViewerResult<Self> {
        let mut provider = Self {
            package,
            core: ProviderCore::new(settings, context, sequence_index),
        };
        provider.load()?;
        Ok(provider)
    }

    /// The raw package.
    #[must_use]
    pub fn package(&self) -> &LegacyPackage {
        &self.package
    }

    fn root_section(&self) -> Option<&Section> {
        self.package
            .sequence(self.core.sequence_index)
            .and_then(|s| s.root_section.as_ref())
    }

    fn normalize(&self) -> ViewerResult<(SequenceModel, Option<StructureGraph>)> {
        let index = self.core.sequence_index;
        let len = self.sequence_count();
        let sequence = self
            .package
            .sequence(index)
            .ok_or(ViewerError::SequenceOutOfRange { index, len })?;
        if sequence.is_stub() {
            return Err(ViewerError::UnresolvedSequence(index));
        }

        let manifestations = self.package.root_structure.as_ref().map(|root| {
            let mut nodes = vec![RawNode::default()];
            let node = manifestation_node(root, &mut nodes);
            nodes[0] = node;
            GraphBuilder::new(&nodes).build(0, &mut [])
        });

        let mut canvases: Vec<Canvas> = sequence.assets.iter().enumerate().map(to_canvas).collect();
        let graph = match &sequence.root_section {
            Some(root) => {
                let mut nodes = vec![RawNode::default()];
                let node = section_node(root, self.settings(), &mut nodes);
                nodes[0] = node;
                GraphBuilder::new(&nodes).build(0, &mut canvases)
            }
            None => StructureGraph::default(),
        };

        let model = SequenceModel {
            canvases,
            graph,
            viewing_direction: ViewingDirection::from_hint(sequence.viewing_direction.as_deref()),
            paged: false,
            start_canvas: None,
        };
        Ok((model, manifestations))
    }
}

fn to_canvas((index, asset): (usize, &Asset)) -> Canvas {
    Canvas {
        index,
        id: None,
        label: asset.order_label.clone().unwrap_or_default(),
        width: asset.width,
        height: asset.height,
        image_service: None,
        file_uri: asset.file_uri.clone(),
        dzi_uri: asset.dzi_uri.clone(),
        media_uri: asset.media_uri.clone(),
        structures: Vec::new(),
    }
}

fn manifestation_node(manifestation: &Manifestation, nodes: &mut Vec<RawNode>) -> RawNode {
    let mut children = Vec::with_capacity(manifestation.structures.len());
    for child in &manifestation.structures {
        let node = manifestation_node(child, nodes);
        nodes.push(node);
        children.push(ChildRef::Node(nodes.len() - 1));
    }

    RawNode {
        id: None,
        label: manifestation.name.clone().unwrap_or_default(),
        structure_type: manifestation.section_type.clone(),
        viewing_hint: None,
        members: Vec::new(),
        children,
        sequence: manifestation.asset_sequence,
    }
}

fn section_node(section: &Section, settings: &Settings, nodes: &mut Vec<RawNode>) -> RawNode {
    let mut children = Vec::with_capacity(section.sections.len());
    for child in &section.sections {
        let node = section_node(child, settings, nodes);
        nodes.push(node);
        children.push(ChildRef::Node(nodes.len() - 1));
    }

    let section_type = section
        .section_type
        .as_deref()
        .map(|raw| settings.map_section_type(raw));

    RawNode {
        id: None,
        label: section_type.clone().unwrap_or_default(),
        structure_type: section_type,
        viewing_hint: None,
        members: section
            .assets
            .iter()
            .map(|asset| match asset {
                AssetRef::Index(i) => MemberRef::Index(*i),
                AssetRef::Other(_) => MemberRef::Missing,
            })
            .collect(),
        children,
        sequence: None,
    }
}

impl DocumentProvider for LegacyProvider {
    fn dialect(&self) -> Dialect {
        Dialect::Legacy
    }

    fn core(&self) -> &ProviderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ProviderCore {
        &mut self.core
    }

    fn load(&mut self) -> ViewerResult<()> {
        let (model, manifestations) = self.normalize()?;
        self.package.scrub_stubs(self.core.sequence_index);

        tracing::debug!(
            sequence = self.core.sequence_index,
            assets = model.total(),
            sections = model.graph.len(),
            "package loaded"
        );

        self.core.install(model, manifestations);
        Ok(())
    }

    fn replace_document(&mut self, document: Document, sequence_index: usize) -> ViewerResult<()> {
        let Document::Legacy(package) = document else {
            return Err(ViewerError::DialectMismatch {
                expected: Dialect::Legacy,
                found: document.dialect(),
            });
        };

        let mut replacement = Self {
            package,
            core: self.core.fork(sequence_index),
        };
        replacement.load()?;
        *self = replacement;
        Ok(())
    }

    fn sequence_count(&self) -> usize {
        self.package.asset_sequences.as_ref().map_or(0, Vec::len)
    }

    fn title(&self) -> Option<String> {
        self.root_section().and_then(|s| s.title.clone())
    }

    fn attribution(&self) -> Option<String> {
        self.package.attribution.clone()
    }

    fn license(&self) -> Option<String> {
        self.package.license.clone()
    }

    fn logo(&self) -> Option<String> {
        self.package.logo.clone()
    }

    fn see_also(&self) -> Option<Value> {
        self.package
            .sequence(self.core.sequence_index)
            .and_then(|s| s.see_also.clone())
    }

    fn manifest_see_also_uri(&self) -> Option<String> {
        let see_also = self.package.see_also.as_ref()?;
        if see_also.get("tag").and_then(Value::as_str) != Some(OPEN_EXTERNAL_TAG) {
            return None;
        }
        let data = see_also.get("data").and_then(Value::as_str)?;
        Some(self.media_uri(data))
    }

    fn metadata(&self, _include_root_properties: bool) -> Vec<MetadataItem> {
        Vec::new()
    }

    fn manifest_type(&self) -> String {
        self.root_section()
            .and_then(|s| s.section_type.as_deref())
            .map(|raw| self.settings().map_section_type(raw).to_lowercase())
            .unwrap_or_default()
    }

    fn sequence_type(&self) -> String {
        self.package
            .sequence(self.core.sequence_index)
            .and_then(|s| s.asset_type.as_deref())
            .map(|t| t.replacen('/', "-", 1))
            .unwrap_or_default()
    }

    fn build_tree(&self) -> Tree {
        let mut tree = Tree::new("root");
        let root = tree.root();

        let mut sections_root = None;
        if let Some(graph) = self.core.manifestations() {
            if let Some(manifestation) = graph.root() {
                let owner = graph.owner_of_sequence(self.core.sequence_index);
                add_manifestation(&mut tree, root, graph, manifestation, owner, &mut sections_root);
            }
        }

        let graph = &self.core.model().graph;
        let Some(section_root) = graph.root() else {
            if let Some(node) = tree.get_mut(root) {
                node.data.get_or_insert(TreeNodeData::manifest(NodeTarget::Sequence(
                    self.core.sequence_index,
                )));
            }
            return tree;
        };

        let sections_root = sections_root.unwrap_or_else(|| {
            if let Some(node) = tree.get_mut(root) {
                node.data = Some(TreeNodeData::structure(section_root));
            }
            root
        });

        add_section_children(&mut tree, sections_root, graph, section_root);
        tree
    }

    fn thumb_uri(&self, _canvas: &Canvas, _width: u32, _height: u32) -> Option<String> {
        None
    }

    fn thumbs(&self, _width: u32, _height: u32) -> Vec<Thumb> {
        Vec::new()
    }

    fn image_uri(&self, canvas: &Canvas) -> Option<String> {
        canvas
            .dzi_uri
            .as_deref()
            .map(|path| self.settings().dzi_uri(path))
    }

    fn poster_image_uri(&self) -> Option<String> {
        self.package
            .sequence(self.core.sequence_index)
            .and_then(AssetSequence::poster_image)
            .map(|path| self.media_uri(path))
    }
}

/// Fill `node` from a manifestation and recurse. The manifestation owning the
/// active sequence becomes the parent of the section nodes.
fn add_manifestation(
    tree: &mut Tree,
    node: TreeNodeId,
    graph: &StructureGraph,
    manifestation: StructureId,
    owner: Option<StructureId>,
    sections_root: &mut Option<TreeNodeId>,
) {
    let Some(structure) = graph.get(manifestation) else {
        return;
    };

    let owns_sequence = owner == Some(manifestation);
    if let Some(tree_node) = tree.get_mut(node) {
        tree_node.label = if structure.label.is_empty() {
            "root".to_string()
        } else {
            structure.label.clone()
        };
        tree_node.data = Some(TreeNodeData::manifest(NodeTarget::Manifestation(manifestation)));
        if owns_sequence {
            tree_node.selected = true;
            tree_node.expanded = true;
        }
    }
    if owns_sequence {
        *sections_root = Some(node);
    }

    for &child in &structure.children {
        if let Some(child_node) = tree.add_node(node, "") {
            add_manifestation(tree, child_node, graph, child, owner, sections_root);
        }
    }
}

fn add_section_children(tree: &mut Tree, parent: TreeNodeId, graph: &StructureGraph, section: StructureId) {
    let children: Vec<_> = graph.children(section).map(|(id, s)| (id, s.label.clone())).collect();
    for (child, label) in children {
        let Some(node) = tree.add_node(parent, label) else {
            continue;
        };
        if let Some(tree_node) = tree.get_mut(node) {
            tree_node.data = Some(TreeNodeData::structure(child));
        }
        add_section_children(tree, node, graph, child);
    }
}
