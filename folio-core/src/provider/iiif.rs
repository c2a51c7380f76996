//! Provider for `sequences`/`canvases`/`structures` manifests.

use serde_json::Value;

use super::{DocumentProvider, ProviderCore};
use crate::error::{ViewerError, ViewerResult};
use crate::graph::{ChildRef, GraphBuilder, MemberRef, RawNode, StructureGraph, StructureId};
use crate::model::{Canvas, MetadataItem, SequenceModel, Thumb, ViewingDirection};
use crate::schema::{text_of, CanvasRef, Dialect, Document, IiifCanvas, IiifManifest, IiifRange, RangeRef};
use crate::settings::{Settings, ViewerContext};
use crate::tree::{NodeTarget, Tree, TreeNodeData, TreeNodeId};

/// Sequence type reported for image manifests.
pub const SEQUENCE_TYPE: &str = "seadragon-iiif";

/// Manifest type reported for image manifests.
pub const MANIFEST_TYPE: &str = "monograph";

/// Provider over a dialect-A manifest.
#[derive(Debug)]
pub struct IiifProvider {
    manifest: IiifManifest,
    core: ProviderCore,
}

impl IiifProvider {
    /// Wrap a manifest and load `sequence_index`.
    ///
    /// # Errors
    ///
    /// Fails when the sequence index is out of range or still a stub.
    pub fn new(
        manifest: IiifManifest,
        settings: Settings,
        context: ViewerContext,
        sequence_index: usize,
    ) -> ViewerResult<Self> {
        let mut provider = Self {
            manifest,
            core: ProviderCore::new(settings, context, sequence_index),
        };
        provider.load()?;
        Ok(provider)
    }

    /// The raw manifest.
    #[must_use]
    pub fn manifest(&self) -> &IiifManifest {
        &self.manifest
    }

    fn normalize(&self) -> ViewerResult<SequenceModel> {
        let index = self.core.sequence_index;
        let len = self.sequence_count();
        let sequence = self
            .manifest
            .sequence(index)
            .ok_or(ViewerError::SequenceOutOfRange { index, len })?;
        let raw_canvases = sequence
            .canvases
            .as_deref()
            .ok_or(ViewerError::UnresolvedSequence(index))?;

        let mut canvases: Vec<Canvas> = raw_canvases.iter().enumerate().map(to_canvas).collect();
        let graph = build_graph(&self.manifest.structures, &mut canvases);

        Ok(SequenceModel {
            canvases,
            graph,
            viewing_direction: ViewingDirection::from_hint(sequence.viewing_direction.as_deref()),
            paged: sequence.viewing_hint.as_deref() == Some("paged"),
            start_canvas: sequence.start_canvas.clone(),
        })
    }
}

fn to_canvas((index, canvas): (usize, &IiifCanvas)) -> Canvas {
    Canvas {
        index,
        id: canvas.id.clone(),
        label: canvas.label.clone().unwrap_or_default(),
        width: canvas.width,
        height: canvas.height,
        image_service: canvas.image_service(),
        ..Canvas::default()
    }
}

/// Flatten a range into a raw node, appending embedded child ranges to
/// `nodes` so they can be referenced by position.
fn to_raw_node(range: &IiifRange, nodes: &mut Vec<RawNode>) -> RawNode {
    let members = range
        .canvases
        .iter()
        .map(|member| match member {
            CanvasRef::Id(id) => MemberRef::Id(id.clone()),
            CanvasRef::Index(i) => MemberRef::Index(*i),
            CanvasRef::Object(map) => map
                .get("@id")
                .and_then(text_of)
                .map_or(MemberRef::Missing, MemberRef::Id),
            CanvasRef::Other(_) => MemberRef::Missing,
        })
        .collect();

    let mut children = Vec::with_capacity(range.ranges.len());
    for child in &range.ranges {
        children.push(match child {
            RangeRef::Id(id) => ChildRef::Id(id.clone()),
            RangeRef::Object(inner) => {
                let node = to_raw_node(inner, nodes);
                nodes.push(node);
                ChildRef::Node(nodes.len() - 1)
            }
            RangeRef::Other(_) => ChildRef::Missing,
        });
    }

    RawNode {
        id: range.id.clone(),
        label: range.label.clone().unwrap_or_default(),
        structure_type: None,
        viewing_hint: range.viewing_hint.clone(),
        members,
        children,
        sequence: None,
    }
}

/// The range hinted `top` is the root; otherwise a synthetic root adopts
/// every manifest-level range in order.
fn build_graph(ranges: &[IiifRange], canvases: &mut [Canvas]) -> StructureGraph {
    if ranges.is_empty() {
        for canvas in canvases.iter_mut() {
            canvas.structures.clear();
        }
        return StructureGraph::default();
    }

    let mut nodes: Vec<RawNode> = Vec::with_capacity(ranges.len() + 1);
    nodes.resize_with(ranges.len(), RawNode::default);
    for (i, range) in ranges.iter().enumerate() {
        let node = to_raw_node(range, &mut nodes);
        nodes[i] = node;
    }

    let root = match ranges
        .iter()
        .position(|r| r.viewing_hint.as_deref() == Some("top"))
    {
        Some(top) => top,
        None => {
            nodes.push(RawNode {
                children: (0..ranges.len()).map(ChildRef::Node).collect(),
                ..RawNode::default()
            });
            nodes.len() - 1
        }
    };

    GraphBuilder::new(&nodes).build(root, canvases)
}

fn join_image_path(service: &str, tail: &str) -> String {
    if service.ends_with('/') {
        format!("{service}{tail}")
    } else {
        format!("{service}/{tail}")
    }
}

impl DocumentProvider for IiifProvider {
    fn dialect(&self) -> Dialect {
        Dialect::Iiif
    }

    fn core(&self) -> &ProviderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ProviderCore {
        &mut self.core
    }

    fn load(&mut self) -> ViewerResult<()> {
        let model = self.normalize()?;
        self.manifest.scrub_stubs(self.core.sequence_index);

        tracing::debug!(
            sequence = self.core.sequence_index,
            canvases = model.total(),
            structures = model.graph.len(),
            paged = model.paged,
            "manifest loaded"
        );

        self.core.install(model, None);
        Ok(())
    }

    fn replace_document(&mut self, document: Document, sequence_index: usize) -> ViewerResult<()> {
        let Document::Iiif(manifest) = document else {
            return Err(ViewerError::DialectMismatch {
                expected: Dialect::Iiif,
                found: document.dialect(),
            });
        };

        let mut replacement = Self {
            manifest,
            core: self.core.fork(sequence_index),
        };
        replacement.load()?;
        *self = replacement;
        Ok(())
    }

    fn sequence_count(&self) -> usize {
        self.manifest.sequences.as_ref().map_or(0, Vec::len)
    }

    fn title(&self) -> Option<String> {
        self.manifest.label.clone()
    }

    fn attribution(&self) -> Option<String> {
        self.manifest.attribution.clone()
    }

    fn license(&self) -> Option<String> {
        self.manifest.license.clone()
    }

    fn logo(&self) -> Option<String> {
        self.manifest.logo.clone()
    }

    fn see_also(&self) -> Option<Value> {
        self.manifest.see_also.clone()
    }

    fn manifest_see_also_uri(&self) -> Option<String> {
        None
    }

    fn metadata(&self, include_root_properties: bool) -> Vec<MetadataItem> {
        // Root properties ride along only with a declared metadata list.
        let Some(metadata) = self.manifest.metadata.as_ref() else {
            return Vec::new();
        };

        let mut items: Vec<MetadataItem> = metadata
            .iter()
            .map(|m| {
                MetadataItem::new(
                    m.label.clone().unwrap_or_default(),
                    m.value.clone().unwrap_or_default(),
                )
            })
            .collect();

        if include_root_properties {
            let manifest = &self.manifest;
            let root = [
                ("description", manifest.description.clone()),
                ("attribution", manifest.attribution.clone()),
                ("license", manifest.license.clone()),
                ("logo", manifest.logo.as_ref().map(|l| format!("<img src=\"{l}\"/>"))),
            ];
            items.extend(
                root.into_iter()
                    .filter_map(|(label, value)| value.filter(|v| !v.is_empty()).map(|v| MetadataItem::new(label, v))),
            );
        }

        items
    }

    fn manifest_type(&self) -> String {
        MANIFEST_TYPE.to_string()
    }

    fn sequence_type(&self) -> String {
        SEQUENCE_TYPE.to_string()
    }

    fn build_tree(&self) -> Tree {
        let graph = &self.core.model().graph;
        let mut tree = Tree::new("root");
        let tree_root = tree.root();
        let root = graph.root();
        let target = root.map_or(
            NodeTarget::Sequence(self.core.sequence_index()),
            NodeTarget::Structure,
        );
        if let Some(node) = tree.get_mut(tree_root) {
            node.data = Some(TreeNodeData::manifest(target));
        }
        if let Some(root) = root {
            add_structure_children(&mut tree, tree_root, graph, root);
        }
        tree
    }

    fn thumb_uri(&self, canvas: &Canvas, width: u32, height: u32) -> Option<String> {
        let service = canvas.image_service.as_deref()?;
        Some(join_image_path(
            service,
            &format!("full/{width},{height}/0/default.jpg"),
        ))
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn thumbs(&self, width: u32, height: u32) -> Vec<Thumb> {
        self.core
            .model()
            .canvases
            .iter()
            .map(|canvas| {
                let height = canvas
                    .aspect_ratio()
                    .map_or(height, |ratio| (f64::from(width) * ratio).floor() as u32);
                Thumb {
                    index: canvas.index,
                    uri: self.thumb_uri(canvas, width, height).unwrap_or_default(),
                    label: canvas.label.clone(),
                    width,
                    height,
                    visible: true,
                }
            })
            .collect()
    }

    fn image_uri(&self, canvas: &Canvas) -> Option<String> {
        let service = canvas.image_service.as_deref()?;
        Some(join_image_path(service, "info.json"))
    }
}

fn add_structure_children(tree: &mut Tree, parent: TreeNodeId, graph: &StructureGraph, structure: StructureId) {
    let children: Vec<_> = graph.children(structure).map(|(id, s)| (id, s.label.clone())).collect();
    for (child, label) in children {
        let Some(node) = tree.add_node(parent, label) else {
            continue;
        };
        if let Some(tree_node) = tree.get_mut(node) {
            tree_node.data = Some(TreeNodeData::structure(child));
        }
        add_structure_children(tree, node, graph, child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider(manifest: serde_json::Value) -> IiifProvider {
        let Document::Iiif(manifest) = Document::from_value(manifest, None).unwrap() else {
            panic!("expected dialect A");
        };
        IiifProvider::new(manifest, Settings::default(), ViewerContext::default(), 0).unwrap()
    }

    fn canvases(n: usize) -> Vec<serde_json::Value> {
        (0..n)
            .map(|i| json!({"@id": format!("c{i}"), "label": format!("{}", i + 1), "width": 100, "height": 150}))
            .collect()
    }

    #[test]
    fn synthetic_root_adopts_manifest_ranges() {
        let p = provider(json!({
            "sequences": [{"canvases": canvases(3)}],
            "structures": [
                {"@id": "r0", "label": "Front", "canvases": ["c0"]},
                {"@id": "r1", "label": "Body", "canvases": ["c1", "c2"], "ranges": ["r2"]},
                {"@id": "r2", "label": "Chapter", "canvases": ["c2"]}
            ]
        }));

        let graph = &p.model().graph;
        let root = p.root_structure().unwrap();
        assert_eq!(root.path, "");
        assert_eq!(graph.len(), 4);
        assert_eq!(p.structure_by_id("r2").unwrap().path, "/1/0");
        // r2 is adopted through r1 and is therefore skipped at the root.
        assert_eq!(root.children.len(), 2);
        assert_eq!(p.structure_by_canvas_index(2).unwrap().label, "Chapter");
        assert_eq!(p.structure_by_canvas_index(1).unwrap().label, "Body");
        assert!(p.structure_by_canvas_index(-1).is_none());
    }

    #[test]
    fn top_range_is_root() {
        let p = provider(json!({
            "sequences": [{"canvases": canvases(2)}],
            "structures": [
                {"@id": "a", "label": "A", "canvases": ["c0"]},
                {"@id": "top", "label": "Top", "viewingHint": "top", "ranges": ["a", "missing"]}
            ]
        }));
        let root = p.root_structure().unwrap();
        assert_eq!(root.label, "Top");
        assert_eq!(p.structure_by_path("/0").unwrap().label, "A");
        assert_eq!(p.structure_index("/0"), Some(0));
        assert_eq!(p.structure_index("/9"), None);
    }

    #[test]
    fn embedded_ranges_become_structures() {
        let p = provider(json!({
            "sequences": [{"canvases": canvases(2)}],
            "structures": [
                {"@id": "top", "viewingHint": "top", "ranges": [
                    {"@id": "inline", "label": "Inline", "canvases": [{"@id": "c1"}]}
                ]}
            ]
        }));
        assert_eq!(p.structure_by_path("/0").unwrap().label, "Inline");
        assert_eq!(p.structure_by_canvas_index(1).unwrap().label, "Inline");
    }

    #[test]
    fn tree_mirrors_structure_graph() {
        let p = provider(json!({
            "sequences": [{"canvases": canvases(2)}],
            "structures": [
                {"@id": "r0", "label": "One", "ranges": ["r1"]},
                {"@id": "r1", "label": "Two"}
            ]
        }));
        let tree = p.tree();
        let root = tree.get(tree.root()).unwrap();
        assert_eq!(root.label, "root");
        assert_eq!(root.data.unwrap().kind, crate::tree::NodeKind::Manifest);

        let labels: Vec<_> = tree.iter().map(|(_, n)| n.label.as_str()).collect();
        assert_eq!(labels, vec!["root", "One", "Two"]);
        assert!(std::ptr::eq(tree, p.tree()));
    }

    #[test]
    fn unstructured_manifest_roots_the_tree_at_its_sequence() {
        let p = provider(json!({"sequences": [{"canvases": canvases(3)}]}));
        let tree = p.tree();
        assert_eq!(tree.len(), 1);
        let root = tree.get(tree.root()).unwrap();
        assert_eq!(root.data, Some(TreeNodeData::manifest(NodeTarget::Sequence(0))));
        assert_eq!(tree.find_by_target(NodeTarget::Sequence(0)), Some(tree.root()));
    }

    #[test]
    fn thumbs_follow_aspect_ratio() {
        let p = provider(json!({
            "sequences": [{"canvases": [
                {"@id": "c0", "label": "1", "width": 200, "height": 300,
                 "images": [{"resource": {"service": {"@id": "http://img/c0"}}}]},
                {"@id": "c1", "label": "2"}
            ]}]
        }));
        let thumbs = p.thumbs(100, 80);
        assert_eq!(thumbs[0].height, 150);
        assert_eq!(thumbs[0].uri, "http://img/c0/full/100,150/0/default.jpg");
        assert_eq!(thumbs[1].height, 80);
        assert_eq!(thumbs[1].uri, "");
        assert_eq!(
            p.image_uri(p.canvas_by_index(0).unwrap()).as_deref(),
            Some("http://img/c0/info.json")
        );
    }

    #[test]
    fn metadata_appends_root_properties_on_request() {
        let p = provider(json!({
            "label": "Book",
            "description": "About",
            "logo": "http://logo.png",
            "metadata": [{"label": "Author", "value": "Someone"}],
            "sequences": [{"canvases": []}]
        }));
        assert_eq!(p.metadata(false).len(), 1);
        let all = p.metadata(true);
        assert_eq!(all.len(), 3);
        assert_eq!(all[1], MetadataItem::new("description", "About"));
        assert_eq!(all[2].value, "<img src=\"http://logo.png\"/>");
        assert_eq!(p.title().as_deref(), Some("Book"));
    }

    #[test]
    fn root_properties_need_a_metadata_list() {
        let without = provider(json!({
            "description": "About",
            "license": "http://license",
            "sequences": [{"canvases": []}]
        }));
        assert!(without.metadata(true).is_empty());

        let empty = provider(json!({
            "description": "About",
            "metadata": [],
            "sequences": [{"canvases": []}]
        }));
        assert_eq!(empty.metadata(false), Vec::new());
        assert_eq!(empty.metadata(true), vec![MetadataItem::new("description", "About")]);
    }

    #[test]
    fn start_canvas_and_types() {
        let p = provider(json!({
            "sequences": [{"canvases": canvases(3), "startCanvas": "c2"}]
        }));
        assert_eq!(p.start_canvas_index(), 2);
        assert_eq!(p.manifest_type(), "monograph");
        assert_eq!(p.sequence_type(), "seadragon-iiif");
        assert!(p.default_to_thumbs_view());
    }

    #[test]
    fn replace_rejects_other_dialect() {
        let mut p = provider(json!({"sequences": [{"canvases": canvases(1)}]}));
        let legacy = Document::from_value(json!({"assetSequences": [{"assets": []}]}), None).unwrap();
        let err = p.replace_document(legacy, 0).unwrap_err();
        assert!(matches!(err, ViewerError::DialectMismatch { expected: Dialect::Iiif, found: Dialect::Legacy }));
        assert_eq!(p.total_canvases(), 1);
    }
}
