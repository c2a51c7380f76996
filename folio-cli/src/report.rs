//! Plain-text reports over an opened document.

use folio_core::{CanvasIndex, DocumentProvider, Tree, TreeNodeId};

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// Summary of the document and its active sequence.
#[must_use]
pub fn render_info(viewer: &dyn DocumentProvider) -> String {
    let mut lines = vec![
        format!(
            "title:          {}",
            viewer
                .title()
                .map_or_else(|| "-".to_string(), |t| viewer.sanitize(&t))
        ),
        format!("dialect:        {}", viewer.dialect()),
        format!("manifest type:  {}", viewer.manifest_type()),
        format!("sequence type:  {}", viewer.sequence_type()),
        format!(
            "sequence:       {} of {}",
            viewer.sequence_index() + 1,
            viewer.sequence_count()
        ),
        format!("canvases:       {}", viewer.total_canvases()),
        format!("direction:      {}", viewer.viewing_direction().as_str()),
        format!("paged:          {}", yes_no(viewer.is_paged())),
        format!("start canvas:   {}", viewer.start_canvas_index()),
        format!("last label:     {}", viewer.last_canvas_label()),
        format!("thumbs view:    {}", yes_no(viewer.default_to_thumbs_view())),
    ];

    if let Some(uri) = viewer.poster_image_uri() {
        lines.push(format!("poster:         {uri}"));
    }

    if viewer.is_see_also_enabled() {
        if let Some(uri) = viewer.manifest_see_also_uri() {
            lines.push(format!("see also:       {uri}"));
        }
    }

    let metadata = viewer.metadata(true);
    if !metadata.is_empty() {
        lines.push("metadata:".to_string());
        for item in metadata {
            lines.push(format!("  {}: {}", item.label, viewer.sanitize(&item.value)));
        }
    }

    lines.join("\n")
}

/// Indented navigation tree; `*` marks the selected node.
#[must_use]
pub fn render_tree(tree: &Tree) -> String {
    let mut out = String::new();
    write_node(&mut out, tree, tree.root(), 0);
    out.truncate(out.trim_end().len());
    out
}

fn write_node(out: &mut String, tree: &Tree, id: TreeNodeId, depth: usize) {
    let Some(node) = tree.get(id) else {
        return;
    };
    let marker = if node.selected { "* " } else { "" };
    out.push_str(&format!("{}{marker}{}\n", "  ".repeat(depth), node.label));
    let children: Vec<TreeNodeId> = tree.children(id).map(|(child, _)| child).collect();
    for child in children {
        write_node(out, tree, child, depth + 1);
    }
}

/// Result of a label search.
#[must_use]
pub fn render_label(viewer: &dyn DocumentProvider, query: &str) -> String {
    match viewer.canvas_index_by_label(query) {
        Some(index) => format!("{query}: canvas {index}"),
        None => format!("{query}: no matching canvas"),
    }
}

fn join_indices(indices: &[CanvasIndex]) -> String {
    indices
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Spread and stepping targets around one canvas.
#[must_use]
pub fn render_pages(viewer: &dyn DocumentProvider, index: CanvasIndex) -> String {
    [
        format!("canvas:  {index}"),
        format!("paged:   {}", yes_no(viewer.is_paged())),
        format!("shown:   [{}]", join_indices(&viewer.paged_indices(index))),
        format!("prev:    {}", viewer.prev_page_index(index)),
        format!("next:    {}", viewer.next_page_index(index)),
        format!("first:   {}", yes_no(viewer.is_first_canvas(index))),
        format!("last:    {}", yes_no(viewer.is_last_canvas(index))),
    ]
    .join("\n")
}

/// Structures containing a canvas, deepest first.
#[must_use]
pub fn render_structure(viewer: &dyn DocumentProvider, index: CanvasIndex) -> String {
    let Some(deepest) = viewer.structure_by_canvas_index(index) else {
        return format!("canvas {index}: no structure");
    };

    let graph = &viewer.model().graph;
    let mut lines = Vec::new();
    let mut current = Some(deepest);
    while let Some(structure) = current {
        let path = if structure.path.is_empty() {
            "/"
        } else {
            structure.path.as_str()
        };
        lines.push(format!("{path}  {}", structure.label));
        current = structure.parent.and_then(|id| graph.get(id));
    }
    lines.join("\n")
}

/// Thumbnail descriptors, one per line.
#[must_use]
pub fn render_thumbs(viewer: &dyn DocumentProvider, width: u32, height: u32) -> String {
    viewer
        .thumbs(width, height)
        .into_iter()
        .map(|thumb| {
            let uri = if thumb.uri.is_empty() { "-" } else { thumb.uri.as_str() };
            format!(
                "{:>3}  {:<8} {}x{}  {uri}",
                thumb.index,
                thumb.label.trim(),
                thumb.width,
                thumb.height
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
