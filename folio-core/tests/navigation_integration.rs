//! Navigation Integration Tests
//!
//! Exercises the provider contract end to end over realistic documents:
//! - Structure graphs and canvas back-references
//! - Label search for both dialects
//! - Two-page spread paging
//! - Thumbnails, metadata and URI templating
//! - Navigation trees

mod common;

use folio_core::{
    provider, DocumentProvider, NodeKind, Settings, ViewerContext, ViewerError, ViewingDirection,
    NO_CANVAS,
};

fn iiif_viewer(settings: &str) -> Box<dyn DocumentProvider> {
    let settings = Settings::from_json(settings).expect("settings parse");
    provider::create(common::manifest(), settings, ViewerContext::new(common::MANIFEST_URI), 0)
        .expect("manifest loads")
}

fn legacy_viewer(settings: &str) -> Box<dyn DocumentProvider> {
    let settings = Settings::from_json(settings).expect("settings parse");
    provider::create(common::package(), settings, ViewerContext::new("package.json"), 0)
        .expect("package loads")
}

// ============================================================================
// Dialect A: structures
// ============================================================================

#[test]
fn test_iiif_top_range_roots_the_structure_graph() {
    let viewer = iiif_viewer("{}");

    let root = viewer.root_structure().unwrap();
    assert_eq!(root.label, "Contents");
    assert_eq!(root.path, "");
    assert_eq!(viewer.structure_by_path("/0").unwrap().label, "Front matter");
    assert_eq!(viewer.structure_by_path("/1/0").unwrap().label, "Section 1.1");
    assert_eq!(
        viewer
            .structure_by_id("http://example.org/iiif/book/range/r2")
            .unwrap()
            .path,
        "/1"
    );
}

#[test]
fn test_iiif_canvas_resolves_to_deepest_structure() {
    let viewer = iiif_viewer("{}");

    assert_eq!(viewer.structure_by_canvas_index(0).unwrap().label, "Front matter");
    assert_eq!(viewer.structure_by_canvas_index(3).unwrap().label, "Section 1.1");
    assert_eq!(viewer.structure_by_canvas_index(4).unwrap().label, "Chapter 1");
    assert!(viewer.structure_by_canvas_index(5).is_none());
    assert!(viewer.structure_by_canvas_index(NO_CANVAS).is_none());
}

#[test]
fn test_iiif_unresolved_members_are_nulled() {
    let viewer = iiif_viewer("{}");
    let chapter = viewer.structure_by_path("/1").unwrap();
    assert_eq!(chapter.canvases, vec![Some(2), Some(3), Some(4), None]);
}

#[test]
fn test_iiif_structure_index_finds_first_member() {
    let viewer = iiif_viewer("{}");
    assert_eq!(viewer.structure_index("/1"), Some(2));
    assert_eq!(viewer.structure_index("/1/0"), Some(3));
    assert_eq!(viewer.structure_index(""), None);
    assert_eq!(viewer.structure_index("/7"), None);
}

#[test]
fn test_iiif_stub_sequence_cannot_be_opened_directly() {
    let err = provider::create(common::manifest(), Settings::default(), ViewerContext::default(), 1)
        .unwrap_err();
    assert!(matches!(err, ViewerError::UnresolvedSequence(1)));

    let err = provider::create(common::manifest(), Settings::default(), ViewerContext::default(), 9)
        .unwrap_err();
    assert!(matches!(err, ViewerError::SequenceOutOfRange { index: 9, len: 2 }));
}

// ============================================================================
// Dialect A: canvases and labels
// ============================================================================

#[test]
fn test_iiif_start_canvas_and_lookup_by_id() {
    let viewer = iiif_viewer("{}");
    assert_eq!(viewer.start_canvas_index(), 1);
    assert_eq!(
        viewer.canvas_index_by_id("http://example.org/iiif/book/canvas/c4"),
        Some(4)
    );
    assert_eq!(viewer.canvas_index_by_id("nope"), None);
}

#[test]
fn test_iiif_label_search() {
    let viewer = iiif_viewer("{}");

    assert_eq!(viewer.canvas_index_by_label("Cover"), Some(0));
    assert_eq!(viewer.canvas_index_by_label("3"), Some(3));
    assert_eq!(viewer.canvas_index_by_label("02"), Some(2));
    assert_eq!(viewer.canvas_index_by_label("4-5"), Some(4));
    assert_eq!(viewer.canvas_index_by_label("4 5"), Some(4));
    assert_eq!(viewer.canvas_index_by_label("4"), None);
    assert_eq!(viewer.canvas_index_by_label("Back"), Some(5));
}

#[test]
fn test_iiif_canvas_labels() {
    let viewer = iiif_viewer("{}");
    assert_eq!(viewer.canvas_label(3).as_deref(), Some("3"));
    assert_eq!(viewer.canvas_label(6), None);
    assert_eq!(viewer.last_canvas_label(), "4-5");
}

// ============================================================================
// Dialect A: paging
// ============================================================================

#[test]
fn test_paging_requires_setting_and_hint() {
    let viewer = iiif_viewer("{}");
    assert!(!viewer.is_paged());
    assert_eq!(viewer.paged_indices(1), vec![1, 2]);
    assert_eq!(viewer.next_page_index(1), 2);
    assert_eq!(viewer.prev_page_index(2), 1);

    let viewer = iiif_viewer(r#"{"pagingEnabled": true}"#);
    assert!(viewer.is_paged());
}

#[test]
fn test_paged_spreads() {
    let viewer = iiif_viewer(r#"{"pagingEnabled": true}"#);

    assert_eq!(viewer.paged_indices(0), vec![0]);
    assert_eq!(viewer.paged_indices(1), vec![1, 2]);
    assert_eq!(viewer.paged_indices(2), vec![1, 2]);
    assert_eq!(viewer.paged_indices(4), vec![3, 4]);
    assert_eq!(viewer.paged_indices(5), vec![5]);
}

#[test]
fn test_paged_stepping() {
    let viewer = iiif_viewer(r#"{"pagingEnabled": true}"#);

    assert_eq!(viewer.next_page_index(0), 1);
    assert_eq!(viewer.next_page_index(1), 3);
    assert_eq!(viewer.next_page_index(3), 5);
    assert_eq!(viewer.next_page_index(5), NO_CANVAS);

    assert_eq!(viewer.prev_page_index(5), 4);
    assert_eq!(viewer.prev_page_index(3), 2);
    assert_eq!(viewer.prev_page_index(1), 0);
    assert_eq!(viewer.prev_page_index(0), -1);

    assert!(viewer.is_first_canvas(0));
    assert!(viewer.is_last_canvas(5));
    assert_eq!(viewer.last_page_index(), 5);
}

#[test]
fn test_selection_is_validated_and_survives_queries() {
    let mut viewer = iiif_viewer("{}");
    assert_eq!(viewer.canvas_index(), NO_CANVAS);
    assert!(viewer.current_canvas().is_none());

    assert!(viewer.set_canvas_index(4));
    assert!(!viewer.set_canvas_index(6));
    assert_eq!(viewer.current_canvas().unwrap().label, "4-5");

    assert!(viewer.set_canvas_index(NO_CANVAS));
    assert!(viewer.current_canvas().is_none());
}

// ============================================================================
// Dialect A: presentation helpers
// ============================================================================

#[test]
fn test_iiif_thumbs_follow_image_service_and_aspect_ratio() {
    let viewer = iiif_viewer("{}");
    let thumbs = viewer.thumbs(100, 90);

    assert_eq!(thumbs.len(), 6);
    assert_eq!(thumbs[0].height, 150);
    assert_eq!(
        thumbs[0].uri,
        "http://example.org/images/c0/full/100,150/0/default.jpg"
    );
    assert_eq!(
        thumbs[1].uri,
        "http://example.org/images/c1/full/100,150/0/default.jpg"
    );
    assert_eq!(thumbs[2].height, 90);
    assert_eq!(
        thumbs[2].uri,
        "http://example.org/images/c2/full/100,90/0/default.jpg"
    );
    assert_eq!(thumbs[3].height, 100);
    assert_eq!(thumbs[3].uri, "");
}

#[test]
fn test_iiif_metadata_and_sanitized_text() {
    let viewer = iiif_viewer("{}");

    let plain = viewer.metadata(false);
    assert_eq!(plain.len(), 2);
    assert_eq!(plain[0].label, "Author");

    let full = viewer.metadata(true);
    assert_eq!(full.len(), 6);
    assert_eq!(full[5].label, "logo");
    assert_eq!(full[5].value, "<img src=\"http://example.org/logo.png\"/>");

    let title = viewer.title().unwrap();
    assert_eq!(viewer.sanitize(&title), "An <i>Illustrated</i> Herbal");
    let attribution = viewer.attribution().unwrap();
    assert_eq!(viewer.sanitize(&attribution), "Provided by <a>Example Library</a>");
}

#[test]
fn test_iiif_types_and_thumbs_view() {
    let viewer = iiif_viewer("{}");
    assert_eq!(viewer.manifest_type(), "monograph");
    assert_eq!(viewer.sequence_type(), "seadragon-iiif");
    assert!(viewer.is_multi_sequence());
    assert!(!viewer.default_to_thumbs_view());
    assert_eq!(viewer.viewing_direction(), ViewingDirection::LeftToRight);
}

#[test]
fn test_iiif_tree() {
    let viewer = iiif_viewer("{}");
    let tree = viewer.tree();

    assert_eq!(tree.len(), 4);
    let root = tree.get(tree.root()).unwrap();
    assert_eq!(root.label, "root");
    assert_eq!(root.data.unwrap().kind, NodeKind::Manifest);

    let top: Vec<_> = tree.children(tree.root()).map(|(_, n)| n.label.clone()).collect();
    assert_eq!(top, vec!["Front matter", "Chapter 1"]);
}

#[test]
fn test_environment_flags() {
    let mut context = ViewerContext::new(common::MANIFEST_URI);
    context.is_home_domain = true;
    context.is_only_instance = true;
    context.embed_domain = Some("blog.example.com".into());
    let viewer = provider::create(common::manifest(), Settings::default(), context, 0).unwrap();

    assert!(viewer.is_deep_linking_enabled());
    assert_eq!(viewer.domain().as_deref(), Some("example.org"));
    assert_eq!(viewer.embed_domain().as_deref(), Some("blog.example.com"));
    assert!(viewer.add_timestamp("a.json").starts_with("a.json?t="));
}

// ============================================================================
// Dialect B
// ============================================================================

#[test]
fn test_legacy_sections_and_back_references() {
    let viewer = legacy_viewer("{}");

    assert_eq!(viewer.root_structure().unwrap().label, "Monograph");
    assert_eq!(viewer.structure_by_canvas_index(0).unwrap().label, "Preface");
    assert_eq!(viewer.structure_by_canvas_index(3).unwrap().label, "Letter");
    assert_eq!(viewer.structure_by_canvas_index(5).unwrap().label, "Monograph");
    assert_eq!(
        viewer.structure_by_path("/1/0").unwrap().canvases,
        vec![Some(3), None]
    );
}

#[test]
fn test_legacy_label_search() {
    let viewer = legacy_viewer("{}");

    assert_eq!(viewer.canvas_index_by_label("ii"), Some(1));
    assert_eq!(viewer.canvas_index_by_label("1"), Some(2));
    assert_eq!(viewer.canvas_index_by_label("3-4"), Some(4));
    assert_eq!(viewer.canvas_index_by_label("3"), Some(4));
    assert_eq!(viewer.canvas_index_by_label("x"), None);
    assert_eq!(viewer.last_canvas_label(), "3 - 4");
}

#[test]
fn test_legacy_section_mappings() {
    let viewer = legacy_viewer(r#"{"sectionMappings": {"Letters": "Correspondence"}}"#);
    assert_eq!(viewer.structure_by_path("/1").unwrap().label, "Correspondence");
    assert_eq!(
        viewer.structure_by_path("/1").unwrap().structure_type.as_deref(),
        Some("Correspondence")
    );
}

#[test]
fn test_legacy_is_never_paged() {
    let viewer = legacy_viewer(r#"{"pagingEnabled": true}"#);
    assert!(!viewer.is_paged());
    assert_eq!(viewer.paged_indices(2), vec![1, 2]);
    assert_eq!(viewer.next_page_index(1), 2);
    assert_eq!(viewer.prev_page_index(1), 0);
}

#[test]
fn test_paging_queries_reject_unselected_and_out_of_range_indices() {
    let viewer = iiif_viewer(r#"{"pagingEnabled": true}"#);
    assert_eq!(viewer.canvas_index(), NO_CANVAS);
    assert!(viewer.paged_indices(viewer.canvas_index()).is_empty());
    assert!(viewer.paged_indices(6).is_empty());
    assert_eq!(viewer.next_page_index(NO_CANVAS), NO_CANVAS);
    assert_eq!(viewer.next_page_index(-4), NO_CANVAS);
    assert_eq!(viewer.prev_page_index(9), NO_CANVAS);
}

#[test]
fn test_legacy_uris() {
    let viewer = legacy_viewer(
        r#"{"dataBaseUri": "http://example.org/packages/letters/", "mediaBaseUri": "http://media.example.org/"}"#,
    );

    let first = viewer.canvas_by_index(0).unwrap();
    assert_eq!(
        viewer.image_uri(first).as_deref(),
        Some("http://example.org/packages/letters/dzi/0001.dzi")
    );

    let last = viewer.canvas_by_index(5).unwrap();
    assert!(viewer.image_uri(last).is_none());
    assert_eq!(
        viewer.canvas_media_uri(last).as_deref(),
        Some("http://media.example.org/files/0006.jpg")
    );
    assert_eq!(
        viewer.manifest_see_also_uri().as_deref(),
        Some("http://media.example.org/letters/volume-1.pdf")
    );
    assert_eq!(
        viewer.poster_image_uri().as_deref(),
        Some("http://media.example.org/posters/volume-1.jpg")
    );
}

#[test]
fn test_poster_image_only_for_packages() {
    assert!(iiif_viewer("{}").poster_image_uri().is_none());
    assert_eq!(
        legacy_viewer("{}").poster_image_uri().as_deref(),
        Some("posters/volume-1.jpg")
    );
}

#[test]
fn test_legacy_getters() {
    let viewer = legacy_viewer("{}");
    assert_eq!(viewer.title().as_deref(), Some("Collected Letters, Volume 1"));
    assert_eq!(viewer.manifest_type(), "monograph");
    assert_eq!(viewer.sequence_type(), "seadragon-dzi");
    assert!(!viewer.default_to_thumbs_view());
    assert!(viewer.metadata(true).is_empty());
    assert!(viewer.thumbs(100, 100).is_empty());
    assert_eq!(viewer.start_canvas_index(), 0);
}

#[test]
fn test_legacy_see_also_can_be_disabled() {
    let viewer = legacy_viewer(r#"{"seeAlsoEnabled": false}"#);
    assert!(!viewer.is_see_also_enabled());
    assert!(viewer.see_also().is_some());
}

#[test]
fn test_legacy_tree_selects_owning_manifestation() {
    let viewer = legacy_viewer("{}");
    let tree = viewer.tree();

    assert_eq!(tree.len(), 6);
    assert_eq!(tree.get(tree.root()).unwrap().label, "Collected Letters");

    let selected = tree.selected().unwrap();
    let volume = tree.get(selected).unwrap();
    assert_eq!(volume.label, "Volume 1");
    assert!(volume.expanded);
    assert_eq!(volume.data.unwrap().kind, NodeKind::Manifest);

    let sections: Vec<_> = tree.children(selected).map(|(_, n)| n.label.clone()).collect();
    assert_eq!(sections, vec!["Preface", "Letters"]);
}
