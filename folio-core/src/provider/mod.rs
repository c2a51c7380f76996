//! Document providers.
//!
//! A provider owns one raw document, the index of the active sequence, the
//! current canvas selection, and the normalized model built from the active
//! sequence by [`DocumentProvider::load`]. Every navigation query the
//! presentation layer issues goes through the [`DocumentProvider`] trait, so
//! dialect differences stay inside the two implementations:
//!
//! - [`IiifProvider`] for `sequences`/`canvases`/`structures` manifests;
//! - [`LegacyProvider`] for `assetSequences`/`assets`/`rootSection` packages.
//!
//! Shared behaviour (paging, label search, structure lookups, settings and
//! environment flags) lives in default trait methods over [`ProviderCore`].

mod iiif;
mod legacy;

pub use iiif::IiifProvider;
pub use legacy::LegacyProvider;

use std::cell::OnceCell;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::ViewerResult;
use crate::graph::{Structure, StructureGraph};
use crate::label;
use crate::model::{Canvas, CanvasIndex, MetadataItem, SequenceModel, Thumb, ViewingDirection, NO_CANVAS};
use crate::paging::{self, PagingContext};
use crate::resolver;
use crate::sanitize::{AllowListSanitizer, HtmlSanitizer};
use crate::schema::{Dialect, Document};
use crate::settings::{Settings, ViewerContext};
use crate::tree::Tree;

/// State shared by both provider variants.
pub struct ProviderCore {
    settings: Settings,
    context: ViewerContext,
    sequence_index: usize,
    canvas_index: CanvasIndex,
    model: SequenceModel,
    manifestations: Option<StructureGraph>,
    tree: OnceCell<Tree>,
    sanitizer: Arc<dyn HtmlSanitizer>,
}

impl fmt::Debug for ProviderCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCore")
            .field("sequence_index", &self.sequence_index)
            .field("canvas_index", &self.canvas_index)
            .field("canvases", &self.model.total())
            .field("structures", &self.model.graph.len())
            .field("sanitizer", &self.sanitizer)
            .finish_non_exhaustive()
    }
}

impl ProviderCore {
    /// Fresh state with nothing selected and an empty model.
    #[must_use]
    pub fn new(settings: Settings, context: ViewerContext, sequence_index: usize) -> Self {
        Self {
            settings,
            context,
            sequence_index,
            canvas_index: NO_CANVAS,
            model: SequenceModel::default(),
            manifestations: None,
            tree: OnceCell::new(),
            sanitizer: Arc::new(AllowListSanitizer::default()),
        }
    }

    /// A copy of this state's configuration aimed at another document: same
    /// settings, environment, sanitizer and canvas selection, empty model.
    #[must_use]
    pub fn fork(&self, sequence_index: usize) -> Self {
        Self {
            settings: self.settings.clone(),
            context: self.context.clone(),
            sequence_index,
            canvas_index: self.canvas_index,
            model: SequenceModel::default(),
            manifestations: None,
            tree: OnceCell::new(),
            sanitizer: Arc::clone(&self.sanitizer),
        }
    }

    /// Install a freshly built model, dropping the memoized tree.
    pub fn install(&mut self, model: SequenceModel, manifestations: Option<StructureGraph>) {
        let total = model.total();
        self.model = model;
        self.manifestations = manifestations;
        self.tree = OnceCell::new();

        if usize::try_from(self.canvas_index).is_ok_and(|i| i >= total) {
            self.canvas_index = NO_CANVAS;
        }
    }

    /// Active settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Host environment.
    #[must_use]
    pub fn context(&self) -> &ViewerContext {
        &self.context
    }

    /// Active sequence index.
    #[must_use]
    pub fn sequence_index(&self) -> usize {
        self.sequence_index
    }

    /// Normalized active sequence.
    #[must_use]
    pub fn model(&self) -> &SequenceModel {
        &self.model
    }

    /// Legacy manifestation graph, when the package has one.
    #[must_use]
    pub fn manifestations(&self) -> Option<&StructureGraph> {
        self.manifestations.as_ref()
    }
}

/// Navigation contract over a loaded document.
///
/// Index-returning queries answer `None` (or [`NO_CANVAS`] where the value is
/// itself a canvas index) for anything out of range; they never fail.
pub trait DocumentProvider: fmt::Debug + Send {
    // -- dialect specific -------------------------------------------------

    /// Dialect this provider handles.
    fn dialect(&self) -> Dialect;

    /// Shared state.
    fn core(&self) -> &ProviderCore;

    /// Shared state, mutably.
    fn core_mut(&mut self) -> &mut ProviderCore;

    /// Select the active sequence, scrub the other reference stubs and rebuild
    /// the normalized model.
    ///
    /// # Errors
    ///
    /// Fails when the active sequence index is out of range or the active
    /// sequence is still an unresolved stub.
    fn load(&mut self) -> ViewerResult<()>;

    /// Swap in a new document and load `sequence_index` from it. On failure
    /// the previous document and model stay in place.
    ///
    /// # Errors
    ///
    /// Fails on a document of the other dialect or when loading fails.
    fn replace_document(&mut self, document: Document, sequence_index: usize) -> ViewerResult<()>;

    /// Number of sequences in the document.
    fn sequence_count(&self) -> usize;

    /// Document title.
    fn title(&self) -> Option<String>;

    /// Attribution statement.
    fn attribution(&self) -> Option<String>;

    /// License URI.
    fn license(&self) -> Option<String>;

    /// Logo URI.
    fn logo(&self) -> Option<String>;

    /// Related resource as declared.
    fn see_also(&self) -> Option<Value>;

    /// URI for opening the related resource externally.
    fn manifest_see_also_uri(&self) -> Option<String>;

    /// Descriptive metadata; root properties (description, attribution,
    /// license, logo) are appended when requested.
    fn metadata(&self, include_root_properties: bool) -> Vec<MetadataItem>;

    /// Lower-case manifest type (`monograph`, `archive`, ...).
    fn manifest_type(&self) -> String;

    /// Sequence type used to pick a presentation (`seadragon-iiif`, ...).
    fn sequence_type(&self) -> String;

    /// Build the navigation tree. Use [`DocumentProvider::tree`] for the
    /// memoized copy.
    fn build_tree(&self) -> Tree;

    /// Thumbnail URI for a canvas at the given size.
    fn thumb_uri(&self, canvas: &Canvas, width: u32, height: u32) -> Option<String>;

    /// Thumbnail descriptors for every canvas; heights follow each canvas'
    /// aspect ratio when known.
    fn thumbs(&self, width: u32, height: u32) -> Vec<Thumb>;

    /// Image (tile source) URI for a canvas.
    fn image_uri(&self, canvas: &Canvas) -> Option<String>;

    /// Poster image shown before media playback, through the media template.
    fn poster_image_uri(&self) -> Option<String> {
        None
    }

    // -- settings and environment ----------------------------------------

    /// Active settings.
    fn settings(&self) -> &Settings {
        self.core().settings()
    }

    /// Replace the settings wholesale.
    fn update_settings(&mut self, settings: Settings) {
        self.core_mut().settings = settings;
    }

    /// Host environment.
    fn context(&self) -> &ViewerContext {
        self.core().context()
    }

    /// Replace the HTML sanitizer.
    fn set_sanitizer(&mut self, sanitizer: Arc<dyn HtmlSanitizer>) {
        self.core_mut().sanitizer = sanitizer;
    }

    /// Sanitize document-supplied HTML through the allow-list.
    fn sanitize(&self, html: &str) -> String {
        self.core().sanitizer.sanitize(html)
    }

    /// Deep links are honoured only on the home domain with a single viewer.
    fn is_deep_linking_enabled(&self) -> bool {
        self.context().is_deep_linking_enabled()
    }

    /// See-also links are shown unless explicitly disabled.
    fn is_see_also_enabled(&self) -> bool {
        self.settings().is_see_also_enabled()
    }

    /// Host of the document URI.
    fn domain(&self) -> Option<String> {
        url::Url::parse(&self.context().data_uri)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }

    /// Domain of the embedding page.
    fn embed_domain(&self) -> Option<String> {
        self.context().embed_domain.clone()
    }

    /// `uri?t=<now>` for cache busting.
    fn add_timestamp(&self, uri: &str) -> String {
        resolver::add_timestamp(uri, resolver::timestamp_millis())
    }

    /// Media URI for a path through the media template.
    fn media_uri(&self, path: &str) -> String {
        self.settings().media_uri(path)
    }

    /// Media URI of a canvas (its media path, else its file path).
    fn canvas_media_uri(&self, canvas: &Canvas) -> Option<String> {
        canvas
            .media_uri
            .as_deref()
            .or(canvas.file_uri.as_deref())
            .map(|path| self.media_uri(path))
    }

    /// Whether the presentation should open on the thumbnail view.
    fn default_to_thumbs_view(&self) -> bool {
        match self.manifest_type().as_str() {
            "monograph" if !self.is_multi_sequence() => return true,
            "archive" | "boundmanuscript" | "artwork" => return true,
            _ => {}
        }
        self.sequence_type() == "application-pdf"
    }

    // -- sequences and canvases ------------------------------------------

    /// Active sequence index.
    fn sequence_index(&self) -> usize {
        self.core().sequence_index
    }

    /// Switch to another sequence of the current document and reload.
    ///
    /// # Errors
    ///
    /// Fails for an unknown index or an unresolved stub; the previous
    /// sequence stays active.
    fn set_sequence_index(&mut self, index: usize) -> ViewerResult<()> {
        let previous = self.core().sequence_index;
        self.core_mut().sequence_index = index;
        if let Err(error) = self.load() {
            self.core_mut().sequence_index = previous;
            self.load()?;
            return Err(error);
        }
        Ok(())
    }

    /// Normalized active sequence.
    fn model(&self) -> &SequenceModel {
        self.core().model()
    }

    /// Selected canvas, [`NO_CANVAS`] when nothing is selected.
    fn canvas_index(&self) -> CanvasIndex {
        self.core().canvas_index
    }

    /// Select a canvas. Returns `false` (and leaves the selection alone) for
    /// an index outside the sequence; [`NO_CANVAS`] clears the selection.
    fn set_canvas_index(&mut self, index: CanvasIndex) -> bool {
        if index != NO_CANVAS && self.model().canvas(index).is_none() {
            return false;
        }
        self.core_mut().canvas_index = index;
        true
    }

    /// Number of canvases in the active sequence.
    fn total_canvases(&self) -> usize {
        self.model().total()
    }

    /// More than one canvas.
    fn is_multi_canvas(&self) -> bool {
        self.total_canvases() > 1
    }

    /// More than one sequence.
    fn is_multi_sequence(&self) -> bool {
        self.sequence_count() > 1
    }

    /// Canvas at `index`.
    fn canvas_by_index(&self, index: CanvasIndex) -> Option<&Canvas> {
        self.model().canvas(index)
    }

    /// Currently selected canvas.
    fn current_canvas(&self) -> Option<&Canvas> {
        self.canvas_by_index(self.canvas_index())
    }

    /// Canvas with the given identifier.
    fn canvas_by_id(&self, id: &str) -> Option<&Canvas> {
        self.model()
            .canvases
            .iter()
            .find(|c| c.id.as_deref() == Some(id))
    }

    /// Index of the canvas with the given identifier.
    fn canvas_index_by_id(&self, id: &str) -> Option<usize> {
        self.canvas_by_id(id).map(|c| c.index)
    }

    /// Trimmed label of the canvas at `index`.
    fn canvas_label(&self, index: CanvasIndex) -> Option<String> {
        self.canvas_by_index(index).map(|c| c.label.trim().to_string())
    }

    /// Last canvas label containing a digit, or `-` when there is none.
    fn last_canvas_label(&self) -> String {
        self.model()
            .canvases
            .iter()
            .rev()
            .map(|c| c.label.trim())
            .find(|label| label.bytes().any(|b| b.is_ascii_digit()))
            .map_or_else(|| "-".to_string(), str::to_string)
    }

    /// Resolve a user-typed label to a canvas index.
    fn canvas_index_by_label(&self, label: &str) -> Option<usize> {
        let labels: Vec<&str> = self.model().canvases.iter().map(|c| c.label.as_str()).collect();
        label::find_canvas_index(label, &labels, self.dialect())
    }

    /// Canvas to open first.
    fn start_canvas_index(&self) -> usize {
        self.model()
            .start_canvas
            .as_deref()
            .and_then(|id| self.canvas_index_by_id(id))
            .unwrap_or(0)
    }

    // -- structures -------------------------------------------------------

    /// Root of the structure graph.
    fn root_structure(&self) -> Option<&Structure> {
        let graph = &self.model().graph;
        graph.root().and_then(|id| graph.get(id))
    }

    /// Deepest structure containing `canvas`.
    fn canvas_structure(&self, canvas: &Canvas) -> Option<&Structure> {
        canvas
            .deepest_structure()
            .and_then(|id| self.model().graph.get(id))
    }

    /// Deepest structure containing the canvas at `index`.
    fn structure_by_canvas_index(&self, index: CanvasIndex) -> Option<&Structure> {
        self.canvas_by_index(index)
            .and_then(|canvas| self.canvas_structure(canvas))
    }

    /// Structure at `path`.
    fn structure_by_path(&self, path: &str) -> Option<&Structure> {
        let graph = &self.model().graph;
        graph.by_path(path).and_then(|id| graph.get(id))
    }

    /// Structure with the given identifier.
    fn structure_by_id(&self, id: &str) -> Option<&Structure> {
        let graph = &self.model().graph;
        graph.by_id(id).and_then(|sid| graph.get(sid))
    }

    /// First canvas contained in the structure at `path`.
    fn structure_index(&self, path: &str) -> Option<usize> {
        let graph = &self.model().graph;
        self.model()
            .canvases
            .iter()
            .find(|canvas| {
                canvas
                    .structures
                    .iter()
                    .filter_map(|id| graph.get(*id))
                    .any(|s| s.path == path)
            })
            .map(|canvas| canvas.index)
    }

    /// Memoized navigation tree, rebuilt after every load.
    fn tree(&self) -> &Tree {
        self.core().tree.get_or_init(|| self.build_tree())
    }

    // -- paging -----------------------------------------------------------

    /// Reading order of the active sequence.
    fn viewing_direction(&self) -> ViewingDirection {
        self.model().viewing_direction
    }

    /// Two-page spreads are in effect.
    fn is_paged(&self) -> bool {
        self.model().paged && self.settings().paging_enabled
    }

    /// Inputs for the paging rules.
    fn paging_context(&self) -> PagingContext {
        PagingContext {
            total: self.total_canvases(),
            direction: self.viewing_direction(),
            paged: self.is_paged(),
        }
    }

    /// Canvases shown together with `index`.
    fn paged_indices(&self, index: CanvasIndex) -> Vec<CanvasIndex> {
        paging::paged_indices(index, self.paging_context())
    }

    /// Always `0`.
    fn first_page_index(&self) -> CanvasIndex {
        paging::first_page_index()
    }

    /// Always `total - 1`.
    fn last_page_index(&self) -> CanvasIndex {
        paging::last_page_index(self.paging_context())
    }

    /// Index to show when stepping back (may be negative).
    fn prev_page_index(&self, index: CanvasIndex) -> CanvasIndex {
        paging::prev_page_index(index, self.paging_context())
    }

    /// Index to show when stepping forward, [`NO_CANVAS`] past the end.
    fn next_page_index(&self, index: CanvasIndex) -> CanvasIndex {
        paging::next_page_index(index, self.paging_context())
    }

    /// Whether `index` is the first canvas.
    fn is_first_canvas(&self, index: CanvasIndex) -> bool {
        paging::is_first_canvas(index)
    }

    /// Whether `index` is the last canvas.
    fn is_last_canvas(&self, index: CanvasIndex) -> bool {
        paging::is_last_canvas(index, self.paging_context())
    }
}

/// Build the provider for a document's dialect and load `sequence_index`.
///
/// # Errors
///
/// Fails when the sequence index is out of range or still a stub.
pub fn create(
    document: Document,
    settings: Settings,
    context: ViewerContext,
    sequence_index: usize,
) -> ViewerResult<Box<dyn DocumentProvider>> {
    let provider: Box<dyn DocumentProvider> = match document {
        Document::Iiif(manifest) => Box::new(IiifProvider::new(manifest, settings, context, sequence_index)?),
        Document::Legacy(package) => {
            Box::new(LegacyProvider::new(package, settings, context, sequence_index)?)
        }
    };
    Ok(provider)
}
