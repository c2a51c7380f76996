//! WebAssembly bindings for folio-core.
//!
//! The host page fetches documents itself and hands the JSON over; this
//! module only exposes the navigation queries. Structured answers are
//! returned as JSON strings.

use wasm_bindgen::prelude::*;

use crate::model::{CanvasIndex, MetadataItem, NO_CANVAS};
use crate::provider::{self, DocumentProvider};
use crate::schema::{Dialect, Document};
use crate::settings::{Settings, ViewerContext};

/// Initialize the folio WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages
    #[cfg(feature = "wasm")]
    console_error_panic_hook::set_once();
}

fn parse_or_default<T>(json: &str) -> Result<T, String>
where
    T: Default + serde::de::DeserializeOwned,
{
    if json.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(json).map_err(|e| e.to_string())
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

/// Viewer instance for WASM.
#[wasm_bindgen]
pub struct WasmViewer {
    provider: Box<dyn DocumentProvider>,
}

#[wasm_bindgen]
impl WasmViewer {
    /// Open a document already fetched by the host.
    ///
    /// Empty settings or context strings use defaults. `dialect` is `"iiif"`,
    /// `"legacy"`, or absent for shape detection.
    ///
    /// # Errors
    ///
    /// Returns an error string if any JSON is malformed, the dialect is
    /// unknown, or the sequence cannot be loaded.
    #[wasm_bindgen(constructor)]
    pub fn new(
        document_json: &str,
        settings_json: &str,
        context_json: &str,
        sequence_index: usize,
        dialect: Option<String>,
    ) -> Result<WasmViewer, String> {
        let settings: Settings = parse_or_default(settings_json)?;
        let context: ViewerContext = parse_or_default(context_json)?;
        let dialect = match dialect {
            Some(name) => Some(name.parse::<Dialect>().map_err(|e| e.to_string())?),
            None => settings
                .iiif
                .map(|iiif| if iiif { Dialect::Iiif } else { Dialect::Legacy }),
        };

        let document = Document::from_json(document_json, dialect).map_err(|e| e.to_string())?;
        let provider =
            provider::create(document, settings, context, sequence_index).map_err(|e| e.to_string())?;
        Ok(Self { provider })
    }

    /// Swap in a re-fetched document, keeping settings and selection.
    ///
    /// # Errors
    ///
    /// Returns an error string if the document is malformed, of the other
    /// dialect, or its sequence cannot be loaded.
    #[wasm_bindgen(js_name = replaceDocument)]
    pub fn replace_document(&mut self, document_json: &str, sequence_index: usize) -> Result<(), String> {
        let document = Document::from_json(document_json, Some(self.provider.dialect()))
            .map_err(|e| e.to_string())?;
        self.provider
            .replace_document(document, sequence_index)
            .map_err(|e| e.to_string())
    }

    /// `"iiif"` or `"legacy"`.
    #[wasm_bindgen(js_name = getDialect)]
    #[must_use]
    pub fn get_dialect(&self) -> String {
        self.provider.dialect().to_string()
    }

    /// Sanitized document title.
    #[wasm_bindgen(js_name = getTitle)]
    #[must_use]
    pub fn get_title(&self) -> Option<String> {
        self.provider.title().map(|t| self.provider.sanitize(&t))
    }

    /// Sanitized attribution statement.
    #[wasm_bindgen(js_name = getAttribution)]
    #[must_use]
    pub fn get_attribution(&self) -> Option<String> {
        self.provider.attribution().map(|a| self.provider.sanitize(&a))
    }

    /// Metadata pairs with sanitized values, as JSON.
    #[wasm_bindgen(js_name = getMetadataJson)]
    #[must_use]
    pub fn get_metadata_json(&self, include_root_properties: bool) -> String {
        let items: Vec<MetadataItem> = self
            .provider
            .metadata(include_root_properties)
            .into_iter()
            .map(|item| MetadataItem::new(item.label, self.provider.sanitize(&item.value)))
            .collect();
        to_json(&items)
    }

    /// Current settings as JSON.
    #[wasm_bindgen(js_name = getSettingsJson)]
    #[must_use]
    pub fn get_settings_json(&self) -> String {
        to_json(self.provider.settings())
    }

    /// Replace the settings.
    ///
    /// # Errors
    ///
    /// Returns an error string if the JSON is malformed.
    #[wasm_bindgen(js_name = updateSettings)]
    pub fn update_settings(&mut self, settings_json: &str) -> Result<(), String> {
        let settings = Settings::from_json(settings_json).map_err(|e| e.to_string())?;
        self.provider.update_settings(settings);
        Ok(())
    }

    /// Manifest type (`monograph`, ...).
    #[wasm_bindgen(js_name = getManifestType)]
    #[must_use]
    pub fn get_manifest_type(&self) -> String {
        self.provider.manifest_type()
    }

    /// Sequence type (`seadragon-iiif`, ...).
    #[wasm_bindgen(js_name = getSequenceType)]
    #[must_use]
    pub fn get_sequence_type(&self) -> String {
        self.provider.sequence_type()
    }

    /// Whether to open on the thumbnail view.
    #[wasm_bindgen(js_name = defaultToThumbsView)]
    #[must_use]
    pub fn default_to_thumbs_view(&self) -> bool {
        self.provider.default_to_thumbs_view()
    }

    /// Whether deep links are honoured.
    #[wasm_bindgen(js_name = isDeepLinkingEnabled)]
    #[must_use]
    pub fn is_deep_linking_enabled(&self) -> bool {
        self.provider.is_deep_linking_enabled()
    }

    /// Active sequence index.
    #[wasm_bindgen(js_name = getSequenceIndex)]
    #[must_use]
    pub fn get_sequence_index(&self) -> usize {
        self.provider.sequence_index()
    }

    /// Switch to another sequence of the loaded document.
    ///
    /// # Errors
    ///
    /// Returns an error string for an unknown or unresolved sequence.
    #[wasm_bindgen(js_name = setSequenceIndex)]
    pub fn set_sequence_index(&mut self, index: usize) -> Result<(), String> {
        self.provider
            .set_sequence_index(index)
            .map_err(|e| e.to_string())
    }

    /// Number of canvases.
    #[wasm_bindgen(js_name = getTotalCanvases)]
    #[must_use]
    pub fn get_total_canvases(&self) -> usize {
        self.provider.total_canvases()
    }

    /// Selected canvas, `-1` when none.
    #[wasm_bindgen(js_name = getCanvasIndex)]
    #[must_use]
    pub fn get_canvas_index(&self) -> CanvasIndex {
        self.provider.canvas_index()
    }

    /// Select a canvas; `false` for an out-of-range index.
    #[wasm_bindgen(js_name = setCanvasIndex)]
    pub fn set_canvas_index(&mut self, index: CanvasIndex) -> bool {
        self.provider.set_canvas_index(index)
    }

    /// Canvas to open first.
    #[wasm_bindgen(js_name = getStartCanvasIndex)]
    #[must_use]
    pub fn get_start_canvas_index(&self) -> usize {
        self.provider.start_canvas_index()
    }

    /// Canvas index for a typed label, `-1` when nothing matches.
    #[wasm_bindgen(js_name = getCanvasIndexByLabel)]
    #[must_use]
    pub fn get_canvas_index_by_label(&self, label: &str) -> CanvasIndex {
        self.provider
            .canvas_index_by_label(label)
            .and_then(|i| CanvasIndex::try_from(i).ok())
            .unwrap_or(NO_CANVAS)
    }

    /// Trimmed label of a canvas.
    #[wasm_bindgen(js_name = getCanvasLabel)]
    #[must_use]
    pub fn get_canvas_label(&self, index: CanvasIndex) -> Option<String> {
        self.provider.canvas_label(index)
    }

    /// Last numeric canvas label, `-` when none.
    #[wasm_bindgen(js_name = getLastCanvasLabel)]
    #[must_use]
    pub fn get_last_canvas_label(&self) -> String {
        self.provider.last_canvas_label()
    }

    /// Image (tile source) URI of a canvas.
    #[wasm_bindgen(js_name = getImageUri)]
    #[must_use]
    pub fn get_image_uri(&self, index: CanvasIndex) -> Option<String> {
        self.provider
            .canvas_by_index(index)
            .and_then(|canvas| self.provider.image_uri(canvas))
    }

    /// Poster image URI of the active sequence.
    #[wasm_bindgen(js_name = getPosterImageUri)]
    #[must_use]
    pub fn get_poster_image_uri(&self) -> Option<String> {
        self.provider.poster_image_uri()
    }

    /// Whether two-page spreads are in effect.
    #[wasm_bindgen(js_name = isPaged)]
    #[must_use]
    pub fn is_paged(&self) -> bool {
        self.provider.is_paged()
    }

    /// Canvases shown together with `index`, as a JSON array.
    #[wasm_bindgen(js_name = getPagedIndicesJson)]
    #[must_use]
    pub fn get_paged_indices_json(&self, index: CanvasIndex) -> String {
        to_json(&self.provider.paged_indices(index))
    }

    /// Index to show when stepping back.
    #[wasm_bindgen(js_name = getPrevPageIndex)]
    #[must_use]
    pub fn get_prev_page_index(&self, index: CanvasIndex) -> CanvasIndex {
        self.provider.prev_page_index(index)
    }

    /// Index to show when stepping forward, `-1` past the end.
    #[wasm_bindgen(js_name = getNextPageIndex)]
    #[must_use]
    pub fn get_next_page_index(&self, index: CanvasIndex) -> CanvasIndex {
        self.provider.next_page_index(index)
    }

    /// Whether `index` is the first canvas.
    #[wasm_bindgen(js_name = isFirstCanvas)]
    #[must_use]
    pub fn is_first_canvas(&self, index: CanvasIndex) -> bool {
        self.provider.is_first_canvas(index)
    }

    /// Whether `index` is the last canvas.
    #[wasm_bindgen(js_name = isLastCanvas)]
    #[must_use]
    pub fn is_last_canvas(&self, index: CanvasIndex) -> bool {
        self.provider.is_last_canvas(index)
    }

    /// Deepest structure containing a canvas, as JSON.
    #[wasm_bindgen(js_name = getStructureJson)]
    #[must_use]
    pub fn get_structure_json(&self, index: CanvasIndex) -> Option<String> {
        self.provider.structure_by_canvas_index(index).map(to_json)
    }

    /// First canvas inside the structure at `path`, `-1` when none.
    #[wasm_bindgen(js_name = getStructureIndex)]
    #[must_use]
    pub fn get_structure_index(&self, path: &str) -> CanvasIndex {
        self.provider
            .structure_index(path)
            .and_then(|i| CanvasIndex::try_from(i).ok())
            .unwrap_or(NO_CANVAS)
    }

    /// Navigation tree as JSON.
    #[wasm_bindgen(js_name = getTreeJson)]
    #[must_use]
    pub fn get_tree_json(&self) -> String {
        to_json(self.provider.tree())
    }

    /// Thumbnail descriptors as JSON.
    #[wasm_bindgen(js_name = getThumbsJson)]
    #[must_use]
    pub fn get_thumbs_json(&self, width: u32, height: u32) -> String {
        to_json(&self.provider.thumbs(width, height))
    }
}
