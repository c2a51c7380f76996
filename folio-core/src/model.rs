//! Normalized, dialect-neutral document model.
//!
//! Everything in this module is derived state: it is rebuilt from the raw
//! document on every load and never written back into it.

use serde::{Deserialize, Serialize};

use crate::graph::{StructureGraph, StructureId};

/// Navigation coordinate into the active sequence's canvas list.
///
/// Signed so that paging arithmetic can step below zero and so that
/// [`NO_CANVAS`] can mark "nothing selected".
pub type CanvasIndex = isize;

/// Sentinel index meaning "nothing selected" / "no such page".
pub const NO_CANVAS: CanvasIndex = -1;

/// Reading order of a sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewingDirection {
    /// Pages advance from left to right.
    #[default]
    LeftToRight,
    /// Pages advance from right to left.
    RightToLeft,
}

impl ViewingDirection {
    /// Interpret a raw `viewingDirection` value; anything other than
    /// `right-to-left` reads as left-to-right.
    #[must_use]
    pub fn from_hint(hint: Option<&str>) -> Self {
        match hint.map(str::trim) {
            Some("right-to-left") => Self::RightToLeft,
            _ => Self::LeftToRight,
        }
    }

    /// Wire representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LeftToRight => "left-to-right",
            Self::RightToLeft => "right-to-left",
        }
    }
}

impl std::fmt::Display for ViewingDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A leaf content unit (page, image, media asset).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    /// Position in the sequence's canvas list.
    pub index: usize,
    /// Document identifier (`@id`), when the dialect has one.
    pub id: Option<String>,
    /// Display label as stored in the document (untrimmed).
    pub label: String,
    /// Width in pixels, if declared.
    pub width: Option<u32>,
    /// Height in pixels, if declared.
    pub height: Option<u32>,
    /// Image service base URI used for thumbnails.
    pub image_service: Option<String>,
    /// Source file URI (legacy assets).
    pub file_uri: Option<String>,
    /// Deep-zoom image URI (legacy assets).
    pub dzi_uri: Option<String>,
    /// Media URI override (legacy assets).
    pub media_uri: Option<String>,
    /// Structures containing this canvas, in discovery order.
    ///
    /// The last entry is the deepest owning structure.
    pub structures: Vec<StructureId>,
}

impl Canvas {
    /// Height divided by width, when both dimensions are known and non-zero.
    #[must_use]
    pub fn aspect_ratio(&self) -> Option<f64> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some(f64::from(h) / f64::from(w)),
            _ => None,
        }
    }

    /// Deepest structure containing this canvas.
    #[must_use]
    pub fn deepest_structure(&self) -> Option<StructureId> {
        self.structures.last().copied()
    }
}

/// The normalized active sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceModel {
    /// Ordered canvases.
    pub canvases: Vec<Canvas>,
    /// Structure tree with canvas back-references resolved.
    pub graph: StructureGraph,
    /// Reading order.
    pub viewing_direction: ViewingDirection,
    /// Whether the sequence declares a paged (two-page spread) layout.
    pub paged: bool,
    /// Identifier of the canvas to open first.
    pub start_canvas: Option<String>,
}

impl SequenceModel {
    /// Number of canvases.
    #[must_use]
    pub fn total(&self) -> usize {
        self.canvases.len()
    }

    /// Canvas at a signed index, `None` when out of range.
    #[must_use]
    pub fn canvas(&self, index: CanvasIndex) -> Option<&Canvas> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.canvases.get(i))
    }
}

/// A thumbnail descriptor for the thumbnail strip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thumb {
    /// Canvas index.
    pub index: usize,
    /// Thumbnail image URI (empty when the canvas has no image service).
    pub uri: String,
    /// Canvas label.
    pub label: String,
    /// Thumbnail width in pixels.
    pub width: u32,
    /// Thumbnail height in pixels.
    pub height: u32,
    /// Whether the thumbnail should be shown.
    pub visible: bool,
}

/// A label/value metadata pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataItem {
    /// Field name.
    pub label: String,
    /// Field value (may contain HTML; sanitize before display).
    pub value: String,
}

impl MetadataItem {
    /// Create a metadata pair.
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}
