//! Raw document schemas for both dialects.
//!
//! These types describe documents exactly as they arrive on the wire. They are
//! deliberately forgiving: optional fields default, references may be strings,
//! indices or embedded objects, and a sequence may be a stub that points at
//! another document. Nothing here interprets the data; see
//! [`crate::provider`] for normalization.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{ViewerError, ViewerResult};

/// The two supported document shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `sequences` / `canvases` / `structures`, cross-referenced by `@id`.
    Iiif,
    /// `assetSequences` / `assets` / `rootSection`, cross-referenced by index.
    Legacy,
}

impl Dialect {
    /// Key of the top-level sequence list for this dialect.
    #[must_use]
    pub fn sequence_key(self) -> &'static str {
        match self {
            Self::Iiif => "sequences",
            Self::Legacy => "assetSequences",
        }
    }

    /// Guess the dialect from the document's shape.
    #[must_use]
    pub fn detect(value: &Value) -> Option<Self> {
        [Self::Iiif, Self::Legacy]
            .into_iter()
            .find(|dialect| value.get(dialect.sequence_key()).is_some_and(Value::is_array))
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iiif => f.write_str("iiif"),
            Self::Legacy => f.write_str("legacy"),
        }
    }
}

impl std::str::FromStr for Dialect {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "iiif" => Ok(Self::Iiif),
            "legacy" => Ok(Self::Legacy),
            _ => Err(ViewerError::UnknownDialect),
        }
    }
}

// ---------------------------------------------------------------------------
// Lenient field helpers
// ---------------------------------------------------------------------------

/// Flatten a JSON-LD style text value to a plain string.
///
/// Accepts strings, numbers, `{"@value": ..}` / `{"@id": ..}` objects and
/// arrays (first usable entry wins).
#[must_use]
pub fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map
            .get("@value")
            .or_else(|| map.get("@id"))
            .and_then(text_of),
        Value::Array(items) => items.iter().find_map(text_of),
        Value::Null | Value::Bool(_) => None,
    }
}

fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(text_of))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn dimension<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn index<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// Dialect A
// ---------------------------------------------------------------------------

/// A dialect-A manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IiifManifest {
    /// Manifest identifier.
    #[serde(rename = "@id", default, deserialize_with = "text")]
    pub id: Option<String>,
    /// Title.
    #[serde(default, deserialize_with = "text")]
    pub label: Option<String>,
    /// Description.
    #[serde(default, deserialize_with = "text")]
    pub description: Option<String>,
    /// Attribution statement.
    #[serde(default, deserialize_with = "text")]
    pub attribution: Option<String>,
    /// License URI.
    #[serde(default, deserialize_with = "text")]
    pub license: Option<String>,
    /// Logo URI.
    #[serde(default, deserialize_with = "text")]
    pub logo: Option<String>,
    /// Related resource, passed through untouched.
    #[serde(default)]
    pub see_also: Option<Value>,
    /// Descriptive label/value pairs; `None` when the document has no list.
    #[serde(default)]
    pub metadata: Option<Vec<IiifMetadata>>,
    /// Sequence list; `None` when the document lacks one.
    #[serde(default)]
    pub sequences: Option<Vec<IiifSequence>>,
    /// Manifest-level ranges.
    #[serde(default, deserialize_with = "list")]
    pub structures: Vec<IiifRange>,
}

/// One `metadata` entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IiifMetadata {
    /// Field name.
    #[serde(default, deserialize_with = "text")]
    pub label: Option<String>,
    /// Field value.
    #[serde(default, deserialize_with = "text")]
    pub value: Option<String>,
}

impl IiifManifest {
    /// Replace every stub other than `active` with an empty placeholder.
    pub fn scrub_stubs(&mut self, active: usize) {
        for (i, sequence) in self.sequences.iter_mut().flatten().enumerate() {
            if i != active && sequence.is_stub() {
                *sequence = IiifSequence {
                    canvases: Some(Vec::new()),
                    ..IiifSequence::default()
                };
            }
        }
    }

    /// Sequence at `index`.
    #[must_use]
    pub fn sequence(&self, index: usize) -> Option<&IiifSequence> {
        self.sequences.as_ref().and_then(|s| s.get(index))
    }
}

/// A dialect-A sequence. A sequence without `canvases` is a reference stub.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IiifSequence {
    /// Sequence identifier, also the URI to fetch a stub from.
    #[serde(rename = "@id", default, deserialize_with = "text")]
    pub id: Option<String>,
    /// Ordered canvases; `None` marks a stub.
    #[serde(default)]
    pub canvases: Option<Vec<IiifCanvas>>,
    /// `left-to-right` (default) or `right-to-left`.
    #[serde(default, deserialize_with = "text")]
    pub viewing_direction: Option<String>,
    /// `paged` enables two-page spreads.
    #[serde(default, deserialize_with = "text")]
    pub viewing_hint: Option<String>,
    /// Identifier of the canvas to open first.
    #[serde(default, deserialize_with = "text")]
    pub start_canvas: Option<String>,
}

impl IiifSequence {
    /// Whether this entry still points at another document.
    #[must_use]
    pub fn is_stub(&self) -> bool {
        self.canvases.is_none()
    }
}

/// A dialect-A canvas.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IiifCanvas {
    /// Canvas identifier.
    #[serde(rename = "@id", default, deserialize_with = "text")]
    pub id: Option<String>,
    /// Page label.
    #[serde(default, deserialize_with = "text")]
    pub label: Option<String>,
    /// Width in pixels.
    #[serde(default, deserialize_with = "dimension")]
    pub width: Option<u32>,
    /// Height in pixels.
    #[serde(default, deserialize_with = "dimension")]
    pub height: Option<u32>,
    /// Image annotations.
    #[serde(default, deserialize_with = "list")]
    pub images: Vec<Value>,
    /// Alternative annotation list used by some producers.
    #[serde(default)]
    pub resources: Option<Vec<Value>>,
}

impl IiifCanvas {
    /// Image service base URI of the first image annotation.
    ///
    /// `resources` takes precedence over `images` when present.
    #[must_use]
    pub fn image_service(&self) -> Option<String> {
        let annotation = match &self.resources {
            Some(resources) => resources.first(),
            None => self.images.first(),
        }?;
        let service = annotation.pointer("/resource/service")?;
        match service {
            Value::Array(items) => items.iter().find_map(|s| s.get("@id").and_then(text_of)),
            Value::Object(map) => map.get("@id").and_then(text_of),
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

/// A canvas member of a range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CanvasRef {
    /// Canvas `@id`.
    Id(String),
    /// Canvas position.
    Index(usize),
    /// Embedded canvas object.
    Object(Map<String, Value>),
    /// Anything else (unresolvable).
    Other(Value),
}

/// A child-range reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RangeRef {
    /// Range `@id`.
    Id(String),
    /// Embedded range.
    Object(Box<IiifRange>),
    /// Anything else (unresolvable).
    Other(Value),
}

/// A dialect-A range (structure).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IiifRange {
    /// Range identifier.
    #[serde(rename = "@id", default, deserialize_with = "text")]
    pub id: Option<String>,
    /// Display label.
    #[serde(default, deserialize_with = "text")]
    pub label: Option<String>,
    /// `top` marks the root range.
    #[serde(default, deserialize_with = "text")]
    pub viewing_hint: Option<String>,
    /// Member canvases.
    #[serde(default, deserialize_with = "list")]
    pub canvases: Vec<CanvasRef>,
    /// Child ranges.
    #[serde(default, deserialize_with = "list")]
    pub ranges: Vec<RangeRef>,
}

// ---------------------------------------------------------------------------
// Dialect B
// ---------------------------------------------------------------------------

/// A dialect-B package.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyPackage {
    /// Manifestation tree.
    #[serde(default)]
    pub root_structure: Option<Manifestation>,
    /// Sequence list; `None` when the document lacks one.
    #[serde(default)]
    pub asset_sequences: Option<Vec<AssetSequence>>,
    /// Attribution statement.
    #[serde(default, deserialize_with = "text")]
    pub attribution: Option<String>,
    /// License URI.
    #[serde(default, deserialize_with = "text")]
    pub license: Option<String>,
    /// Logo URI.
    #[serde(default, deserialize_with = "text")]
    pub logo: Option<String>,
    /// Package-level related resource (`{ tag, data }`).
    #[serde(default)]
    pub see_also: Option<Value>,
}

impl LegacyPackage {
    /// Replace every stub other than `active` with an empty placeholder.
    pub fn scrub_stubs(&mut self, active: usize) {
        for (i, sequence) in self.asset_sequences.iter_mut().flatten().enumerate() {
            if i != active && sequence.is_stub() {
                *sequence = AssetSequence::default();
            }
        }
    }

    /// Sequence at `index`.
    #[must_use]
    pub fn sequence(&self, index: usize) -> Option<&AssetSequence> {
        self.asset_sequences.as_ref().and_then(|s| s.get(index))
    }
}

/// A node of the dialect-B manifestation tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifestation {
    /// Display name.
    #[serde(default, deserialize_with = "text")]
    pub name: Option<String>,
    /// Manifestation type.
    #[serde(default, deserialize_with = "text")]
    pub section_type: Option<String>,
    /// Index of the sequence this node owns.
    #[serde(default, deserialize_with = "index")]
    pub asset_sequence: Option<usize>,
    /// Child manifestations.
    #[serde(default, deserialize_with = "list")]
    pub structures: Vec<Manifestation>,
}

/// A dialect-B sequence. An entry carrying `$ref` is a reference stub.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSequence {
    /// Stub reference, relative to the package URI.
    #[serde(rename = "$ref", default, deserialize_with = "text")]
    pub reference: Option<String>,
    /// MIME-like asset type (`seadragon/dzi`, `application/pdf`).
    #[serde(default, deserialize_with = "text")]
    pub asset_type: Option<String>,
    /// Ordered assets.
    #[serde(default, deserialize_with = "list")]
    pub assets: Vec<Asset>,
    /// Root of the section tree.
    #[serde(default)]
    pub root_section: Option<Section>,
    /// Reading order, rarely present.
    #[serde(default, deserialize_with = "text")]
    pub viewing_direction: Option<String>,
    /// Sequence-level related resource.
    #[serde(default)]
    pub see_also: Option<Value>,
    /// Player-specific extras (`posterImage`, ...).
    #[serde(default)]
    pub extensions: Option<Value>,
}

impl AssetSequence {
    /// Whether this entry still points at another document.
    #[must_use]
    pub fn is_stub(&self) -> bool {
        self.reference.is_some()
    }

    /// Poster image path from `extensions.posterImage`.
    #[must_use]
    pub fn poster_image(&self) -> Option<&str> {
        self.extensions
            .as_ref()
            .and_then(|e| e.get("posterImage"))
            .and_then(Value::as_str)
            .filter(|path| !path.trim().is_empty())
    }
}

/// A dialect-B asset (canvas).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// Page label.
    #[serde(default, deserialize_with = "text")]
    pub order_label: Option<String>,
    /// Source file path.
    #[serde(default, deserialize_with = "text")]
    pub file_uri: Option<String>,
    /// Deep-zoom descriptor path.
    #[serde(default, deserialize_with = "text")]
    pub dzi_uri: Option<String>,
    /// Media path override.
    #[serde(default, deserialize_with = "text")]
    pub media_uri: Option<String>,
    /// Width in pixels.
    #[serde(default, deserialize_with = "dimension")]
    pub width: Option<u32>,
    /// Height in pixels.
    #[serde(default, deserialize_with = "dimension")]
    pub height: Option<u32>,
}

/// An asset index inside a section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetRef {
    /// Asset position.
    Index(usize),
    /// Anything else (unresolvable).
    Other(Value),
}

/// A dialect-B section (structure).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Section type, subject to `sectionMappings`.
    #[serde(default, deserialize_with = "text")]
    pub section_type: Option<String>,
    /// Title (meaningful on the root section).
    #[serde(default, deserialize_with = "text")]
    pub title: Option<String>,
    /// Member asset indices.
    #[serde(default, deserialize_with = "list")]
    pub assets: Vec<AssetRef>,
    /// Child sections.
    #[serde(default, deserialize_with = "list")]
    pub sections: Vec<Section>,
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A raw document of either dialect.
#[derive(Debug, Clone)]
pub enum Document {
    /// Dialect A.
    Iiif(IiifManifest),
    /// Dialect B.
    Legacy(LegacyPackage),
}

impl Document {
    /// Parse a raw JSON document.
    ///
    /// `dialect` forces the interpretation; otherwise it is detected from the
    /// shape.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::NotFound`] when the document has no sequence
    /// list for the chosen dialect, or a serialization error when a present
    /// field has an unusable shape.
    pub fn from_value(value: Value, dialect: Option<Dialect>) -> ViewerResult<Self> {
        let dialect = match dialect {
            Some(dialect) => dialect,
            None => Dialect::detect(&value).ok_or_else(|| {
                ViewerError::NotFound("document has no sequence list".to_string())
            })?,
        };

        if !value.get(dialect.sequence_key()).is_some_and(Value::is_array) {
            return Err(ViewerError::NotFound(format!(
                "document has no `{}` list",
                dialect.sequence_key()
            )));
        }

        Ok(match dialect {
            Dialect::Iiif => Self::Iiif(serde_json::from_value(value)?),
            Dialect::Legacy => Self::Legacy(serde_json::from_value(value)?),
        })
    }

    /// Parse a JSON string.
    ///
    /// # Errors
    ///
    /// See [`Document::from_value`].
    pub fn from_json(json: &str, dialect: Option<Dialect>) -> ViewerResult<Self> {
        Self::from_value(serde_json::from_str(json)?, dialect)
    }

    /// Which dialect this document is.
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        match self {
            Self::Iiif(_) => Dialect::Iiif,
            Self::Legacy(_) => Dialect::Legacy,
        }
    }

    /// Number of sequences (stubs included).
    #[must_use]
    pub fn sequence_count(&self) -> usize {
        match self {
            Self::Iiif(m) => m.sequences.as_ref().map_or(0, Vec::len),
            Self::Legacy(p) => p.asset_sequences.as_ref().map_or(0, Vec::len),
        }
    }

    fn check_index(&self, index: usize) -> ViewerResult<()> {
        let len = self.sequence_count();
        if index < len {
            Ok(())
        } else {
            Err(ViewerError::SequenceOutOfRange { index, len })
        }
    }

    /// Whether sequence `index` is still a reference stub.
    #[must_use]
    pub fn is_stub(&self, index: usize) -> bool {
        match self {
            Self::Iiif(m) => m.sequence(index).is_some_and(IiifSequence::is_stub),
            Self::Legacy(p) => p.sequence(index).is_some_and(AssetSequence::is_stub),
        }
    }

    /// Raw reference of sequence `index` when it is a stub.
    ///
    /// Dialect A yields the sequence `@id`; dialect B yields `$ref` as written
    /// (relative to the package URI).
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::SequenceOutOfRange`] for an unknown index.
    pub fn sequence_reference(&self, index: usize) -> ViewerResult<Option<String>> {
        self.check_index(index)?;
        if !self.is_stub(index) {
            return Ok(None);
        }
        Ok(match self {
            Self::Iiif(m) => m.sequence(index).and_then(|s| s.id.clone()),
            Self::Legacy(p) => p.sequence(index).and_then(|s| s.reference.clone()),
        })
    }

    /// Replace sequence `index` with a fetched sequence document.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::SequenceOutOfRange`] for an unknown index or a
    /// serialization error when the payload is not a sequence.
    pub fn resolve_sequence(&mut self, index: usize, value: Value) -> ViewerResult<()> {
        self.check_index(index)?;
        match self {
            Self::Iiif(m) => {
                let sequence: IiifSequence = serde_json::from_value(value)?;
                if let Some(slot) = m.sequences.as_mut().and_then(|s| s.get_mut(index)) {
                    *slot = sequence;
                }
            }
            Self::Legacy(p) => {
                let sequence: AssetSequence = serde_json::from_value(value)?;
                if let Some(slot) = p.asset_sequences.as_mut().and_then(|s| s.get_mut(index)) {
                    *slot = sequence;
                }
            }
        }
        Ok(())
    }

    /// Replace every stub other than `active` with an empty placeholder.
    pub fn scrub_stubs(&mut self, active: usize) {
        match self {
            Self::Iiif(m) => m.scrub_stubs(active),
            Self::Legacy(p) => p.scrub_stubs(active),
        }
    }
}
