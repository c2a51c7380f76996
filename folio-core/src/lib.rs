//! # Folio Core
//!
//! Document model resolution and navigation for image viewers.
//! Compiles to WASM for true cross-platform portability.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              folio-core.wasm                │
//! ├─────────────────────────────────────────────┤
//! │  Schemas         │  Providers               │
//! │  - IIIF manifest │  - Sequence selection    │
//! │  - Legacy package│  - Structure graph       │
//! │  - Stub scrubbing│  - Navigation tree       │
//! ├─────────────────────────────────────────────┤
//! │  Navigation      │  Resolver                │
//! │  - Paging        │  - Fetch contract        │
//! │  - Label search  │  - Stub resolution       │
//! │  - Sanitizer     │  - Reload / bootstrap    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use folio_core::{provider, Document, DocumentProvider, Settings, ViewerContext};
//!
//! let json = r#"{"sequences": [{"canvases": [{"@id": "c0", "label": "1"}]}]}"#;
//! let document = Document::from_json(json, None).unwrap();
//! let viewer = provider::create(document, Settings::default(), ViewerContext::default(), 0).unwrap();
//! assert_eq!(viewer.canvas_index_by_label("1"), Some(0));
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bootstrap;
pub mod error;
pub mod graph;
pub mod label;
pub mod model;
pub mod paging;
pub mod provider;
pub mod resolver;
pub mod sanitize;
pub mod schema;
pub mod settings;
pub mod tree;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use bootstrap::{open, BootstrapOptions};
pub use error::{ResolveError, ViewerError, ViewerResult};
pub use graph::{Structure, StructureGraph, StructureId};
pub use model::{Canvas, CanvasIndex, MetadataItem, SequenceModel, Thumb, ViewingDirection, NO_CANVAS};
pub use paging::PagingContext;
pub use provider::{DocumentProvider, IiifProvider, LegacyProvider, ProviderCore};
pub use resolver::{FetchRequest, ManifestResolver, Transport};
pub use sanitize::{AllowListSanitizer, HtmlSanitizer};
pub use schema::{Dialect, Document, IiifManifest, LegacyPackage};
pub use settings::{Settings, ViewerContext};
pub use tree::{NodeKind, NodeTarget, Tree, TreeNode, TreeNodeData, TreeNodeId};

/// Folio core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
