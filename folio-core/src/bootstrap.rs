//! Opening a viewer: fetch, detect, resolve, construct.

use tracing::info;

use crate::error::ViewerResult;
use crate::provider::{self, DocumentProvider};
use crate::resolver::{self, ManifestResolver, Transport};
use crate::schema::Dialect;
use crate::settings::{Settings, ViewerContext};

/// Everything needed to open a document.
#[derive(Debug, Clone, Default)]
pub struct BootstrapOptions {
    /// Viewer settings.
    pub settings: Settings,
    /// Host environment (carries the data URI).
    pub context: ViewerContext,
    /// Sequence to open.
    pub sequence_index: usize,
    /// Forced dialect; falls back to the `IIIF` setting, then to shape
    /// detection.
    pub dialect: Option<Dialect>,
}

impl BootstrapOptions {
    /// Options for a document URI with default settings.
    #[must_use]
    pub fn new(data_uri: impl Into<String>) -> Self {
        Self {
            context: ViewerContext::new(data_uri),
            ..Self::default()
        }
    }

    /// Dialect to force, if any.
    #[must_use]
    pub fn forced_dialect(&self) -> Option<Dialect> {
        self.dialect.or_else(|| {
            self.settings
                .iiif
                .map(|iiif| if iiif { Dialect::Iiif } else { Dialect::Legacy })
        })
    }
}

/// Fetch the document named by `options`, resolve its selected sequence and
/// build the matching provider.
///
/// # Errors
///
/// Fails when fetching fails, the document has no sequence list, or the
/// selected sequence does not exist.
pub async fn open<R>(resolver: &R, options: BootstrapOptions) -> ViewerResult<Box<dyn DocumentProvider>>
where
    R: ManifestResolver + ?Sized,
{
    let uri = resolver::manifest_uri(&options.settings, &options.context);
    let transport = Transport::select(&options.context);
    let dialect = options.forced_dialect();

    let document =
        resolver::fetch_document(resolver, &uri, transport, options.sequence_index, dialect).await?;
    let found = document.dialect();

    let viewer = provider::create(
        document,
        options.settings,
        options.context,
        options.sequence_index,
    )?;

    info!(
        %uri,
        dialect = %found,
        sequences = viewer.sequence_count(),
        canvases = viewer.total_canvases(),
        "document opened"
    );
    Ok(viewer)
}
