//! Document fetching.
//!
//! The engine never performs I/O itself. A [`ManifestResolver`] supplied by
//! the host turns a [`FetchRequest`] into parsed JSON; this module decides
//! which URIs to ask for, resolves the active sequence when it is a reference
//! stub, and swaps reloaded documents into an existing provider.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{ResolveError, ViewerResult};
use crate::provider::DocumentProvider;
use crate::schema::{Dialect, Document};
use crate::settings::{Settings, ViewerContext};

/// Callback name used for JSONP requests.
pub const JSONP_CALLBACK: &str = "manifestCallback";

/// How a document is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// Plain cross-origin JSON request.
    Cors,
    /// Script-tag style request wrapped in `callback(...)`.
    Jsonp {
        /// Callback function name.
        callback: String,
    },
}

impl Transport {
    /// CORS when the environment supports it and JSONP was not requested.
    #[must_use]
    pub fn select(context: &ViewerContext) -> Self {
        if context.cors_enabled() {
            Self::Cors
        } else {
            Self::Jsonp {
                callback: JSONP_CALLBACK.to_string(),
            }
        }
    }
}

/// A single document request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Absolute or host-relative URI.
    pub uri: String,
    /// Transport to use.
    pub transport: Transport,
}

impl FetchRequest {
    /// Create a request.
    #[must_use]
    pub fn new(uri: impl Into<String>, transport: Transport) -> Self {
        Self {
            uri: uri.into(),
            transport,
        }
    }
}

/// Host-provided document fetcher.
#[async_trait]
pub trait ManifestResolver: Send + Sync {
    /// Fetch and parse the JSON document at `request.uri`.
    async fn fetch_json(&self, request: &FetchRequest) -> Result<Value, ResolveError>;
}

/// Milliseconds since the Unix epoch.
#[must_use]
pub fn timestamp_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Append a `t=<timestamp>` cache-busting parameter.
#[must_use]
pub fn add_timestamp(uri: &str, timestamp: u64) -> String {
    let separator = if uri.contains('?') { '&' } else { '?' };
    format!("{uri}{separator}t={timestamp}")
}

/// Document URI: `dataBaseUri` followed by the host's data URI.
#[must_use]
pub fn manifest_uri(settings: &Settings, context: &ViewerContext) -> String {
    settings.data_uri(&context.data_uri)
}

/// URI of a legacy sequence reference, relative to the package URI.
#[must_use]
pub fn sequence_uri(manifest_uri: &str, reference: &str) -> String {
    if let Ok(joined) = url::Url::parse(manifest_uri).and_then(|base| base.join(reference)) {
        return joined.into();
    }

    let path = manifest_uri.split(['?', '#']).next().unwrap_or_default();
    match path.rfind('/') {
        Some(slash) => format!("{}{reference}", &path[..=slash]),
        None => reference.to_string(),
    }
}

/// Fetch the document at `uri` and resolve sequence `sequence_index` if it is
/// a reference stub.
///
/// # Errors
///
/// Propagates resolver failures, [`crate::ViewerError::NotFound`] for a
/// document without a sequence list, and
/// [`crate::ViewerError::SequenceOutOfRange`] for an unknown sequence.
pub async fn fetch_document<R>(
    resolver: &R,
    uri: &str,
    transport: Transport,
    sequence_index: usize,
    dialect: Option<Dialect>,
) -> ViewerResult<Document>
where
    R: ManifestResolver + ?Sized,
{
    debug!(uri, ?transport, "fetching document");
    let value = resolver
        .fetch_json(&FetchRequest::new(uri, transport.clone()))
        .await?;
    let mut document = Document::from_value(value, dialect)?;

    if let Some(reference) = document.sequence_reference(sequence_index)? {
        let stub_uri = match document.dialect() {
            Dialect::Iiif => reference,
            Dialect::Legacy => sequence_uri(uri, &reference),
        };
        debug!(uri = %stub_uri, sequence = sequence_index, "resolving sequence stub");
        let payload = resolver
            .fetch_json(&FetchRequest::new(stub_uri, transport))
            .await?;
        document.resolve_sequence(sequence_index, payload)?;
    }

    Ok(document)
}

/// Re-fetch the provider's document (cache-busted) and reload its active
/// sequence. On failure the provider keeps its previous state.
///
/// # Errors
///
/// See [`fetch_document`]; also fails if the fetched document is of the
/// other dialect.
pub async fn reload<P, R>(provider: &mut P, resolver: &R) -> ViewerResult<()>
where
    P: DocumentProvider + ?Sized,
    R: ManifestResolver + ?Sized,
{
    let sequence_index = provider.sequence_index();
    reload_sequence(provider, resolver, sequence_index).await
}

/// [`reload`], then hand the refreshed provider to `callback`.
///
/// # Errors
///
/// See [`reload`]; the callback is not invoked on failure.
pub async fn reload_with<P, R, F>(provider: &mut P, resolver: &R, callback: F) -> ViewerResult<()>
where
    P: DocumentProvider + ?Sized,
    R: ManifestResolver + ?Sized,
    F: FnOnce(&mut P) + Send,
{
    reload(provider, resolver).await?;
    callback(provider);
    Ok(())
}

/// Re-fetch the document and switch to `sequence_index`, resolving it when
/// it is a reference stub.
///
/// # Errors
///
/// See [`reload`].
pub async fn reload_sequence<P, R>(
    provider: &mut P,
    resolver: &R,
    sequence_index: usize,
) -> ViewerResult<()>
where
    P: DocumentProvider + ?Sized,
    R: ManifestResolver + ?Sized,
{
    let uri = add_timestamp(
        &manifest_uri(provider.settings(), provider.context()),
        timestamp_millis(),
    );
    let transport = Transport::select(provider.context());
    let dialect = provider.dialect();

    let document = fetch_document(resolver, &uri, transport, sequence_index, Some(dialect)).await?;
    provider.replace_document(document, sequence_index)?;

    info!(
        sequence = sequence_index,
        canvases = provider.total_canvases(),
        "document reloaded"
    );
    Ok(())
}
