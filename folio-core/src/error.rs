//! Error types for document operations.

use thiserror::Error;

/// Result type for document operations.
pub type ViewerResult<T> = Result<T, ViewerError>;

/// Errors that can occur while opening, loading or reloading a document.
///
/// Expected "not found" answers (out-of-range indices, unknown labels,
/// unresolvable references) are never errors; they surface as `None` or the
/// `-1` sentinel from the relevant accessor.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// The document has no sequence list in either dialect's shape.
    #[error("Document not found: {0}")]
    NotFound(String),

    /// The requested sequence index does not exist in the document.
    #[error("Sequence index {index} out of range (document has {len} sequences)")]
    SequenceOutOfRange {
        /// Requested sequence index.
        index: usize,
        /// Number of sequences in the document.
        len: usize,
    },

    /// The selected sequence is still a reference stub.
    #[error("Sequence {0} has not been resolved")]
    UnresolvedSequence(usize),

    /// Neither dialect's shape matched the raw document.
    #[error("Unknown document dialect")]
    UnknownDialect,

    /// A document of one dialect was handed to a provider of the other.
    #[error("Expected a {expected} document, got {found}")]
    DialectMismatch {
        /// Dialect the provider handles.
        expected: crate::schema::Dialect,
        /// Dialect of the supplied document.
        found: crate::schema::Dialect,
    },

    /// Document serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Fetching the document through the resolver failed.
    #[error("Failed to resolve document: {0}")]
    Resolve(#[from] ResolveError),
}

/// Errors reported by a [`crate::resolver::ManifestResolver`].
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Connection, timeout or other transport failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The origin answered with a non-success status.
    #[error("Request to {uri} failed with status {status}")]
    Status {
        /// Requested URI.
        uri: String,
        /// HTTP status code.
        status: u16,
    },

    /// The payload was not a JSON document (or JSONP-wrapped document).
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Local I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
