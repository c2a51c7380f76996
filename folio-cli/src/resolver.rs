//! HTTP and filesystem document resolvers.

use std::path::PathBuf;

use async_trait::async_trait;
use folio_core::{FetchRequest, ManifestResolver, ResolveError, Transport};
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Errors that can occur while fetching a document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The document URI is not a valid URL.
    #[error("invalid document URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed (connection, timeout, etc.).
    #[error("document request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("request to {uri} returned status {status}")]
    Status {
        /// Requested URI.
        uri: String,
        /// HTTP status code.
        status: u16,
    },
    /// Reading a local document failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Local path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// A JSONP body was not wrapped in the expected callback.
    #[error("response is not wrapped in {callback}(...)")]
    Jsonp {
        /// Expected callback name.
        callback: String,
    },
    /// JSON parsing failed.
    #[error("failed to parse document: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<FetchError> for ResolveError {
    fn from(error: FetchError) -> Self {
        match error {
            FetchError::Status { uri, status } => Self::Status { uri, status },
            FetchError::Io { source, .. } => Self::Io(source),
            FetchError::Jsonp { .. } | FetchError::Json(_) => Self::InvalidPayload(error.to_string()),
            FetchError::InvalidUrl(_) | FetchError::Http(_) => Self::Transport(error.to_string()),
        }
    }
}

/// Strip a `callback(...)` wrapper (and an optional trailing `;`).
///
/// # Errors
///
/// Returns [`FetchError::Jsonp`] if the body is not wrapped in `callback`.
pub fn unwrap_jsonp<'a>(body: &'a str, callback: &str) -> Result<&'a str, FetchError> {
    let trimmed = body.trim();
    let trimmed = trimmed.strip_suffix(';').unwrap_or(trimmed).trim_end();
    trimmed
        .strip_prefix(callback)
        .map(str::trim_start)
        .and_then(|rest| rest.strip_prefix('('))
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| FetchError::Jsonp {
            callback: callback.to_string(),
        })
}

/// Parse a response body according to its transport.
///
/// # Errors
///
/// Returns an error if the body is not JSON or not correctly wrapped.
pub fn parse_body(body: &str, transport: &Transport) -> Result<Value, FetchError> {
    let json = match transport {
        Transport::Cors => body,
        Transport::Jsonp { callback } => unwrap_jsonp(body, callback)?,
    };
    Ok(serde_json::from_str(json)?)
}

/// Fetches documents over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpResolver {
    http: Client,
}

impl HttpResolver {
    /// Create a resolver with a fresh HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client fails to build.
    pub fn new() -> Result<Self, FetchError> {
        let http = Client::builder()
            .user_agent(concat!("folio-cli/", env!("CARGO_PKG_VERSION")))
            // Disable proxy detection to avoid macOS system-configuration panic
            .no_proxy()
            .build()?;
        Ok(Self { http })
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<Value, FetchError> {
        let mut url = Url::parse(&request.uri).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        if let Transport::Jsonp { callback } = &request.transport {
            url.query_pairs_mut().append_pair("callback", callback);
        }

        tracing::debug!(%url, "GET");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                uri: request.uri.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        parse_body(&body, &request.transport)
    }
}

#[async_trait]
impl ManifestResolver for HttpResolver {
    async fn fetch_json(&self, request: &FetchRequest) -> Result<Value, ResolveError> {
        Ok(self.fetch(request).await?)
    }
}

/// Reads documents from the local filesystem.
///
/// Accepts plain paths and `file://` URLs; cache-busting query strings are
/// ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileResolver;

impl FileResolver {
    /// Local path named by a document URI.
    #[must_use]
    pub fn path_of(uri: &str) -> PathBuf {
        if let Ok(url) = Url::parse(uri) {
            if let Ok(path) = url.to_file_path() {
                return path;
            }
        }
        let path = uri.split(['?', '#']).next().unwrap_or_default();
        PathBuf::from(path)
    }

    async fn fetch(request: &FetchRequest) -> Result<Value, FetchError> {
        let path = Self::path_of(&request.uri);
        tracing::debug!(path = %path.display(), "read");
        let body = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| FetchError::Io { path, source })?;
        parse_body(&body, &request.transport)
    }
}

#[async_trait]
impl ManifestResolver for FileResolver {
    async fn fetch_json(&self, request: &FetchRequest) -> Result<Value, ResolveError> {
        Ok(Self::fetch(request).await?)
    }
}

/// Dispatches `http`/`https` URIs to [`HttpResolver`] and everything else to
/// [`FileResolver`].
#[derive(Debug, Clone)]
pub struct AutoResolver {
    http: HttpResolver,
}

impl AutoResolver {
    /// Create a resolver.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client fails to build.
    pub fn new() -> Result<Self, FetchError> {
        Ok(Self {
            http: HttpResolver::new()?,
        })
    }
}

fn is_remote(uri: &str) -> bool {
    Url::parse(uri).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

#[async_trait]
impl ManifestResolver for AutoResolver {
    async fn fetch_json(&self, request: &FetchRequest) -> Result<Value, ResolveError> {
        if is_remote(&request.uri) {
            self.http.fetch_json(request).await
        } else {
            FileResolver.fetch_json(request).await
        }
    }
}
