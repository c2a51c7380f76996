//! Shared fixtures and an in-memory resolver for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use folio_core::{Document, FetchRequest, ManifestResolver, ResolveError};
use serde_json::Value;

pub const MANIFEST_URI: &str = "http://example.org/iiif/book/manifest.json";
pub const SEQUENCE_1_URI: &str = "http://example.org/iiif/book/sequence/1.json";
pub const PACKAGE_URI: &str = "http://example.org/packages/letters/package.json";
pub const LEGACY_SEQUENCE_1_URI: &str = "http://example.org/packages/letters/legacy-sequence-1.json";

/// Dialect-A fixture: six canvases, paged, nested ranges, one stub sequence.
pub fn manifest_json() -> Value {
    parse(include_str!("../fixtures/manifest.json"))
}

/// Resolved body of the fixture manifest's second sequence.
pub fn sequence_1_json() -> Value {
    parse(include_str!("../fixtures/sequence-1.json"))
}

/// Dialect-B fixture: two volumes, the second one a `$ref` stub.
pub fn package_json() -> Value {
    parse(include_str!("../fixtures/package.json"))
}

/// Resolved body of the fixture package's second sequence.
pub fn legacy_sequence_1_json() -> Value {
    parse(include_str!("../fixtures/legacy-sequence-1.json"))
}

pub fn manifest() -> Document {
    Document::from_value(manifest_json(), None).expect("fixture manifest parses")
}

pub fn package() -> Document {
    Document::from_value(package_json(), None).expect("fixture package parses")
}

fn parse(json: &str) -> Value {
    serde_json::from_str(json).expect("fixture is valid JSON")
}

/// Resolver serving documents from memory, keyed by URI without query.
#[derive(Debug, Default)]
pub struct MemoryResolver {
    documents: Mutex<HashMap<String, Value>>,
    requests: Mutex<Vec<FetchRequest>>,
}

impl MemoryResolver {
    /// Resolver serving both fixture documents and their stub sequences.
    pub fn with_fixtures() -> Self {
        let resolver = Self::default();
        resolver.insert(MANIFEST_URI, manifest_json());
        resolver.insert(SEQUENCE_1_URI, sequence_1_json());
        resolver.insert(PACKAGE_URI, package_json());
        resolver.insert(LEGACY_SEQUENCE_1_URI, legacy_sequence_1_json());
        resolver
    }

    pub fn insert(&self, uri: &str, value: Value) {
        self.documents
            .lock()
            .unwrap()
            .insert(uri.to_string(), value);
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ManifestResolver for MemoryResolver {
    async fn fetch_json(&self, request: &FetchRequest) -> Result<Value, ResolveError> {
        self.requests.lock().unwrap().push(request.clone());
        let key = request.uri.split('?').next().unwrap_or_default();
        self.documents
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| ResolveError::Status {
                uri: request.uri.clone(),
                status: 404,
            })
    }
}
