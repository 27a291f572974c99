//! Documentation documents and the blob joiner.
//!
//! Documentation blobs are OpenAPI-3.1-shaped JSON. This module keeps the
//! document model deliberately shallow: the path and schema tables hold raw
//! [`serde_json::Value`] entries, and unrecognized fields ride along through
//! `#[serde(flatten)]`, so merging never loses structure it does not
//! interpret.

use bytes::Bytes;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::error::{SwaggerError, SwaggerResult};

/// The OpenAPI version stamped on documents this layer creates.
pub const OPENAPI_VERSION: &str = "3.1.0";

/// A documentation document: the parsed form of a documentation blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiDocument {
    /// OpenAPI version marker.
    pub openapi: String,

    /// API metadata.
    pub info: ApiInfo,

    /// Server URLs this API is reachable under.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<ApiServer>,

    /// Path table. Entries are carried structurally, not interpreted.
    #[serde(default)]
    pub paths: IndexMap<String, Value>,

    /// Shared schema section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<ApiComponents>,

    /// Top-level fields this layer does not interpret (tags, extensions).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApiDocument {
    /// Creates a document with the given title and version and no paths.
    #[must_use]
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            openapi: OPENAPI_VERSION.to_string(),
            info: ApiInfo {
                title: title.into(),
                version: version.into(),
                ..ApiInfo::default()
            },
            servers: Vec::new(),
            paths: IndexMap::new(),
            components: None,
            extra: Map::new(),
        }
    }

    /// The well-formed empty document: no paths, blank metadata.
    #[must_use]
    pub fn empty() -> Self {
        Self::new("", "")
    }

    /// Adds (or replaces) a path entry.
    pub fn add_path(&mut self, path: impl Into<String>, operations: Value) {
        self.paths.insert(path.into(), operations);
    }

    /// Adds (or replaces) a shared schema.
    pub fn add_schema(&mut self, name: impl Into<String>, schema: Value) {
        self.components
            .get_or_insert_with(ApiComponents::default)
            .schemas
            .insert(name.into(), schema);
    }

    /// Parses a documentation blob.
    pub fn from_slice(blob: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(blob)
    }

    /// Serializes this document into a blob.
    pub fn to_bytes(&self) -> SwaggerResult<Bytes> {
        serde_json::to_vec(self)
            .map(Bytes::from)
            .map_err(SwaggerError::Serialize)
    }
}

impl Default for ApiDocument {
    fn default() -> Self {
        Self::empty()
    }
}

/// API metadata block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiInfo {
    /// API title.
    pub title: String,
    /// API version.
    pub version: String,
    /// API description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Metadata fields this layer does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A server entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiServer {
    /// Server URL.
    pub url: String,
    /// Server description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Reusable components; only the schema table is merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiComponents {
    /// Shared schema table. Entries are carried structurally.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: IndexMap<String, Value>,
    /// Component kinds this layer does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An opaque documentation option, applied by a descriptor when it renders
/// its definition.
#[derive(Clone)]
pub struct SwaggerOption {
    inner: Arc<dyn Fn(&mut ApiDocument) + Send + Sync>,
}

impl SwaggerOption {
    /// Creates an option from a document transform.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut ApiDocument) + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Overrides the document title.
    #[must_use]
    pub fn with_title(title: impl Into<String>) -> Self {
        let title = title.into();
        Self::new(move |doc| doc.info.title = title.clone())
    }

    /// Overrides the document version.
    #[must_use]
    pub fn with_version(version: impl Into<String>) -> Self {
        let version = version.into();
        Self::new(move |doc| doc.info.version = version.clone())
    }

    /// Sets the document description.
    #[must_use]
    pub fn with_description(description: impl Into<String>) -> Self {
        let description = description.into();
        Self::new(move |doc| doc.info.description = Some(description.clone()))
    }

    /// Appends a server URL entry.
    #[must_use]
    pub fn with_server(url: impl Into<String>) -> Self {
        let url = url.into();
        Self::new(move |doc| {
            doc.servers.push(ApiServer {
                url: url.clone(),
                description: None,
            });
        })
    }

    /// Applies this option to a document.
    pub fn apply(&self, doc: &mut ApiDocument) {
        (self.inner)(doc);
    }
}

impl fmt::Debug for SwaggerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwaggerOption").finish_non_exhaustive()
    }
}

/// Merges documentation blobs into one document.
///
/// Appending never fails; parse problems surface on
/// [`sum_definitions`](Self::sum_definitions). The first appended blob
/// supplies the document envelope (version marker, info block, servers,
/// uninterpreted top-level fields); later blobs contribute their path and
/// schema tables, overriding earlier entries on key collision.
///
/// # Example
///
/// ```
/// use stoa_transport::{ApiDocument, SwaggerJoiner};
/// use serde_json::json;
///
/// let mut first = ApiDocument::new("Users", "1.0.0");
/// first.add_path("/users", json!({"get": {}}));
/// let mut second = ApiDocument::new("Orders", "1.0.0");
/// second.add_path("/orders", json!({"post": {}}));
///
/// let mut joiner = SwaggerJoiner::new();
/// joiner.add_definition(first.to_bytes().unwrap());
/// joiner.add_definition(second.to_bytes().unwrap());
///
/// let merged = ApiDocument::from_slice(&joiner.sum_definitions().unwrap()).unwrap();
/// assert_eq!(merged.info.title, "Users");
/// assert_eq!(merged.paths.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SwaggerJoiner {
    definitions: Vec<Bytes>,
}

impl SwaggerJoiner {
    /// Creates a joiner with no pending blobs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a documentation blob to the pending set.
    pub fn add_definition(&mut self, blob: impl Into<Bytes>) {
        self.definitions.push(blob.into());
    }

    /// Returns the number of pending blobs.
    #[must_use]
    pub fn definition_count(&self) -> usize {
        self.definitions.len()
    }

    /// Parses all pending blobs and serializes their union.
    ///
    /// With zero blobs pending this returns the empty document.
    pub fn sum_definitions(&self) -> SwaggerResult<Bytes> {
        let mut merged: Option<ApiDocument> = None;
        for (index, blob) in self.definitions.iter().enumerate() {
            let doc = ApiDocument::from_slice(blob)
                .map_err(|source| SwaggerError::Parse { index, source })?;
            merged = Some(match merged {
                None => doc,
                Some(mut base) => {
                    merge_into(&mut base, doc);
                    base
                }
            });
        }
        merged.unwrap_or_default().to_bytes()
    }
}

/// Folds `next` into `base`: paths and schemas union, later entries win.
fn merge_into(base: &mut ApiDocument, next: ApiDocument) {
    base.paths.extend(next.paths);
    if let Some(components) = next.components {
        match &mut base.components {
            Some(existing) => existing.schemas.extend(components.schemas),
            None => base.components = Some(components),
        }
    }
}
