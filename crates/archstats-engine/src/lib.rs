//! Schema bootstrap and synchronization engine.
//!
//! The engine owns a set of [`Group`]s, each binding one or more
//! `(request, transformer)` pairs to a fixed attribute schema inferred
//! from the first response. A single update task sweeps all groups
//! periodically: fetch, transform, diff against the live attribute
//! values, write deltas through the attribute host, and persist a
//! snapshot when something changed (or once, on the very first poll of a
//! never-persisted group).

use std::collections::HashMap;

use archstats_core::{AttrId, TypeTag, TypedValue};
use archstats_transform::Transformer;
use chrono::Utc;
use serde_json::Value;

mod builder;
mod errors;
mod fetch;
mod sync;

pub use builder::SchemaBuilder;
pub use errors::{EngineError, EngineResult};
pub use fetch::{FetchResult, HttpFetcher, MetricsFetcher};
pub use sync::{EngineTuning, SyncEngine};

// ============================================================================
// Request
// ============================================================================

/// One endpoint binding: a URL, its query parameters, and the
/// transformer for its response shape.
///
/// Stateless except for `last_response`, which caches the most recent
/// raw body for schema bootstrapping and instance discovery; diffing
/// always re-transforms fresh.
#[derive(Debug, Clone)]
pub struct Request {
    pub url: String,
    pub parameters: Vec<(String, String)>,
    pub transformer: Transformer,
    pub last_response: Option<String>,
}

impl Request {
    pub fn new(url: impl Into<String>, transformer: Transformer) -> Self {
        Self {
            url: url.into(),
            parameters: Vec::new(),
            transformer,
            last_response: None,
        }
    }

    pub fn with_param(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.parameters.push((key.into(), value.into()));
        self
    }
}

// ============================================================================
// Attribute
// ============================================================================

/// One typed, addressable slot, created exactly once at bootstrap.
///
/// The tag is fixed for the process lifetime; a later poll that would
/// coerce differently surfaces as a host write failure, not a retype.
#[derive(Debug, Clone)]
pub struct Attribute {
    /// Canonical identifier (schema key, without the PV prefix).
    pub name: String,
    /// Raw upstream label, kept for doc strings and diagnostics.
    pub doc: String,
    pub tag: TypeTag,
    pub value: TypedValue,
    pub host_id: AttrId,
}

// ============================================================================
// Group
// ============================================================================

/// A named collection of attributes sharing requests and one snapshot
/// index. Owns its attributes and requests; mutated only by the engine's
/// update task.
#[derive(Debug)]
pub struct Group {
    pub name: String,
    /// Prefix applied to attribute names at host registration only.
    pub pv_prefix: String,
    /// Document-store index snapshots are persisted under.
    pub index: String,
    pub requests: Vec<Request>,

    pub(crate) attributes: Vec<Attribute>,
    pub(crate) by_name: HashMap<String, usize>,

    pub(crate) changed_since_persist: bool,
    pub(crate) document_count: u64,
    /// Whether any document already existed under `index` at bootstrap.
    pub(crate) initial_document_exists: bool,
}

impl Group {
    /// Look up an attribute by canonical name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.by_name.get(name).map(|&idx| &self.attributes[idx])
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn document_count(&self) -> u64 {
        self.document_count
    }

    pub fn changed_since_persist(&self) -> bool {
        self.changed_since_persist
    }

    /// Current values of every attribute plus an `@timestamp`, shaped as
    /// one document-store entry.
    pub fn snapshot_document(&self) -> Value {
        let mut doc = serde_json::Map::with_capacity(self.attributes.len() + 1);
        for attr in &self.attributes {
            doc.insert(attr.name.clone(), attr.value.as_json());
        }
        doc.insert(
            "@timestamp".to_string(),
            Value::from(Utc::now().to_rfc3339()),
        );
        Value::Object(doc)
    }
}
