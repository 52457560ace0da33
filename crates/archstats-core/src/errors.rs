use std::borrow::Cow;
use std::io;
use thiserror::Error;

/// Errors surfaced by the HTTP metrics fetch.
///
/// A fetch failure aborts the owning group's current tick only; the sweep
/// retries on the next scheduled pass.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timeout fetching {url}")]
    Timeout { url: String },

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("transport error: {details}")]
    Transport { details: Cow<'static, str> },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors from the attribute-hosting layer.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("attribute {name} already registered")]
    Duplicate { name: String },

    #[error("unknown attribute id {id}")]
    UnknownId { id: usize },

    #[error("type mismatch writing {name}: slot is {expected}, got {got}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        got: &'static str,
    },

    #[error("host rejected write: {details}")]
    Rejected { details: Cow<'static, str> },
}

/// Errors from the snapshot store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection error: {details}")]
    Connect { details: Cow<'static, str> },

    #[error("store rejected document for {index}: {details}")]
    Rejected {
        index: String,
        details: Cow<'static, str>,
    },

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Fatal bootstrap errors from the schema builder.
///
/// A collision means two upstream labels canonicalize to the same
/// identifier within one group. That is a configuration problem, not a
/// runtime condition, so startup for the group must abort.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema collision in group {group}: {name} (from {raw_key})")]
    Collision {
        group: String,
        name: String,
        raw_key: String,
    },

    #[error("empty identifier in group {group} (from {raw_key})")]
    EmptyName { group: String, raw_key: String },

    #[error("host registration failed for {name}: {source}")]
    Register {
        name: String,
        #[source]
        source: HostError,
    },
}
