use archstats_core::{FetchError, SchemaError};
use archstats_transform::TransformError;
use thiserror::Error;

/// Errors from one group's tick or bootstrap.
///
/// Fetch and transform failures abort only the affected group's current
/// tick; the sweep continues with the next group after a backoff. Schema
/// errors only occur at bootstrap and are fatal for the group.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("fetch failed for group {group}: {source}")]
    Fetch {
        group: String,
        #[source]
        source: FetchError,
    },

    #[error("transform failed for group {group}: {source}")]
    Transform {
        group: String,
        #[source]
        source: TransformError,
    },

    #[error("no group at index {idx}")]
    UnknownGroup { idx: usize },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

pub type EngineResult<T> = Result<T, EngineError>;
