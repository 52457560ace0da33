//! Snapshot store implementations.
//!
//! Snapshots are append-only JSON documents, one index per group. The
//! HTTP store targets an Elasticsearch-style document API; the memory
//! store backs tests and dry runs.

mod es_store;
mod mem_store;

pub use es_store::EsSnapshotStore;
pub use mem_store::MemSnapshotStore;
