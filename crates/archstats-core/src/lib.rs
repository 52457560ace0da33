//! Archstats Core Types
//!
//! This crate defines the value model shared by the transformation pipeline
//! and the sync engine, plus the traits for the two external collaborators:
//! the attribute host (the layer that exposes PVs to readers) and the
//! snapshot store (the document index snapshots are persisted to).

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod errors;
pub mod view;

pub use errors::{FetchError, HostError, SchemaError, StoreError};
pub use view::SharedViewHost;

use async_trait::async_trait;

// ============================================================================
// Type Tag
// ============================================================================

/// The type of an attribute slot, fixed at schema-build time.
///
/// Derived once from the first observed value for a field and never changed
/// afterwards, even if a later poll would coerce differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Bool,
    Int,
    Float,
    Str,
}

impl TypeTag {
    /// EPICS-style record type for this tag, used as host metadata.
    pub const fn record_type(&self) -> &'static str {
        match self {
            TypeTag::Bool => "bi",
            TypeTag::Int => "longin",
            TypeTag::Float => "ai",
            TypeTag::Str => "stringin",
        }
    }
}

// ============================================================================
// Typed Value
// ============================================================================

/// A coerced metric value.
///
/// Diffing uses value equality on this type; `Float` compares with native
/// `f64` equality, which is what the upstream diff semantics call for
/// (unchanged upstream text coerces to a bit-identical float).
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl TypedValue {
    pub const fn tag(&self) -> TypeTag {
        match self {
            TypedValue::Bool(_) => TypeTag::Bool,
            TypedValue::Int(_) => TypeTag::Int,
            TypedValue::Float(_) => TypeTag::Float,
            TypedValue::Str(_) => TypeTag::Str,
        }
    }

    /// True for the values the unit-conversion special case treats as
    /// "skip conversion": zero numbers, `false`, and the empty string.
    pub fn is_falsy(&self) -> bool {
        match self {
            TypedValue::Bool(b) => !b,
            TypedValue::Int(i) => *i == 0,
            TypedValue::Float(f) => *f == 0.0,
            TypedValue::Str(s) => s.is_empty(),
        }
    }

    /// Numeric view, if this value is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TypedValue::Int(i) => Some(*i as f64),
            TypedValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// JSON representation for snapshot documents.
    pub fn as_json(&self) -> Value {
        match self {
            TypedValue::Bool(b) => Value::Bool(*b),
            TypedValue::Int(i) => Value::from(*i),
            TypedValue::Float(f) => Value::from(*f),
            TypedValue::Str(s) => Value::from(s.as_str()),
        }
    }
}

impl std::fmt::Display for TypedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypedValue::Bool(b) => write!(f, "{b}"),
            TypedValue::Int(i) => write!(f, "{i}"),
            TypedValue::Float(v) => write!(f, "{v}"),
            TypedValue::Str(s) => write!(f, "{s}"),
        }
    }
}

// ============================================================================
// Field Spec
// ============================================================================

/// One canonicalized field produced by a transformer.
///
/// Produced fresh on every poll and consumed within the same diff cycle.
/// `raw_key` keeps the upstream label for host doc strings and error
/// messages; `name` is the canonical identifier the schema is keyed by.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub raw_key: String,
    pub value: TypedValue,
}

impl FieldSpec {
    pub fn new(
        name: impl Into<String>,
        raw_key: impl Into<String>,
        value: TypedValue,
    ) -> Self {
        Self {
            name: name.into(),
            raw_key: raw_key.into(),
            value,
        }
    }
}

// ============================================================================
// Attribute Host (external collaborator)
// ============================================================================

/// Opaque identifier handed out by an [`AttributeHost`] at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttrId(pub usize);

pub type HostResult<T> = Result<T, HostError>;

/// The layer that exposes attributes to external readers.
///
/// The engine registers every attribute exactly once at bootstrap and is
/// the sole writer afterwards. Implementations must tolerate concurrent
/// reads while a write is in flight.
#[async_trait]
pub trait AttributeHost: Send + Sync {
    /// Register a new attribute. Called once per attribute, at bootstrap.
    async fn register(
        &self,
        name: &str,
        initial: &TypedValue,
        doc: &str,
    ) -> HostResult<AttrId>;

    /// Write a new value to a previously registered attribute.
    async fn write(&self, id: AttrId, value: &TypedValue) -> HostResult<()>;
}

pub type ArcDynHost = std::sync::Arc<dyn AttributeHost>;

// ============================================================================
// Snapshot Store (external collaborator)
// ============================================================================

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable document store for group snapshots.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Whether any document already exists under `index`.
    ///
    /// Only consulted once per group, at bootstrap, to decide whether the
    /// first completed poll must force a snapshot.
    async fn exists(&self, index: &str) -> StoreResult<bool>;

    /// Append a snapshot document under `index`.
    async fn store(&self, index: &str, document: &Value) -> StoreResult<()>;
}

pub type ArcDynStore = std::sync::Arc<dyn SnapshotStore>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_follows_variant() {
        assert_eq!(TypedValue::Bool(true).tag(), TypeTag::Bool);
        assert_eq!(TypedValue::Int(3).tag(), TypeTag::Int);
        assert_eq!(TypedValue::Float(0.5).tag(), TypeTag::Float);
        assert_eq!(TypedValue::Str("x".into()).tag(), TypeTag::Str);
    }

    #[test]
    fn falsy_values() {
        assert!(TypedValue::Int(0).is_falsy());
        assert!(TypedValue::Float(0.0).is_falsy());
        assert!(TypedValue::Bool(false).is_falsy());
        assert!(TypedValue::Str(String::new()).is_falsy());
        assert!(!TypedValue::Int(-1).is_falsy());
        assert!(!TypedValue::Str("0".into()).is_falsy());
    }

    #[test]
    fn json_round_trip_shapes() {
        assert_eq!(TypedValue::Int(160_732).as_json(), serde_json::json!(160_732));
        assert_eq!(TypedValue::Bool(true).as_json(), serde_json::json!(true));
        assert_eq!(
            TypedValue::Str("MTS".into()).as_json(),
            serde_json::json!("MTS")
        );
    }

    #[test]
    fn record_types_match_epics_conventions() {
        assert_eq!(TypeTag::Bool.record_type(), "bi");
        assert_eq!(TypeTag::Int.record_type(), "longin");
        assert_eq!(TypeTag::Float.record_type(), "ai");
        assert_eq!(TypeTag::Str.record_type(), "stringin");
    }
}
