//! In-process attribute host backed by a shared read view.
//!
//! The engine is the single writer; external readers take point-in-time
//! snapshots. A wire-protocol host (an IOC) would implement
//! [`AttributeHost`] the same way against its own PV database.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::{AttrId, AttributeHost, HostError, HostResult, TypedValue};

struct Slot {
    name: String,
    doc: String,
    value: TypedValue,
}

#[derive(Default)]
struct Inner {
    slots: Vec<Slot>,
    by_name: HashMap<String, usize>,
}

/// Shared-view attribute host.
///
/// Cheap to clone; all clones observe the same registry.
#[derive(Clone, Default)]
pub struct SharedViewHost {
    inner: Arc<RwLock<Inner>>,
}

impl SharedViewHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a named attribute, if registered.
    pub fn get(&self, name: &str) -> Option<TypedValue> {
        let inner = self.inner.read();
        let idx = *inner.by_name.get(name)?;
        Some(inner.slots[idx].value.clone())
    }

    /// Doc string (the raw upstream label) of a named attribute.
    pub fn doc(&self, name: &str) -> Option<String> {
        let inner = self.inner.read();
        let idx = *inner.by_name.get(name)?;
        Some(inner.slots[idx].doc.clone())
    }

    /// Point-in-time snapshot of every attribute.
    pub fn snapshot(&self) -> HashMap<String, TypedValue> {
        let inner = self.inner.read();
        inner
            .slots
            .iter()
            .map(|s| (s.name.clone(), s.value.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().slots.is_empty()
    }
}

#[async_trait]
impl AttributeHost for SharedViewHost {
    async fn register(
        &self,
        name: &str,
        initial: &TypedValue,
        doc: &str,
    ) -> HostResult<AttrId> {
        let mut inner = self.inner.write();
        if inner.by_name.contains_key(name) {
            return Err(HostError::Duplicate { name: name.into() });
        }
        let idx = inner.slots.len();
        inner.slots.push(Slot {
            name: name.into(),
            doc: doc.into(),
            value: initial.clone(),
        });
        inner.by_name.insert(name.into(), idx);
        Ok(AttrId(idx))
    }

    async fn write(&self, id: AttrId, value: &TypedValue) -> HostResult<()> {
        let mut inner = self.inner.write();
        let slot = inner
            .slots
            .get_mut(id.0)
            .ok_or(HostError::UnknownId { id: id.0 })?;
        if slot.value.tag() != value.tag() {
            return Err(HostError::TypeMismatch {
                name: slot.name.clone(),
                expected: slot.value.tag().record_type(),
                got: value.tag().record_type(),
            });
        }
        slot.value = value.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_then_read() {
        let host = SharedViewHost::new();
        let id = host
            .register("STS:TotalSpace", &TypedValue::Int(42), "total_space")
            .await
            .unwrap();

        assert_eq!(host.get("STS:TotalSpace"), Some(TypedValue::Int(42)));
        assert_eq!(host.doc("STS:TotalSpace").as_deref(), Some("total_space"));

        host.write(id, &TypedValue::Int(43)).await.unwrap();
        assert_eq!(host.get("STS:TotalSpace"), Some(TypedValue::Int(43)));
    }

    #[tokio::test]
    async fn duplicate_registration_rejected() {
        let host = SharedViewHost::new();
        host.register("A", &TypedValue::Int(1), "a").await.unwrap();
        let err = host.register("A", &TypedValue::Int(2), "a").await;
        assert!(matches!(err, Err(HostError::Duplicate { .. })));
    }

    #[tokio::test]
    async fn type_mismatch_rejected() {
        let host = SharedViewHost::new();
        let id = host
            .register("A", &TypedValue::Int(1), "a")
            .await
            .unwrap();
        let err = host.write(id, &TypedValue::Str("x".into())).await;
        assert!(matches!(err, Err(HostError::TypeMismatch { .. })));
        // Slot keeps its previous value after a rejected write.
        assert_eq!(host.get("A"), Some(TypedValue::Int(1)));
    }

    #[tokio::test]
    async fn snapshot_is_point_in_time() {
        let host = SharedViewHost::new();
        let id = host
            .register("A", &TypedValue::Float(1.5), "a")
            .await
            .unwrap();
        let snap = host.snapshot();
        host.write(id, &TypedValue::Float(2.5)).await.unwrap();
        assert_eq!(snap.get("A"), Some(&TypedValue::Float(1.5)));
        assert_eq!(host.get("A"), Some(TypedValue::Float(2.5)));
    }
}
