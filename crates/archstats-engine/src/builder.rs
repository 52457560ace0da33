//! Schema bootstrap.
//!
//! Turns the field specs from a group's initial fetch into a fixed
//! attribute schema: one typed slot per first-seen canonical name, each
//! registered with the attribute host. The schema is closed after this
//! point; fields that appear later are logged and dropped by the sync
//! loop.

use std::collections::HashMap;

use archstats_core::{
    AttributeHost, FieldSpec, SchemaError,
};
use tracing::{debug, info};

use crate::{Attribute, Group, Request};

pub struct SchemaBuilder<'a> {
    host: &'a dyn AttributeHost,
}

impl<'a> SchemaBuilder<'a> {
    pub fn new(host: &'a dyn AttributeHost) -> Self {
        Self { host }
    }

    /// Build a group from the union of its requests' first field specs.
    ///
    /// Called exactly once per group. Two specs canonicalizing to the
    /// same identifier is a configuration error and aborts startup for
    /// this group.
    pub async fn build(
        &self,
        name: impl Into<String>,
        pv_prefix: impl Into<String>,
        index: impl Into<String>,
        requests: Vec<Request>,
        specs: Vec<FieldSpec>,
        initial_document_exists: bool,
    ) -> Result<Group, SchemaError> {
        let name = name.into();
        let pv_prefix = pv_prefix.into();
        let index = index.into();

        let mut attributes: Vec<Attribute> = Vec::with_capacity(specs.len());
        let mut by_name: HashMap<String, usize> =
            HashMap::with_capacity(specs.len());

        for spec in specs {
            if spec.name.is_empty() {
                return Err(SchemaError::EmptyName {
                    group: name,
                    raw_key: spec.raw_key,
                });
            }
            if by_name.contains_key(&spec.name) {
                return Err(SchemaError::Collision {
                    group: name,
                    name: spec.name,
                    raw_key: spec.raw_key,
                });
            }

            let hosted_name = format!("{pv_prefix}{}", spec.name);
            let host_id = self
                .host
                .register(&hosted_name, &spec.value, &spec.raw_key)
                .await
                .map_err(|source| SchemaError::Register {
                    name: hosted_name.clone(),
                    source,
                })?;

            debug!(
                attribute = %hosted_name,
                tag = ?spec.value.tag(),
                "attribute registered"
            );

            by_name.insert(spec.name.clone(), attributes.len());
            attributes.push(Attribute {
                name: spec.name,
                doc: spec.raw_key,
                tag: spec.value.tag(),
                value: spec.value,
                host_id,
            });
        }

        info!(
            group = %name,
            attributes = attributes.len(),
            %index,
            prior_document = initial_document_exists,
            "group schema built"
        );

        Ok(Group {
            name,
            pv_prefix,
            index,
            requests,
            attributes,
            by_name,
            changed_since_persist: false,
            document_count: 0,
            initial_document_exists,
        })
    }
}
