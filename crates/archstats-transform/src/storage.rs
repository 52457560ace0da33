//! Per-appliance storage metrics.
//!
//! Shape: `[{"name": "STS"|"MTS"|"LTS", <key>: <value>, ...}, ...]` —
//! one entry per storage tier (short/medium/long term). Fields are named
//! `<tier>:<camelize(key)>`. Storage keys arrive as well-formed
//! identifiers, so they are camelized directly instead of going through
//! the full label-normalization pipeline.

use archstats_core::FieldSpec;
use serde_json::{Map, Value};
use tracing::warn;

use crate::coerce::coerce_value;
use crate::errors::{TransformError, TransformResult};
use crate::normalize::camelize;

pub fn transform(body: &str) -> TransformResult<Vec<FieldSpec>> {
    let entries: Vec<Map<String, Value>> = serde_json::from_str(body)?;

    let mut specs = Vec::new();
    for entry in &entries {
        let tier = entry.get("name").and_then(Value::as_str).ok_or_else(|| {
            TransformError::Shape(
                "storage metrics entry missing 'name'".into(),
            )
        })?;

        for (key, value) in entry {
            if key == "name" {
                continue;
            }
            let camel = camelize(key);
            if camel.is_empty() {
                warn!(raw_key = %key, "storage key camelized to empty identifier, skipping");
                continue;
            }
            specs.push(FieldSpec::new(
                format!("{tier}:{camel}"),
                key.as_str(),
                coerce_value(value),
            ));
        }
    }
    Ok(specs)
}
