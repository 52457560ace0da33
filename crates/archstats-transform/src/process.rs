//! Per-appliance process metrics.
//!
//! Shape: `[{"label": str, "data": [[ts, value], ...]}, ...]` where
//! `data` is time-ordered. The field value is the value component of the
//! last (most recent) pair; the field name is the camelized first
//! whitespace-delimited token of the label.
//!
//! Process metrics update on their own cadence upstream, so the last
//! sample may lag our polling loop by up to a minute. The defaults keep
//! the attribute numeric no matter what: an empty series yields integer
//! `0`, a malformed pair yields float `0.0`.

use archstats_core::{FieldSpec, TypedValue};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::coerce::coerce_value;
use crate::errors::TransformResult;
use crate::normalize::camelize;

#[derive(Debug, Deserialize)]
struct ProcessItem {
    #[serde(default = "unknown_label")]
    label: String,
    #[serde(default)]
    data: Option<Value>,
}

fn unknown_label() -> String {
    "unknown".to_string()
}

pub fn transform(body: &str) -> TransformResult<Vec<FieldSpec>> {
    let items: Vec<ProcessItem> = serde_json::from_str(body)?;

    let mut specs = Vec::new();
    for item in items {
        let token = item.label.split_whitespace().next().unwrap_or("unknown");
        let name = camelize(token);
        if name.is_empty() {
            warn!(label = %item.label, "process label normalized to empty identifier, skipping");
            continue;
        }
        specs.push(FieldSpec::new(name, item.label.as_str(), last_sample(&item.data)));
    }
    Ok(specs)
}

/// Most recent sample value of a `[[ts, value], ...]` series.
fn last_sample(data: &Option<Value>) -> TypedValue {
    let series = match data {
        None => return TypedValue::Int(0),
        Some(Value::Array(a)) if a.is_empty() => return TypedValue::Int(0),
        Some(Value::Array(a)) => a,
        // Not indexable as a series at all
        Some(_) => return TypedValue::Float(0.0),
    };

    match series.last().and_then(|pair| pair.get(1)) {
        Some(value) => coerce_value(value),
        None => TypedValue::Float(0.0),
    }
}
