//! Per-appliance detailed metrics.
//!
//! Shape: `[{"name": str, "value": str, "source": str}, ...]` (the
//! `source` field is ignored). One field per item, named from the label.
//!
//! The "Estimated bytes transferred in ETL" items carry their unit
//! (`KB`, `MB`, or `GB`) in a parenthesized suffix of the label, and the
//! upstream unit drifts as the transferred volume grows. To keep the
//! attribute unit-stable the label is rewritten to `(MB)` and the value
//! rescaled accordingly. A falsy or non-numeric value skips the rescale
//! but the label is still rewritten, matching the upstream behavior.

use archstats_core::{FieldSpec, TypedValue};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::coerce::coerce_value;
use crate::errors::TransformResult;
use crate::normalize::key_to_pv;

const ETL_BYTES_PREFIX: &str = "Estimated bytes transferred in ETL";

#[derive(Debug, Deserialize)]
struct DetailedItem {
    name: String,
    #[serde(default)]
    value: Value,
}

pub fn transform(body: &str) -> TransformResult<Vec<FieldSpec>> {
    let items: Vec<DetailedItem> = serde_json::from_str(body)?;

    let mut specs = Vec::new();
    for item in items {
        let value = coerce_value(&item.value);
        let (label, value) = if item.name.starts_with(ETL_BYTES_PREFIX) {
            normalize_units(&item.name, value)
        } else {
            (item.name, value)
        };

        let pv = key_to_pv(&label);
        if pv.is_empty() {
            warn!(raw_key = %label, "metric label normalized to empty identifier, skipping");
            continue;
        }
        specs.push(FieldSpec::new(pv, label, value));
    }
    Ok(specs)
}

/// Rescale an estimated-bytes value to MB and rewrite the unit suffix.
fn normalize_units(label: &str, value: TypedValue) -> (String, TypedValue) {
    let Some((unitless, suffix)) = label.rsplit_once('(') else {
        // No unit suffix at all: nothing to rewrite.
        return (label.to_string(), value);
    };
    let units = suffix.trim_end_matches(')');

    let converted = if value.is_falsy() {
        value
    } else {
        match units {
            "KB" => match value.as_f64() {
                Some(v) => TypedValue::Float(v / 1024.0),
                None => {
                    warn!(%label, %value, "non-numeric estimated-bytes value, skipping rescale");
                    value
                }
            },
            "GB" => match value.as_f64() {
                Some(v) => TypedValue::Float(v * 1024.0),
                None => {
                    warn!(%label, %value, "non-numeric estimated-bytes value, skipping rescale");
                    value
                }
            },
            // MB, or a unit we do not recognize: carried unchanged
            _ => value,
        }
    };

    (format!("{unitless}(MB)"), converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn kb_rescaled_to_mb() {
        let body = r#"[{"name": "Estimated bytes transferred in ETL(0&raquo;1)(KB)",
                        "value": "2048", "source": "etl"}]"#;
        let specs = transform(body).unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(
            specs[0].raw_key,
            "Estimated bytes transferred in ETL(0&raquo;1)(MB)"
        );
        assert_eq!(specs[0].value, TypedValue::Float(2.0));
    }

    #[test]
    fn gb_rescaled_to_mb() {
        let body = r#"[{"name": "Estimated bytes transferred in ETL(0&raquo;1)(GB)",
                        "value": "2", "source": "etl"}]"#;
        let specs = transform(body).unwrap();
        assert_eq!(specs[0].value, TypedValue::Float(2048.0));
        assert!(specs[0].raw_key.ends_with("(MB)"));
    }

    #[test]
    fn mb_carried_unchanged() {
        let body = r#"[{"name": "Estimated bytes transferred in ETL(0&raquo;1)(MB)",
                        "value": "5", "source": "etl"}]"#;
        let specs = transform(body).unwrap();
        assert_eq!(specs[0].value, TypedValue::Int(5));
        assert!(specs[0].raw_key.ends_with("(MB)"));
    }

    #[test]
    fn raw_guillemet_character_in_label() {
        let body = "[{\"name\": \"Estimated bytes transferred in ETL(0\u{00bb}1)(KB)\",
                      \"value\": \"2048\", \"source\": \"etl\"}]";
        let specs = transform(body).unwrap();
        assert!(specs[0].raw_key.ends_with("(MB)"));
        assert_eq!(specs[0].value, TypedValue::Float(2.0));
        assert!(specs[0].name.contains("To"), "name was {}", specs[0].name);
    }

    #[test]
    fn falsy_value_skips_rescale_but_rewrites_label() {
        let body = r#"[{"name": "Estimated bytes transferred in ETL(0&raquo;1)(KB)",
                        "value": "0", "source": "etl"}]"#;
        let specs = transform(body).unwrap();
        assert_eq!(specs[0].value, TypedValue::Int(0));
        assert!(specs[0].raw_key.ends_with("(MB)"));
    }

    #[test]
    fn ordinary_items_pass_through() {
        let body = r#"[{"name": "Avg write latency (ms)", "value": "1.25", "source": "engine"}]"#;
        let specs = transform(body).unwrap();
        assert_eq!(specs[0].name, "AvgWriteLatencyMs");
        assert_eq!(specs[0].raw_key, "Avg write latency (ms)");
        assert_eq!(specs[0].value, TypedValue::Float(1.25));
    }

    #[test]
    fn order_is_preserved() {
        let body = r#"[
            {"name": "B metric", "value": "1", "source": "s"},
            {"name": "A metric", "value": "2", "source": "s"}
        ]"#;
        let specs = transform(body).unwrap();
        assert_eq!(specs[0].name, "BMetric");
        assert_eq!(specs[1].name, "AMetric");
    }
}
