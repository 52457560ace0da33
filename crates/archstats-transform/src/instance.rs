//! Appliance-level instance metrics.
//!
//! Shape: `[{"instance": "appliance0", <key>: <value>, ...}, ...]`.
//! Every non-discriminator key becomes one field named
//! `<instance>:<key_to_pv(key)>`.

use archstats_core::FieldSpec;
use serde_json::{Map, Value};
use tracing::warn;

use crate::coerce::coerce_value;
use crate::errors::{TransformError, TransformResult};
use crate::normalize::key_to_pv;

pub fn transform(body: &str) -> TransformResult<Vec<FieldSpec>> {
    let entries: Vec<Map<String, Value>> = serde_json::from_str(body)?;

    let mut specs = Vec::new();
    for entry in &entries {
        let instance = entry
            .get("instance")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                TransformError::Shape(
                    "instance metrics entry missing 'instance'".into(),
                )
            })?;

        for (key, value) in entry {
            if key == "instance" {
                continue;
            }
            let pv = key_to_pv(key);
            if pv.is_empty() {
                warn!(raw_key = %key, "metric key normalized to empty identifier, skipping");
                continue;
            }
            specs.push(FieldSpec::new(
                format!("{instance}:{pv}"),
                key.as_str(),
                coerce_value(value),
            ));
        }
    }
    Ok(specs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use archstats_core::TypedValue;
    use pretty_assertions::assert_eq;

    #[test]
    fn fields_prefixed_with_instance() {
        let body = r#"[
            {"instance": "appliance0", "Event rate": "1,024", "Status": "Working"},
            {"instance": "appliance1", "Event rate": "12"}
        ]"#;

        let specs = transform(body).unwrap();
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[0].name, "appliance0:EventRate");
        assert_eq!(specs[0].raw_key, "Event rate");
        assert_eq!(specs[0].value, TypedValue::Int(1024));
        assert_eq!(specs[1].name, "appliance0:Status");
        assert_eq!(specs[1].value, TypedValue::Str("Working".into()));
        assert_eq!(specs[2].name, "appliance1:EventRate");
    }

    #[test]
    fn discriminator_key_not_emitted() {
        let body = r#"[{"instance": "appliance0", "Connected": "true"}]"#;
        let specs = transform(body).unwrap();
        assert_eq!(specs.len(), 1);
        assert!(specs.iter().all(|s| s.raw_key != "instance"));
    }

    #[test]
    fn missing_discriminator_is_a_shape_error() {
        let body = r#"[{"Event rate": "12"}]"#;
        assert!(matches!(
            transform(body),
            Err(TransformError::Shape(_))
        ));
    }

    #[test]
    fn malformed_body_is_a_parse_error() {
        assert!(matches!(
            transform("not json"),
            Err(TransformError::JsonParse(_))
        ));
    }
}
