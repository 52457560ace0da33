//! Metrics transformation pipeline.
//!
//! Turns raw archiver-appliance JSON bodies into ordered sequences of
//! canonicalized, typed [`FieldSpec`]s. There are four distinct upstream
//! shapes, one transformer per shape; all share the same contract:
//! a finite, non-lazy sequence produced fresh on every poll, with the
//! input never mutated.

use archstats_core::FieldSpec;

mod coerce;
mod detailed;
mod errors;
mod instance;
mod normalize;
mod process;
mod storage;

pub use coerce::{coerce, coerce_value};
pub use errors::{TransformError, TransformResult};
pub use normalize::{camelize, key_to_pv, parameterize};

/// The four upstream metrics shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transformer {
    /// `getApplianceMetrics`: one entry per appliance instance.
    InstanceMetrics,
    /// `getApplianceMetricsForAppliance`: `{name, value, source}` items.
    DetailedMetrics,
    /// `getStorageMetricsForAppliance`: one entry per storage tier.
    StorageMetrics,
    /// `getProcessMetricsDataForAppliance`: labelled time series.
    ProcessMetrics,
}

impl Transformer {
    /// Transform one raw JSON body into field specs.
    pub fn transform(&self, body: &str) -> TransformResult<Vec<FieldSpec>> {
        match self {
            Transformer::InstanceMetrics => instance::transform(body),
            Transformer::DetailedMetrics => detailed::transform(body),
            Transformer::StorageMetrics => storage::transform(body),
            Transformer::ProcessMetrics => process::transform(body),
        }
    }
}

impl std::fmt::Display for Transformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Transformer::InstanceMetrics => "instance",
            Transformer::DetailedMetrics => "detailed",
            Transformer::StorageMetrics => "storage",
            Transformer::ProcessMetrics => "process",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_reaches_every_variant() {
        // Minimal valid body for each shape.
        assert!(Transformer::InstanceMetrics
            .transform(r#"[{"instance": "a", "k": "1"}]"#)
            .is_ok());
        assert!(Transformer::DetailedMetrics
            .transform(r#"[{"name": "n", "value": "1", "source": "s"}]"#)
            .is_ok());
        assert!(Transformer::StorageMetrics
            .transform(r#"[{"name": "STS", "k": "1"}]"#)
            .is_ok());
        assert!(Transformer::ProcessMetrics
            .transform(r#"[{"label": "l", "data": [[1, 2]]}]"#)
            .is_ok());
    }

    #[test]
    fn transform_is_restartable() {
        let body = r#"[{"name": "STS", "k": "1"}]"#;
        let first = Transformer::StorageMetrics.transform(body).unwrap();
        let second = Transformer::StorageMetrics.transform(body).unwrap();
        assert_eq!(first, second);
    }
}
