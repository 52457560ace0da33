//! Instance discovery and group construction.
//!
//! One fetch of the appliance-level metrics endpoint yields the set of
//! appliance instances; each instance gets one group bound to the three
//! per-appliance endpoints. The appliance-wide instance-metrics group is
//! config-gated and off by default.

use anyhow::{bail, Context, Result};
use archstats_config::ArchstatsConfig;
use archstats_engine::{MetricsFetcher, Request, SyncEngine};
use archstats_transform::Transformer;
use serde_json::{Map, Value};
use tracing::info;

/// Fetch `getApplianceMetrics` once and collect the instance names.
pub async fn discover_instances<F: MetricsFetcher>(
    fetcher: &F,
    base_url: &str,
) -> Result<Vec<String>> {
    let url = format!("{base_url}mgmt/bpl/getApplianceMetrics");
    let body = fetcher
        .fetch(&url, &[])
        .await
        .with_context(|| format!("fetching {url}"))?;

    let entries: Vec<Map<String, Value>> =
        serde_json::from_str(&body).context("parsing appliance metrics")?;

    let instances: Vec<String> = entries
        .iter()
        .filter_map(|e| e.get("instance").and_then(Value::as_str))
        .map(str::to_string)
        .collect();

    if instances.is_empty() {
        bail!("no appliance instances reported by {url}");
    }
    Ok(instances)
}

/// Bootstrap one group per discovered instance (plus, optionally, the
/// appliance-wide group).
pub async fn bootstrap_groups<F: MetricsFetcher>(
    engine: &mut SyncEngine<F>,
    cfg: &ArchstatsConfig,
    instances: &[String],
) -> Result<()> {
    let base = &cfg.appliance.url;

    if cfg.engine.appliance_group {
        engine
            .bootstrap_group(
                "ApplianceMetrics",
                cfg.appliance.prefix.clone(),
                cfg.database.index_prefix.clone(),
                vec![Request::new(
                    format!("{base}mgmt/bpl/getApplianceMetrics"),
                    Transformer::InstanceMetrics,
                )],
            )
            .await
            .context("bootstrapping appliance-wide group")?;
    }

    for instance in instances {
        let requests = vec![
            Request::new(
                format!("{base}mgmt/bpl/getApplianceMetricsForAppliance"),
                Transformer::DetailedMetrics,
            )
            .with_param("appliance", instance),
            Request::new(
                format!("{base}mgmt/bpl/getStorageMetricsForAppliance"),
                Transformer::StorageMetrics,
            )
            .with_param("appliance", instance),
            Request::new(
                format!("{base}mgmt/bpl/getProcessMetricsDataForAppliance"),
                Transformer::ProcessMetrics,
            )
            .with_param("appliance", instance),
        ];

        engine
            .bootstrap_group(
                format!("DetailedMetrics{instance}"),
                format!("{}{instance}:", cfg.appliance.prefix),
                format!(
                    "{}_{}",
                    cfg.database.index_prefix,
                    instance.to_lowercase()
                ),
                requests,
            )
            .await
            .with_context(|| format!("bootstrapping group for {instance}"))?;

        info!(%instance, "group bootstrapped");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use archstats_config::{ApplianceCfg, DatabaseCfg, EngineCfg, LoggingCfg};
    use archstats_core::{FetchError, SharedViewHost, TypedValue};
    use archstats_engine::{EngineTuning, FetchResult};
    use archstats_store::MemSnapshotStore;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    struct OneBody(String);

    #[async_trait]
    impl MetricsFetcher for OneBody {
        async fn fetch(
            &self,
            _url: &str,
            _parameters: &[(String, String)],
        ) -> FetchResult<String> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn discovery_collects_instance_names() {
        let fetcher = OneBody(
            r#"[{"instance": "appliance0", "Event rate": "1"},
                {"instance": "appliance1"}]"#
                .to_string(),
        );
        let instances =
            discover_instances(&fetcher, "http://archiver:17665/")
                .await
                .unwrap();
        assert_eq!(instances, vec!["appliance0", "appliance1"]);
    }

    #[tokio::test]
    async fn discovery_fails_on_empty_response() {
        let fetcher = OneBody("[]".to_string());
        assert!(
            discover_instances(&fetcher, "http://archiver:17665/")
                .await
                .is_err()
        );
    }

    struct ByUrl(HashMap<String, String>);

    #[async_trait]
    impl MetricsFetcher for ByUrl {
        async fn fetch(
            &self,
            url: &str,
            _parameters: &[(String, String)],
        ) -> FetchResult<String> {
            self.0.get(url).cloned().ok_or_else(|| FetchError::Transport {
                details: format!("no body for {url}").into(),
            })
        }
    }

    #[tokio::test]
    async fn appliance_group_flag_adds_the_shared_group() {
        let base = "http://archiver:17665/";
        let mut bodies = HashMap::new();
        bodies.insert(
            format!("{base}mgmt/bpl/getApplianceMetrics"),
            r#"[{"instance": "appliance0", "Event rate": "5"}]"#.to_string(),
        );
        bodies.insert(
            format!("{base}mgmt/bpl/getApplianceMetricsForAppliance"),
            r#"[{"name": "Avg write latency (ms)", "value": "1.5", "source": "engine"}]"#
                .to_string(),
        );
        bodies.insert(
            format!("{base}mgmt/bpl/getStorageMetricsForAppliance"),
            r#"[{"name": "STS", "totalSpace": "1"}]"#.to_string(),
        );
        bodies.insert(
            format!("{base}mgmt/bpl/getProcessMetricsDataForAppliance"),
            r#"[{"label": "Load average", "data": [[1, 0.5]]}]"#.to_string(),
        );

        let cfg = ArchstatsConfig {
            appliance: ApplianceCfg {
                url: base.to_string(),
                prefix: "ARCH:".to_string(),
            },
            database: DatabaseCfg::default(),
            engine: EngineCfg {
                appliance_group: true,
                ..EngineCfg::default()
            },
            logging: LoggingCfg::default(),
        };

        let host = SharedViewHost::new();
        let mut engine = SyncEngine::new(
            ByUrl(bodies),
            Arc::new(host.clone()),
            Arc::new(MemSnapshotStore::new()),
            EngineTuning::default(),
            CancellationToken::new(),
        );

        let instances = vec!["appliance0".to_string()];
        bootstrap_groups(&mut engine, &cfg, &instances)
            .await
            .unwrap();

        // The shared group comes first, then one group per instance.
        assert_eq!(engine.groups().len(), 2);

        let shared = &engine.groups()[0];
        assert_eq!(shared.name, "ApplianceMetrics");
        assert_eq!(shared.index, "archiver_appliance_metrics");
        assert!(shared.attribute("appliance0:EventRate").is_some());
        assert_eq!(
            host.get("ARCH:appliance0:EventRate"),
            Some(TypedValue::Int(5))
        );

        let per_instance = &engine.groups()[1];
        assert_eq!(per_instance.name, "DetailedMetricsappliance0");
        assert_eq!(per_instance.index, "archiver_appliance_metrics_appliance0");
        assert!(per_instance.attribute("AvgWriteLatencyMs").is_some());
        assert!(per_instance.attribute("STS:TotalSpace").is_some());
        assert!(per_instance.attribute("Load").is_some());
    }
}
