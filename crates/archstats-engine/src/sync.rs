//! The sweep loop: fetch, diff, apply, persist.

use std::time::Duration;

use anyhow::Result;
use archstats_core::{ArcDynHost, ArcDynStore, AttributeHost, SnapshotStore};
use metrics::counter;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::builder::SchemaBuilder;
use crate::errors::{EngineError, EngineResult};
use crate::fetch::MetricsFetcher;
use crate::{Group, Request};

/// Sweep cadence.
///
/// The inter-group delay is backpressure etiquette toward the shared
/// management API, not a correctness requirement.
#[derive(Debug, Clone)]
pub struct EngineTuning {
    pub sweep_interval: Duration,
    pub group_delay: Duration,
    pub error_backoff: Duration,
}

impl Default for EngineTuning {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(60),
            group_delay: Duration::from_millis(100),
            error_backoff: Duration::from_secs(10),
        }
    }
}

/// Single-writer synchronization engine.
///
/// One logical task drives all groups sequentially; nothing else writes
/// attributes. The cancellation token is checked at every sleep
/// boundary, so shutdown latency is bounded by one group tick.
pub struct SyncEngine<F: MetricsFetcher> {
    fetcher: F,
    host: ArcDynHost,
    store: ArcDynStore,
    tuning: EngineTuning,
    cancel: CancellationToken,
    groups: Vec<Group>,
}

impl<F: MetricsFetcher> SyncEngine<F> {
    pub fn new(
        fetcher: F,
        host: ArcDynHost,
        store: ArcDynStore,
        tuning: EngineTuning,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            fetcher,
            host,
            store,
            tuning,
            cancel,
            groups: Vec::new(),
        }
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Fetch every request once, build the group's schema from the union
    /// of their field specs, and register the group for sweeping.
    ///
    /// Fatal on fetch/transform failure or schema collision: a group
    /// that cannot bootstrap must not come up half-schemed.
    pub async fn bootstrap_group(
        &mut self,
        name: impl Into<String>,
        pv_prefix: impl Into<String>,
        index: impl Into<String>,
        mut requests: Vec<Request>,
    ) -> EngineResult<()> {
        let name = name.into();
        let index = index.into();

        let mut specs = Vec::new();
        for request in &mut requests {
            let body = self
                .fetcher
                .fetch(&request.url, &request.parameters)
                .await
                .map_err(|source| EngineError::Fetch {
                    group: name.clone(),
                    source,
                })?;
            specs.extend(request.transformer.transform(&body).map_err(
                |source| EngineError::Transform {
                    group: name.clone(),
                    source,
                },
            )?);
            request.last_response = Some(body);
        }

        // Resolved once; a probe failure means "assume absent", which at
        // worst forces one redundant first snapshot.
        let initial_document_exists =
            match self.store.exists(&index).await {
                Ok(exists) => exists,
                Err(e) => {
                    warn!(%index, error = %e, "prior-document probe failed, assuming absent");
                    false
                }
            };

        let group = SchemaBuilder::new(self.host.as_ref())
            .build(
                name,
                pv_prefix,
                index,
                requests,
                specs,
                initial_document_exists,
            )
            .await?;

        self.groups.push(group);
        Ok(())
    }

    /// Run one tick for the group at `idx`. Exposed for tests and for
    /// callers that drive the schedule themselves.
    pub async fn tick_group(&mut self, idx: usize) -> EngineResult<()> {
        let group = self
            .groups
            .get_mut(idx)
            .ok_or(EngineError::UnknownGroup { idx })?;
        update_group(
            &self.fetcher,
            self.host.as_ref(),
            self.store.as_ref(),
            group,
        )
        .await
    }

    /// One full pass over all groups.
    pub async fn sweep(&mut self) {
        counter!("archstats_sweeps_total").increment(1);

        for idx in 0..self.groups.len() {
            let result = update_group(
                &self.fetcher,
                self.host.as_ref(),
                self.store.as_ref(),
                &mut self.groups[idx],
            )
            .await;

            if let Err(e) = result {
                warn!(error = %e, "group tick failed, backing off");
                counter!("archstats_group_tick_errors_total").increment(1);
                if self.sleep_or_cancelled(self.tuning.error_backoff).await {
                    return;
                }
            }

            if self.sleep_or_cancelled(self.tuning.group_delay).await {
                return;
            }
        }
    }

    /// Sweep indefinitely until cancelled. Never exits on error.
    pub async fn run(mut self) -> Result<()> {
        info!(
            groups = self.groups.len(),
            interval_secs = self.tuning.sweep_interval.as_secs(),
            "sync engine running"
        );

        loop {
            self.sweep().await;
            if self.cancel.is_cancelled()
                || self.sleep_or_cancelled(self.tuning.sweep_interval).await
            {
                info!("sync engine cancelled");
                return Ok(());
            }
        }
    }

    /// Returns true if cancelled while sleeping.
    async fn sleep_or_cancelled(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => true,
            _ = tokio::time::sleep(duration) => false,
        }
    }
}

/// One group tick: fetch each request, diff the fresh field specs
/// against the live attribute values, write deltas, then decide
/// persistence.
async fn update_group<F: MetricsFetcher>(
    fetcher: &F,
    host: &dyn AttributeHost,
    store: &dyn SnapshotStore,
    group: &mut Group,
) -> EngineResult<()> {
    let mut changed = false;

    for ri in 0..group.requests.len() {
        let (url, parameters, transformer) = {
            let request = &group.requests[ri];
            (
                request.url.clone(),
                request.parameters.clone(),
                request.transformer,
            )
        };

        let body = fetcher.fetch(&url, &parameters).await.map_err(|source| {
            counter!("archstats_fetch_errors_total").increment(1);
            EngineError::Fetch {
                group: group.name.clone(),
                source,
            }
        })?;

        let specs = transformer.transform(&body).map_err(|source| {
            EngineError::Transform {
                group: group.name.clone(),
                source,
            }
        })?;
        group.requests[ri].last_response = Some(body);

        for spec in specs {
            let Some(&slot) = group.by_name.get(&spec.name) else {
                // Schema is closed after bootstrap: log and drop.
                warn!(
                    group = %group.name,
                    field = %spec.name,
                    raw_key = %spec.raw_key,
                    "saw unknown field"
                );
                counter!("archstats_unknown_fields_total").increment(1);
                continue;
            };

            let attr = &mut group.attributes[slot];
            if attr.value == spec.value {
                continue;
            }

            // The slot only takes the new value once the host accepted
            // it, so a rejected write re-diffs on the next tick.
            match host.write(attr.host_id, &spec.value).await {
                Ok(()) => {
                    attr.value = spec.value;
                    changed = true;
                }
                Err(e) => {
                    warn!(
                        group = %group.name,
                        attribute = %attr.name,
                        value = %spec.value,
                        error = %e,
                        "failed to apply attribute update"
                    );
                    counter!("archstats_write_errors_total").increment(1);
                }
            }
        }
    }

    if changed {
        group.changed_since_persist = true;
    }

    let first_document = group.document_count == 0;
    if group.changed_since_persist
        || (first_document && !group.initial_document_exists)
    {
        match store.store(&group.index, &group.snapshot_document()).await {
            Ok(()) => {
                group.document_count += 1;
                group.changed_since_persist = false;
                counter!("archstats_snapshots_stored_total").increment(1);
                debug!(
                    group = %group.name,
                    index = %group.index,
                    documents = group.document_count,
                    "snapshot persisted"
                );
            }
            Err(e) => {
                // Flag stays set, so persistence retries next tick.
                warn!(
                    group = %group.name,
                    index = %group.index,
                    error = %e,
                    "snapshot store failed"
                );
            }
        }
    }

    Ok(())
}
