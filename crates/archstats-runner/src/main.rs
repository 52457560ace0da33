use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use archstats_core::{ArcDynStore, SharedViewHost};
use archstats_engine::{EngineTuning, HttpFetcher, SyncEngine};
use archstats_store::EsSnapshotStore;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

mod bootstrap;

#[derive(Parser, Debug)]
#[command(
    name = "archstats",
    about = "EPICS Archiver Appliance statistics poller"
)]
struct Args {
    /// Path to the YAML config file
    #[arg(short, long)]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = archstats_config::load_from_path(&args.config)
        .context("load config")?;

    archstats_o11y::init(&cfg.logging);

    info!(appliance = %cfg.appliance.url, "archstats starting");

    let client = reqwest::Client::new();
    let host = SharedViewHost::new();
    let store: ArcDynStore = Arc::new(EsSnapshotStore::with_client(
        cfg.database.url.clone(),
        client.clone(),
    ));
    let cancel = CancellationToken::new();

    let tuning = EngineTuning {
        sweep_interval: Duration::from_secs(cfg.engine.update_rate_secs),
        group_delay: Duration::from_millis(cfg.engine.group_delay_ms),
        error_backoff: Duration::from_secs(cfg.engine.error_backoff_secs),
    };

    let mut engine = SyncEngine::new(
        HttpFetcher::with_client(client.clone()),
        Arc::new(host.clone()),
        store,
        tuning,
        cancel.clone(),
    );

    let discovery = HttpFetcher::with_client(client);
    let instances =
        bootstrap::discover_instances(&discovery, &cfg.appliance.url)
            .await
            .context("discover appliance instances")?;
    info!(instances = instances.len(), "appliance instances discovered");

    bootstrap::bootstrap_groups(&mut engine, &cfg, &instances).await?;

    let engine_task = tokio::spawn(engine.run());

    tokio::signal::ctrl_c().await.context("wait for ctrl-c")?;
    info!("shutdown requested");
    cancel.cancel();
    engine_task.await??;

    Ok(())
}
