//! Archstats configuration.
//!
//! One YAML file describes the appliance being polled, the document
//! store, and the engine cadence. `${ENV}` references are expanded
//! before parsing so credentials and hostnames can stay out of the file.

use std::fs;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchstatsConfig {
    /// The archiver appliance under observation.
    pub appliance: ApplianceCfg,

    /// Snapshot document store.
    #[serde(default)]
    pub database: DatabaseCfg,

    /// Engine cadence and feature gates.
    #[serde(default)]
    pub engine: EngineCfg,

    /// Log output options.
    #[serde(default)]
    pub logging: LoggingCfg,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplianceCfg {
    /// Base URL of the management API, with trailing slash
    /// (e.g. `http://archiver:17665/`).
    pub url: String,

    /// PV name prefix applied to every hosted attribute.
    #[serde(default)]
    pub prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseCfg {
    /// Base URL of the document store.
    pub url: String,

    /// Index name prefix; the per-instance suffix is appended at bootstrap.
    pub index_prefix: String,
}

impl Default for DatabaseCfg {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            index_prefix: "archiver_appliance_metrics".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineCfg {
    /// Seconds between full sweeps over all groups.
    pub update_rate_secs: u64,

    /// Milliseconds of backpressure delay between groups within a sweep.
    pub group_delay_ms: u64,

    /// Seconds to back off after a failed group tick.
    pub error_backoff_secs: u64,

    /// Also host the appliance-wide instance-metrics group.
    pub appliance_group: bool,
}

impl Default for EngineCfg {
    fn default() -> Self {
        Self {
            update_rate_secs: 60,
            group_delay_ms: 100,
            error_backoff_secs: 10,
            appliance_group: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingCfg {
    /// Either a simple level like "info" or a full filter string.
    pub level: Option<String>,

    /// Emit logs as JSON lines when true; otherwise pretty text.
    pub json: bool,

    /// Include target info in logs.
    pub with_targets: bool,
}

/// Load a config file, expanding `${ENV}` references first.
pub fn load_from_path(file_path: &str) -> Result<ArchstatsConfig> {
    let raw = fs::read_to_string(file_path)
        .with_context(|| format!("reading config {file_path}"))?;
    let with_env = shellexpand::env(&raw)
        .with_context(|| format!("expanding env vars in {file_path}"))?
        .to_string();
    let cfg: ArchstatsConfig =
        serde_yaml::from_str(&with_env).with_context(|| "parsing yaml")?;

    Ok(cfg)
}
