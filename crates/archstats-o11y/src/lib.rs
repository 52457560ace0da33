//! Observability for the archstats binary: one global tracing
//! subscriber driven by the config file's `logging` section, plus a
//! panic hook that feeds the panic counter before the default handler
//! prints.

use std::panic;
use std::sync::Once;

use archstats_config::LoggingCfg;
use metrics::counter;
use tracing::error;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

static INIT: Once = Once::new();

/// Install the subscriber and panic hook. Later calls are no-ops.
pub fn init(cfg: &LoggingCfg) {
    INIT.call_once(|| {
        let fmt_layer = if cfg.json {
            fmt::layer().with_target(cfg.with_targets).json().boxed()
        } else {
            fmt::layer().with_target(cfg.with_targets).boxed()
        };

        let subscriber = Registry::default()
            .with(poller_filter(cfg.level.as_deref()))
            .with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)
            .expect("global tracing subscriber already set");

        hook_panics();
    });
}

/// `RUST_LOG` wins when set. Otherwise the configured level applies
/// across the poller while the HTTP client stack is pinned to `warn`,
/// keeping per-request chatter out of sweep logs even at `debug`.
fn poller_filter(level: Option<&str>) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_env("RUST_LOG") {
        return filter;
    }
    EnvFilter::try_new(directives(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn directives(level: Option<&str>) -> String {
    format!(
        "{},hyper=warn,reqwest=warn,h2=warn",
        level.unwrap_or("info")
    )
}

/// A panicked sweep task leaves the hosted attributes frozen at their
/// last values; record that as a trace and a counter before the default
/// stderr report runs.
fn hook_panics() {
    let prev = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        counter!("archstats_panics_total").increment(1);
        error!(panic = %info, "panic in poller");
        prev(info);
    }));
}
