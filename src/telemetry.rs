//! Telemetry and observability setup
//!
//! Configures structured logging with tracing and tracing-subscriber.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Build the log filter, preferring RUST_LOG over the configured level
fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gslb_metrics={}", default_level)))
}

/// Initialize tracing subscriber for structured logging
///
/// This can only be called once per process. Subsequent calls are silently ignored.
///
/// # Examples
///
/// ```no_run
/// gslb_metrics::telemetry::init("info");
/// tracing::info!("controller metrics ready");
/// ```
pub fn init(default_level: &str) {
    INIT.call_once(|| {
        tracing_subscriber::registry()
            .with(build_filter(default_level))
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    });
}
