//! Command-line interface for gslb-metrics
//!
//! Provides argument parsing and subcommand handling for the gslb-metrics binary.

use clap::{Parser, Subcommand};

/// Prometheus metrics for a DNS-based global load balancer
#[derive(Parser)]
#[command(name = "gslb-metrics")]
#[command(version)]
#[command(about = "Prometheus metrics for a DNS-based global load balancer")]
#[command(
    long_about = "gslb-metrics lists the controller's instrument catalog and renders \
    its Prometheus exposition, using the same registry the controller registers into."
)]
pub struct Cli {
    /// Path to configuration file (defaults apply when it does not exist)
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// List every enabled instrument with its kind, labels and help text
    Describe {
        /// Print as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Register the catalog, publish runtime info and print the exposition
    Render {
        /// Controller version for the runtime info metric
        #[arg(long = "app-version", default_value = env!("CARGO_PKG_VERSION"))]
        app_version: String,
        /// Commit SHA for the runtime info metric (truncated to 7 characters)
        #[arg(long, default_value = "unknown")]
        commit: String,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# gslb-metrics Configuration
# ==========================

# ─────────────────────────────────────────────────────────────────────────────
# METRICS
# ─────────────────────────────────────────────────────────────────────────────

[metrics]
# Namespace the controller runs in, exposed on k8gb_runtime_info
namespace = "k8gb"

# Instantiate the Infoblox provider instruments
# (k8gb_infoblox_* counters and the request duration histogram)
infoblox = true

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error"
# RUST_LOG takes precedence when set
log_level = "info"
"#
}
