//! gslb-metrics command-line tool
//!
//! Inspects the instrument catalog and renders its Prometheus exposition.

use clap::Parser;
use gslb_metrics::cli::{Cli, Command, generate_config_template};
use gslb_metrics::config::Config;
use gslb_metrics::metrics::{GslbMetrics, InstrumentCatalog, MetricDescriptor};
use gslb_metrics::telemetry;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Command::Config { output } = &cli.command {
        match output {
            Some(path) => {
                std::fs::write(path, generate_config_template())?;
                eprintln!("Configuration template written to {}", path);
            }
            None => print!("{}", generate_config_template()),
        }
        return Ok(());
    }

    let config = Config::load_or_default(&cli.config)?;
    telemetry::init(&config.observability.log_level);

    tracing::debug!(
        config_path = %cli.config,
        namespace = %config.metrics.namespace,
        infoblox = config.metrics.infoblox,
        "Configuration loaded"
    );

    match cli.command {
        Command::Config { .. } => {}
        Command::Describe { json } => {
            let catalog = InstrumentCatalog::new(&config.catalog_options())?;
            let descriptors: Vec<&MetricDescriptor> = catalog
                .entries()
                .into_iter()
                .filter_map(|(descriptor, instrument)| instrument.map(|_| descriptor))
                .collect();

            if json {
                let listing: Vec<serde_json::Value> = descriptors
                    .iter()
                    .map(|d| {
                        serde_json::json!({
                            "name": d.name(),
                            "descriptor": d,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                for d in descriptors {
                    println!(
                        "{:<42} {:<10} [{}]  {}",
                        d.name(),
                        d.kind.as_str(),
                        d.labels.join(", "),
                        d.help
                    );
                }
            }
        }
        Command::Render {
            app_version,
            commit,
        } => {
            let metrics = GslbMetrics::new(
                &config.metrics.namespace,
                &config.catalog_options(),
                prometheus::Registry::new(),
            )?;
            metrics.register()?;
            metrics.set_runtime_info(&app_version, &commit);
            print!("{}", metrics.gather()?);
        }
    }

    Ok(())
}
