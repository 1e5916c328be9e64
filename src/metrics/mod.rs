//! Prometheus metrics for the GSLB controller
//!
//! This module provides:
//! - a static descriptor table naming every instrument ([`descriptor`])
//! - the instrument catalog built from it ([`InstrumentCatalog`])
//! - one-shot registration into a prometheus registry ([`MetricsRegistry`])
//! - status aggregation across load balancing strategies ([`status`])
//! - the event-recording facade used by controller code ([`GslbMetrics`])
//!
//! # Example
//!
//! ```
//! use gslb_metrics::metrics::{CatalogOptions, GslbMetrics, GslbRef, HealthStatus};
//!
//! let metrics = GslbMetrics::new("k8gb", &CatalogOptions::default(), prometheus::Registry::new())?;
//! metrics.register()?;
//!
//! let gslb = GslbRef::new("test-gslb", "roundrobin-test");
//! metrics.increment_reconciliation(gslb);
//! metrics.record_roundrobin_status(gslb, HealthStatus::Healthy.repeat(2));
//!
//! assert!(metrics.gather()?.contains("k8gb_gslb_status_count_for_roundrobin"));
//! # Ok::<(), gslb_metrics::error::MetricsError>(())
//! ```

pub mod catalog;
pub mod descriptor;
pub mod labels;
pub mod naming;
pub mod recorder;
pub mod registry;
pub mod status;

pub use catalog::{CatalogOptions, InfobloxInstruments, Instrument, InstrumentCatalog};
pub use descriptor::{MetricDescriptor, MetricKind};
pub use labels::{GslbRef, HealthStatus, ProviderRequest, StrategyTag};
pub use naming::canonical_name;
pub use recorder::GslbMetrics;
pub use registry::{MetricsRegistry, RegistrationState};
pub use status::StatusCounts;
