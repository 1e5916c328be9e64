//! Event recorder
//!
//! [`GslbMetrics`] is what controller code talks to: one method per domain
//! event. Recording is best effort, no method returns an error and a
//! failed label lookup is logged and dropped so metrics never fail a
//! reconciliation.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::SystemTime;

use prometheus::{CounterVec, HistogramVec, Registry};

use super::catalog::{CatalogOptions, InfobloxInstruments, InstrumentCatalog};
use super::labels::{GslbRef, HealthStatus, ProviderRequest, StrategyTag};
use super::registry::{MetricsRegistry, RegistrationState};
use super::status::{self, StatusCounts, set_gauge};
use crate::error::MetricsResult;

/// Length of the commit SHA exposed in runtime info
const GIT_SHA_LEN: usize = 7;

/// Compiler version captured by build.rs
const RUST_VERSION: &str = env!("GSLB_RUSTC_VERSION");

/// Namespace reported by [`GslbMetrics::global`]
pub const DEFAULT_NAMESPACE: &str = "k8gb";

/// Controller metrics
///
/// Cheap to clone, all clones share instruments and registration state.
#[derive(Clone)]
pub struct GslbMetrics {
    namespace: Arc<str>,
    catalog: Arc<InstrumentCatalog>,
    registry: MetricsRegistry,
}

impl GslbMetrics {
    /// Build an independent instance bound to `collector`
    ///
    /// Nothing is registered until [`GslbMetrics::register`] is called.
    ///
    /// # Errors
    ///
    /// Returns an error if an instrument cannot be constructed.
    pub fn new(
        namespace: &str,
        options: &CatalogOptions,
        collector: Registry,
    ) -> MetricsResult<Self> {
        let catalog = Arc::new(InstrumentCatalog::new(options)?);
        let registry = MetricsRegistry::new(Arc::clone(&catalog), collector);
        Ok(Self {
            namespace: Arc::from(namespace),
            catalog,
            registry,
        })
    }

    /// Process-wide instance bound to `prometheus::default_registry()`
    ///
    /// Built on first use with every instrument enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be constructed.
    pub fn global() -> MetricsResult<&'static GslbMetrics> {
        static GLOBAL: OnceLock<GslbMetrics> = OnceLock::new();

        if let Some(metrics) = GLOBAL.get() {
            return Ok(metrics);
        }
        let metrics = Self::new(
            DEFAULT_NAMESPACE,
            &CatalogOptions::default(),
            prometheus::default_registry().clone(),
        )?;
        // A concurrent caller may have won the race, keep whichever is stored
        Ok(GLOBAL.get_or_init(|| metrics))
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn catalog(&self) -> &InstrumentCatalog {
        &self.catalog
    }

    /// Prometheus registry the instruments are exposed through
    pub fn registry(&self) -> &Registry {
        self.registry.collector()
    }

    /// Register the catalog with the collector, at most once
    ///
    /// # Errors
    ///
    /// See [`MetricsRegistry::register`].
    pub fn register(&self) -> MetricsResult<()> {
        self.registry.register()
    }

    /// Remove the catalog from the collector
    pub fn unregister(&self) {
        self.registry.unregister()
    }

    pub fn registration_state(&self) -> RegistrationState {
        self.registry.state()
    }

    /// Encode the collector's metrics in Prometheus text format
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn gather(&self) -> MetricsResult<String> {
        self.registry.gather()
    }

    /// Count hosts by health status
    pub fn record_ingress_status(
        &self,
        gslb: GslbRef<'_>,
        service_health: &HashMap<String, HealthStatus>,
    ) {
        let counts = StatusCounts::tally(service_health.values().copied());
        status::apply(
            &self.catalog.gslb_service_status_num,
            gslb,
            counts,
            StrategyTag::Untagged,
        );
    }

    /// Set the number of healthy hosts
    pub fn record_healthy_hosts(&self, gslb: GslbRef<'_>, hosts_count: usize) {
        set_gauge(
            &self.catalog.gslb_healthy_records,
            &[gslb.namespace, gslb.name],
            hosts_count as f64,
        );
    }

    /// Set the number of healthy records across all DNS names
    ///
    /// `healthy_records` maps a DNS name to the addresses currently
    /// considered healthy for it.
    pub fn record_healthy_records(
        &self,
        gslb: GslbRef<'_>,
        healthy_records: &HashMap<String, Vec<String>>,
    ) {
        let count = healthy_records.values().map(Vec::len).sum();
        self.record_healthy_hosts(gslb, count);
    }

    /// Set one gauge per DNS name holding its resolved target count
    pub fn record_endpoint_targets<I, S>(&self, gslb: GslbRef<'_>, endpoints: I)
    where
        I: IntoIterator<Item = (S, usize)>,
        S: AsRef<str>,
    {
        for (dns_name, targets) in endpoints {
            set_gauge(
                &self.catalog.endpoint_status_num,
                &[gslb.namespace, gslb.name, dns_name.as_ref()],
                targets as f64,
            );
        }
    }

    /// Failover status, tagged by the role of the reporting cluster
    pub fn record_failover_status<I>(&self, gslb: GslbRef<'_>, is_primary: bool, results: I)
    where
        I: IntoIterator<Item = HealthStatus>,
    {
        status::apply(
            &self.catalog.gslb_status_count_for_failover,
            gslb,
            StatusCounts::tally(results),
            StrategyTag::failover(is_primary),
        );
    }

    pub fn record_roundrobin_status<I>(&self, gslb: GslbRef<'_>, results: I)
    where
        I: IntoIterator<Item = HealthStatus>,
    {
        status::apply(
            &self.catalog.gslb_status_count_for_roundrobin,
            gslb,
            StatusCounts::tally(results),
            StrategyTag::Untagged,
        );
    }

    pub fn record_geoip_status<I>(&self, gslb: GslbRef<'_>, results: I)
    where
        I: IntoIterator<Item = HealthStatus>,
    {
        status::apply(
            &self.catalog.gslb_status_count_for_geoip,
            gslb,
            StatusCounts::tally(results),
            StrategyTag::Untagged,
        );
    }

    pub fn increment_error(&self, gslb: GslbRef<'_>) {
        inc_counter(&self.catalog.gslb_errors_total, gslb);
    }

    pub fn increment_reconciliation(&self, gslb: GslbRef<'_>) {
        inc_counter(&self.catalog.gslb_reconciliation_loops_total, gslb);
    }

    pub fn infoblox_increment_zone_update(&self, gslb: GslbRef<'_>) {
        if let Some(infoblox) = self.infoblox("zone_update") {
            inc_counter(&infoblox.zone_updates_total, gslb);
        }
    }

    pub fn infoblox_increment_zone_update_error(&self, gslb: GslbRef<'_>) {
        if let Some(infoblox) = self.infoblox("zone_update_error") {
            inc_counter(&infoblox.zone_update_errors_total, gslb);
        }
    }

    pub fn infoblox_increment_heartbeat(&self, gslb: GslbRef<'_>) {
        if let Some(infoblox) = self.infoblox("heartbeat") {
            inc_counter(&infoblox.heartbeats_total, gslb);
        }
    }

    pub fn infoblox_increment_heartbeat_error(&self, gslb: GslbRef<'_>) {
        if let Some(infoblox) = self.infoblox("heartbeat_error") {
            inc_counter(&infoblox.heartbeat_errors_total, gslb);
        }
    }

    /// Observe the wall-clock time elapsed since `start` for a provider request
    ///
    /// A start time in the future (clock stepped backwards mid-request) is
    /// recorded as zero.
    pub fn observe_request_duration(
        &self,
        start: SystemTime,
        request: ProviderRequest,
        success: bool,
    ) {
        let Some(infoblox) = self.infoblox("request_duration") else {
            return;
        };

        let seconds = match SystemTime::now().duration_since(start) {
            Ok(elapsed) => elapsed.as_secs_f64(),
            Err(e) => {
                tracing::warn!(
                    request = %request,
                    ahead_by_seconds = e.duration().as_secs_f64(),
                    "Request start time is in the future, recording zero duration"
                );
                0.0
            }
        };

        observe(
            &infoblox.request_duration,
            &[request.as_str(), if success { "true" } else { "false" }],
            seconds,
        );
    }

    /// Publish build and platform facts as a constant `1` gauge
    pub fn set_runtime_info(&self, version: &str, commit: &str) {
        let git_sha = first_n(commit, GIT_SHA_LEN);
        set_gauge(
            &self.catalog.runtime_info,
            &[
                &*self.namespace,
                version,
                RUST_VERSION,
                std::env::consts::ARCH,
                std::env::consts::OS,
                git_sha,
            ],
            1.0,
        );
    }

    fn infoblox(&self, operation: &'static str) -> Option<&InfobloxInstruments> {
        let infoblox = self.catalog.infoblox.as_ref();
        if infoblox.is_none() {
            tracing::trace!(operation, "Infoblox metrics disabled, skipping");
        }
        infoblox
    }
}

/// First `n` characters of `value`, or all of it when shorter
fn first_n(value: &str, n: usize) -> &str {
    match value.char_indices().nth(n) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

fn inc_counter(vec: &CounterVec, gslb: GslbRef<'_>) {
    match vec.get_metric_with_label_values(&[gslb.namespace, gslb.name]) {
        Ok(counter) => counter.inc(),
        Err(e) => {
            tracing::warn!(
                error = %e,
                namespace = gslb.namespace,
                name = gslb.name,
                "Failed to increment counter, metric update dropped"
            );
        }
    }
}

fn observe(vec: &HistogramVec, labels: &[&str], value: f64) {
    match vec.get_metric_with_label_values(labels) {
        Ok(histogram) => histogram.observe(value),
        Err(e) => {
            tracing::warn!(
                error = %e,
                labels = ?labels,
                "Failed to observe histogram, metric update dropped"
            );
        }
    }
}
