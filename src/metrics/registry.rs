//! One-shot registration of the catalog into a prometheus registry
//!
//! A metric name can only be registered once per prometheus registry, so
//! the registration body runs at most once per [`MetricsRegistry`]; every
//! later call only reports the stored outcome.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use prometheus::{Encoder, Registry, TextEncoder};

use super::catalog::InstrumentCatalog;
use crate::error::{MetricsError, MetricsResult};

/// Lifecycle of the registration guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationState {
    Unregistered,
    /// Body in progress, `metric` is the instrument being registered
    Registering { metric: String },
    Registered,
    Failed { metric: String, reason: String },
}

/// Hands the catalog to an external prometheus registry exactly once
#[derive(Clone)]
pub struct MetricsRegistry {
    catalog: Arc<InstrumentCatalog>,
    collector: Registry,
    state: Arc<Mutex<RegistrationState>>,
}

impl MetricsRegistry {
    pub fn new(catalog: Arc<InstrumentCatalog>, collector: Registry) -> Self {
        Self {
            catalog,
            collector,
            state: Arc::new(Mutex::new(RegistrationState::Unregistered)),
        }
    }

    /// The prometheus registry instruments are registered into
    pub fn collector(&self) -> &Registry {
        &self.collector
    }

    /// Current guard state
    pub fn state(&self) -> RegistrationState {
        self.lock_state().clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, RegistrationState> {
        // Registration never panics while holding the lock in practice, but a
        // poisoned guard still holds a valid state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register every instantiated instrument with the collector
    ///
    /// Only the first call does any work. Concurrent callers wait for it and
    /// then observe its outcome. Instruments registered before a failure stay
    /// registered.
    ///
    /// # Errors
    ///
    /// - [`MetricsError::Registration`] from the call that ran the body
    ///   when the collector rejected an instrument (e.g. duplicate name)
    /// - [`MetricsError::RegistrationFailed`] from every later call after
    ///   such a failure, or after an earlier body panicked mid-registration
    pub fn register(&self) -> MetricsResult<()> {
        let mut state = self.lock_state();

        match &*state {
            RegistrationState::Unregistered => {}
            RegistrationState::Registered => {
                tracing::debug!("Prometheus metrics already registered, skipping");
                return Ok(());
            }
            RegistrationState::Failed { metric, reason } => {
                return Err(MetricsError::RegistrationFailed {
                    metric: metric.clone(),
                    reason: reason.clone(),
                });
            }
            // Only seen through a poisoned lock: an earlier body panicked
            RegistrationState::Registering { metric } => {
                let metric = metric.clone();
                let reason = "an earlier registration attempt panicked".to_string();
                tracing::error!(
                    metric = %metric,
                    "Prometheus metrics registration was interrupted"
                );
                *state = RegistrationState::Failed {
                    metric: metric.clone(),
                    reason: reason.clone(),
                };
                return Err(MetricsError::RegistrationFailed { metric, reason });
            }
        }

        let described = self.catalog.describe();
        let count = described.len();
        for (name, instrument) in described {
            *state = RegistrationState::Registering {
                metric: name.clone(),
            };
            tracing::debug!(
                metric = %name,
                kind = instrument.kind().as_str(),
                "Registering metric"
            );
            if let Err(source) = self.collector.register(instrument.collector()) {
                tracing::error!(
                    metric = %name,
                    error = %source,
                    "Prometheus registry rejected metric"
                );
                *state = RegistrationState::Failed {
                    metric: name.clone(),
                    reason: source.to_string(),
                };
                return Err(MetricsError::Registration {
                    metric: name,
                    source,
                });
            }
        }

        *state = RegistrationState::Registered;
        tracing::info!(metric_count = count, "Prometheus metrics registered");
        Ok(())
    }

    /// Remove every instantiated instrument from the collector
    ///
    /// Instruments that are not registered are skipped, so this is safe to
    /// call repeatedly. The registration guard is not reset.
    pub fn unregister(&self) {
        for (name, instrument) in self.catalog.describe() {
            match self.collector.unregister(instrument.collector()) {
                Ok(()) => tracing::debug!(metric = %name, "Unregistered metric"),
                Err(e) => tracing::trace!(metric = %name, error = %e, "Metric not registered"),
            }
        }
    }

    /// Encode all gathered metrics in Prometheus text format
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Encoding`] if the encoder fails or produces
    /// invalid UTF-8.
    pub fn gather(&self) -> MetricsResult<String> {
        let metric_families = self.collector.gather();
        let metric_count = metric_families.len();

        tracing::debug!(
            metric_family_count = metric_count,
            "Encoding metrics to Prometheus text format"
        );

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    metric_family_count = metric_count,
                    "Prometheus text encoder failed"
                );
                MetricsError::Encoding(format!(
                    "failed to encode {} metric families: {}",
                    metric_count, e
                ))
            })?;

        String::from_utf8(buffer).map_err(|e| {
            MetricsError::Encoding(format!(
                "encoder produced invalid UTF-8 at byte {}",
                e.utf8_error().valid_up_to()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::catalog::{CatalogOptions, Instrument};

    fn test_registry(options: CatalogOptions) -> (Arc<InstrumentCatalog>, MetricsRegistry) {
        let catalog =
            Arc::new(InstrumentCatalog::new(&options).expect("Failed to create test catalog"));
        let registry = MetricsRegistry::new(Arc::clone(&catalog), Registry::new());
        (catalog, registry)
    }

    /// Give every instantiated instrument one child so gather() exposes it
    fn touch_all(catalog: &InstrumentCatalog) {
        for (descriptor, instrument) in catalog.entries() {
            let values = vec!["x"; descriptor.labels.len()];
            match instrument {
                Some(Instrument::Counter(vec)) => vec.with_label_values(&values).inc(),
                Some(Instrument::Gauge(vec)) => vec.with_label_values(&values).set(1.0),
                Some(Instrument::Histogram(vec)) => vec.with_label_values(&values).observe(1.0),
                None => {}
            }
        }
    }

    /// Names of the metric families the collector currently exposes
    fn exposed_names(registry: &MetricsRegistry) -> Vec<String> {
        touch_all(&registry.catalog);
        registry
            .collector()
            .gather()
            .iter()
            .map(|mf| mf.name().to_string())
            .collect()
    }

    #[test]
    fn test_new_registry_starts_unregistered() {
        let (_, registry) = test_registry(CatalogOptions::default());
        assert_eq!(registry.state(), RegistrationState::Unregistered);
    }

    #[test]
    fn test_register_moves_to_registered() {
        let (catalog, registry) = test_registry(CatalogOptions::default());
        registry.register().expect("registration should succeed");

        assert_eq!(registry.state(), RegistrationState::Registered);
        assert_eq!(exposed_names(&registry).len(), catalog.describe().len());
    }

    #[test]
    fn test_register_twice_is_a_noop() {
        let (catalog, registry) = test_registry(CatalogOptions::default());
        registry.register().expect("first registration should succeed");
        registry.register().expect("second registration should be a no-op");

        catalog
            .gslb_errors_total
            .with_label_values(&["ns", "app"])
            .inc();
        let families = registry.collector().gather();
        let errors: Vec<_> = families
            .iter()
            .filter(|mf| mf.name() == "k8gb_gslb_errors_total")
            .collect();
        assert_eq!(errors.len(), 1, "metric family should be exposed once");
    }

    #[test]
    fn test_register_failure_is_reported_and_replayed() {
        let collector = Registry::new();
        let first = Arc::new(
            InstrumentCatalog::new(&CatalogOptions::default()).expect("Failed to create catalog"),
        );
        let second = Arc::new(
            InstrumentCatalog::new(&CatalogOptions::default()).expect("Failed to create catalog"),
        );

        MetricsRegistry::new(first, collector.clone())
            .register()
            .expect("first catalog should register");

        let clashing = MetricsRegistry::new(second, collector);
        let err = clashing
            .register()
            .expect_err("duplicate names should be rejected");
        assert!(matches!(
            &err,
            MetricsError::Registration { metric, source: prometheus::Error::AlreadyReg }
                if metric == "k8gb_gslb_healthy_records"
        ));

        match clashing.state() {
            RegistrationState::Failed { metric, .. } => {
                assert_eq!(metric, "k8gb_gslb_healthy_records")
            }
            other => panic!("expected Failed state, got {:?}", other),
        }

        let replay = clashing.register().expect_err("failure should be replayed");
        assert!(matches!(replay, MetricsError::RegistrationFailed { .. }));
    }

    #[test]
    fn test_register_after_interrupted_body_reports_failure() {
        use std::thread;

        let (_, registry) = test_registry(CatalogOptions::default());
        let poisoner = registry.clone();
        let outcome = thread::spawn(move || {
            let mut state = poisoner.lock_state();
            *state = RegistrationState::Registering {
                metric: "k8gb_gslb_service_status_num".to_string(),
            };
            panic!("registration body panicked");
        })
        .join();
        assert!(outcome.is_err(), "helper thread should have panicked");

        let err = registry
            .register()
            .expect_err("interrupted registration must not report success");
        assert!(matches!(
            &err,
            MetricsError::RegistrationFailed { metric, .. }
                if metric == "k8gb_gslb_service_status_num"
        ));
        assert!(matches!(registry.state(), RegistrationState::Failed { .. }));

        // Later calls replay the same failure
        let replay = registry.register().expect_err("failure should be replayed");
        assert!(matches!(replay, MetricsError::RegistrationFailed { .. }));
    }

    #[test]
    fn test_partial_registration_is_not_rolled_back() {
        let collector = Registry::new();
        let (catalog, _) = test_registry(CatalogOptions::default());
        // Occupy the last name in catalog order with a foreign instrument
        let foreign =
            InstrumentCatalog::new(&CatalogOptions::default()).expect("Failed to create catalog");
        collector
            .register(Box::new(foreign.runtime_info.clone()))
            .expect("pre-registration should succeed");

        let registry = MetricsRegistry::new(catalog, collector);
        assert!(registry.register().is_err());

        let kept = exposed_names(&registry);
        assert!(kept.contains(&"k8gb_gslb_healthy_records".to_string()));
        assert!(kept.contains(&"k8gb_endpoint_status_num".to_string()));
        // Only the foreign runtime info is registered and it has no children
        assert!(!kept.contains(&"k8gb_runtime_info".to_string()));
    }

    #[test]
    fn test_unregister_removes_everything_and_is_idempotent() {
        let (_, registry) = test_registry(CatalogOptions::default());
        registry.register().expect("registration should succeed");

        registry.unregister();
        assert!(exposed_names(&registry).is_empty());

        registry.unregister();
        assert!(exposed_names(&registry).is_empty());
        // The guard is terminal, a later register() stays a no-op
        assert_eq!(registry.state(), RegistrationState::Registered);
        registry.register().expect("register after unregister is a no-op");
        assert!(exposed_names(&registry).is_empty());
    }

    #[test]
    fn test_unregister_before_register_is_a_noop() {
        let (_, registry) = test_registry(CatalogOptions::default());
        registry.unregister();
        assert_eq!(registry.state(), RegistrationState::Unregistered);
        registry.register().expect("registration should still succeed");
    }

    #[test]
    fn test_disabled_instruments_are_not_registered() {
        let (_, registry) = test_registry(CatalogOptions { infoblox: false });
        registry.register().expect("registration should succeed");

        let names = exposed_names(&registry);
        assert_eq!(names.len(), 9);
        assert!(names.iter().all(|n| !n.starts_with("k8gb_infoblox")));
    }

    #[test]
    fn test_concurrent_register_runs_body_once() {
        use std::thread;

        let (catalog, registry) = test_registry(CatalogOptions::default());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let r = registry.clone();
                thread::spawn(move || r.register())
            })
            .collect();

        for handle in handles {
            handle
                .join()
                .expect("register thread panicked")
                .expect("every caller should observe success");
        }

        assert_eq!(registry.state(), RegistrationState::Registered);
        assert_eq!(exposed_names(&registry).len(), catalog.describe().len());
    }

    #[test]
    fn test_gather_produces_prometheus_text_format() {
        let (catalog, registry) = test_registry(CatalogOptions::default());
        registry.register().expect("registration should succeed");
        catalog
            .gslb_reconciliation_loops_total
            .with_label_values(&["ns", "app"])
            .inc();

        let output = registry.gather().expect("Failed to gather test metrics");
        assert!(output.contains("# HELP k8gb_gslb_reconciliation_loops_total"));
        assert!(output.contains("# TYPE k8gb_gslb_reconciliation_loops_total counter"));
        let sample = "k8gb_gslb_reconciliation_loops_total{name=\"app\",namespace=\"ns\"} 1";
        assert!(output.contains(sample), "missing sample in:\n{}", output);
    }
}
