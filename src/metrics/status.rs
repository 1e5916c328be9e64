//! Status aggregation
//!
//! Reduces per-target health results into the three mutually exclusive
//! counts exposed by the status gauges.

use prometheus::GaugeVec;

use super::labels::{GslbRef, HealthStatus, StrategyTag};

/// Per-status target counts for one reconciliation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub healthy: usize,
    pub unhealthy: usize,
    pub not_found: usize,
}

impl StatusCounts {
    /// Count results by status
    ///
    /// Every input lands in exactly one bucket, so
    /// `tally(xs).total() == xs.len()`.
    pub fn tally<I>(results: I) -> Self
    where
        I: IntoIterator<Item = HealthStatus>,
    {
        results
            .into_iter()
            .fold(Self::default(), |mut counts, status| {
                match status {
                    HealthStatus::Healthy => counts.healthy += 1,
                    HealthStatus::Unhealthy => counts.unhealthy += 1,
                    HealthStatus::NotFound => counts.not_found += 1,
                }
                counts
            })
    }

    pub fn get(&self, status: HealthStatus) -> usize {
        match status {
            HealthStatus::Healthy => self.healthy,
            HealthStatus::Unhealthy => self.unhealthy,
            HealthStatus::NotFound => self.not_found,
        }
    }

    pub fn total(&self) -> usize {
        self.healthy + self.unhealthy + self.not_found
    }
}

/// Write the three counts onto a `{namespace, name, status}` gauge
///
/// The writes are independent sets in the order Healthy, Unhealthy,
/// NotFound; a scrape in between may see a mix of old and new values until
/// the next reconciliation.
pub fn apply(vec: &GaugeVec, gslb: GslbRef<'_>, counts: StatusCounts, tag: StrategyTag) {
    for status in HealthStatus::ALL {
        let label = tag.status_label(status);
        set_gauge(
            vec,
            &[gslb.namespace, gslb.name, label.as_str()],
            counts.get(status) as f64,
        );
    }
}

/// Set a gauge child, logging and swallowing label mismatches
pub(crate) fn set_gauge(vec: &GaugeVec, labels: &[&str], value: f64) {
    match vec.get_metric_with_label_values(labels) {
        Ok(gauge) => gauge.set(value),
        Err(e) => {
            tracing::warn!(
                error = %e,
                labels = ?labels,
                "Failed to set gauge, metric update dropped"
            );
        }
    }
}
