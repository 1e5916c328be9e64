//! Type-safe label values
//!
//! Label values with a closed domain are enums so callers cannot invent
//! new series by typo.

use std::fmt;

/// Identifies the load balancing object a series belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GslbRef<'a> {
    pub namespace: &'a str,
    pub name: &'a str,
}

impl<'a> GslbRef<'a> {
    pub fn new(namespace: &'a str, name: &'a str) -> Self {
        Self { namespace, name }
    }
}

/// Tri-state health of a single target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    NotFound,
}

impl HealthStatus {
    /// Every status in the order the aggregator writes them
    pub const ALL: [HealthStatus; 3] = [
        HealthStatus::Healthy,
        HealthStatus::Unhealthy,
        HealthStatus::NotFound,
    ];

    /// Convert status to Prometheus label string
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "Healthy",
            HealthStatus::Unhealthy => "Unhealthy",
            HealthStatus::NotFound => "NotFound",
        }
    }

    /// One result per target, all carrying this status
    ///
    /// Matches the shape the strategies report in: a single status for a
    /// whole list of targets.
    ///
    /// ```
    /// use gslb_metrics::metrics::HealthStatus;
    ///
    /// let targets = ["10.0.0.1", "10.0.0.2"];
    /// let results: Vec<_> = HealthStatus::Healthy.repeat(targets.len()).collect();
    /// assert_eq!(results, vec![HealthStatus::Healthy; 2]);
    /// ```
    pub fn repeat(self, count: usize) -> impl Iterator<Item = HealthStatus> {
        std::iter::repeat_n(self, count)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status label suffix distinguishing strategy roles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyTag {
    /// Failover, reported by the primary cluster
    Primary,
    /// Failover, reported by a secondary cluster
    Secondary,
    /// Round robin and GeoIP
    Untagged,
}

impl StrategyTag {
    /// Failover tag for the reporting side
    pub fn failover(is_primary: bool) -> Self {
        if is_primary {
            StrategyTag::Primary
        } else {
            StrategyTag::Secondary
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            StrategyTag::Primary => "_primary",
            StrategyTag::Secondary => "_secondary",
            StrategyTag::Untagged => "",
        }
    }

    /// Full status label, e.g. `Healthy_primary`
    pub fn status_label(&self, status: HealthStatus) -> String {
        format!("{}{}", status.as_str(), self.suffix())
    }
}

/// DNS provider request kind, the `request` label of the duration histogram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderRequest {
    CreateZoneDelegated,
    GetZoneDelegated,
    UpdateZoneDelegated,
    DeleteZoneDelegated,
    CreateTxtRecord,
    GetTxtRecord,
    UpdateTxtRecord,
    DeleteTxtRecord,
}

impl ProviderRequest {
    pub const ALL: [ProviderRequest; 8] = [
        ProviderRequest::CreateZoneDelegated,
        ProviderRequest::GetZoneDelegated,
        ProviderRequest::UpdateZoneDelegated,
        ProviderRequest::DeleteZoneDelegated,
        ProviderRequest::CreateTxtRecord,
        ProviderRequest::GetTxtRecord,
        ProviderRequest::UpdateTxtRecord,
        ProviderRequest::DeleteTxtRecord,
    ];

    /// Convert request kind to Prometheus label string
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderRequest::CreateZoneDelegated => "ZoneCreate",
            ProviderRequest::GetZoneDelegated => "ZoneRead",
            ProviderRequest::UpdateZoneDelegated => "ZoneUpdate",
            ProviderRequest::DeleteZoneDelegated => "ZoneDelete",
            ProviderRequest::CreateTxtRecord => "TXTRecordCreate",
            ProviderRequest::GetTxtRecord => "TXTRecordRead",
            ProviderRequest::UpdateTxtRecord => "TXTRecordUpdate",
            ProviderRequest::DeleteTxtRecord => "TXTRecordDelete",
        }
    }
}

impl fmt::Display for ProviderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
