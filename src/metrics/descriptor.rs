//! Static descriptions of every instrument the controller exposes

use serde::Serialize;

use super::naming::canonical_name;

/// Instrument type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Counter,
    Gauge,
    #[serde(rename = "histogram")]
    DurationHistogram,
}

impl MetricKind {
    /// Prometheus `# TYPE` value for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::DurationHistogram => "histogram",
        }
    }
}

/// Exponential bucket layout for duration histograms
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExponentialBuckets {
    pub start: f64,
    pub factor: f64,
    pub count: usize,
}

/// Immutable description of one instrument
///
/// The exposed name is derived from `ident` by [`canonical_name`], so the
/// descriptor table holds a single spelling of every metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricDescriptor {
    pub ident: &'static str,
    pub kind: MetricKind,
    pub help: &'static str,
    pub labels: &'static [&'static str],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buckets: Option<ExponentialBuckets>,
}

impl MetricDescriptor {
    /// Canonical (exposed) metric name
    pub fn name(&self) -> String {
        canonical_name(self.ident)
    }
}

const GSLB_LABELS: &[&str] = &["namespace", "name"];
const STATUS_LABELS: &[&str] = &["namespace", "name", "status"];

pub const GSLB_HEALTHY_RECORDS: MetricDescriptor = MetricDescriptor {
    ident: "K8gbGslbHealthyRecords",
    kind: MetricKind::Gauge,
    help: "Number of healthy records observed by K8GB.",
    labels: GSLB_LABELS,
    buckets: None,
};

pub const GSLB_SERVICE_STATUS_NUM: MetricDescriptor = MetricDescriptor {
    ident: "K8gbGslbServiceStatusNum",
    kind: MetricKind::Gauge,
    help: "Number of managed hosts observed by K8GB.",
    labels: STATUS_LABELS,
    buckets: None,
};

pub const GSLB_STATUS_COUNT_FOR_FAILOVER: MetricDescriptor = MetricDescriptor {
    ident: "K8gbGslbStatusCountForFailover",
    kind: MetricKind::Gauge,
    help: "Gslb status count for Failover strategy.",
    labels: STATUS_LABELS,
    buckets: None,
};

pub const GSLB_STATUS_COUNT_FOR_ROUNDROBIN: MetricDescriptor = MetricDescriptor {
    ident: "K8gbGslbStatusCountForRoundrobin",
    kind: MetricKind::Gauge,
    help: "Gslb status count for RoundRobin strategy.",
    labels: STATUS_LABELS,
    buckets: None,
};

pub const GSLB_STATUS_COUNT_FOR_GEOIP: MetricDescriptor = MetricDescriptor {
    ident: "K8gbGslbStatusCountForGeoip",
    kind: MetricKind::Gauge,
    help: "Gslb status count for GeoIP strategy.",
    labels: STATUS_LABELS,
    buckets: None,
};

pub const GSLB_ERRORS_TOTAL: MetricDescriptor = MetricDescriptor {
    ident: "K8gbGslbErrorsTotal",
    kind: MetricKind::Counter,
    help: "Number of errors",
    labels: GSLB_LABELS,
    buckets: None,
};

pub const GSLB_RECONCILIATION_LOOPS_TOTAL: MetricDescriptor = MetricDescriptor {
    ident: "K8gbGslbReconciliationLoopsTotal",
    kind: MetricKind::Counter,
    help: "Number of successful reconciliation loops.",
    labels: GSLB_LABELS,
    buckets: None,
};

pub const ENDPOINT_STATUS_NUM: MetricDescriptor = MetricDescriptor {
    ident: "K8gbEndpointStatusNum",
    kind: MetricKind::Gauge,
    help: "Number of targets in DNS endpoint.",
    labels: &["namespace", "name", "dns_name"],
    buckets: None,
};

pub const RUNTIME_INFO: MetricDescriptor = MetricDescriptor {
    ident: "K8gbRuntimeInfo",
    kind: MetricKind::Gauge,
    help: "K8gb runtime info.",
    labels: &[
        "namespace",
        "k8gb_version",
        "rust_version",
        "arch",
        "os",
        "git_sha",
    ],
    buckets: None,
};

pub const INFOBLOX_REQUEST_DURATION: MetricDescriptor = MetricDescriptor {
    ident: "K8gbInfobloxRequestDuration",
    kind: MetricKind::DurationHistogram,
    help: "How long it took for Infoblox requests to complete, partitioned by request type. \
           Round-trip time of http communication is included.",
    labels: &["request", "success"],
    // 0.2, 0.8, 3.2, 12.8, 51.2 seconds
    buckets: Some(ExponentialBuckets {
        start: 0.2,
        factor: 4.0,
        count: 5,
    }),
};

pub const INFOBLOX_ZONE_UPDATES_TOTAL: MetricDescriptor = MetricDescriptor {
    ident: "K8gbInfobloxZoneUpdatesTotal",
    kind: MetricKind::Counter,
    help: "Number of K8GB Infoblox zone updates.",
    labels: GSLB_LABELS,
    buckets: None,
};

pub const INFOBLOX_ZONE_UPDATE_ERRORS_TOTAL: MetricDescriptor = MetricDescriptor {
    ident: "K8gbInfobloxZoneUpdateErrorsTotal",
    kind: MetricKind::Counter,
    help: "Number of K8GB Infoblox zone update errors.",
    labels: GSLB_LABELS,
    buckets: None,
};

pub const INFOBLOX_HEARTBEATS_TOTAL: MetricDescriptor = MetricDescriptor {
    ident: "K8gbInfobloxHeartbeatsTotal",
    kind: MetricKind::Counter,
    help: "Number of K8GB Infoblox heartbeat TXT record updates.",
    labels: GSLB_LABELS,
    buckets: None,
};

pub const INFOBLOX_HEARTBEAT_ERRORS_TOTAL: MetricDescriptor = MetricDescriptor {
    ident: "K8gbInfobloxHeartbeatErrorsTotal",
    kind: MetricKind::Counter,
    help: "Number of K8GB Infoblox TXT record errors.",
    labels: GSLB_LABELS,
    buckets: None,
};

/// Every descriptor, in catalog order
pub const ALL: [&MetricDescriptor; 14] = [
    &GSLB_HEALTHY_RECORDS,
    &GSLB_SERVICE_STATUS_NUM,
    &GSLB_STATUS_COUNT_FOR_FAILOVER,
    &GSLB_STATUS_COUNT_FOR_ROUNDROBIN,
    &GSLB_STATUS_COUNT_FOR_GEOIP,
    &GSLB_ERRORS_TOTAL,
    &GSLB_RECONCILIATION_LOOPS_TOTAL,
    &INFOBLOX_REQUEST_DURATION,
    &INFOBLOX_ZONE_UPDATES_TOTAL,
    &INFOBLOX_ZONE_UPDATE_ERRORS_TOTAL,
    &INFOBLOX_HEARTBEATS_TOTAL,
    &INFOBLOX_HEARTBEAT_ERRORS_TOTAL,
    &ENDPOINT_STATUS_NUM,
    &RUNTIME_INFO,
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_canonical_names_match_exposed_names() {
        let names: Vec<String> = ALL.iter().map(|d| d.name()).collect();
        assert_eq!(
            names,
            vec![
                "k8gb_gslb_healthy_records",
                "k8gb_gslb_service_status_num",
                "k8gb_gslb_status_count_for_failover",
                "k8gb_gslb_status_count_for_roundrobin",
                "k8gb_gslb_status_count_for_geoip",
                "k8gb_gslb_errors_total",
                "k8gb_gslb_reconciliation_loops_total",
                "k8gb_infoblox_request_duration",
                "k8gb_infoblox_zone_updates_total",
                "k8gb_infoblox_zone_update_errors_total",
                "k8gb_infoblox_heartbeats_total",
                "k8gb_infoblox_heartbeat_errors_total",
                "k8gb_endpoint_status_num",
                "k8gb_runtime_info",
            ]
        );
    }

    #[test]
    fn test_canonical_names_are_collision_free() {
        let idents: HashSet<&str> = ALL.iter().map(|d| d.ident).collect();
        let names: HashSet<String> = ALL.iter().map(|d| d.name()).collect();
        assert_eq!(idents.len(), ALL.len(), "duplicate identifier in catalog");
        assert_eq!(
            names.len(),
            ALL.len(),
            "two identifiers share a canonical name"
        );
    }

    #[test]
    fn test_only_histograms_carry_buckets() {
        for descriptor in ALL {
            assert_eq!(
                descriptor.buckets.is_some(),
                descriptor.kind == MetricKind::DurationHistogram,
                "{} bucket layout does not match its kind",
                descriptor.ident
            );
        }
    }

    #[test]
    fn test_descriptor_serializes_for_listing() {
        let json = serde_json::to_value(GSLB_ERRORS_TOTAL).expect("descriptor should serialize");
        assert_eq!(json["kind"], "counter");
        assert_eq!(json["labels"], serde_json::json!(["namespace", "name"]));
        assert!(json.get("buckets").is_none());
    }

    #[test]
    fn test_serialized_kind_matches_type_line() {
        for descriptor in ALL {
            let json = serde_json::to_value(descriptor).expect("descriptor should serialize");
            assert_eq!(json["kind"], descriptor.kind.as_str());
        }

        let json = serde_json::to_value(INFOBLOX_REQUEST_DURATION).expect("should serialize");
        assert_eq!(json["kind"], "histogram");
        assert_eq!(json["buckets"]["count"], 5);
    }
}
