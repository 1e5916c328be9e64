//! Instrument catalog
//!
//! Owns one live prometheus vec per enabled descriptor. Discovery for
//! registration goes through [`InstrumentCatalog::entries`], an explicit
//! list pairing every descriptor with its (possibly absent) instrument.

use prometheus::core::Collector;
use prometheus::{CounterVec, GaugeVec, HistogramOpts, HistogramVec, Opts};

use super::descriptor::{self, MetricDescriptor, MetricKind};
use crate::error::{MetricsError, MetricsResult};

/// Which optional instrument groups get instantiated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogOptions {
    /// Instantiate the Infoblox provider counters and request histogram
    pub infoblox: bool,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self { infoblox: true }
    }
}

/// A live, label-partitioned instrument
///
/// Cloning shares the underlying state.
#[derive(Clone)]
pub enum Instrument {
    Counter(CounterVec),
    Gauge(GaugeVec),
    Histogram(HistogramVec),
}

impl Instrument {
    /// Kind of the wrapped vec
    pub fn kind(&self) -> MetricKind {
        match self {
            Instrument::Counter(_) => MetricKind::Counter,
            Instrument::Gauge(_) => MetricKind::Gauge,
            Instrument::Histogram(_) => MetricKind::DurationHistogram,
        }
    }

    /// Boxed handle suitable for `prometheus::Registry::{register, unregister}`
    pub fn collector(&self) -> Box<dyn Collector> {
        match self {
            Instrument::Counter(vec) => Box::new(vec.clone()),
            Instrument::Gauge(vec) => Box::new(vec.clone()),
            Instrument::Histogram(vec) => Box::new(vec.clone()),
        }
    }

    /// Build the instrument a descriptor asks for
    pub fn build(descriptor: &MetricDescriptor) -> MetricsResult<Self> {
        let name = descriptor.name();
        let construction = |source| MetricsError::InstrumentConstruction {
            metric: name.clone(),
            source,
        };

        let instrument = match descriptor.kind {
            MetricKind::Counter => Instrument::Counter(
                CounterVec::new(Opts::new(name.clone(), descriptor.help), descriptor.labels)
                    .map_err(construction)?,
            ),
            MetricKind::Gauge => Instrument::Gauge(
                GaugeVec::new(Opts::new(name.clone(), descriptor.help), descriptor.labels)
                    .map_err(construction)?,
            ),
            MetricKind::DurationHistogram => {
                let mut opts = HistogramOpts::new(name.clone(), descriptor.help);
                if let Some(layout) = descriptor.buckets {
                    let buckets =
                        prometheus::exponential_buckets(layout.start, layout.factor, layout.count)
                            .map_err(construction)?;
                    opts = opts.buckets(buckets);
                }
                Instrument::Histogram(
                    HistogramVec::new(opts, descriptor.labels).map_err(construction)?,
                )
            }
        };

        Ok(instrument)
    }
}

fn gauge(descriptor: &MetricDescriptor) -> MetricsResult<GaugeVec> {
    match Instrument::build(descriptor)? {
        Instrument::Gauge(vec) => Ok(vec),
        other => Err(kind_mismatch(descriptor, &other)),
    }
}

fn counter(descriptor: &MetricDescriptor) -> MetricsResult<CounterVec> {
    match Instrument::build(descriptor)? {
        Instrument::Counter(vec) => Ok(vec),
        other => Err(kind_mismatch(descriptor, &other)),
    }
}

fn histogram(descriptor: &MetricDescriptor) -> MetricsResult<HistogramVec> {
    match Instrument::build(descriptor)? {
        Instrument::Histogram(vec) => Ok(vec),
        other => Err(kind_mismatch(descriptor, &other)),
    }
}

fn kind_mismatch(descriptor: &MetricDescriptor, built: &Instrument) -> MetricsError {
    MetricsError::InstrumentConstruction {
        metric: descriptor.name(),
        source: prometheus::Error::Msg(format!(
            "descriptor declares {} but catalog field holds {}",
            descriptor.kind.as_str(),
            built.kind().as_str()
        )),
    }
}

/// Infoblox provider instruments, only present when enabled
#[derive(Clone)]
pub struct InfobloxInstruments {
    pub request_duration: HistogramVec,
    pub zone_updates_total: CounterVec,
    pub zone_update_errors_total: CounterVec,
    pub heartbeats_total: CounterVec,
    pub heartbeat_errors_total: CounterVec,
}

impl InfobloxInstruments {
    fn new() -> MetricsResult<Self> {
        Ok(Self {
            request_duration: histogram(&descriptor::INFOBLOX_REQUEST_DURATION)?,
            zone_updates_total: counter(&descriptor::INFOBLOX_ZONE_UPDATES_TOTAL)?,
            zone_update_errors_total: counter(&descriptor::INFOBLOX_ZONE_UPDATE_ERRORS_TOTAL)?,
            heartbeats_total: counter(&descriptor::INFOBLOX_HEARTBEATS_TOTAL)?,
            heartbeat_errors_total: counter(&descriptor::INFOBLOX_HEARTBEAT_ERRORS_TOTAL)?,
        })
    }
}

/// The fixed set of controller instruments
#[derive(Clone)]
pub struct InstrumentCatalog {
    pub gslb_healthy_records: GaugeVec,
    pub gslb_service_status_num: GaugeVec,
    pub gslb_status_count_for_failover: GaugeVec,
    pub gslb_status_count_for_roundrobin: GaugeVec,
    pub gslb_status_count_for_geoip: GaugeVec,
    pub gslb_errors_total: CounterVec,
    pub gslb_reconciliation_loops_total: CounterVec,
    pub endpoint_status_num: GaugeVec,
    pub runtime_info: GaugeVec,
    pub infoblox: Option<InfobloxInstruments>,
}

impl InstrumentCatalog {
    /// Instantiate every enabled instrument
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::InstrumentConstruction`] if prometheus rejects
    /// a descriptor (invalid name, label or bucket layout).
    pub fn new(options: &CatalogOptions) -> MetricsResult<Self> {
        let infoblox = if options.infoblox {
            Some(InfobloxInstruments::new()?)
        } else {
            None
        };

        Ok(Self {
            gslb_healthy_records: gauge(&descriptor::GSLB_HEALTHY_RECORDS)?,
            gslb_service_status_num: gauge(&descriptor::GSLB_SERVICE_STATUS_NUM)?,
            gslb_status_count_for_failover: gauge(&descriptor::GSLB_STATUS_COUNT_FOR_FAILOVER)?,
            gslb_status_count_for_roundrobin: gauge(&descriptor::GSLB_STATUS_COUNT_FOR_ROUNDROBIN)?,
            gslb_status_count_for_geoip: gauge(&descriptor::GSLB_STATUS_COUNT_FOR_GEOIP)?,
            gslb_errors_total: counter(&descriptor::GSLB_ERRORS_TOTAL)?,
            gslb_reconciliation_loops_total: counter(&descriptor::GSLB_RECONCILIATION_LOOPS_TOTAL)?,
            endpoint_status_num: gauge(&descriptor::ENDPOINT_STATUS_NUM)?,
            runtime_info: gauge(&descriptor::RUNTIME_INFO)?,
            infoblox,
        })
    }

    /// Every descriptor paired with its instrument, `None` when not instantiated
    ///
    /// New instruments are added here and in the struct; registration and
    /// teardown pick them up from this list.
    pub fn entries(&self) -> Vec<(&'static MetricDescriptor, Option<Instrument>)> {
        let infoblox = self.infoblox.as_ref();

        vec![
            (
                &descriptor::GSLB_HEALTHY_RECORDS,
                Some(Instrument::Gauge(self.gslb_healthy_records.clone())),
            ),
            (
                &descriptor::GSLB_SERVICE_STATUS_NUM,
                Some(Instrument::Gauge(self.gslb_service_status_num.clone())),
            ),
            (
                &descriptor::GSLB_STATUS_COUNT_FOR_FAILOVER,
                Some(Instrument::Gauge(self.gslb_status_count_for_failover.clone())),
            ),
            (
                &descriptor::GSLB_STATUS_COUNT_FOR_ROUNDROBIN,
                Some(Instrument::Gauge(self.gslb_status_count_for_roundrobin.clone())),
            ),
            (
                &descriptor::GSLB_STATUS_COUNT_FOR_GEOIP,
                Some(Instrument::Gauge(self.gslb_status_count_for_geoip.clone())),
            ),
            (
                &descriptor::GSLB_ERRORS_TOTAL,
                Some(Instrument::Counter(self.gslb_errors_total.clone())),
            ),
            (
                &descriptor::GSLB_RECONCILIATION_LOOPS_TOTAL,
                Some(Instrument::Counter(self.gslb_reconciliation_loops_total.clone())),
            ),
            (
                &descriptor::INFOBLOX_REQUEST_DURATION,
                infoblox.map(|i| Instrument::Histogram(i.request_duration.clone())),
            ),
            (
                &descriptor::INFOBLOX_ZONE_UPDATES_TOTAL,
                infoblox.map(|i| Instrument::Counter(i.zone_updates_total.clone())),
            ),
            (
                &descriptor::INFOBLOX_ZONE_UPDATE_ERRORS_TOTAL,
                infoblox.map(|i| Instrument::Counter(i.zone_update_errors_total.clone())),
            ),
            (
                &descriptor::INFOBLOX_HEARTBEATS_TOTAL,
                infoblox.map(|i| Instrument::Counter(i.heartbeats_total.clone())),
            ),
            (
                &descriptor::INFOBLOX_HEARTBEAT_ERRORS_TOTAL,
                infoblox.map(|i| Instrument::Counter(i.heartbeat_errors_total.clone())),
            ),
            (
                &descriptor::ENDPOINT_STATUS_NUM,
                Some(Instrument::Gauge(self.endpoint_status_num.clone())),
            ),
            (
                &descriptor::RUNTIME_INFO,
                Some(Instrument::Gauge(self.runtime_info.clone())),
            ),
        ]
    }

    /// `(canonical name, instrument)` for every instantiated instrument
    pub fn describe(&self) -> Vec<(String, Instrument)> {
        self.entries()
            .into_iter()
            .filter_map(|(descriptor, instrument)| {
                instrument.map(|instrument| (descriptor.name(), instrument))
            })
            .collect()
    }
}
