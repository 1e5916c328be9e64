//! gslb-metrics - Prometheus metrics for a DNS-based global load balancer
//!
//! This library turns controller events (health evaluations, DNS zone
//! operations, reconciliation loops) into a fixed set of labeled
//! Prometheus instruments and registers them exactly once.

pub mod cli;
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;
