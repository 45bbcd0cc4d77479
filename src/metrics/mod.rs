//! Metrics for the stream and pipeline engines
//!
//! Each engine phase defines its metrics in a dedicated submodule so names stay
//! unique and documented. Recording goes through the `metrics` facade; when no
//! recorder is installed every call is a no-op.

pub mod pipeline;
pub mod registry;
pub mod streams;

pub use pipeline::PipelineMetrics;
pub use streams::StreamMetrics;

use std::sync::OnceLock;
use tracing::{info, warn};

static HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> = OnceLock::new();

/// Initialize the global metrics recorder
///
/// Idempotent. Installs an in-process Prometheus recorder (no HTTP listener)
/// and registers all phase metrics so the first render is complete.
pub fn init_metrics() {
    HANDLE.get_or_init(|| {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        match ::metrics::set_global_recorder(recorder) {
            Ok(()) => info!("Prometheus recorder installed"),
            Err(e) => warn!("Failed to install Prometheus recorder: {}", e),
        }
        registry::register_all_metrics();
        handle
    });
}

/// Render the current metrics snapshot in Prometheus text format
pub fn render() -> Option<String> {
    HANDLE.get().map(|handle| handle.render())
}

/// Trait for phase-specific metrics collections
pub trait PhaseMetrics {
    /// Register all metrics for this phase
    fn register_metrics();

    /// Phase name used as the metric prefix
    fn phase_name() -> &'static str;

    /// Documentation for every metric in this phase
    fn metrics_documentation() -> Vec<MetricDoc>;
}

/// Documentation for a single metric
#[derive(Debug, Clone)]
pub struct MetricDoc {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub help: &'static str,
    pub labels: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetricType {
    Counter,
    Histogram,
    Gauge,
}

/// Builds metric names following `nexus_{phase}_{metric_name}[_total]`
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("nexus_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("nexus_", $phase, "_", $name)
    };
    (gauge, $phase:literal, $name:literal) => {
        concat!("nexus_", $phase, "_", $name)
    };
}

pub(crate) use phase_metric;
