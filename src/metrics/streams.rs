//! Stream Phase Metrics
//!
//! Classification, validation, criterion filtering and aggregation counts for the
//! sensor, transaction and event streams.

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};
use crate::types::StreamKind;

/// Metrics collection for the Streams phase
pub struct StreamMetrics;

impl StreamMetrics {
    /// Record a dispatched batch and its size
    pub fn record_dispatch(records: usize) {
        ::metrics::counter!(phase_metric!(counter, "streams", "batches_dispatched")).increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "streams", "batch_size"))
            .record(records as f64);
    }

    /// Record a record that matched no stream kind
    pub fn record_unclassifiable() {
        ::metrics::counter!(phase_metric!(counter, "streams", "unclassifiable_records"))
            .increment(1);
    }

    /// Record the outcome of one filter call
    pub fn record_filter(kind: StreamKind, accepted: usize, rejected: usize, invalid: usize) {
        ::metrics::counter!(phase_metric!(counter, "streams", "records_accepted"), "kind" => kind.as_str())
            .increment(accepted as u64);
        ::metrics::counter!(phase_metric!(counter, "streams", "records_rejected"), "kind" => kind.as_str())
            .increment(rejected as u64);
        ::metrics::counter!(phase_metric!(counter, "streams", "records_invalid"), "kind" => kind.as_str())
            .increment(invalid as u64);
    }

    /// Record a criterion token that could not be parsed
    pub fn record_criterion_error(kind: StreamKind) {
        ::metrics::counter!(phase_metric!(counter, "streams", "criterion_errors"), "kind" => kind.as_str())
            .increment(1);
    }

    /// Record operations folded into a stream's running state
    pub fn record_aggregate(kind: StreamKind, operations: usize) {
        ::metrics::counter!(phase_metric!(counter, "streams", "operations_aggregated"), "kind" => kind.as_str())
            .increment(operations as u64);
    }
}

impl PhaseMetrics for StreamMetrics {
    fn register_metrics() {
        use metrics::{counter, histogram};

        let _ = counter!(phase_metric!(counter, "streams", "batches_dispatched"));
        let _ = counter!(phase_metric!(counter, "streams", "unclassifiable_records"));
        for kind in StreamKind::ALL {
            let _ = counter!(phase_metric!(counter, "streams", "records_accepted"), "kind" => kind.as_str());
            let _ = counter!(phase_metric!(counter, "streams", "records_rejected"), "kind" => kind.as_str());
            let _ = counter!(phase_metric!(counter, "streams", "records_invalid"), "kind" => kind.as_str());
            let _ = counter!(phase_metric!(counter, "streams", "criterion_errors"), "kind" => kind.as_str());
            let _ = counter!(phase_metric!(counter, "streams", "operations_aggregated"), "kind" => kind.as_str());
        }
        let _ = histogram!(phase_metric!(histogram, "streams", "batch_size"));
    }

    fn phase_name() -> &'static str {
        "streams"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "streams", "batches_dispatched"),
                metric_type: MetricType::Counter,
                help: "Total number of mixed batches dispatched",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "streams", "unclassifiable_records"),
                metric_type: MetricType::Counter,
                help: "Records that matched no stream kind",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "streams", "records_accepted"),
                metric_type: MetricType::Counter,
                help: "Records accepted by the stream filter",
                labels: vec!["kind"],
            },
            MetricDoc {
                name: phase_metric!(counter, "streams", "records_rejected"),
                metric_type: MetricType::Counter,
                help: "Records rejected by a filter criterion",
                labels: vec!["kind"],
            },
            MetricDoc {
                name: phase_metric!(counter, "streams", "records_invalid"),
                metric_type: MetricType::Counter,
                help: "Records dropped for failing shape validation",
                labels: vec!["kind"],
            },
            MetricDoc {
                name: phase_metric!(counter, "streams", "criterion_errors"),
                metric_type: MetricType::Counter,
                help: "Criterion tokens that failed to parse",
                labels: vec!["kind"],
            },
            MetricDoc {
                name: phase_metric!(counter, "streams", "operations_aggregated"),
                metric_type: MetricType::Counter,
                help: "Operations folded into running stream statistics",
                labels: vec!["kind"],
            },
            MetricDoc {
                name: phase_metric!(histogram, "streams", "batch_size"),
                metric_type: MetricType::Histogram,
                help: "Number of records per dispatched batch",
                labels: vec![],
            },
        ]
    }
}
