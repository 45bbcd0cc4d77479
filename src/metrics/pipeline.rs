//! Pipeline Phase Metrics

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

/// Metrics collection for the Pipeline phase
pub struct PipelineMetrics;

impl PipelineMetrics {
    pub fn record_success(pipeline_id: &str) {
        ::metrics::counter!(phase_metric!(counter, "pipeline", "records_processed"), "pipeline" => pipeline_id.to_string())
            .increment(1);
    }

    /// Record a record that failed and was recovered from
    pub fn record_failure(pipeline_id: &str, error_type: &'static str) {
        ::metrics::counter!(
            phase_metric!(counter, "pipeline", "records_failed"),
            "pipeline" => pipeline_id.to_string(),
            "error_type" => error_type
        )
        .increment(1);
    }

    pub fn record_skipped(count: usize) {
        ::metrics::counter!(phase_metric!(counter, "pipeline", "records_skipped"))
            .increment(count as u64);
    }

    /// Record one `process_data` call
    pub fn record_batch(duration_secs: f64, efficiency: u32) {
        ::metrics::histogram!(phase_metric!(histogram, "pipeline", "batch_duration_seconds"))
            .record(duration_secs);
        ::metrics::gauge!(phase_metric!(gauge, "pipeline", "efficiency_percent"))
            .set(efficiency as f64);
    }
}

impl PhaseMetrics for PipelineMetrics {
    fn register_metrics() {
        use metrics::{counter, gauge, histogram};

        let _ = counter!(phase_metric!(counter, "pipeline", "records_processed"));
        let _ = counter!(phase_metric!(counter, "pipeline", "records_failed"));
        let _ = counter!(phase_metric!(counter, "pipeline", "records_skipped"));
        let _ = histogram!(phase_metric!(histogram, "pipeline", "batch_duration_seconds"));
        let _ = gauge!(phase_metric!(gauge, "pipeline", "efficiency_percent"));
    }

    fn phase_name() -> &'static str {
        "pipeline"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "pipeline", "records_processed"),
                metric_type: MetricType::Counter,
                help: "Records that completed all three stages",
                labels: vec!["pipeline"],
            },
            MetricDoc {
                name: phase_metric!(counter, "pipeline", "records_failed"),
                metric_type: MetricType::Counter,
                help: "Records whose pipeline run failed and was recovered",
                labels: vec!["pipeline", "error_type"],
            },
            MetricDoc {
                name: phase_metric!(counter, "pipeline", "records_skipped"),
                metric_type: MetricType::Counter,
                help: "Records with no matching pipeline encoding",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(histogram, "pipeline", "batch_duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Wall-clock duration of each process_data call",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(gauge, "pipeline", "efficiency_percent"),
                metric_type: MetricType::Gauge,
                help: "Share of counted records that completed without failure",
                labels: vec![],
            },
        ]
    }
}
