//! Metrics registry for coordinating phase-specific metrics

use crate::metrics::{MetricDoc, PhaseMetrics};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// Register all metrics from all phases, warning on name conflicts
pub fn register_all_metrics() -> usize {
    let mut all_metrics = HashMap::new();

    register_phase_metrics::<super::streams::StreamMetrics>(&mut all_metrics);
    register_phase_metrics::<super::pipeline::PipelineMetrics>(&mut all_metrics);

    info!(
        "Registered {} total metrics across all phases",
        all_metrics.len()
    );

    if std::env::var("NEXUS_METRICS_DEBUG").is_ok() {
        for line in metrics_summary(&all_metrics) {
            info!("{}", line);
        }
    }
    all_metrics.len()
}

fn register_phase_metrics<T: PhaseMetrics>(all_metrics: &mut HashMap<String, MetricDoc>) {
    T::register_metrics();
    let phase_docs = T::metrics_documentation();
    let phase_name = T::phase_name();

    debug!(
        "Registering {} metrics for phase '{}'",
        phase_docs.len(),
        phase_name
    );

    for doc in phase_docs {
        if extract_phase_from_metric_name(doc.name) != phase_name {
            warn!("Metric '{}' does not carry the '{}' phase prefix", doc.name, phase_name);
        }
        if all_metrics.contains_key(doc.name) {
            warn!(
                "Metric name conflict detected: '{}' registered twice (phase '{}')",
                doc.name, phase_name
            );
        } else {
            all_metrics.insert(doc.name.to_string(), doc);
        }
    }
}

/// One line per registered metric, grouped by phase
fn metrics_summary(all_metrics: &HashMap<String, MetricDoc>) -> Vec<String> {
    let mut by_phase: BTreeMap<&str, Vec<&MetricDoc>> = BTreeMap::new();
    for doc in all_metrics.values() {
        by_phase
            .entry(extract_phase_from_metric_name(doc.name))
            .or_default()
            .push(doc);
    }

    let mut lines = Vec::new();
    for (phase, mut docs) in by_phase {
        docs.sort_by_key(|d| d.name);
        lines.push(format!("Phase '{}': {} metrics", phase, docs.len()));
        for doc in docs {
            let labels = if doc.labels.is_empty() {
                String::new()
            } else {
                format!(" [{}]", doc.labels.join(", "))
            };
            lines.push(format!(
                "  - {} ({:?}){}: {}",
                doc.name, doc.metric_type, labels, doc.help
            ));
        }
    }
    lines
}

/// Extract phase name from metric name (e.g., "nexus_pipeline_records_failed_total" -> "pipeline")
fn extract_phase_from_metric_name(metric_name: &str) -> &str {
    if let Some(stripped) = metric_name.strip_prefix("nexus_") {
        if let Some(next_underscore) = stripped.find('_') {
            return &stripped[..next_underscore];
        }
    }
    "unknown"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_phase_from_metric_name() {
        assert_eq!(
            extract_phase_from_metric_name("nexus_streams_records_accepted_total"),
            "streams"
        );
        assert_eq!(
            extract_phase_from_metric_name("nexus_pipeline_batch_duration_seconds"),
            "pipeline"
        );
        assert_eq!(
            extract_phase_from_metric_name("invalid_metric_name"),
            "unknown"
        );
    }

    #[test]
    fn test_metrics_summary_groups_by_phase() {
        let mut all_metrics = HashMap::new();
        register_phase_metrics::<crate::metrics::PipelineMetrics>(&mut all_metrics);

        let lines = metrics_summary(&all_metrics);
        assert_eq!(lines[0], "Phase 'pipeline': 5 metrics");
        assert_eq!(lines.len(), 6);
        assert!(lines.contains(
            &"  - nexus_pipeline_records_failed_total (Counter) [pipeline, error_type]: Records whose pipeline run failed and was recovered"
                .to_string()
        ));
        assert!(lines.contains(
            &"  - nexus_pipeline_efficiency_percent (Gauge): Share of counted records that completed without failure"
                .to_string()
        ));
    }

    #[test]
    fn test_all_phase_metrics_have_unique_names() {
        assert_eq!(register_all_metrics(), 13);
    }
}
