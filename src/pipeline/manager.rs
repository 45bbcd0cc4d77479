use super::{Encoding, Pipeline};
use crate::config::PipelineConfig;
use crate::error::NexusError;
use crate::metrics::PipelineMetrics;
use crate::types::RawRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// One recovered pipeline failure
#[derive(Debug, Clone, Serialize)]
pub struct RecoveryEntry {
    pub pipeline_id: String,
    pub record_index: usize,
    pub error_type: &'static str,
    pub message: String,
    pub recovered_at: DateTime<Utc>,
}

/// Bookkeeping owned by one manager for its whole lifetime
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineContext {
    pub total: u64,
    pub failures: u64,
    pub elapsed: Duration,
    /// Pipeline id of every counted record, in processing order
    pub lineage: Vec<String>,
    pub recovery_log: Vec<RecoveryEntry>,
}

impl PipelineContext {
    pub fn successes(&self) -> u64 {
        self.total - self.failures
    }

    /// Rounded percentage of counted records that completed; 0 when none were counted
    pub fn efficiency(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        (self.successes() as f64 * 100.0 / self.total as f64).round() as u32
    }

    /// Distinct pipeline ids in first-use order, e.g. `JSON_001 -> CSV_001`
    pub fn lineage_report(&self) -> String {
        let mut seen: Vec<&str> = Vec::new();
        for id in &self.lineage {
            if !seen.contains(&id.as_str()) {
                seen.push(id);
            }
        }
        seen.join(" -> ")
    }
}

/// Outcome of one `process_data` call
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub outputs: Vec<String>,
    pub failures: usize,
    pub skipped: usize,
    pub elapsed: Duration,
}

/// Owns one pipeline per encoding and the shared context
#[derive(Debug)]
pub struct PipelineManager {
    pipelines: Vec<Pipeline>,
    context: PipelineContext,
}

impl PipelineManager {
    /// Encoded, structured and positional pipelines built from `config`
    pub fn new(config: &PipelineConfig) -> Self {
        Self::with_pipelines(vec![
            Pipeline::standard(config.encoded_id.clone(), Encoding::Encoded, config),
            Pipeline::standard(config.structured_id.clone(), Encoding::Structured, config),
            Pipeline::standard(config.positional_id.clone(), Encoding::Positional, config),
        ])
    }

    pub fn with_pipelines(pipelines: Vec<Pipeline>) -> Self {
        Self {
            pipelines,
            context: PipelineContext::default(),
        }
    }

    pub fn add_pipeline(&mut self, pipeline: Pipeline) {
        self.pipelines.push(pipeline);
    }

    pub fn pipelines(&self) -> &[Pipeline] {
        &self.pipelines
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    pub fn efficiency(&self) -> u32 {
        self.context.efficiency()
    }

    fn select(&self, record: &RawRecord) -> Option<&Pipeline> {
        let encoding = Encoding::detect(record)?;
        self.pipelines.iter().find(|p| p.encoding() == encoding)
    }

    /// Route every record to its pipeline, recovering from per-record failures
    #[instrument(skip_all, fields(records = batch.len()))]
    pub fn process_data(&mut self, batch: &[RawRecord]) -> BatchReport {
        let started = Instant::now();
        let mut report = BatchReport::default();

        for (index, record) in batch.iter().enumerate() {
            let Some(pipeline) = self.select(record) else {
                warn!("No pipeline accepts {} record {}; skipping", record.shape(), index);
                report.skipped += 1;
                continue;
            };
            let pipeline_id = pipeline.id().to_string();

            let result = pipeline.process(record.clone());
            self.context.total += 1;
            self.context.lineage.push(pipeline_id.clone());

            match result {
                Ok(output) => {
                    PipelineMetrics::record_success(&pipeline_id);
                    report.outputs.push(output);
                }
                Err(e) => {
                    self.recover(pipeline_id, index, e);
                    report.failures += 1;
                }
            }
        }

        report.elapsed = started.elapsed();
        self.context.elapsed += report.elapsed;
        PipelineMetrics::record_skipped(report.skipped);
        PipelineMetrics::record_batch(report.elapsed.as_secs_f64(), self.context.efficiency());
        info!(
            "Processed {} records ({} failed, {} skipped), efficiency {}%",
            batch.len() - report.skipped,
            report.failures,
            report.skipped,
            self.context.efficiency()
        );
        report
    }

    fn recover(&mut self, pipeline_id: String, record_index: usize, error: NexusError) {
        let error_type = error.kind();
        warn!(
            "Record {} failed in {}: {}; recovery initiated, continuing with next record",
            record_index, pipeline_id, error
        );
        PipelineMetrics::record_failure(&pipeline_id, error_type);
        self.context.failures += 1;
        self.context.recovery_log.push(RecoveryEntry {
            pipeline_id,
            record_index,
            error_type,
            message: error.to_string(),
            recovered_at: Utc::now(),
        });
    }
}

impl Default for PipelineManager {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Scalar;

    #[test]
    fn test_efficiency_is_zero_without_records() {
        let manager = PipelineManager::default();
        assert_eq!(manager.efficiency(), 0);
        assert_eq!(manager.context().lineage_report(), "");
    }

    #[test]
    fn test_efficiency_rounds_success_share() {
        let context = PipelineContext {
            total: 3,
            failures: 1,
            ..Default::default()
        };
        assert_eq!(context.efficiency(), 67);
    }

    #[test]
    fn test_failure_is_recovered_and_batch_continues() {
        let mut manager = PipelineManager::default();
        let batch = vec![
            RawRecord::text(r#"{"sensor":"temp","value":23.5}"#),
            RawRecord::text(r#"{"sensor":"temp","value":"#),
            RawRecord::text("alice,login,1"),
        ];

        let report = manager.process_data(&batch);
        assert_eq!(report.outputs.len(), 2);
        assert_eq!(report.failures, 1);

        let context = manager.context();
        assert_eq!(context.total, 3);
        assert_eq!(context.failures, 1);
        assert_eq!(context.recovery_log.len(), 1);
        assert_eq!(context.recovery_log[0].record_index, 1);
        assert_eq!(context.recovery_log[0].error_type, "format");
        assert_eq!(context.recovery_log[0].pipeline_id, "JSON_001");
        assert_eq!(manager.efficiency(), 67);
    }

    #[test]
    fn test_overflowing_stream_is_recovered() {
        let mut manager = PipelineManager::default();
        let report = manager.process_data(&[
            RawRecord::sequence([i64::MAX, 1]),
            RawRecord::text("temp:22"),
        ]);

        assert_eq!(report.outputs, vec!["Processed temp reading: 22°C (Normal range)"]);
        let context = manager.context();
        assert_eq!(context.total, 2);
        assert_eq!(context.failures, 1);
        assert_eq!(context.recovery_log[0].pipeline_id, "STREAM_001");
        assert_eq!(context.recovery_log[0].error_type, "domain");
    }

    #[test]
    fn test_unroutable_records_are_skipped_uncounted() {
        let mut manager = PipelineManager::default();
        let report = manager.process_data(&[
            RawRecord::text("plain"),
            RawRecord::Scalar(Scalar::Int(4)),
            RawRecord::sequence([1, 2, 3]),
        ]);

        assert_eq!(report.skipped, 2);
        assert_eq!(manager.context().total, 1);
        assert_eq!(manager.efficiency(), 100);
    }

    #[test]
    fn test_lineage_follows_pipeline_usage() {
        let mut manager = PipelineManager::default();
        manager.process_data(&[
            RawRecord::text("temp:22"),
            RawRecord::text("bob,buy,2"),
            RawRecord::sequence([1, 2]),
            RawRecord::text("temp:25"),
        ]);

        let context = manager.context();
        assert_eq!(context.lineage.len(), 4);
        assert_eq!(context.lineage_report(), "JSON_001 -> CSV_001 -> STREAM_001");
    }

    #[test]
    fn test_elapsed_accumulates_across_calls() {
        let mut manager = PipelineManager::default();
        let first = manager.process_data(&[RawRecord::text("temp:22")]);
        let second = manager.process_data(&[RawRecord::text("temp:40")]);
        assert_eq!(manager.context().elapsed, first.elapsed + second.elapsed);
        assert_eq!(manager.context().total, 2);
    }
}
