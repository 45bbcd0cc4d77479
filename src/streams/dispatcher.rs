use super::{classify, EventPolicy, SensorPolicy, Stream, StreamPolicy, StreamStats, TransactionPolicy};
use crate::config::StreamsConfig;
use crate::error::Result;
use crate::metrics::StreamMetrics;
use crate::types::{RawRecord, StreamKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, instrument, warn};

/// Optional criterion token per stream kind, e.g. `">30"`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Criteria {
    pub sensor: Option<String>,
    pub transaction: Option<String>,
    pub event: Option<String>,
}

impl Criteria {
    pub fn for_kind(&self, kind: StreamKind) -> Option<&str> {
        match kind {
            StreamKind::Sensor => self.sensor.as_deref(),
            StreamKind::Transaction => self.transaction.as_deref(),
            StreamKind::Event => self.event.as_deref(),
        }
    }
}

/// Combined result of one dispatch call
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    /// Aggregation summary for every kind present in the batch
    pub summaries: Vec<(StreamKind, String)>,
    /// Latest snapshot of all three streams
    pub stats: Vec<StreamStats>,
    /// Element validation and criterion problems, already recovered from
    pub issues: Vec<String>,
}

impl fmt::Display for DispatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (kind, summary) in &self.summaries {
            writeln!(f, "- {kind}: {summary}")?;
        }
        writeln!(f, "Stream statistics:")?;
        for stats in &self.stats {
            writeln!(f, "  {stats}")?;
        }
        for issue in &self.issues {
            writeln!(f, "  ! {issue}")?;
        }
        Ok(())
    }
}

/// Owns one stream per kind and routes mixed batches into them
#[derive(Debug)]
pub struct StreamDispatcher {
    sensor: Stream<SensorPolicy>,
    transaction: Stream<TransactionPolicy>,
    event: Stream<EventPolicy>,
}

impl StreamDispatcher {
    pub fn new(config: &StreamsConfig) -> Self {
        Self {
            sensor: Stream::new(SensorPolicy),
            transaction: Stream::new(TransactionPolicy),
            event: Stream::new(EventPolicy::from_config(config)),
        }
    }

    /// Classify every record, then filter and aggregate each kind present.
    ///
    /// A record that cannot be classified fails the whole call before any
    /// stream state is touched; element-level problems are reported in
    /// [`DispatchReport::issues`] instead.
    #[instrument(skip_all, fields(records = batch.len()))]
    pub fn dispatch(&mut self, batch: &[RawRecord], criteria: &Criteria) -> Result<DispatchReport> {
        StreamMetrics::record_dispatch(batch.len());

        let mut sensors = Vec::new();
        let mut transactions = Vec::new();
        let mut events = Vec::new();
        for (index, record) in batch.iter().enumerate() {
            let kind = classify(record).map_err(|e| {
                warn!("Record {} could not be classified: {}", index, e);
                StreamMetrics::record_unclassifiable();
                e
            })?;
            match kind {
                StreamKind::Sensor => sensors.push(record.clone()),
                StreamKind::Transaction => transactions.push(record.clone()),
                StreamKind::Event => events.push(record.clone()),
            }
        }

        let mut report = DispatchReport {
            summaries: Vec::new(),
            stats: Vec::new(),
            issues: Vec::new(),
        };
        run_stream(&mut self.sensor, &sensors, criteria, &mut report);
        run_stream(&mut self.transaction, &transactions, criteria, &mut report);
        run_stream(&mut self.event, &events, criteria, &mut report);

        report.stats = self.stats();
        info!(
            "Dispatched {} records into {} streams",
            batch.len(),
            report.summaries.len()
        );
        Ok(report)
    }

    /// Latest snapshot of every stream, in sensor/transaction/event order
    pub fn stats(&self) -> Vec<StreamStats> {
        vec![self.sensor.stats(), self.transaction.stats(), self.event.stats()]
    }

    pub fn stats_for(&self, kind: StreamKind) -> StreamStats {
        match kind {
            StreamKind::Sensor => self.sensor.stats(),
            StreamKind::Transaction => self.transaction.stats(),
            StreamKind::Event => self.event.stats(),
        }
    }
}

impl Default for StreamDispatcher {
    fn default() -> Self {
        Self::new(&StreamsConfig::default())
    }
}

fn run_stream<P: StreamPolicy>(
    stream: &mut Stream<P>,
    records: &[RawRecord],
    criteria: &Criteria,
    report: &mut DispatchReport,
) {
    if records.is_empty() {
        return;
    }
    let kind = stream.kind();
    let outcome = stream.filter(records, criteria.for_kind(kind));
    report
        .issues
        .extend(outcome.errors.iter().map(|e| format!("{kind}: {e}")));
    let summary = stream.process_batch(&outcome.accepted);
    report.summaries.push((kind, summary));
}
