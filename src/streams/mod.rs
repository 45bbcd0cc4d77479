//! Typed streams: classification, validation/filtering and running aggregation
//!
//! Every stream kind shares one control flow, [`Stream`], parameterized by a
//! [`StreamPolicy`] that supplies the element check, the criterion split and the
//! aggregation for that kind. State lives for as long as the `Stream` does and is
//! never reset between batches.

pub mod classifier;
pub mod criterion;
pub mod dispatcher;
pub mod event;
pub mod sensor;
pub mod transaction;

pub use classifier::classify;
pub use criterion::{Comparison, Criterion};
pub use dispatcher::{Criteria, DispatchReport, StreamDispatcher};
pub use event::{EventBatch, EventPolicy};
pub use sensor::{SensorPolicy, SensorReading};
pub use transaction::{TransactionBatch, TransactionPolicy};

use crate::error::NexusError;
use crate::metrics::StreamMetrics;
use crate::types::{RawRecord, StreamKind};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

/// Per-kind behaviour plugged into the generic [`Stream`]
pub trait StreamPolicy {
    /// Validated element type
    type Item: Clone + fmt::Debug + fmt::Display;
    /// Running totals owned by the stream
    type Totals: Default + fmt::Debug;

    fn kind(&self) -> StreamKind;

    /// Shape and type check for a single element
    fn validate(&self, record: &RawRecord) -> Result<Self::Item, NexusError>;

    /// Split an element into the part that satisfies the criterion and the part that does not
    fn partition(
        &self,
        item: Self::Item,
        criterion: &Criterion,
    ) -> (Option<Self::Item>, Option<Self::Item>);

    /// Fold accepted elements into the totals and summarize this call
    fn aggregate(&self, totals: &mut Self::Totals, batch: &[Self::Item]) -> String;

    /// Operation count and named metrics derived from the totals
    fn snapshot(&self, totals: &Self::Totals) -> (u64, BTreeMap<String, f64>);
}

/// Result of one filter call
#[derive(Debug)]
pub struct FilterOutcome<T> {
    pub accepted: Vec<T>,
    /// Elements (or element parts) that failed the criterion
    pub rejected: Vec<T>,
    /// Elements dropped for failing shape validation
    pub invalid: usize,
    /// Element validation and criterion format errors raised during the call
    pub errors: Vec<NexusError>,
}

/// Point-in-time view of a stream's running state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamStats {
    pub kind: StreamKind,
    pub count: u64,
    pub metrics: BTreeMap<String, f64>,
    /// Rejected-by-criterion elements from the most recent filter call
    pub rejected: Vec<String>,
}

impl fmt::Display for StreamStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: count={}", self.kind, self.count)?;
        for (name, value) in &self.metrics {
            write!(f, ", {name}={value}")?;
        }
        if !self.rejected.is_empty() {
            write!(f, ", rejected=[{}]", self.rejected.join(", "))?;
        }
        Ok(())
    }
}

/// A persistent aggregation context for one stream kind
#[derive(Debug)]
pub struct Stream<P: StreamPolicy> {
    policy: P,
    totals: P::Totals,
    rejected: Vec<P::Item>,
}

impl<P: StreamPolicy> Stream<P> {
    pub fn new(policy: P) -> Self {
        Self {
            policy,
            totals: P::Totals::default(),
            rejected: Vec::new(),
        }
    }

    pub fn kind(&self) -> StreamKind {
        self.policy.kind()
    }

    pub fn totals(&self) -> &P::Totals {
        &self.totals
    }

    /// Validate every element, then apply the optional criterion token.
    ///
    /// Invalid elements and malformed criteria are reported in the outcome and
    /// never abort the call. The rejected log is replaced on every call.
    pub fn filter(&mut self, batch: &[RawRecord], criterion: Option<&str>) -> FilterOutcome<P::Item> {
        let kind = self.kind();
        let mut errors = Vec::new();
        let mut valid = Vec::with_capacity(batch.len());

        for record in batch {
            match self.policy.validate(record) {
                Ok(item) => valid.push(item),
                Err(e) => {
                    warn!("Dropping {} element: {}", kind, e);
                    errors.push(e);
                }
            }
        }
        let invalid = batch.len() - valid.len();

        let criterion = match criterion.map(str::parse::<Criterion>) {
            Some(Ok(c)) => Some(c),
            Some(Err(e)) => {
                warn!("Ignoring {} criterion: {}", kind, e);
                StreamMetrics::record_criterion_error(kind);
                errors.push(e);
                None
            }
            None => None,
        };

        let (accepted, rejected) = match criterion {
            Some(c) => {
                let mut accepted = Vec::new();
                let mut rejected = Vec::new();
                for item in valid {
                    let (keep, drop) = self.policy.partition(item, &c);
                    accepted.extend(keep);
                    rejected.extend(drop);
                }
                (accepted, rejected)
            }
            None => (valid, Vec::new()),
        };

        debug!(
            "{} filter: accepted={} rejected={} invalid={}",
            kind,
            accepted.len(),
            rejected.len(),
            invalid
        );
        StreamMetrics::record_filter(kind, accepted.len(), rejected.len(), invalid);
        self.rejected = rejected.clone();

        FilterOutcome {
            accepted,
            rejected,
            invalid,
            errors,
        }
    }

    /// Fold accepted elements into the running state and return a summary line
    pub fn process_batch(&mut self, accepted: &[P::Item]) -> String {
        let summary = self.policy.aggregate(&mut self.totals, accepted);
        StreamMetrics::record_aggregate(self.kind(), accepted.len());
        summary
    }

    pub fn stats(&self) -> StreamStats {
        let (count, metrics) = self.policy.snapshot(&self.totals);
        StreamStats {
            kind: self.kind(),
            count,
            metrics,
            rejected: self.rejected.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Average rounded to two decimals; zero when nothing has been counted
pub(crate) fn running_average(sum: f64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        round2(sum / count as f64)
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_average_is_zero_without_samples() {
        assert_eq!(running_average(0.0, 0), 0.0);
        assert_eq!(running_average(10.0, 3), 3.33);
    }

    #[test]
    fn test_rejected_log_is_replaced_each_call() {
        let mut stream = Stream::new(SensorPolicy);
        let batch = vec![
            RawRecord::tuple([31.0, 1.0, 1.0]),
            RawRecord::tuple([29.0, 1.0, 1.0]),
        ];

        stream.filter(&batch, Some(">30"));
        assert_eq!(stream.stats().rejected, vec!["(29.0, 1.0, 1.0)".to_string()]);

        stream.filter(&batch, None);
        assert!(stream.stats().rejected.is_empty());
    }

    #[test]
    fn test_malformed_criterion_falls_back_to_no_filter() {
        let mut stream = Stream::new(SensorPolicy);
        let batch = vec![
            RawRecord::tuple([31.0, 1.0, 1.0]),
            RawRecord::tuple([29.0, 1.0, 1.0]),
        ];

        let outcome = stream.filter(&batch, Some("=30"));
        assert_eq!(outcome.accepted.len(), 2);
        assert!(outcome.rejected.is_empty());
        assert!(matches!(outcome.errors.as_slice(), [NexusError::Format(_)]));
    }

    #[test]
    fn test_stats_display_lists_metrics() {
        let mut stream = Stream::new(SensorPolicy);
        let outcome = stream.filter(&[RawRecord::tuple([22.0, 40.0, 1000.0])], None);
        stream.process_batch(&outcome.accepted);

        let rendered = stream.stats().to_string();
        assert!(rendered.starts_with("sensor: count=1"));
        assert!(rendered.contains("avg_temperature=22"));
    }
}
