use super::{running_average, Criterion, StreamPolicy};
use crate::error::NexusError;
use crate::types::{RawRecord, StreamKind};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// A validated sequence of signed operations; negatives are buys, positives sells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionBatch(pub Vec<i64>);

impl fmt::Display for TransactionBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransactionTotals {
    pub operations: u64,
    pub buy_sum: i64,
    pub buy_count: u64,
    pub sell_sum: i64,
    pub sell_count: u64,
    /// Net flow of the most recent `process_batch` call
    pub last_net_flow: i64,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TransactionPolicy;

impl StreamPolicy for TransactionPolicy {
    type Item = TransactionBatch;
    type Totals = TransactionTotals;

    fn kind(&self) -> StreamKind {
        StreamKind::Transaction
    }

    fn validate(&self, record: &RawRecord) -> Result<TransactionBatch, NexusError> {
        let values = match record {
            RawRecord::Sequence(values) | RawRecord::Tuple(values) if !values.is_empty() => values,
            other => {
                return Err(NexusError::ElementValidation(format!(
                    "transactions must be a non-empty sequence, got {}",
                    other.shape()
                )))
            }
        };

        values
            .iter()
            .map(|v| {
                v.as_int().ok_or_else(|| {
                    NexusError::ElementValidation(format!("transaction {v} is not an integer"))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(TransactionBatch)
    }

    fn partition(
        &self,
        item: TransactionBatch,
        criterion: &Criterion,
    ) -> (Option<TransactionBatch>, Option<TransactionBatch>) {
        let (keep, drop): (Vec<i64>, Vec<i64>) =
            item.0.into_iter().partition(|v| criterion.matches(*v as f64));
        (
            (!keep.is_empty()).then_some(TransactionBatch(keep)),
            (!drop.is_empty()).then_some(TransactionBatch(drop)),
        )
    }

    fn aggregate(&self, totals: &mut TransactionTotals, batch: &[TransactionBatch]) -> String {
        let mut operations = 0u64;
        let mut net_flow = 0i64;

        for item in batch {
            let mut staged = totals.clone();
            match apply(&mut staged, item).and_then(|flow| net_flow.checked_add(flow)) {
                Some(flow) => {
                    *totals = staged;
                    net_flow = flow;
                    operations += item.0.len() as u64;
                }
                None => warn!("Dropping transaction batch {}: totals would overflow", item),
            }
        }
        totals.last_net_flow = net_flow;

        format!("Transaction analysis: {operations} operations, net flow: {net_flow:+} units")
    }

    fn snapshot(&self, totals: &TransactionTotals) -> (u64, BTreeMap<String, f64>) {
        let metrics = BTreeMap::from([
            ("buys".to_string(), totals.buy_count as f64),
            ("sells".to_string(), totals.sell_count as f64),
            (
                "avg_buy".to_string(),
                running_average(totals.buy_sum as f64, totals.buy_count),
            ),
            (
                "avg_sell".to_string(),
                running_average(totals.sell_sum as f64, totals.sell_count),
            ),
            ("net_flow".to_string(), totals.last_net_flow as f64),
        ]);
        (totals.operations, metrics)
    }
}

/// Fold one batch into `totals`, returning its net flow; `None` on overflow
fn apply(totals: &mut TransactionTotals, batch: &TransactionBatch) -> Option<i64> {
    let mut net_flow = 0i64;
    for &value in &batch.0 {
        net_flow = net_flow.checked_add(value)?;
        if value < 0 {
            totals.buy_sum = totals.buy_sum.checked_add(value)?;
            totals.buy_count += 1;
        } else if value > 0 {
            totals.sell_sum = totals.sell_sum.checked_add(value)?;
            totals.sell_count += 1;
        }
        totals.operations += 1;
    }
    Some(net_flow)
}
