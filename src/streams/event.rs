use super::{Criterion, StreamPolicy};
use crate::config::StreamsConfig;
use crate::error::NexusError;
use crate::types::{RawRecord, StreamKind};
use std::collections::BTreeMap;
use std::fmt;

/// A validated sequence of event tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBatch(pub Vec<String>);

impl fmt::Display for EventBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EventTotals {
    pub events: u64,
    pub logins: u64,
    pub logouts: u64,
    pub errors: u64,
}

/// Tallies login/logout/error tokens by exact match; other tokens are counted
/// as processed events only.
#[derive(Debug, Clone)]
pub struct EventPolicy {
    login: String,
    logout: String,
    error: String,
}

impl EventPolicy {
    pub fn from_config(config: &StreamsConfig) -> Self {
        Self {
            login: config.login_token.clone(),
            logout: config.logout_token.clone(),
            error: config.error_token.clone(),
        }
    }
}

impl Default for EventPolicy {
    fn default() -> Self {
        Self::from_config(&StreamsConfig::default())
    }
}

impl StreamPolicy for EventPolicy {
    type Item = EventBatch;
    type Totals = EventTotals;

    fn kind(&self) -> StreamKind {
        StreamKind::Event
    }

    fn validate(&self, record: &RawRecord) -> Result<EventBatch, NexusError> {
        let values = match record {
            RawRecord::Sequence(values) | RawRecord::Tuple(values) if !values.is_empty() => values,
            other => {
                return Err(NexusError::ElementValidation(format!(
                    "events must be a non-empty sequence, got {}",
                    other.shape()
                )))
            }
        };

        values
            .iter()
            .map(|v| {
                v.as_text().map(str::to_string).ok_or_else(|| {
                    NexusError::ElementValidation(format!("event {v} is not a text token"))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(EventBatch)
    }

    /// Compares the character length of each token against the threshold
    fn partition(
        &self,
        item: EventBatch,
        criterion: &Criterion,
    ) -> (Option<EventBatch>, Option<EventBatch>) {
        let (keep, drop): (Vec<String>, Vec<String>) = item
            .0
            .into_iter()
            .partition(|token| criterion.matches(token.chars().count() as f64));
        (
            (!keep.is_empty()).then_some(EventBatch(keep)),
            (!drop.is_empty()).then_some(EventBatch(drop)),
        )
    }

    fn aggregate(&self, totals: &mut EventTotals, batch: &[EventBatch]) -> String {
        let mut events = 0u64;
        let mut errors = 0u64;

        for token in batch.iter().flat_map(|b| b.0.iter()) {
            events += 1;
            if *token == self.login {
                totals.logins += 1;
            } else if *token == self.logout {
                totals.logouts += 1;
            } else if *token == self.error {
                totals.errors += 1;
                errors += 1;
            }
        }
        totals.events += events;

        format!("Event analysis: {events} events, {errors} error(s) detected")
    }

    fn snapshot(&self, totals: &EventTotals) -> (u64, BTreeMap<String, f64>) {
        let metrics = BTreeMap::from([
            ("logins".to_string(), totals.logins as f64),
            ("logouts".to_string(), totals.logouts as f64),
            ("error_events".to_string(), totals.errors as f64),
        ]);
        (totals.events, metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streams::Stream;
    use crate::types::Scalar;

    #[test]
    fn test_counts_known_tokens_and_ignores_others() {
        let mut stream = Stream::new(EventPolicy::default());
        let outcome = stream.filter(
            &[RawRecord::sequence(["login", "error", "logout", "heartbeat", "error"])],
            None,
        );
        let summary = stream.process_batch(&outcome.accepted);

        assert_eq!(summary, "Event analysis: 5 events, 2 error(s) detected");
        let totals = stream.totals();
        assert_eq!(totals.events, 5);
        assert_eq!((totals.logins, totals.logouts, totals.errors), (1, 1, 2));
    }

    #[test]
    fn test_matching_is_exact() {
        let mut stream = Stream::new(EventPolicy::default());
        let outcome = stream.filter(&[RawRecord::sequence(["Login", "ERROR", "login "])], None);
        stream.process_batch(&outcome.accepted);
        assert_eq!(stream.stats().metrics["logins"], 0.0);
        assert_eq!(stream.stats().metrics["error_events"], 0.0);
        assert_eq!(stream.stats().count, 3);
    }

    #[test]
    fn test_totals_accumulate_across_calls() {
        let mut stream = Stream::new(EventPolicy::default());
        for _ in 0..2 {
            let outcome = stream.filter(&[RawRecord::sequence(["login", "logout"])], None);
            stream.process_batch(&outcome.accepted);
        }
        let stats = stream.stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.metrics["logins"], 2.0);
    }

    #[test]
    fn test_criterion_uses_token_length() {
        let mut stream = Stream::new(EventPolicy::default());
        let outcome = stream.filter(&[RawRecord::sequence(["login", "error", "logout"])], Some(">5"));
        assert_eq!(outcome.accepted, vec![EventBatch(vec!["logout".to_string()])]);
        assert_eq!(
            outcome.rejected,
            vec![EventBatch(vec!["login".to_string(), "error".to_string()])]
        );
    }

    #[test]
    fn test_mixed_token_types_are_invalid() {
        let mut stream = Stream::new(EventPolicy::default());
        let outcome = stream.filter(
            &[RawRecord::Sequence(vec![Scalar::Text("login".into()), Scalar::Int(3)])],
            None,
        );
        assert!(outcome.accepted.is_empty());
        assert_eq!(outcome.invalid, 1);
    }
}
