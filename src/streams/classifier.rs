use crate::error::{NexusError, Result};
use crate::types::{RawRecord, Scalar, StreamKind};

/// Map a raw record onto the stream kind that owns it.
///
/// Rules are checked in order: a 3-tuple of numbers is a sensor reading; an
/// ordered sequence starting with an integer is a transaction batch; one
/// starting with text is an event batch. Everything else is unclassifiable.
pub fn classify(record: &RawRecord) -> Result<StreamKind> {
    if let RawRecord::Tuple(values) = record {
        if values.len() == 3 && values.iter().all(|v| v.as_number().is_some()) {
            return Ok(StreamKind::Sensor);
        }
    }

    let values = match record {
        RawRecord::Tuple(values) | RawRecord::Sequence(values) => values,
        other => {
            return Err(NexusError::UnclassifiableRecord(format!(
                "{} records do not belong to any stream",
                other.shape()
            )))
        }
    };

    match values.first() {
        Some(Scalar::Int(_)) => Ok(StreamKind::Transaction),
        Some(Scalar::Text(_)) => Ok(StreamKind::Event),
        Some(first) => Err(NexusError::UnclassifiableRecord(format!(
            "{} starting with {} does not belong to any stream",
            record.shape(),
            first
        ))),
        None => Err(NexusError::UnclassifiableRecord(format!(
            "empty {} does not belong to any stream",
            record.shape()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_numeric_triple_is_sensor() {
        assert_eq!(
            classify(&RawRecord::tuple([22.5, 65.0, 1013.0])).unwrap(),
            StreamKind::Sensor
        );
        assert_eq!(
            classify(&RawRecord::tuple([22, 65, 1013])).unwrap(),
            StreamKind::Sensor
        );
    }

    #[test]
    fn test_sequence_kind_depends_on_first_element() {
        assert_eq!(
            classify(&RawRecord::sequence([10, -5, 20])).unwrap(),
            StreamKind::Transaction
        );
        assert_eq!(
            classify(&RawRecord::sequence(["login", "error"])).unwrap(),
            StreamKind::Event
        );
        // a 3-element sequence is not a sensor tuple
        assert_eq!(
            classify(&RawRecord::sequence([1, 2, 3])).unwrap(),
            StreamKind::Transaction
        );
    }

    #[test]
    fn test_everything_else_is_unclassifiable() {
        let records = vec![
            RawRecord::text("hello"),
            RawRecord::Sequence(Vec::new()),
            RawRecord::sequence([1.5, 2.5]),
            RawRecord::Scalar(Scalar::Int(1)),
            RawRecord::Mapping(BTreeMap::new()),
            RawRecord::tuple([1.0, 2.0]),
        ];

        for record in records {
            assert!(
                matches!(classify(&record), Err(NexusError::UnclassifiableRecord(_))),
                "{record:?} should not classify"
            );
        }
    }
}
