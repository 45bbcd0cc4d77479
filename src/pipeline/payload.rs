use crate::types::{RawRecord, Scalar};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Value handed from one stage to the next
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Payload {
    /// Untouched input, consumed by the input stage
    Raw(RawRecord),
    /// Canonical shape produced by the input stage
    Parsed(Canonical),
    /// Enriched shape produced by the transform stage
    Transformed(Transformed),
    /// Final human-readable summary produced by the output stage
    Rendered(String),
}

impl Payload {
    pub fn variant(&self) -> &'static str {
        match self {
            Payload::Raw(_) => "raw",
            Payload::Parsed(_) => "parsed",
            Payload::Transformed(_) => "transformed",
            Payload::Rendered(_) => "rendered",
        }
    }
}

/// Intermediate representation, keyed by which input encoding produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Canonical {
    /// `{"sensor": .., "value": ..}` or `sensor:value`
    Sensor { sensor: String, value: Scalar },
    /// `user,action,number`
    Structured {
        user: String,
        action: String,
        number: String,
    },
    /// index -> value for any finite iterable
    Positional(BTreeMap<usize, Scalar>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RangeStatus {
    Normal,
    Critical,
}

impl fmt::Display for RangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeStatus::Normal => f.write_str("Normal"),
            RangeStatus::Critical => f.write_str("Critical"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Transformed {
    Reading {
        sensor: String,
        value: f64,
        status: RangeStatus,
    },
    Activity {
        user: String,
        action: String,
    },
    Summary {
        count: usize,
        average: f64,
    },
}
