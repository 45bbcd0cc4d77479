use crate::error::NexusError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

static CRITERION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([<>])\s*([-+]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][-+]?\d+)?)\s*$")
        .expect("criterion pattern compiles")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Comparison {
    GreaterThan,
    LessThan,
}

/// Inequality filter parsed from tokens like `">30"` or `"<-2.5"`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Criterion {
    pub comparison: Comparison,
    pub threshold: f64,
}

impl Criterion {
    pub fn new(comparison: Comparison, threshold: f64) -> Self {
        Self {
            comparison,
            threshold,
        }
    }

    pub fn matches(&self, value: f64) -> bool {
        match self.comparison {
            Comparison::GreaterThan => value > self.threshold,
            Comparison::LessThan => value < self.threshold,
        }
    }
}

impl FromStr for Criterion {
    type Err = NexusError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let caps = CRITERION_RE.captures(token).ok_or_else(|| {
            NexusError::Format(format!(
                "criterion '{token}' must be '>' or '<' followed by a number"
            ))
        })?;

        let comparison = match &caps[1] {
            ">" => Comparison::GreaterThan,
            _ => Comparison::LessThan,
        };
        let threshold = caps[2]
            .parse::<f64>()
            .map_err(|e| NexusError::Format(format!("criterion '{token}': {e}")))?;

        Ok(Self::new(comparison, threshold))
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.comparison {
            Comparison::GreaterThan => '>',
            Comparison::LessThan => '<',
        };
        write!(f, "{op}{}", self.threshold)
    }
}
