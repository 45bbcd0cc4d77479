//! Single-record processors for numeric, text and log data
//!
//! Each processor validates a raw record against its own contract, summarizes
//! it, and formats the summary for display.

use crate::error::{NexusError, Result};
use crate::types::{RawRecord, Scalar};

pub trait DataProcessor {
    fn name(&self) -> &'static str;

    /// Check that the record matches what this processor understands
    fn validate(&self, data: &RawRecord) -> Result<()>;

    /// Summarize a validated record
    fn process(&self, data: &RawRecord) -> Result<String>;

    fn format_output(&self, result: &str) -> String {
        format!("Processed {result}")
    }
}

/// Validate, process and format one record
pub fn run_processor(processor: &dyn DataProcessor, data: &RawRecord) -> Result<String> {
    processor.validate(data)?;
    let result = processor.process(data)?;
    Ok(processor.format_output(&result))
}

/// Values of a single primitive, a sequence or a mapping; empty collections are rejected
fn collect_values<'a>(data: &'a RawRecord, what: &str) -> Result<Vec<&'a Scalar>> {
    let values: Vec<&Scalar> = match data {
        RawRecord::Scalar(s) => vec![s],
        RawRecord::Sequence(values) | RawRecord::Tuple(values) => values.iter().collect(),
        RawRecord::Mapping(map) => map.values().collect(),
        RawRecord::Text(_) => {
            return Err(NexusError::ElementValidation(format!(
                "{what} data cannot be an encoded string"
            )))
        }
    };
    if values.is_empty() {
        return Err(NexusError::ElementValidation(format!(
            "{what} data must have at least one value"
        )));
    }
    Ok(values)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NumericProcessor;

impl NumericProcessor {
    fn integers(data: &RawRecord) -> Result<Vec<i64>> {
        collect_values(data, "numeric")?
            .into_iter()
            .map(|v| {
                v.as_int().ok_or_else(|| {
                    NexusError::ElementValidation(format!("numeric value {v} must be an integer"))
                })
            })
            .collect()
    }
}

impl DataProcessor for NumericProcessor {
    fn name(&self) -> &'static str {
        "numeric"
    }

    fn validate(&self, data: &RawRecord) -> Result<()> {
        Self::integers(data).map(|_| ())
    }

    fn process(&self, data: &RawRecord) -> Result<String> {
        let values = Self::integers(data)?;
        let sum = values
            .iter()
            .try_fold(0i64, |acc, v| acc.checked_add(*v))
            .ok_or_else(|| {
                NexusError::Domain(format!(
                    "sum of {} numeric values overflows a 64-bit integer",
                    values.len()
                ))
            })?;
        Ok(format!(
            "{} numeric value(s), sum={}, avg={:.2}",
            values.len(),
            sum,
            sum as f64 / values.len() as f64
        ))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextProcessor;

impl TextProcessor {
    fn texts(data: &RawRecord) -> Result<Vec<&str>> {
        if let RawRecord::Text(s) = data {
            return Ok(vec![s.as_str()]);
        }
        collect_values(data, "text")?
            .into_iter()
            .map(|v| {
                v.as_text().ok_or_else(|| {
                    NexusError::ElementValidation(format!("text value {v} must be a string"))
                })
            })
            .collect()
    }
}

impl DataProcessor for TextProcessor {
    fn name(&self) -> &'static str {
        "text"
    }

    fn validate(&self, data: &RawRecord) -> Result<()> {
        Self::texts(data).map(|_| ())
    }

    fn process(&self, data: &RawRecord) -> Result<String> {
        let texts = Self::texts(data)?;
        let chars: usize = texts.iter().map(|t| t.chars().count()).sum();
        let words: usize = texts.iter().map(|t| t.split_whitespace().count()).sum();
        Ok(format!("text: {chars} character(s), {words} words"))
    }
}

/// Log lines of the form `LEVEL: message`
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProcessor;

impl LogProcessor {
    fn split(data: &RawRecord) -> Result<(&str, &str)> {
        let line = match data {
            RawRecord::Text(s) => s.as_str(),
            other => {
                return Err(NexusError::ElementValidation(format!(
                    "log data must be a string, got {}",
                    other.shape()
                )))
            }
        };
        let (level, message) = line.split_once(':').ok_or_else(|| {
            NexusError::Format("log data must have '<LEVEL>: <message>' format".to_string())
        })?;
        let level = level.trim();
        if level.is_empty() || !level.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(NexusError::Format(format!(
                "log level '{level}' must be uppercase"
            )));
        }
        Ok((level, message.trim()))
    }
}

impl DataProcessor for LogProcessor {
    fn name(&self) -> &'static str {
        "log"
    }

    fn validate(&self, data: &RawRecord) -> Result<()> {
        Self::split(data).map(|_| ())
    }

    fn process(&self, data: &RawRecord) -> Result<String> {
        let (level, message) = Self::split(data)?;
        Ok(format!("{level}: {message}"))
    }

    fn format_output(&self, result: &str) -> String {
        let (level, message) = result.split_once(':').unwrap_or((result, ""));
        let message = message.trim();
        if level == "ERROR" {
            format!("[ALERT] ERROR level detected: {message}")
        } else {
            format!("[{level}] {level} level detected: {message}")
        }
    }
}
