use super::{Canonical, Payload, Stage, StageRole};
use crate::error::{NexusError, Result};
use crate::types::{RawRecord, Scalar};
use std::collections::BTreeMap;
use tracing::debug;

/// Parses raw records into one of the canonical shapes
#[derive(Debug, Clone)]
pub struct InputStage {
    structured_fields: usize,
}

impl InputStage {
    pub fn new(structured_fields: usize) -> Self {
        Self { structured_fields }
    }

    fn parse_encoded(&self, data: &str) -> Result<Canonical> {
        if data.trim_start().starts_with('{') {
            return parse_json_object(data);
        }

        match data.split_once(':') {
            Some((sensor, value)) if !sensor.trim().is_empty() && !value.trim().is_empty() => {
                Ok(Canonical::Sensor {
                    sensor: sensor.trim().to_string(),
                    value: Scalar::Text(value.trim().to_string()),
                })
            }
            _ => Err(NexusError::Format(format!(
                "'{data}' is not a two-field 'key:value' encoding"
            ))),
        }
    }

    fn parse_delimited(&self, data: &str) -> Result<Canonical> {
        let fields: Vec<&str> = data.split(',').map(str::trim).collect();
        if fields.len() != self.structured_fields {
            return Err(NexusError::Format(format!(
                "expected {} comma-separated fields, found {}",
                self.structured_fields,
                fields.len()
            )));
        }
        let field = |i: usize| fields.get(i).map(|s| s.to_string()).unwrap_or_default();

        Ok(Canonical::Structured {
            user: field(0),
            action: field(1),
            number: field(2),
        })
    }
}

impl Default for InputStage {
    fn default() -> Self {
        Self::new(crate::constants::STRUCTURED_FIELD_COUNT)
    }
}

impl Stage for InputStage {
    fn role(&self) -> StageRole {
        StageRole::Input
    }

    fn process(&self, payload: Payload) -> Result<Payload> {
        let record = match payload {
            Payload::Raw(record) => record,
            other => {
                return Err(NexusError::Stage(format!(
                    "input stage expects a raw record, got {}",
                    other.variant()
                )))
            }
        };
        debug!("Input: {:?}", record);

        let canonical = match record {
            RawRecord::Text(data) if data.contains(':') => self.parse_encoded(&data)?,
            RawRecord::Text(data) if data.contains(',') => self.parse_delimited(&data)?,
            RawRecord::Tuple(values) | RawRecord::Sequence(values) => {
                Canonical::Positional(values.into_iter().enumerate().collect())
            }
            RawRecord::Mapping(map) => {
                Canonical::Positional(map.into_values().enumerate().collect())
            }
            other => {
                return Err(NexusError::Stage(format!(
                    "input stage cannot parse a {} record",
                    other.shape()
                )))
            }
        };

        Ok(Payload::Parsed(canonical))
    }
}

fn parse_json_object(data: &str) -> Result<Canonical> {
    let value: serde_json::Value = serde_json::from_str(data)
        .map_err(|e| NexusError::Format(format!("invalid JSON record: {e}")))?;
    let obj = value
        .as_object()
        .ok_or_else(|| NexusError::Format("JSON record must be an object".to_string()))?;

    let text = |key: &str| -> Option<String> {
        obj.get(key).and_then(|v| match v {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    };

    if let Some(sensor) = text("sensor") {
        let value = match obj.get("value") {
            Some(serde_json::Value::Number(n)) => match n.as_i64() {
                Some(i) => Scalar::Int(i),
                None => Scalar::Real(n.as_f64().unwrap_or(f64::NAN)),
            },
            Some(serde_json::Value::String(s)) => Scalar::Text(s.clone()),
            _ => {
                return Err(NexusError::Format(format!(
                    "sensor '{sensor}' record has no usable value"
                )))
            }
        };
        return Ok(Canonical::Sensor { sensor, value });
    }

    match (text("user"), text("action")) {
        (Some(user), Some(action)) => Ok(Canonical::Structured {
            user,
            action,
            number: text("number").unwrap_or_default(),
        }),
        _ => Err(NexusError::Format(
            "JSON record has neither sensor nor user/action fields".to_string(),
        )),
    }
}
