use super::{Canonical, Payload, RangeStatus, Stage, StageRole, Transformed};
use crate::config::PipelineConfig;
use crate::error::{NexusError, Result};
use crate::streams::round2;
use crate::types::Scalar;
use tracing::debug;

/// Enriches and validates canonical records
#[derive(Debug, Clone)]
pub struct TransformStage {
    normal_min: f64,
    normal_max: f64,
    known_sensors: Vec<String>,
}

impl TransformStage {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            normal_min: config.normal_min,
            normal_max: config.normal_max,
            known_sensors: config.known_sensors.clone(),
        }
    }

    /// Normal when `normal_min <= value < normal_max`
    pub fn status_for(&self, value: f64) -> RangeStatus {
        if value >= self.normal_min && value < self.normal_max {
            RangeStatus::Normal
        } else {
            RangeStatus::Critical
        }
    }

    fn transform_sensor(&self, sensor: String, value: Scalar) -> Result<Transformed> {
        if !self.known_sensors.iter().any(|s| *s == sensor) {
            return Err(NexusError::Domain(format!("unknown sensor type '{sensor}'")));
        }
        let value = match &value {
            Scalar::Text(s) => s.trim().parse::<f64>().ok(),
            other => other.as_number(),
        }
        .filter(|v| v.is_finite())
        .ok_or_else(|| NexusError::Domain(format!("sensor '{sensor}' value {value} is not numeric")))?;

        Ok(Transformed::Reading {
            status: self.status_for(value),
            sensor,
            value,
        })
    }
}

impl Default for TransformStage {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl Stage for TransformStage {
    fn role(&self) -> StageRole {
        StageRole::Transform
    }

    fn process(&self, payload: Payload) -> Result<Payload> {
        let canonical = match payload {
            Payload::Parsed(canonical) => canonical,
            other => {
                return Err(NexusError::Stage(format!(
                    "transform stage expects a parsed record, got {}",
                    other.variant()
                )))
            }
        };

        let transformed = match canonical {
            Canonical::Sensor { sensor, value } => {
                debug!("Transform: enriched {} reading with range status", sensor);
                self.transform_sensor(sensor, value)?
            }
            Canonical::Structured { user, action, .. } => {
                debug!("Transform: projected structured record for {}", user);
                Transformed::Activity { user, action }
            }
            Canonical::Positional(values) => {
                let ints = values
                    .values()
                    .map(|v| {
                        v.as_int().ok_or_else(|| {
                            NexusError::Domain(format!("stream value {v} is not an integer"))
                        })
                    })
                    .collect::<Result<Vec<i64>>>()?;
                if ints.is_empty() {
                    return Err(NexusError::Domain("stream has no values".to_string()));
                }
                let sum = ints
                    .iter()
                    .try_fold(0i64, |acc, v| acc.checked_add(*v))
                    .ok_or_else(|| {
                        NexusError::Domain(format!(
                            "sum of {} stream values overflows a 64-bit integer",
                            ints.len()
                        ))
                    })?;
                debug!("Transform: aggregated {} stream values", ints.len());
                Transformed::Summary {
                    count: ints.len(),
                    average: round2(sum as f64 / ints.len() as f64),
                }
            }
        };

        Ok(Payload::Transformed(transformed))
    }
}
