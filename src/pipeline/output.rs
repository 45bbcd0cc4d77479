use super::{Payload, Stage, StageRole, Transformed};
use crate::constants::sensor_unit;
use crate::error::{NexusError, Result};

/// Renders transformed records as one summary line
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputStage;

impl Stage for OutputStage {
    fn role(&self) -> StageRole {
        StageRole::Output
    }

    fn process(&self, payload: Payload) -> Result<Payload> {
        let rendered = match payload {
            Payload::Transformed(Transformed::Reading {
                sensor,
                value,
                status,
            }) => format!(
                "Processed {sensor} reading: {value}{} ({status} range)",
                sensor_unit(&sensor)
            ),
            Payload::Transformed(Transformed::Activity { user, action }) => {
                format!("User activity: {user} performed {action}")
            }
            Payload::Transformed(Transformed::Summary { count, average }) => {
                format!("Stream summary: {count} readings, avg: {average:.2}")
            }
            other => {
                return Err(NexusError::Stage(format!(
                    "output stage expects a transformed record, got {}",
                    other.variant()
                )))
            }
        };
        Ok(Payload::Rendered(rendered))
    }
}
