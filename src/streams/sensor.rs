use super::{running_average, Criterion, StreamPolicy};
use crate::error::NexusError;
use crate::types::{RawRecord, StreamKind};
use std::collections::BTreeMap;
use std::fmt;

/// One validated (temperature, humidity, pressure) triple
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:?}, {:?}, {:?})",
            self.temperature, self.humidity, self.pressure
        )
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SensorTotals {
    pub readings: u64,
    pub temperature_sum: f64,
    pub humidity_sum: f64,
    pub pressure_sum: f64,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SensorPolicy;

impl StreamPolicy for SensorPolicy {
    type Item = SensorReading;
    type Totals = SensorTotals;

    fn kind(&self) -> StreamKind {
        StreamKind::Sensor
    }

    fn validate(&self, record: &RawRecord) -> Result<SensorReading, NexusError> {
        let values = match record {
            RawRecord::Tuple(values) if values.len() == 3 => values,
            other => {
                return Err(NexusError::ElementValidation(format!(
                    "sensor reading must be a 3-tuple, got {}",
                    other.shape()
                )))
            }
        };

        let mut fields = [0.0; 3];
        for (slot, value) in fields.iter_mut().zip(values) {
            *slot = value.as_number().ok_or_else(|| {
                NexusError::ElementValidation(format!("sensor field {value} is not a number"))
            })?;
        }

        Ok(SensorReading {
            temperature: fields[0],
            humidity: fields[1],
            pressure: fields[2],
        })
    }

    fn partition(
        &self,
        item: SensorReading,
        criterion: &Criterion,
    ) -> (Option<SensorReading>, Option<SensorReading>) {
        if criterion.matches(item.temperature) {
            (Some(item), None)
        } else {
            (None, Some(item))
        }
    }

    fn aggregate(&self, totals: &mut SensorTotals, batch: &[SensorReading]) -> String {
        for reading in batch {
            totals.readings += 1;
            totals.temperature_sum += reading.temperature;
            totals.humidity_sum += reading.humidity;
            totals.pressure_sum += reading.pressure;
        }

        format!(
            "Sensor analysis: {} readings processed, avg temp: {}°C, avg humidity: {}%, avg pressure: {} hPa",
            batch.len(),
            running_average(totals.temperature_sum, totals.readings),
            running_average(totals.humidity_sum, totals.readings),
            running_average(totals.pressure_sum, totals.readings),
        )
    }

    fn snapshot(&self, totals: &SensorTotals) -> (u64, BTreeMap<String, f64>) {
        let metrics = BTreeMap::from([
            (
                "avg_temperature".to_string(),
                running_average(totals.temperature_sum, totals.readings),
            ),
            (
                "avg_humidity".to_string(),
                running_average(totals.humidity_sum, totals.readings),
            ),
            (
                "avg_pressure".to_string(),
                running_average(totals.pressure_sum, totals.readings),
            ),
        ]);
        (totals.readings, metrics)
    }
}
