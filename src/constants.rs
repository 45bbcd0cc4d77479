//! Default identifiers and tunables shared by the stream and pipeline engines.
//! These values back `Config::default()` and can be overridden from a TOML file.

// Pipeline identifiers (reporting lineage only, never used for lookup)
pub const ENCODED_PIPELINE_ID: &str = "JSON_001";
pub const STRUCTURED_PIPELINE_ID: &str = "CSV_001";
pub const POSITIONAL_PIPELINE_ID: &str = "STREAM_001";

// Number of fields a comma-separated record must split into
pub const STRUCTURED_FIELD_COUNT: usize = 3;

// Normal band for temperature readings: min inclusive, max exclusive
pub const NORMAL_RANGE_MIN: f64 = 20.0;
pub const NORMAL_RANGE_MAX: f64 = 30.0;

// Sensor sub-kinds the transform stage understands
pub const TEMPERATURE_SENSOR: &str = "temp";

// Event tokens tallied by the event stream
pub const LOGIN_EVENT: &str = "login";
pub const LOGOUT_EVENT: &str = "logout";
pub const ERROR_EVENT: &str = "error";

/// Unit suffix rendered next to a reading of the given sensor kind
pub fn sensor_unit(sensor: &str) -> &'static str {
    match sensor {
        TEMPERATURE_SENSOR => "°C",
        _ => "",
    }
}

/// Default list of sensor sub-kinds
pub fn default_known_sensors() -> Vec<String> {
    vec![TEMPERATURE_SENSOR.to_string()]
}
