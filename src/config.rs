use crate::constants;
use crate::error::{NexusError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub streams: StreamsConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamsConfig {
    /// Event tokens that are tallied individually
    pub login_token: String,
    pub logout_token: String,
    pub error_token: String,
}

impl Default for StreamsConfig {
    fn default() -> Self {
        Self {
            login_token: constants::LOGIN_EVENT.to_string(),
            logout_token: constants::LOGOUT_EVENT.to_string(),
            error_token: constants::ERROR_EVENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub encoded_id: String,
    pub structured_id: String,
    pub positional_id: String,
    pub structured_fields: usize,
    pub normal_min: f64,
    pub normal_max: f64,
    pub known_sensors: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            encoded_id: constants::ENCODED_PIPELINE_ID.to_string(),
            structured_id: constants::STRUCTURED_PIPELINE_ID.to_string(),
            positional_id: constants::POSITIONAL_PIPELINE_ID.to_string(),
            structured_fields: constants::STRUCTURED_FIELD_COUNT,
            normal_min: constants::NORMAL_RANGE_MIN,
            normal_max: constants::NORMAL_RANGE_MAX,
            known_sensors: constants::default_known_sensors(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    pub level: String,
    /// Directory for daily-rotated JSON logs; console only when absent
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "nexus_streams=info".to_string(),
            dir: None,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            NexusError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pipeline.structured_fields == 0 {
            return Err(NexusError::Config(
                "pipeline.structured_fields must be at least 1".to_string(),
            ));
        }
        if self.pipeline.normal_min >= self.pipeline.normal_max {
            return Err(NexusError::Config(format!(
                "pipeline.normal_min ({}) must be below pipeline.normal_max ({})",
                self.pipeline.normal_min, self.pipeline.normal_max
            )));
        }
        Ok(())
    }
}
