use thiserror::Error;

use crate::pipeline::StageRole;

#[derive(Error, Debug)]
pub enum NexusError {
    #[error("Unclassifiable record: {0}")]
    UnclassifiableRecord(String),

    #[error("Invalid element: {0}")]
    ElementValidation(String),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Domain error: {0}")]
    Domain(String),

    #[error("Stage error: {0}")]
    Stage(String),

    #[error("Pipeline {pipeline} failed in {stage} stage: {source}")]
    Pipeline {
        pipeline: String,
        stage: StageRole,
        #[source]
        source: Box<NexusError>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NexusError {
    /// Strip pipeline context and return the error raised by the stage itself.
    pub fn root_cause(&self) -> &NexusError {
        match self {
            NexusError::Pipeline { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Short label used for metrics and recovery entries.
    pub fn kind(&self) -> &'static str {
        match self.root_cause() {
            NexusError::UnclassifiableRecord(_) | NexusError::Stage(_) => "structural",
            NexusError::ElementValidation(_) => "element_validation",
            NexusError::Format(_) => "format",
            NexusError::Domain(_) => "domain",
            NexusError::Config(_) | NexusError::Toml(_) => "config",
            NexusError::Json(_) | NexusError::Io(_) => "io",
            NexusError::Pipeline { .. } => "pipeline",
        }
    }
}

pub type Result<T> = std::result::Result<T, NexusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cause_unwraps_nested_pipeline_errors() {
        let err = NexusError::Pipeline {
            pipeline: "JSON_001".to_string(),
            stage: StageRole::Input,
            source: Box::new(NexusError::Format("bad json".to_string())),
        };

        assert!(matches!(err.root_cause(), NexusError::Format(_)));
        assert_eq!(err.kind(), "format");
        assert!(err.to_string().contains("JSON_001"));
        assert!(err.to_string().contains("input"));
    }
}
