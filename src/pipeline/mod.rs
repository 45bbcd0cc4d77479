//! Three-stage record pipelines: input -> transform -> output
//!
//! Stages are stateless and exchange a [`Payload`]. A [`Pipeline`] runs one
//! record through its three stages and stops at the first failure; the
//! [`PipelineManager`] routes records by surface encoding and recovers from
//! per-record failures.

pub mod input;
pub mod manager;
pub mod output;
pub mod payload;
pub mod transform;

pub use input::InputStage;
pub use manager::{BatchReport, PipelineContext, PipelineManager, RecoveryEntry};
pub use output::OutputStage;
pub use payload::{Canonical, Payload, RangeStatus, Transformed};
pub use transform::TransformStage;

use crate::config::PipelineConfig;
use crate::error::{NexusError, Result};
use crate::types::RawRecord;
use serde::Serialize;
use std::fmt;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StageRole {
    Input,
    Transform,
    Output,
}

impl fmt::Display for StageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageRole::Input => f.write_str("input"),
            StageRole::Transform => f.write_str("transform"),
            StageRole::Output => f.write_str("output"),
        }
    }
}

/// Common trait for all pipeline stages
pub trait Stage: fmt::Debug {
    fn role(&self) -> StageRole;

    fn process(&self, payload: Payload) -> Result<Payload>;
}

/// Surface encoding a pipeline expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Encoding {
    /// String containing `:`
    Encoded,
    /// String containing `,`
    Structured,
    /// Any other finite iterable
    Positional,
}

impl Encoding {
    /// Detect the encoding of a record; `None` when no pipeline accepts it
    pub fn detect(record: &RawRecord) -> Option<Encoding> {
        match record {
            RawRecord::Text(s) if s.contains(':') => Some(Encoding::Encoded),
            RawRecord::Text(s) if s.contains(',') => Some(Encoding::Structured),
            RawRecord::Tuple(_) | RawRecord::Sequence(_) | RawRecord::Mapping(_) => {
                Some(Encoding::Positional)
            }
            RawRecord::Text(_) | RawRecord::Scalar(_) => None,
        }
    }
}

/// An immutable chain of exactly three stages
#[derive(Debug)]
pub struct Pipeline {
    id: String,
    encoding: Encoding,
    stages: [Box<dyn Stage>; 3],
}

impl Pipeline {
    pub fn new(id: impl Into<String>, encoding: Encoding, stages: [Box<dyn Stage>; 3]) -> Self {
        Self {
            id: id.into(),
            encoding,
            stages,
        }
    }

    /// Input, transform and output stages configured from `config`
    pub fn standard(id: impl Into<String>, encoding: Encoding, config: &PipelineConfig) -> Self {
        Self::new(
            id,
            encoding,
            [
                Box::new(InputStage::new(config.structured_fields)),
                Box::new(TransformStage::from_config(config)),
                Box::new(OutputStage),
            ],
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Run a record through every stage; the first failure aborts the chain
    #[instrument(skip(self, record), fields(pipeline = %self.id))]
    pub fn process(&self, record: RawRecord) -> Result<String> {
        let mut payload = Payload::Raw(record);
        for stage in &self.stages {
            payload = stage.process(payload).map_err(|e| NexusError::Pipeline {
                pipeline: self.id.clone(),
                stage: stage.role(),
                source: Box::new(e),
            })?;
            debug!("{} stage produced {}", stage.role(), payload.variant());
        }

        match payload {
            Payload::Rendered(output) => Ok(output),
            other => Err(NexusError::Pipeline {
                pipeline: self.id.clone(),
                stage: StageRole::Output,
                source: Box::new(NexusError::Stage(format!(
                    "pipeline ended with a {} payload",
                    other.variant()
                ))),
            }),
        }
    }
}
