pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod processors;
pub mod records;
pub mod streams;
pub mod types;

pub use config::Config;
pub use error::{NexusError, Result};
pub use pipeline::{Pipeline, PipelineManager};
pub use streams::{Criteria, StreamDispatcher};
pub use types::{RawRecord, Scalar, StreamKind};
