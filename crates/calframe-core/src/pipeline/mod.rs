pub mod config;
mod orchestrator;
mod types;

pub use config::{ExecutionMode, FailurePolicy, OverwritePolicy, PipelineConfig};
pub use orchestrator::{run_pipeline, run_pipeline_reported};
pub use types::{
    FailedFrame, FrameOutcome, NotProcessedReason, PipelineStage, ProgressReporter, RunSummary,
    SkipReason,
};
