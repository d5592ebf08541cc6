//! Run orchestration: the capture loop, progress reporting and the busy guard.

pub mod coordinator;
pub mod progress;

pub use coordinator::{
    ArtifactInfo, Coordinator, EditOutcome, GenerateOutcome, PipelineObserver, PipelineState,
    TracingObserver,
};
pub use progress::PipelineProgress;
