//! Worker tasks that back the runtime orchestration.
//!
//! A single pipeline worker owns the local mirror and serialises every input
//! that can change it.

mod pipeline;

pub use pipeline::{Command, PipelineWorker, SubmitOutcome};
