// accounts/src/pipeline/mod.rs

//! A small async step pipeline used to drive record lifecycles.
//!
//! A `Pipeline<TData, Err>` is an ordered list of named steps. Each step owns
//! `on` and `after` handlers that receive a shared `ContextData<TData>`
//! and answer with a `PipelineControl`. Steps can be optional or skipped by a
//! condition evaluated against the context right before the step runs.

pub mod context_data;
pub mod control;
pub mod definition;
pub mod execution;
pub mod step;

use thiserror::Error;

pub use context_data::ContextData;
pub use control::{PipelineControl, PipelineResult};
pub use definition::{Handler, Pipeline};
pub use step::{SkipCondition, StepDef};

/// Failures raised by the pipeline machinery itself, as opposed to its handlers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Context for pipeline is still shared after the run")]
  ContextStillShared,
}
