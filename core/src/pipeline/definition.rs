// accounts/src/pipeline/definition.rs

//! The `Pipeline<TData, Err>` struct, its construction and handler registration.

use crate::pipeline::context_data::ContextData;
use crate::pipeline::control::PipelineControl;
use crate::pipeline::step::{Phase, SkipCondition, StepDef};
use crate::pipeline::PipelineError;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

/// A boxed async step handler.
///
/// Handlers receive a clone of the run's `ContextData<TData>` and must not hold
/// its lock guards across an `.await`.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>>
    + Send
    + Sync,
>;

pub(crate) struct StepHandlers<TData: Send + Sync + 'static, Err> {
  pub(crate) on: Vec<Handler<TData, Err>>,
  pub(crate) after: Vec<Handler<TData, Err>>,
}

impl<TData: Send + Sync + 'static, Err> Default for StepHandlers<TData, Err> {
  fn default() -> Self {
    Self {
      on: Vec::new(),
      after: Vec::new(),
    }
  }
}

impl<TData: Send + Sync + 'static, Err> StepHandlers<TData, Err> {
  pub(crate) fn phase(&self, phase: Phase) -> &[Handler<TData, Err>] {
    match phase {
      Phase::On => &self.on,
      Phase::After => &self.after,
    }
  }

  fn phase_mut(&mut self, phase: Phase) -> &mut Vec<Handler<TData, Err>> {
    match phase {
      Phase::On => &mut self.on,
      Phase::After => &mut self.after,
    }
  }

  pub(crate) fn is_empty(&self) -> bool {
    self.on.is_empty() && self.after.is_empty()
  }
}

/// An ordered list of named steps over a shared context `TData`.
///
/// `Err` is the error every handler returns; it must absorb `PipelineError` so
/// the run can report misconfiguration (a required step without handlers)
/// through the same channel.
pub struct Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  pub(crate) steps: Vec<StepDef<TData>>,
  pub(crate) handlers: HashMap<String, StepHandlers<TData, Err>>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  /// Creates a pipeline from `(name, optional, skip_if)` step definitions.
  pub fn new(step_defs: &[(&str, bool, Option<SkipCondition<TData>>)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(name, optional, skip_if)| StepDef {
        name: (*name).to_string(),
        optional: *optional,
        skip_if: skip_if.clone(),
      })
      .collect();

    Self {
      steps,
      handlers: HashMap::new(),
    }
  }

  /// Panics on an unknown step: a typo in a step name is a setup bug, not a runtime condition.
  fn step_mut(&mut self, step_name: &str) -> &mut StepDef<TData> {
    match self.steps.iter_mut().find(|s| s.name == step_name) {
      Some(step) => step,
      None => panic!("Pipeline setup error: step '{}' is not defined.", step_name),
    }
  }

  fn register<F, UserErr>(
    &mut self,
    phase: Phase,
    step_name: &str,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<PipelineControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.step_mut(step_name);
    let handler: Handler<TData, Err> = Box::new(move |ctx_data| {
      let fut = handler_fn(ctx_data);
      Box::pin(async move { fut.await.map_err(Into::into) })
    });
    self
      .handlers
      .entry(step_name.to_string())
      .or_default()
      .phase_mut(phase)
      .push(handler);
  }

  /// Registers the main handler of a step.
  pub fn on<F, UserErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<PipelineControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.register(Phase::On, step_name, handler_fn);
  }

  /// Registers a handler that runs once the step's `on` handlers have all continued.
  pub fn after<F, UserErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<PipelineControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.register(Phase::After, step_name, handler_fn);
  }
}
