// accounts/src/pipeline/step.rs
use std::fmt;
use std::sync::Arc;

/// Evaluated against the context right before a step runs; `true` skips the step.
pub type SkipCondition<TData> = Arc<dyn Fn(&TData) -> bool + Send + Sync + 'static>;

#[derive(Clone)]
pub struct StepDef<TData: 'static + Send + Sync> {
  pub name: String,
  /// An optional step without handlers is skipped instead of failing the run.
  pub optional: bool,
  pub skip_if: Option<SkipCondition<TData>>,
}

impl<TData: 'static + Send + Sync> fmt::Debug for StepDef<TData> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("optional", &self.optional)
      .field("skip_if_present", &self.skip_if.is_some())
      .finish()
  }
}

/// The handler slots every step has, run in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
  On,
  After,
}

impl Phase {
  pub(crate) const ALL: [Phase; 2] = [Phase::On, Phase::After];

  pub(crate) fn as_str(self) -> &'static str {
    match self {
      Phase::On => "on",
      Phase::After => "after",
    }
  }
}
