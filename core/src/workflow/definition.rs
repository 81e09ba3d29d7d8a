// core/src/workflow/definition.rs

//! `Workflow<TData, Err>`: an ordered list of named steps and the handlers
//! registered for them.

use crate::error::WorkflowError;
use crate::workflow::context::ContextData;
use crate::workflow::control::StepControl;
use std::future::Future;
use std::pin::Pin;

/// An async step handler over the shared context.
///
/// Handlers take a clone of the `ContextData` handle, so any guard they take
/// must be released before they `.await`.
pub type StepHandler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<StepControl, Err>> + Send>>
    + Send
    + Sync,
>;

pub(crate) struct StepDef<TData, Err>
where
  TData: 'static + Send + Sync,
{
  pub(crate) name: String,
  pub(crate) optional: bool,
  pub(crate) handlers: Vec<StepHandler<TData, Err>>,
}

pub struct Workflow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<WorkflowError> + Send + Sync + 'static,
{
  pub(crate) name: &'static str,
  pub(crate) steps: Vec<StepDef<TData, Err>>,
}

impl<TData, Err> Workflow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<WorkflowError> + Send + Sync + 'static,
{
  /// Declares the steps, in execution order, as `(name, optional)` pairs.
  pub fn new(name: &'static str, step_defs: &[(&str, bool)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(step_name, optional)| StepDef {
        name: (*step_name).to_string(),
        optional: *optional,
        handlers: Vec::new(),
      })
      .collect();

    Self { name, steps }
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  /// Registers a handler for `step_name`.
  ///
  /// Panics if the step was never declared: that is a wiring mistake, not a
  /// runtime condition.
  pub fn on_step<F, UserErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<StepControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    let workflow_name = self.name;
    let step = self
      .steps
      .iter_mut()
      .find(|s| s.name == step_name)
      .unwrap_or_else(|| {
        panic!(
          "Workflow setup error: step '{}' not declared in workflow '{}'.",
          step_name, workflow_name
        )
      });

    let handler: StepHandler<TData, Err> = Box::new(move |ctx_data| {
      let user_fut = handler_fn(ctx_data);
      Box::pin(async move { user_fut.await.map_err(Into::into) })
    });
    step.handlers.push(handler);
  }

  /// Checks that every non-optional step has at least one handler.
  pub fn validate(&self) -> Result<(), WorkflowError> {
    match self.steps.iter().find(|s| !s.optional && s.handlers.is_empty()) {
      Some(step) => Err(WorkflowError::HandlerMissing {
        step_name: step.name.clone(),
      }),
      None => Ok(()),
    }
  }
}
