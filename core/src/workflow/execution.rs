// core/src/workflow/execution.rs

use crate::error::WorkflowError;
use crate::workflow::context::ContextData;
use crate::workflow::control::{StepControl, WorkflowResult};
use crate::workflow::definition::Workflow;
use tracing::{event, instrument, span, Instrument, Level};

impl<TData, Err> Workflow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<WorkflowError> + Send + Sync + 'static,
{
  /// Runs every step in declaration order against `ctx_data`.
  ///
  /// The first handler error aborts the run and is returned as-is. A
  /// non-optional step with no handlers fails with
  /// `WorkflowError::HandlerMissing` converted into `Err`.
  #[instrument(
    name = "Workflow::run",
    skip_all,
    fields(workflow = self.name, num_steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<WorkflowResult, Err> {
    event!(Level::DEBUG, "Workflow run starting.");

    for (step_idx, step) in self.steps.iter().enumerate() {
      if step.handlers.is_empty() {
        if step.optional {
          event!(Level::DEBUG, step_name = %step.name, "Optional step has no handlers, skipping.");
          continue;
        }
        event!(Level::ERROR, step_name = %step.name, "Non-optional step has no handlers.");
        return Err(Err::from(WorkflowError::HandlerMissing {
          step_name: step.name.clone(),
        }));
      }

      let step_span = span!(
        Level::INFO,
        "workflow_step",
        step_name = step.name.as_str(),
        step_index = step_idx,
        optional = step.optional
      );

      for handler_fn in &step.handlers {
        match handler_fn(ctx_data.clone()).instrument(step_span.clone()).await {
          Ok(StepControl::Continue) => {}
          Ok(StepControl::Stop) => {
            event!(Level::INFO, step_name = %step.name, "Workflow stopped by step.");
            return Ok(WorkflowResult::Stopped);
          }
          Err(e) => {
            event!(Level::WARN, step_name = %step.name, error = %e, "Step failed.");
            return Err(e);
          }
        }
      }
    }

    event!(Level::DEBUG, "Workflow run completed.");
    Ok(WorkflowResult::Completed)
  }
}
