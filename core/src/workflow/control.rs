// core/src/workflow/control.rs

/// Signal from a step handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepControl {
  Continue,
  /// Halt the run; remaining steps are not executed.
  Stop,
}

/// Outcome of a full workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowResult {
  Completed,
  /// A handler returned `StepControl::Stop`.
  Stopped,
}
