// core/src/workflow/mod.rs

//! A small step engine: named steps run in order over a shared
//! `ContextData<T>`, each able to continue, stop, or fail the run.

pub mod context;
pub mod control;
pub mod definition;
pub mod execution;

pub use context::ContextData;
pub use control::{StepControl, WorkflowResult};
pub use definition::{StepHandler, Workflow};
