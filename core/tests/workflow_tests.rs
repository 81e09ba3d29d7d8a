// tests/workflow_tests.rs
mod common;

use common::*;
use foodlane::{ContextData, MarketError, StepControl, Workflow, WorkflowError, WorkflowResult};
use serial_test::serial;
use std::sync::atomic::Ordering;

#[tokio::test]
#[serial]
async fn test_workflow_runs_steps_in_order() {
  setup_tracing();
  reset_counters();
  let mut wf = Workflow::<TestContext, MarketError>::new("ordered", &[("step1", false), ("step2", false), ("step3", false)]);
  wf.on_step("step1", simple_handler("step1", " S1"));
  wf.on_step("step2", simple_handler("step2", " S2"));
  wf.on_step("step3", simple_handler("step3", " S3"));

  let ctx = ContextData::new(TestContext::default());
  let result = wf.run(ctx.clone()).await.unwrap();

  assert_eq!(result, WorkflowResult::Completed);
  let guard = ctx.read();
  assert_eq!(guard.counter, 3);
  assert_eq!(guard.message, " S1 S2 S3");
  assert_eq!(guard.steps_executed, vec!["step1", "step2", "step3"]);
  assert_eq!(HANDLER_EXEC_COUNTER.load(Ordering::SeqCst), 3);
}

#[tokio::test]
#[serial]
async fn test_workflow_stops_on_step_control_stop() {
  setup_tracing();
  let mut wf = Workflow::<TestContext, MarketError>::new("stopping", &[("stepA", false), ("stopStep", false), ("stepC", false)]);
  wf.on_step("stepA", simple_handler("stepA", "A"));
  wf.on_step("stopStep", simple_handler("stopStep", "S"));
  wf.on_step("stepC", simple_handler("stepC", "C"));

  let ctx = ContextData::new(TestContext {
    should_stop_at: Some("stopStep".to_string()),
    ..Default::default()
  });
  let result = wf.run(ctx.clone()).await.unwrap();

  assert_eq!(result, WorkflowResult::Stopped);
  assert_eq!(ctx.read().steps_executed, vec!["stepA", "stopStep"]);
}

#[tokio::test]
#[serial]
async fn test_workflow_propagates_handler_error() {
  setup_tracing();
  let mut wf = Workflow::<TestContext, MarketError>::new("failing", &[("good", false), ("bad", false), ("never", false)]);
  wf.on_step("good", simple_handler("good", "G"));
  wf.on_step("bad", failing_handler("bad"));
  wf.on_step("never", simple_handler("never", "N"));

  let ctx = ContextData::new(TestContext::default());
  let result = wf.run(ctx.clone()).await;

  assert!(matches!(result, Err(MarketError::Validation(ref msg)) if msg == "bad failed"));
  assert_eq!(ctx.read().steps_executed, vec!["good", "bad"]);
}

#[tokio::test]
#[serial]
async fn test_optional_step_without_handler_is_skipped() {
  setup_tracing();
  let mut wf = Workflow::<TestContext, MarketError>::new("optional", &[("first", false), ("maybe", true), ("last", false)]);
  wf.on_step("first", simple_handler("first", "1"));
  wf.on_step("last", simple_handler("last", "2"));

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(wf.run(ctx.clone()).await.unwrap(), WorkflowResult::Completed);
  assert_eq!(ctx.read().message, "12");
}

#[tokio::test]
#[serial]
async fn test_missing_required_handler_fails_run() {
  setup_tracing();
  let mut wf = Workflow::<TestContext, MarketError>::new("incomplete", &[("first", false), ("required", false)]);
  wf.on_step("first", simple_handler("first", "1"));

  assert!(matches!(
    wf.validate(),
    Err(WorkflowError::HandlerMissing { ref step_name }) if step_name == "required"
  ));
  let result = wf.run(ContextData::new(TestContext::default())).await;
  assert!(matches!(
    result,
    Err(MarketError::Workflow(WorkflowError::HandlerMissing { .. }))
  ));
}

#[test]
#[should_panic(expected = "not declared")]
fn test_registering_unknown_step_panics() {
  let mut wf = Workflow::<TestContext, MarketError>::new("strict", &[("only", false)]);
  wf.on_step("ghost", |_ctx: ContextData<TestContext>| async { Ok::<_, MarketError>(StepControl::Continue) });
}
