// tests/behavior_eval.rs

use linkflow::behavior::{RepeatKind, SimpleTaskBehavior, TaskBehavior};
use linkflow::errors::{ActivityError, FlowError};
use linkflow::model::{EvalResult, TaskStatus};
use linkflow_test_utils::init_tracing;
use linkflow_test_utils::mock_context::MockTaskContext;
use linkflow_test_utils::scripted_repeats::{Scripted, ScriptedRepeats};

fn ready(name: &str) -> MockTaskContext {
    MockTaskContext::new(name).with_status(TaskStatus::Ready)
}

#[test]
fn skipped_task_short_circuits_without_running_activity() {
    init_tracing();

    let mut ctx = MockTaskContext::new("t").with_status(TaskStatus::Skipped);
    let mut repeats = ScriptedRepeats::new();

    let result = SimpleTaskBehavior::new().eval(&mut ctx, &mut repeats);

    assert!(matches!(result, EvalResult::Skip));
    assert_eq!(ctx.calls.eval_activity, 0);
    assert!(ctx.status_history.is_empty());
}

#[test]
fn unfinished_activity_waits_without_status_change() {
    init_tracing();

    let mut ctx = ready("t").activity(Ok(false));
    let mut repeats = ScriptedRepeats::new();

    let result = SimpleTaskBehavior::new().eval(&mut ctx, &mut repeats);

    assert!(matches!(result, EvalResult::Wait));
    assert_eq!(ctx.status, TaskStatus::Ready);
    assert!(ctx.status_history.is_empty());
}

#[test]
fn finished_activity_without_policy_is_done() {
    init_tracing();

    let mut ctx = ready("t").activity(Ok(true));
    let mut repeats = ScriptedRepeats::new();

    let result = SimpleTaskBehavior::new().eval(&mut ctx, &mut repeats);

    assert!(matches!(result, EvalResult::Done));
    assert!(repeats.expressions.is_empty());
    assert_eq!(ctx.calls.eval_activity, 1);
}

#[test]
fn non_retriable_error_fails_task_with_original_error() {
    init_tracing();

    let original = ActivityError::fatal("boom");
    let mut ctx = ready("t").activity(Err(original.clone()));
    // Budget is irrelevant for non-retriable errors.
    let mut repeats = ScriptedRepeats::new().on_error(3);

    let result = SimpleTaskBehavior::new().eval(&mut ctx, &mut repeats);

    match result {
        EvalResult::Fail(err) => assert_eq!(err.activity_error(), Some(&original)),
        other => panic!("expected Fail, got {other:?}"),
    }
    assert_eq!(ctx.status, TaskStatus::Failed);
    assert!(repeats.repeats.is_empty());
}

#[test]
fn retriable_error_with_budget_delegates_to_repeat_handler() {
    init_tracing();

    let mut ctx = ready("t").activity(Err(ActivityError::retriable("flaky")));
    let mut repeats = ScriptedRepeats::new().on_error(2);

    let result = SimpleTaskBehavior::new().eval(&mut ctx, &mut repeats);

    assert!(matches!(result, EvalResult::Wait));
    assert_eq!(ctx.status, TaskStatus::Ready);
    assert_eq!(repeats.repeats.len(), 1);
    assert_eq!(repeats.repeats[0].0, RepeatKind::OnError);
    assert_eq!(repeats.repeats[0].1.count, 2);
}

#[test]
fn retriable_error_with_exhausted_budget_fails() {
    init_tracing();

    let mut ctx = ready("t").activity(Err(ActivityError::ExitStatus {
        code: 75,
        retriable: true,
    }));
    let mut repeats = ScriptedRepeats::new().on_error(0);

    let result = SimpleTaskBehavior::new().eval(&mut ctx, &mut repeats);

    assert!(result.is_fail());
    assert_eq!(ctx.status, TaskStatus::Failed);
    assert!(repeats.repeats.is_empty());
}

#[test]
fn repeat_lookup_failure_fails_with_lookup_error() {
    init_tracing();

    let mut ctx = ready("t").activity(Err(ActivityError::retriable("flaky")));
    let mut repeats = ScriptedRepeats::new()
        .on_error(5)
        .failing_lookup(RepeatKind::OnError);

    let result = SimpleTaskBehavior::new().eval(&mut ctx, &mut repeats);

    assert!(matches!(result, EvalResult::Fail(FlowError::RepeatData { .. })));
    assert_eq!(ctx.status, TaskStatus::Failed);
    assert!(repeats.repeats.is_empty());
}

#[test]
fn repeat_handler_failure_marks_task_failed() {
    init_tracing();

    let mut ctx = ready("t").activity(Err(ActivityError::retriable("flaky")));
    let mut repeats = ScriptedRepeats::new()
        .on_error(1)
        .repeat_outcome(Scripted::Err("store unavailable".into()));

    let result = SimpleTaskBehavior::new().eval(&mut ctx, &mut repeats);

    assert!(result.is_fail());
    assert_eq!(ctx.status, TaskStatus::Failed);
}

#[test]
fn condition_policy_is_handed_to_expression_evaluator() {
    init_tracing();

    let mut ctx = ready("poll").activity(Ok(true));
    let mut repeats = ScriptedRepeats::new()
        .on_condition("PENDING", 4)
        .expression_outcome(Scripted::Wait);

    let result = SimpleTaskBehavior::new().eval(&mut ctx, &mut repeats);

    assert!(matches!(result, EvalResult::Wait));
    assert_eq!(repeats.expressions.len(), 1);
    assert_eq!(repeats.expressions[0].condition, "PENDING");
}

#[test]
fn condition_lookup_failure_fails_task() {
    init_tracing();

    let mut ctx = ready("poll").activity(Ok(true));
    let mut repeats = ScriptedRepeats::new().failing_lookup(RepeatKind::OnCondition);

    let result = SimpleTaskBehavior::new().eval(&mut ctx, &mut repeats);

    assert!(result.is_fail());
    assert_eq!(ctx.status, TaskStatus::Failed);
}

#[test]
fn post_eval_defaults_to_done() {
    init_tracing();

    let mut ctx = ready("t");
    let mut repeats = ScriptedRepeats::new();

    let result = SimpleTaskBehavior::new().post_eval(&mut ctx, &mut repeats);

    assert!(matches!(result, EvalResult::Done));
    assert_eq!(ctx.calls.post_eval_activity, 1);
    assert_eq!(ctx.calls.eval_activity, 0);
}

#[test]
fn post_eval_error_follows_the_eval_error_branch() {
    init_tracing();

    let behavior = SimpleTaskBehavior::new();

    let mut ctx = ready("t").post_activity(Err(ActivityError::UnexpectedOutput {
        pattern: "OK".into(),
    }));
    let mut repeats = ScriptedRepeats::new().on_error(1);
    assert!(matches!(behavior.post_eval(&mut ctx, &mut repeats), EvalResult::Wait));
    assert_eq!(repeats.repeats.len(), 1);

    let mut ctx = ready("t").post_activity(Err(ActivityError::fatal("bad output")));
    let mut repeats = ScriptedRepeats::new().on_error(1);
    assert!(behavior.post_eval(&mut ctx, &mut repeats).is_fail());
    assert_eq!(ctx.status, TaskStatus::Failed);
}

#[test]
fn post_eval_consults_condition_policy() {
    init_tracing();

    let mut ctx = ready("t");
    let mut repeats = ScriptedRepeats::new()
        .on_condition("again", 0)
        .expression_outcome(Scripted::Done);

    let result = SimpleTaskBehavior::new().post_eval(&mut ctx, &mut repeats);

    assert!(matches!(result, EvalResult::Done));
    assert_eq!(repeats.expressions.len(), 1);
}
