// tests/flow_instance.rs

use std::time::Duration;

use linkflow::behavior::{RepeatData, RepeatHandler, RepeatKind, TaskContext};
use linkflow::errors::{ActivityError, FlowError};
use linkflow::flow::{FlowGraph, FlowInstance, MemoryRepeatStore};
use linkflow::model::{
    ActivityConfig, EvalResult, Link, LinkId, LinkStatus, LinkType, RepeatPolicy, Task,
};
use linkflow_test_utils::builders::{FlowBuilder, TaskConfigBuilder};
use linkflow_test_utils::init_tracing;

fn pair() -> FlowInstance {
    let graph = FlowBuilder::new()
        .task("a")
        .task("b")
        .expression("a", "b", "ok")
        .graph();
    FlowInstance::new(graph)
}

#[test]
fn graph_rejects_links_to_unknown_tasks() {
    let tasks = vec![Task::new("a", ActivityConfig::new("true"))];
    let links = vec![Link::new(0, "a", "ghost", LinkType::Normal)];

    let err = FlowGraph::new("f", tasks, links).unwrap_err();
    assert!(matches!(err, FlowError::TaskNotFound(name) if name == "ghost"));
}

#[test]
fn graph_reassigns_link_ids_by_position() -> Result<(), FlowError> {
    let tasks = vec![
        Task::new("a", ActivityConfig::new("true")),
        Task::new("b", ActivityConfig::new("true")),
    ];
    let links = vec![Link::new(42, "a", "b", LinkType::Normal)];

    let graph = FlowGraph::new("f", tasks, links)?;
    assert_eq!(graph.outgoing("a"), &[LinkId(0)]);
    assert_eq!(graph.incoming("b"), &[LinkId(0)]);
    assert!(graph.outgoing("missing").is_empty());
    Ok(())
}

#[test]
fn graph_orders_tasks_by_name_not_declaration() {
    let graph = FlowBuilder::new()
        .task("zeta")
        .task("mid")
        .task("alpha")
        .link("mid", "alpha")
        .graph();

    let order: Vec<_> = graph.tasks().map(|t| t.name.as_str()).collect();
    assert_eq!(order, ["alpha", "mid", "zeta"]);
    assert_eq!(graph.root_tasks(), ["mid", "zeta"]);

    let statuses: Vec<_> = FlowInstance::new(graph)
        .task_statuses()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(statuses, ["alpha", "mid", "zeta"]);
}

#[test]
fn activity_slot_lifecycle() -> Result<(), FlowError> {
    init_tracing();

    let mut instance = pair();

    {
        let mut ctx = instance.context("a")?;
        assert_eq!(ctx.eval_activity(), Ok(false));
        // Still running: no second request.
        assert_eq!(ctx.eval_activity(), Ok(false));
    }
    let requests = instance.take_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].attempt, 1);
    assert!(instance.is_running("a"));

    assert!(instance.finish_activity("a", Ok("ok\n".to_string())));
    assert!(!instance.finish_activity("a", Ok(String::new())));

    {
        let mut ctx = instance.context("a")?;
        assert_eq!(ctx.eval_activity(), Ok(true));
    }
    assert_eq!(instance.output("a"), Some("ok\n"));
    assert_eq!(instance.running_count(), 0);

    {
        let mut ctx = instance.context("a")?;
        assert_eq!(ctx.eval_activity(), Ok(false));
    }
    assert_eq!(instance.take_requests()[0].attempt, 2);
    Ok(())
}

#[test]
fn failed_activity_surfaces_its_error_once() -> Result<(), FlowError> {
    let mut instance = pair();
    instance.context("a")?.eval_activity().ok();
    instance.finish_activity("a", Err(ActivityError::retriable("flaky")));

    let mut ctx = instance.context("a")?;
    assert_eq!(ctx.eval_activity(), Err(ActivityError::retriable("flaky")));
    // Consumed: the next evaluation starts a new run.
    assert_eq!(ctx.eval_activity(), Ok(false));
    Ok(())
}

#[test]
fn link_keeps_first_resolution() -> Result<(), FlowError> {
    init_tracing();

    let mut instance = pair();
    {
        let mut ctx = instance.context("a")?;
        ctx.set_link_status(LinkId(0), LinkStatus::Pending);
        ctx.set_link_status(LinkId(0), LinkStatus::True);
        ctx.set_link_status(LinkId(0), LinkStatus::False);
    }
    assert_eq!(instance.link_status(LinkId(0)), LinkStatus::True);

    let ctx = instance.context("b")?;
    let incoming = ctx.from_link_instances();
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].status, LinkStatus::True);
    Ok(())
}

#[test]
fn expression_link_reads_source_output() -> Result<(), FlowError> {
    let mut instance = pair();
    instance.context("a")?.eval_activity().ok();
    instance.finish_activity("a", Ok("all ok".to_string()));
    instance.context("a")?.eval_activity().ok();

    let link = instance.graph().link(LinkId(0)).cloned().expect("link");
    let mut ctx = instance.context("a")?;
    assert_eq!(ctx.eval_link(&link)?, true);
    assert_eq!(ctx.eval_expression("!ok")?, false);
    Ok(())
}

#[test]
fn expect_stdout_mismatch_is_retriable() -> Result<(), FlowError> {
    let graph = FlowBuilder::new()
        .with_task("t", TaskConfigBuilder::new("make").expect_stdout("^OK$").build())
        .graph();
    let mut instance = FlowInstance::new(graph);
    instance.context("t")?.eval_activity().ok();
    instance.finish_activity("t", Ok("NOPE".to_string()));

    let mut ctx = instance.context("t")?;
    ctx.eval_activity().ok();
    let err = ctx.post_eval_activity().unwrap_err();
    assert!(err.is_retriable());
    assert!(matches!(err, ActivityError::UnexpectedOutput { .. }));
    Ok(())
}

fn policy_task(on_error: Option<u32>, while_count: Option<u32>) -> FlowInstance {
    let mut task = Task::new("t", ActivityConfig::new("true"));
    task.repeat.on_error = on_error.map(|count| RepeatPolicy {
        count,
        condition: String::new(),
        interval: Duration::from_millis(5),
    });
    task.repeat.while_condition = while_count.map(|count| RepeatPolicy {
        count,
        condition: "again".to_string(),
        interval: Duration::from_millis(7),
    });
    FlowInstance::new(FlowGraph::new("f", vec![task], Vec::new()).expect("graph"))
}

#[test]
fn repeat_store_reports_unconfigured_policy_as_default() -> Result<(), FlowError> {
    let mut instance = policy_task(None, None);
    let ctx = instance.context("t")?;
    let store = MemoryRepeatStore::new();

    assert_eq!(store.repeat_data(&ctx, RepeatKind::OnError)?, RepeatData::default());
    assert_eq!(store.repeat_data(&ctx, RepeatKind::OnCondition)?, RepeatData::default());
    Ok(())
}

#[test]
fn repeat_store_consumes_budget() -> Result<(), FlowError> {
    let mut instance = policy_task(Some(2), None);
    let mut ctx = instance.context("t")?;
    let mut store = MemoryRepeatStore::new();

    let data = store.repeat_data(&ctx, RepeatKind::OnError)?;
    assert_eq!(data.count, 2);
    assert!(matches!(
        store.do_repeat(&mut ctx, &data, RepeatKind::OnError)?,
        EvalResult::Wait
    ));
    assert_eq!(store.remaining("t", RepeatKind::OnError), Some(1));
    assert_eq!(store.take_delay("t"), Some(Duration::from_millis(5)));
    assert_eq!(store.take_delay("t"), None);

    let data = store.repeat_data(&ctx, RepeatKind::OnError)?;
    store.do_repeat(&mut ctx, &data, RepeatKind::OnError)?;
    let data = store.repeat_data(&ctx, RepeatKind::OnError)?;
    assert_eq!(data.count, 0);
    assert!(store.do_repeat(&mut ctx, &data, RepeatKind::OnError)?.is_fail());
    Ok(())
}

#[test]
fn unbounded_condition_repeat_never_exhausts() -> Result<(), FlowError> {
    let mut instance = policy_task(None, Some(0));
    instance.context("t")?.eval_activity().ok();
    instance.finish_activity("t", Ok("again".to_string()));
    let mut ctx = instance.context("t")?;
    ctx.eval_activity().ok();

    let mut store = MemoryRepeatStore::new();
    for _ in 0..5 {
        let data = store.repeat_data(&ctx, RepeatKind::OnCondition)?;
        assert!(matches!(
            store.evaluate_expression(&mut ctx, &data)?,
            EvalResult::Wait
        ));
        assert_eq!(store.take_delay("t"), Some(Duration::from_millis(7)));
    }
    Ok(())
}
