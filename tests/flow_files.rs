// tests/flow_files.rs

use std::error::Error;
use std::path::PathBuf;

use linkflow::config::load_and_validate;
use linkflow::engine::{CoreCommand, CoreRuntime, FlowState, RuntimeEvent};
use linkflow::flow::FlowGraph;
use linkflow::model::{LinkType, TaskStatus};
use linkflow_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

fn release_flow() -> Result<FlowGraph, Box<dyn Error>> {
    let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let flow = load_and_validate(manifest.join("flows/release.toml"))?;
    Ok(FlowGraph::from_flow(&flow))
}

#[test]
fn release_flow_shape() -> TestResult {
    init_tracing();

    let graph = release_flow()?;

    assert_eq!(graph.name(), "release");
    assert_eq!(graph.root_tasks(), vec!["build".to_string()]);
    assert_eq!(graph.outgoing("poll").len(), 2);
    assert_eq!(graph.incoming("rollback").len(), 1);

    let types: Vec<_> = graph.links().iter().map(|l| l.link_type).collect();
    assert_eq!(
        types,
        vec![
            LinkType::Normal,
            LinkType::Expression,
            LinkType::Otherwise,
            LinkType::Error
        ]
    );

    let build = graph.task("build").expect("build task");
    assert_eq!(build.activity.expect_stdout.as_deref(), Some("BUILD OK"));
    assert_eq!(build.repeat.on_error.as_ref().map(|p| p.count), Some(3));

    Ok(())
}

#[test]
fn release_flow_deploys_when_ready() -> TestResult {
    init_tracing();

    let mut core = CoreRuntime::new(release_flow()?);
    let mut step = core.start();
    let mut order = Vec::new();

    // Feed back the echo output of every command.
    while step.keep_running {
        let mut events = Vec::new();
        for command in step.commands {
            if let CoreCommand::DispatchActivities(requests) = command {
                for r in requests {
                    order.push(r.task.clone());
                    let output = r.cmd.trim_start_matches("echo ").to_string();
                    events.push(RuntimeEvent::ActivityFinished {
                        task: r.task,
                        result: Ok(output),
                    });
                }
            }
        }
        let event = events.pop().expect("one activity at a time in this flow");
        step = core.step(event);
    }

    assert_eq!(order, vec!["build", "poll", "deploy"]);
    assert_eq!(core.state(), &FlowState::Completed);
    assert_eq!(core.instance().status("notify"), TaskStatus::NotStarted);
    assert_eq!(core.instance().status("rollback"), TaskStatus::NotStarted);

    Ok(())
}
