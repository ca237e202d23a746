// tests/process_executor.rs
#![cfg(unix)]

use std::error::Error;

use tokio::sync::mpsc;

use linkflow::engine::{CoreRuntime, FlowState, Runtime, RuntimeEvent};
use linkflow::errors::ActivityError;
use linkflow::exec::task_runner::execute;
use linkflow::exec::RealExecutorBackend;
use linkflow::flow::ActivityRequest;
use linkflow::model::TaskStatus;
use linkflow_test_utils::builders::{FlowBuilder, TaskConfigBuilder};
use linkflow_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn request(cmd: &str, retriable: &[i32]) -> ActivityRequest {
    ActivityRequest {
        task: "t".to_string(),
        cmd: cmd.to_string(),
        retriable_exit_codes: retriable.to_vec(),
        attempt: 1,
    }
}

#[tokio::test]
async fn captures_stdout_of_successful_process() {
    init_tracing();

    let output = with_timeout(execute(&request("echo hello; echo oops >&2", &[]))).await;
    assert_eq!(output, Ok("hello\n".to_string()));
}

#[tokio::test]
async fn exit_code_is_classified_by_retriable_list() {
    init_tracing();

    let retriable = with_timeout(execute(&request("exit 75", &[75]))).await;
    assert_eq!(
        retriable,
        Err(ActivityError::ExitStatus {
            code: 75,
            retriable: true
        })
    );

    let fatal = with_timeout(execute(&request("exit 1", &[75]))).await;
    assert_eq!(
        fatal,
        Err(ActivityError::ExitStatus {
            code: 1,
            retriable: false
        })
    );
}

#[tokio::test]
async fn runs_real_flow_with_branching_on_output() -> TestResult {
    init_tracing();

    let graph = FlowBuilder::new()
        .with_task("probe", TaskConfigBuilder::new("echo STATUS=green").build())
        .with_task("ship", TaskConfigBuilder::new("echo shipped").expect_stdout("^shipped").build())
        .with_task("page", TaskConfigBuilder::new("echo paging").build())
        .expression("probe", "ship", "STATUS=green")
        .otherwise("probe", "page")
        .graph();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = RealExecutorBackend::new(rt_tx.clone());
    let runtime = Runtime::new(CoreRuntime::new(graph), rt_rx, rt_tx, executor);

    let report = with_timeout(runtime.run()).await?;

    assert_eq!(report.state, FlowState::Completed);
    assert_eq!(report.status_of("ship"), Some(TaskStatus::Done));
    assert_eq!(report.status_of("page"), Some(TaskStatus::NotStarted));

    Ok(())
}
