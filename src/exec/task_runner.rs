// src/exec/task_runner.rs

//! Single activity process runner.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::engine::RuntimeEvent;
use crate::errors::ActivityError;
use crate::flow::ActivityRequest;

/// Run one activity and report its result as `ActivityFinished`.
pub async fn run_activity(request: ActivityRequest, runtime_tx: mpsc::Sender<RuntimeEvent>) {
    let task = request.task.clone();
    let result = execute(&request).await;

    if let Err(err) = &result {
        debug!(task = %task, error = %err, retriable = err.is_retriable(), "activity failed");
    }

    if runtime_tx
        .send(RuntimeEvent::ActivityFinished {
            task: task.clone(),
            result,
        })
        .await
        .is_err()
    {
        error!(task = %task, "runtime gone; dropping activity result");
    }
}

/// Build a shell command appropriate for the platform.
fn shell_command(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}

/// Run the process to completion; `Ok` carries its stdout.
pub async fn execute(request: &ActivityRequest) -> Result<String, ActivityError> {
    info!(
        task = %request.task,
        attempt = request.attempt,
        cmd = %request.cmd,
        "starting activity process"
    );

    let mut cmd = shell_command(&request.cmd);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|err| {
        ActivityError::Launch(format!("spawning process for task '{}': {err}", request.task))
    })?;

    // Always consume stderr so buffers don't fill; log at debug.
    if let Some(stderr) = child.stderr.take() {
        let task = request.task.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(task = %task, "stderr: {}", line);
            }
        });
    }

    let mut output = String::new();
    if let Some(mut stdout) = child.stdout.take() {
        stdout.read_to_string(&mut output).await.map_err(|err| {
            ActivityError::fatal(format!("reading stdout of task '{}': {err}", request.task))
        })?;
    }

    let status = child.wait().await.map_err(|err| {
        ActivityError::fatal(format!("waiting for process of task '{}': {err}", request.task))
    })?;

    for line in output.lines() {
        debug!(task = %request.task, "stdout: {}", line);
    }

    let code = status.code().unwrap_or(-1);
    info!(
        task = %request.task,
        attempt = request.attempt,
        exit_code = code,
        success = status.success(),
        "activity process exited"
    );

    if status.success() {
        Ok(output)
    } else {
        Err(ActivityError::ExitStatus {
            code,
            retriable: request.retriable_exit_codes.contains(&code),
        })
    }
}
