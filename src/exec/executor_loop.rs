// src/exec/executor_loop.rs

//! Background loop that turns activity requests into processes.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::RuntimeEvent;
use crate::exec::task_runner::run_activity;
use crate::flow::ActivityRequest;
use crate::model::TaskName;

/// Spawn the background executor loop.
///
/// Each request runs in its own Tokio task. The core never asks for a second
/// run of a task whose activity is still in flight; if that happens anyway
/// the request is still honoured and a warning is logged.
pub fn spawn_executor(runtime_tx: mpsc::Sender<RuntimeEvent>) -> mpsc::Sender<ActivityRequest> {
    let (tx, mut rx) = mpsc::channel::<ActivityRequest>(32);

    tokio::spawn(async move {
        info!("executor loop started");

        let mut active: HashMap<TaskName, JoinHandle<()>> = HashMap::new();

        while let Some(request) = rx.recv().await {
            active.retain(|_, handle| !handle.is_finished());

            if active.contains_key(&request.task) {
                warn!(
                    task = %request.task,
                    attempt = request.attempt,
                    "activity requested while a previous run is still active"
                );
            }

            let name = request.task.clone();
            let rt_tx = runtime_tx.clone();
            let handle = tokio::spawn(async move {
                let task = request.task.clone();
                run_activity(request, rt_tx).await;
                debug!(task = %task, "activity runner finished");
            });
            active.insert(name, handle);
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}
