// src/engine/runtime.rs

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::behavior::{SimpleTaskBehavior, TaskBehavior};
use crate::errors::Result;
use crate::exec::ExecutorBackend;
use crate::flow::ActivityRequest;
use crate::model::TaskName;

use super::core::CoreRuntime;
use super::{CoreCommand, CoreStep, FlowReport, RuntimeEvent};

/// Drives a [`CoreRuntime`] in response to `RuntimeEvent`s and delegates
/// activity execution to an `ExecutorBackend`.
///
/// All flow semantics live in the core; this shell only reads events,
/// starts timers and hands activities to the executor.
pub struct Runtime<E: ExecutorBackend, B: TaskBehavior = SimpleTaskBehavior> {
    core: CoreRuntime<B>,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    /// Used to deliver delayed `EvalRequested` events.
    event_tx: mpsc::Sender<RuntimeEvent>,
    executor: E,
}

impl<E: ExecutorBackend, B: TaskBehavior> fmt::Debug for Runtime<E, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("state", self.core.state())
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend, B: TaskBehavior> Runtime<E, B> {
    pub fn new(
        core: CoreRuntime<B>,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        event_tx: mpsc::Sender<RuntimeEvent>,
        executor: E,
    ) -> Self {
        Self {
            core,
            event_rx,
            event_tx,
            executor,
        }
    }

    /// Main event loop.
    ///
    /// Starts the flow, then feeds events into the core until it reaches a
    /// final state. Returns the final report.
    pub async fn run(mut self) -> Result<FlowReport> {
        info!("linkflow runtime started");

        let step = self.core.start();
        let mut keep_running = self.apply(step).await?;

        while keep_running {
            let Some(event) = self.event_rx.recv().await else {
                warn!("runtime event channel closed; exiting");
                break;
            };

            debug!(?event, "runtime received event");
            let step = self.core.step(event);
            keep_running = self.apply(step).await?;
        }

        info!(state = %self.core.state(), "runtime exiting");
        Ok(self.core.report())
    }

    /// Execute the commands of one step; returns whether to keep running.
    async fn apply(&mut self, step: CoreStep) -> Result<bool> {
        for command in step.commands {
            self.execute_command(command).await?;
        }
        Ok(step.keep_running)
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchActivities(requests) => self.dispatch(requests).await?,
            CoreCommand::ScheduleEval { task, delay } => self.schedule_eval(task, delay),
            CoreCommand::Finish(state) => info!(%state, "flow finished"),
        }
        Ok(())
    }

    async fn dispatch(&mut self, requests: Vec<ActivityRequest>) -> Result<()> {
        if requests.is_empty() {
            return Ok(());
        }

        let names: Vec<_> = requests.iter().map(|r| r.task.as_str()).collect();
        debug!(?names, "dispatching activities");

        self.executor.dispatch(requests).await
    }

    fn schedule_eval(&self, task: TaskName, delay: Duration) {
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(RuntimeEvent::EvalRequested { task }).await.is_err() {
                debug!("runtime gone before delayed evaluation fired");
            }
        });
    }
}
