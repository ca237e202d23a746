// src/flow/instance.rs

//! Runtime state of one flow instance and the [`TaskContext`] over it.

use std::collections::HashMap;
use std::mem;

use tracing::{debug, trace, warn};

use crate::behavior::TaskContext;
use crate::errors::{ActivityError, FlowError, Result};
use crate::expr;
use crate::flow::graph::FlowGraph;
use crate::model::{Link, LinkId, LinkInstance, LinkStatus, Task, TaskName, TaskStatus};

/// A request to start a task's activity, handed to the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRequest {
    pub task: TaskName,
    pub cmd: String,
    pub retriable_exit_codes: Vec<i32>,
    /// 1 for the first run, incremented on every repeat.
    pub attempt: u32,
}

/// Lifecycle of a task's activity within the instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ActivitySlot {
    #[default]
    Idle,
    Running,
    /// Completed, result not yet consumed by an evaluation.
    Finished(std::result::Result<String, ActivityError>),
}

#[derive(Debug, Default)]
struct InstanceState {
    statuses: HashMap<TaskName, TaskStatus>,
    links: Vec<LinkStatus>,
    activities: HashMap<TaskName, ActivitySlot>,
    attempts: HashMap<TaskName, u32>,
    /// Published activity output per task.
    outputs: HashMap<TaskName, String>,
    /// Activity requests produced since the last `take_requests`.
    requests: Vec<ActivityRequest>,
}

/// One running execution of a [`FlowGraph`].
#[derive(Debug)]
pub struct FlowInstance {
    graph: FlowGraph,
    state: InstanceState,
}

impl FlowInstance {
    pub fn new(graph: FlowGraph) -> Self {
        let state = InstanceState {
            links: vec![LinkStatus::Pending; graph.links().len()],
            ..InstanceState::default()
        };
        Self { graph, state }
    }

    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    pub fn status(&self, task: &str) -> TaskStatus {
        self.state.statuses.get(task).copied().unwrap_or_default()
    }

    pub fn link_status(&self, link: LinkId) -> LinkStatus {
        self.state.links.get(link.0).copied().unwrap_or_default()
    }

    pub fn output(&self, task: &str) -> Option<&str> {
        self.state.outputs.get(task).map(String::as_str)
    }

    pub fn attempts(&self, task: &str) -> u32 {
        self.state.attempts.get(task).copied().unwrap_or(0)
    }

    pub fn is_running(&self, task: &str) -> bool {
        matches!(self.state.activities.get(task), Some(ActivitySlot::Running))
    }

    pub fn running_count(&self) -> usize {
        self.state
            .activities
            .values()
            .filter(|slot| matches!(slot, ActivitySlot::Running))
            .count()
    }

    /// Status of every task, ordered by task name.
    pub fn task_statuses(&self) -> Vec<(TaskName, TaskStatus)> {
        self.graph
            .tasks()
            .map(|t| (t.name.clone(), self.status(&t.name)))
            .collect()
    }

    /// Borrow the context of one task.
    pub fn context(&mut self, task: &str) -> Result<InstanceTaskContext<'_>> {
        let task = self
            .graph
            .task(task)
            .ok_or_else(|| FlowError::TaskNotFound(task.to_string()))?;

        Ok(InstanceTaskContext {
            task,
            graph: &self.graph,
            state: &mut self.state,
        })
    }

    /// Record the result of a running activity.
    ///
    /// Returns `false` (and changes nothing) when the task has no activity
    /// in flight.
    pub fn finish_activity(
        &mut self,
        task: &str,
        result: std::result::Result<String, ActivityError>,
    ) -> bool {
        match self.state.activities.get_mut(task) {
            Some(slot) if matches!(slot, ActivitySlot::Running) => {
                *slot = ActivitySlot::Finished(result);
                true
            }
            other => {
                warn!(
                    task = %task,
                    slot = ?other,
                    "activity completion for a task with no running activity; ignoring"
                );
                false
            }
        }
    }

    /// Drain the activity requests produced by evaluations so far.
    pub fn take_requests(&mut self) -> Vec<ActivityRequest> {
        mem::take(&mut self.state.requests)
    }
}

/// [`TaskContext`] of one task in a [`FlowInstance`].
#[derive(Debug)]
pub struct InstanceTaskContext<'a> {
    task: &'a Task,
    graph: &'a FlowGraph,
    state: &'a mut InstanceState,
}

impl InstanceTaskContext<'_> {
    fn link_instances(&self, ids: &[LinkId]) -> Vec<LinkInstance> {
        ids.iter()
            .filter_map(|id| {
                let link = self.graph.link(*id)?;
                let status = self.state.links.get(id.0).copied().unwrap_or_default();
                Some(LinkInstance::new(link.clone(), status))
            })
            .collect()
    }

    fn output_of(&self, task: &str) -> &str {
        self.state.outputs.get(task).map(String::as_str).unwrap_or("")
    }
}

impl TaskContext for InstanceTaskContext<'_> {
    fn task(&self) -> &Task {
        self.task
    }

    fn status(&self) -> TaskStatus {
        self.state
            .statuses
            .get(&self.task.name)
            .copied()
            .unwrap_or_default()
    }

    fn set_status(&mut self, status: TaskStatus) {
        trace!(task = %self.task.name, %status, "task status");
        self.state.statuses.insert(self.task.name.clone(), status);
    }

    fn from_link_instances(&self) -> Vec<LinkInstance> {
        self.link_instances(self.graph.incoming(&self.task.name))
    }

    fn to_link_instances(&self) -> Vec<LinkInstance> {
        self.link_instances(self.graph.outgoing(&self.task.name))
    }

    fn set_link_status(&mut self, link: LinkId, status: LinkStatus) {
        let Some(current) = self.state.links.get_mut(link.0) else {
            warn!(task = %self.task.name, %link, "status for unknown link; ignoring");
            return;
        };

        if !status.is_resolved() {
            warn!(task = %self.task.name, %link, "refusing to reset link to pending");
            return;
        }

        if current.is_resolved() {
            if *current != status {
                warn!(
                    task = %self.task.name,
                    %link,
                    current = %current,
                    requested = %status,
                    "link already resolved; keeping first resolution"
                );
            }
            return;
        }

        trace!(task = %self.task.name, %link, %status, "link resolved");
        *current = status;
    }

    fn eval_activity(&mut self) -> std::result::Result<bool, ActivityError> {
        let name = &self.task.name;
        let state = &mut *self.state;
        let slot = state.activities.entry(name.clone()).or_default();

        match mem::take(slot) {
            ActivitySlot::Idle => {
                *slot = ActivitySlot::Running;

                let attempt = state.attempts.entry(name.clone()).or_insert(0);
                *attempt += 1;

                debug!(task = %name, attempt = *attempt, "requesting activity run");
                state.requests.push(ActivityRequest {
                    task: name.clone(),
                    cmd: self.task.activity.cmd.clone(),
                    retriable_exit_codes: self.task.activity.retriable_exit_codes.clone(),
                    attempt: *attempt,
                });
                Ok(false)
            }
            ActivitySlot::Running => {
                *slot = ActivitySlot::Running;
                Ok(false)
            }
            ActivitySlot::Finished(Ok(output)) => {
                state.outputs.insert(name.clone(), output);
                Ok(true)
            }
            ActivitySlot::Finished(Err(err)) => Err(err),
        }
    }

    fn post_eval_activity(&mut self) -> std::result::Result<(), ActivityError> {
        let Some(expect) = &self.task.activity.expect_stdout else {
            return Ok(());
        };

        match expr::evaluate(expect, self.output_of(&self.task.name)) {
            Ok(true) => Ok(()),
            Ok(false) => Err(ActivityError::UnexpectedOutput {
                pattern: expect.clone(),
            }),
            Err(err) => Err(ActivityError::fatal(err.to_string())),
        }
    }

    fn eval_link(&mut self, link: &Link) -> Result<bool> {
        let condition = link.condition.as_deref().ok_or_else(|| FlowError::LinkEval {
            link: link.id,
            message: "expression link has no condition".to_string(),
        })?;

        expr::evaluate(condition, self.output_of(&link.from)).map_err(|err| FlowError::LinkEval {
            link: link.id,
            message: err.to_string(),
        })
    }

    fn eval_expression(&mut self, source: &str) -> Result<bool> {
        expr::evaluate(source, self.output_of(&self.task.name))
    }
}
