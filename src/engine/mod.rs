// src/engine/mod.rs

//! Orchestration engine for linkflow.
//!
//! This module ties together:
//! - a flow instance and its repeat budgets
//! - the task behavior that moves each task through its states
//! - the main runtime event loop that reacts to:
//!   - activity completion events
//!   - delayed re-evaluation requests
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::fmt;
use std::time::Duration;

use crate::errors::ActivityError;
use crate::flow::ActivityRequest;
use crate::model::{TaskName, TaskStatus};

/// Events flowing into the runtime from executors, timers and signals.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// An activity finished; `Ok` carries its stdout.
    ActivityFinished {
        task: TaskName,
        result: Result<String, ActivityError>,
    },
    /// A delayed re-evaluation is due.
    EvalRequested { task: TaskName },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Overall state of a flow instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    Running,
    /// No work left.
    Completed,
    /// A fault was not handled by any error link.
    Failed { task: TaskName, error: String },
    Cancelled,
}

impl FlowState {
    pub fn is_running(&self) -> bool {
        matches!(self, FlowState::Running)
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowState::Running => f.write_str("running"),
            FlowState::Completed => f.write_str("completed"),
            FlowState::Failed { task, error } => write!(f, "failed at '{task}': {error}"),
            FlowState::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Start these activities.
    DispatchActivities(Vec<ActivityRequest>),
    /// Send `EvalRequested` for `task` once `delay` has elapsed.
    ScheduleEval { task: TaskName, delay: Duration },
    /// The flow reached a final state.
    Finish(FlowState),
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

/// Summary of a finished (or interrupted) flow instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowReport {
    pub flow: String,
    pub state: FlowState,
    /// Final status of every task, ordered by task name.
    pub tasks: Vec<(TaskName, TaskStatus)>,
    /// End tasks that notified the flow, in notification order.
    pub notified: Vec<TaskName>,
}

impl FlowReport {
    pub fn status_of(&self, task: &str) -> Option<TaskStatus> {
        self.tasks
            .iter()
            .find(|(name, _)| name == task)
            .map(|(_, status)| *status)
    }
}

pub mod core;
pub mod runtime;

pub use core::CoreRuntime;
pub use runtime::Runtime;
