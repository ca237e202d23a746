// src/model/task.rs

//! Static task definitions.

use std::time::Duration;

/// Canonical task name type used throughout the crate.
pub type TaskName = String;

/// How a task's unit of work is run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityConfig {
    /// Shell command executed for the activity.
    pub cmd: String,
    /// Exit codes that mark a failure as retriable.
    pub retriable_exit_codes: Vec<i32>,
    /// Condition the activity output must satisfy during post-evaluation.
    pub expect_stdout: Option<String>,
}

impl ActivityConfig {
    pub fn new(cmd: &str) -> Self {
        Self {
            cmd: cmd.to_string(),
            ..Self::default()
        }
    }
}

/// One configured repeat policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepeatPolicy {
    /// Repeat budget. For condition repeats `0` means unbounded.
    pub count: u32,
    /// Continuation condition; empty for error repeats.
    pub condition: String,
    /// Delay before the repeated evaluation.
    pub interval: Duration,
}

/// Repeat policies attached to a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepeatSettings {
    pub on_error: Option<RepeatPolicy>,
    pub while_condition: Option<RepeatPolicy>,
}

/// A graph node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub name: TaskName,
    pub activity: ActivityConfig,
    pub repeat: RepeatSettings,
}

impl Task {
    pub fn new(name: &str, activity: ActivityConfig) -> Self {
        Self {
            name: name.to_string(),
            activity,
            repeat: RepeatSettings::default(),
        }
    }
}

/// Work item naming a successor task the scheduler should enter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskEntry {
    pub task: TaskName,
}

impl TaskEntry {
    pub fn new(task: impl Into<TaskName>) -> Self {
        Self { task: task.into() }
    }
}
