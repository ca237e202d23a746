// src/model/status.rs

//! Runtime statuses and the results exchanged with the scheduler.

use std::cmp::Ordering;
use std::fmt;

use crate::errors::FlowError;
use crate::model::task::TaskEntry;

/// Status of a task within one flow instance.
///
/// Moves forward only: `NotStarted -> Entered -> {Ready | Skipped} -> {Done | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaskStatus {
    #[default]
    NotStarted,
    Entered,
    Ready,
    Skipped,
    Done,
    Failed,
}

impl TaskStatus {
    /// Whether an entry for this task should still be run through `enter`.
    pub fn accepts_entry(self) -> bool {
        matches!(self, TaskStatus::NotStarted | TaskStatus::Entered)
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Skipped | TaskStatus::Done | TaskStatus::Failed
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::NotStarted => "not started",
            TaskStatus::Entered => "entered",
            TaskStatus::Ready => "ready",
            TaskStatus::Skipped => "skipped",
            TaskStatus::Done => "done",
            TaskStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Status of a link instance.
///
/// `Pending` is the only unresolved value. The ordering is partial:
/// `Pending` sorts below every resolved value, and distinct resolved values
/// are incomparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LinkStatus {
    #[default]
    Pending,
    False,
    True,
    Skipped,
}

impl LinkStatus {
    pub fn is_resolved(self) -> bool {
        !matches!(self, LinkStatus::Pending)
    }
}

impl PartialOrd for LinkStatus {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.is_resolved(), other.is_resolved()) {
            (false, false) => Some(Ordering::Equal),
            (false, true) => Some(Ordering::Less),
            (true, false) => Some(Ordering::Greater),
            (true, true) if self == other => Some(Ordering::Equal),
            (true, true) => None,
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LinkStatus::Pending => "pending",
            LinkStatus::False => "false",
            LinkStatus::True => "true",
            LinkStatus::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Outcome of admitting a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnterResult {
    /// At least one incoming link is still pending.
    NotReady,
    /// Ready, and at least one incoming link resolved true.
    Eval,
    /// Every incoming link resolved, none of them true.
    Skip,
}

/// Outcome of one evaluation step.
#[derive(Debug)]
pub enum EvalResult {
    /// Not finished; the scheduler must evaluate again later.
    Wait,
    Done,
    Skip,
    Fail(FlowError),
}

impl EvalResult {
    pub fn is_fail(&self) -> bool {
        matches!(self, EvalResult::Fail(_))
    }
}

/// Result of `done` / `skip`: whether the flow must be told a terminal task
/// finished, plus the next frontier of entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Propagation {
    pub notify_flow: bool,
    pub entries: Vec<TaskEntry>,
}

impl Propagation {
    pub fn terminal() -> Self {
        Self {
            notify_flow: true,
            entries: Vec::new(),
        }
    }

    pub fn continue_with(entries: Vec<TaskEntry>) -> Self {
        Self {
            notify_flow: false,
            entries,
        }
    }
}

/// Result of routing an unrecovered error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultRouting {
    pub handled: bool,
    pub entries: Vec<TaskEntry>,
}

impl FaultRouting {
    pub fn unhandled() -> Self {
        Self::default()
    }
}
