// src/behavior/repeat.rs

//! Repeat policies and the collaborator that owns their lifecycle.

use std::fmt;
use std::time::Duration;

use crate::behavior::TaskContext;
use crate::errors::FlowError;
use crate::model::EvalResult;

/// Which repeat policy is being looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepeatKind {
    /// Re-run after a retriable error.
    OnError,
    /// Re-run while a condition holds.
    OnCondition,
}

impl fmt::Display for RepeatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RepeatKind::OnError => "ErrorRepeatData",
            RepeatKind::OnCondition => "OnCondRepeatData",
        };
        f.write_str(s)
    }
}

/// Current state of one repeat policy.
///
/// The default value (count 0, empty condition) means "not configured".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepeatData {
    /// Remaining repeat budget.
    pub count: u32,
    pub condition: String,
    pub interval: Duration,
}

impl RepeatData {
    pub fn has_condition(&self) -> bool {
        !self.condition.is_empty()
    }
}

/// Owner of repeat budgets: lookup, consumption and condition checks.
pub trait RepeatHandler {
    /// Fetch the policy of the given kind for the context's task.
    fn repeat_data(
        &self,
        ctx: &dyn TaskContext,
        kind: RepeatKind,
    ) -> Result<RepeatData, FlowError>;

    /// Consume one unit of budget and decide how evaluation continues.
    fn do_repeat(
        &mut self,
        ctx: &mut dyn TaskContext,
        data: &RepeatData,
        kind: RepeatKind,
    ) -> Result<EvalResult, FlowError>;

    /// Evaluate `data.condition` and decide whether the task repeats.
    fn evaluate_expression(
        &mut self,
        ctx: &mut dyn TaskContext,
        data: &RepeatData,
    ) -> Result<EvalResult, FlowError>;
}
