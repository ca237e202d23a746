// src/flow/repeat_store.rs

//! In-memory repeat budgets for one flow instance.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{info, warn};

use crate::behavior::{RepeatData, RepeatHandler, RepeatKind, TaskContext};
use crate::errors::{FlowError, Result};
use crate::model::{EvalResult, RepeatPolicy, Task, TaskName};

/// [`RepeatHandler`] that keeps remaining budgets in memory.
///
/// Budgets start at the task's configured `count` and are decremented on
/// every repeat. They are lost when the instance goes away.
#[derive(Debug, Default)]
pub struct MemoryRepeatStore {
    remaining: HashMap<(TaskName, RepeatKind), u32>,
    /// Delay requested by the latest repeat of each task.
    delays: HashMap<TaskName, Duration>,
}

fn policy(task: &Task, kind: RepeatKind) -> Option<&RepeatPolicy> {
    match kind {
        RepeatKind::OnError => task.repeat.on_error.as_ref(),
        RepeatKind::OnCondition => task.repeat.while_condition.as_ref(),
    }
}

impl MemoryRepeatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining budget, if the policy has been touched yet.
    pub fn remaining(&self, task: &str, kind: RepeatKind) -> Option<u32> {
        self.remaining.get(&(task.to_string(), kind)).copied()
    }

    /// Hand the delay of the latest repeat to the scheduler.
    pub fn take_delay(&mut self, task: &str) -> Option<Duration> {
        self.delays.remove(task)
    }

    fn consume(&mut self, task: &str, kind: RepeatKind, data: &RepeatData) -> Result<EvalResult> {
        if data.count == 0 {
            return Ok(EvalResult::Fail(FlowError::RepeatData {
                task: task.to_string(),
                message: format!("{} budget exhausted", kind),
            }));
        }

        let left = data.count - 1;
        self.remaining.insert((task.to_string(), kind), left);
        self.delays.insert(task.to_string(), data.interval);

        info!(
            task = %task,
            kind = %kind,
            remaining = left,
            interval_ms = data.interval.as_millis() as u64,
            "repeating task"
        );
        Ok(EvalResult::Wait)
    }
}

impl RepeatHandler for MemoryRepeatStore {
    fn repeat_data(&self, ctx: &dyn TaskContext, kind: RepeatKind) -> Result<RepeatData> {
        let task = ctx.task();
        let Some(policy) = policy(task, kind) else {
            return Ok(RepeatData::default());
        };

        let count = self
            .remaining(&task.name, kind)
            .unwrap_or(policy.count);

        Ok(RepeatData {
            count,
            condition: policy.condition.clone(),
            interval: policy.interval,
        })
    }

    fn do_repeat(
        &mut self,
        ctx: &mut dyn TaskContext,
        data: &RepeatData,
        kind: RepeatKind,
    ) -> Result<EvalResult> {
        let task = ctx.task().name.clone();
        self.consume(&task, kind, data)
    }

    fn evaluate_expression(
        &mut self,
        ctx: &mut dyn TaskContext,
        data: &RepeatData,
    ) -> Result<EvalResult> {
        let holds = ctx.eval_expression(&data.condition)?;
        let task = ctx.task();

        if !holds {
            return Ok(EvalResult::Done);
        }

        let unbounded = policy(task, RepeatKind::OnCondition).is_some_and(|p| p.count == 0);
        if unbounded {
            info!(task = %task.name, condition = %data.condition, "condition holds; repeating task");
            self.delays.insert(task.name.clone(), data.interval);
            return Ok(EvalResult::Wait);
        }

        if data.count > 0 {
            let name = task.name.clone();
            return self.consume(&name, RepeatKind::OnCondition, data);
        }

        warn!(
            task = %task.name,
            condition = %data.condition,
            "condition still holds but repeat budget is exhausted; continuing"
        );
        Ok(EvalResult::Done)
    }
}
