#![allow(dead_code)]

use linkflow::behavior::{RepeatData, RepeatHandler, RepeatKind, TaskContext};
use linkflow::errors::FlowError;
use linkflow::model::EvalResult;

/// What a scripted repeat operation returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scripted {
    Wait,
    Done,
    /// `Ok(EvalResult::Fail(..))`
    Fail(String),
    /// `Err(..)`
    Err(String),
}

impl Scripted {
    fn to_result(&self, task: &str) -> Result<EvalResult, FlowError> {
        let error = |message: &str| FlowError::RepeatData {
            task: task.to_string(),
            message: message.to_string(),
        };
        match self {
            Scripted::Wait => Ok(EvalResult::Wait),
            Scripted::Done => Ok(EvalResult::Done),
            Scripted::Fail(message) => Ok(EvalResult::Fail(error(message))),
            Scripted::Err(message) => Err(error(message)),
        }
    }
}

/// A `RepeatHandler` with fixed answers and call recording.
#[derive(Debug, Clone)]
pub struct ScriptedRepeats {
    pub on_error: RepeatData,
    pub on_condition: RepeatData,
    /// Lookups of this kind fail.
    pub failing_lookup: Option<RepeatKind>,
    pub repeat_outcome: Scripted,
    pub expression_outcome: Scripted,
    pub repeats: Vec<(RepeatKind, RepeatData)>,
    pub expressions: Vec<RepeatData>,
}

impl Default for ScriptedRepeats {
    fn default() -> Self {
        Self {
            on_error: RepeatData::default(),
            on_condition: RepeatData::default(),
            failing_lookup: None,
            repeat_outcome: Scripted::Wait,
            expression_outcome: Scripted::Done,
            repeats: Vec::new(),
            expressions: Vec::new(),
        }
    }
}

impl ScriptedRepeats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_error(mut self, count: u32) -> Self {
        self.on_error = RepeatData {
            count,
            ..RepeatData::default()
        };
        self
    }

    pub fn on_condition(mut self, condition: &str, count: u32) -> Self {
        self.on_condition = RepeatData {
            count,
            condition: condition.to_string(),
            ..RepeatData::default()
        };
        self
    }

    pub fn failing_lookup(mut self, kind: RepeatKind) -> Self {
        self.failing_lookup = Some(kind);
        self
    }

    pub fn repeat_outcome(mut self, outcome: Scripted) -> Self {
        self.repeat_outcome = outcome;
        self
    }

    pub fn expression_outcome(mut self, outcome: Scripted) -> Self {
        self.expression_outcome = outcome;
        self
    }
}

impl RepeatHandler for ScriptedRepeats {
    fn repeat_data(&self, ctx: &dyn TaskContext, kind: RepeatKind) -> Result<RepeatData, FlowError> {
        if self.failing_lookup == Some(kind) {
            return Err(FlowError::RepeatData {
                task: ctx.task().name.clone(),
                message: format!("{kind} lookup failed"),
            });
        }
        Ok(match kind {
            RepeatKind::OnError => self.on_error.clone(),
            RepeatKind::OnCondition => self.on_condition.clone(),
        })
    }

    fn do_repeat(
        &mut self,
        ctx: &mut dyn TaskContext,
        data: &RepeatData,
        kind: RepeatKind,
    ) -> Result<EvalResult, FlowError> {
        self.repeats.push((kind, data.clone()));
        self.repeat_outcome.to_result(&ctx.task().name)
    }

    fn evaluate_expression(
        &mut self,
        ctx: &mut dyn TaskContext,
        data: &RepeatData,
    ) -> Result<EvalResult, FlowError> {
        self.expressions.push(data.clone());
        self.expression_outcome.to_result(&ctx.task().name)
    }
}
