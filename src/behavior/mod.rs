// src/behavior/mod.rs

//! Per-task execution behavior.
//!
//! The scheduler drives one task through these operations, one transition
//! at a time:
//!
//! ```text
//! enter ──Eval──> eval (repeat while Wait) ──Done──> post_eval ──Done──> done
//!   │                │                                   │
//!   └──Skip──> skip  └──Fail──> error                    └──Fail──> error
//! ```
//!
//! - [`context`] is the capability surface of one task in one flow instance.
//! - [`repeat`] describes repeat policies and their owning collaborator.
//! - [`simple`] is the default behavior.

pub mod context;
pub mod repeat;
pub mod simple;

pub use context::TaskContext;
pub use repeat::{RepeatData, RepeatHandler, RepeatKind};
pub use simple::SimpleTaskBehavior;

use crate::errors::{FlowError, Result};
use crate::model::{EnterResult, EvalResult, FaultRouting, Propagation};

/// State machine governing a single task.
pub trait TaskBehavior {
    /// Decide whether the task starts, is skipped, or must wait for more
    /// predecessors.
    fn enter(&self, ctx: &mut dyn TaskContext) -> EnterResult;

    /// Drive the unit of work, repeating on retriable errors or conditions.
    fn eval(&self, ctx: &mut dyn TaskContext, repeats: &mut dyn RepeatHandler) -> EvalResult;

    /// Second-phase completion of a finished unit of work.
    fn post_eval(&self, ctx: &mut dyn TaskContext, repeats: &mut dyn RepeatHandler) -> EvalResult;

    /// Resolve outgoing links after normal completion.
    fn done(&self, ctx: &mut dyn TaskContext) -> Result<Propagation>;

    /// Propagate a skip to every outgoing link.
    fn skip(&self, ctx: &mut dyn TaskContext) -> Propagation;

    /// Route an unrecovered error to the task's error links, if it has any.
    fn error(&self, ctx: &mut dyn TaskContext, err: &FlowError) -> FaultRouting;
}
