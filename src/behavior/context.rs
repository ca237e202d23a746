// src/behavior/context.rs

use crate::errors::{ActivityError, FlowError};
use crate::model::{Link, LinkId, LinkInstance, LinkStatus, Task, TaskStatus};

/// Mutable view of one task inside one running flow instance.
///
/// The behavior never owns this state; it reads and writes it only through
/// these methods.
pub trait TaskContext {
    /// Static definition of the task.
    fn task(&self) -> &Task;

    fn status(&self) -> TaskStatus;

    fn set_status(&mut self, status: TaskStatus);

    /// Incoming link instances, in definition order.
    fn from_link_instances(&self) -> Vec<LinkInstance>;

    /// Outgoing link instances, in definition order.
    fn to_link_instances(&self) -> Vec<LinkInstance>;

    /// Resolve a link instance. Implementations keep the first resolution
    /// and never accept `Pending`.
    fn set_link_status(&mut self, link: LinkId, status: LinkStatus);

    /// Run the unit of work one step. `Ok(false)` means "not finished yet".
    fn eval_activity(&mut self) -> Result<bool, ActivityError>;

    /// Second-phase finalization of a finished unit of work.
    fn post_eval_activity(&mut self) -> Result<(), ActivityError>;

    /// Evaluate the condition of an `Expression` link.
    fn eval_link(&mut self, link: &Link) -> Result<bool, FlowError>;

    /// Evaluate an expression against this task's scope.
    fn eval_expression(&mut self, expr: &str) -> Result<bool, FlowError>;
}
