// src/model/mod.rs

//! Flow data model.
//!
//! - [`task`] holds static task definitions and task entries.
//! - [`link`] holds typed edges and their per-instance snapshots.
//! - [`status`] holds task/link statuses and the results the behavior
//!   hands back to the scheduler.

pub mod link;
pub mod status;
pub mod task;

pub use link::{Link, LinkId, LinkInstance, LinkType};
pub use status::{EnterResult, EvalResult, FaultRouting, LinkStatus, Propagation, TaskStatus};
pub use task::{ActivityConfig, RepeatPolicy, RepeatSettings, Task, TaskEntry, TaskName};
