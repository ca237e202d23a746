// src/flow/mod.rs

//! Flow definitions and instances.
//!
//! - [`graph`] is the static definition: tasks plus typed, ordered links.
//! - [`instance`] is the per-execution state and the concrete task context
//!   the behavior operates on.
//! - [`repeat_store`] keeps repeat budgets for an instance.

pub mod graph;
pub mod instance;
pub mod repeat_store;

pub use graph::FlowGraph;
pub use instance::{ActivityRequest, ActivitySlot, FlowInstance, InstanceTaskContext};
pub use repeat_store::MemoryRepeatStore;
