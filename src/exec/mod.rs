// src/exec/mod.rs

//! Activity execution layer.
//!
//! Runs the shell commands behind task activities with
//! `tokio::process::Command` and reports results back to the runtime as
//! `RuntimeEvent::ActivityFinished`.
//!
//! - [`backend`] provides the `ExecutorBackend` trait and the production
//!   `RealExecutorBackend`; tests swap in a fake.
//! - [`executor_loop`] owns the background loop receiving activity requests.
//! - [`task_runner`] runs a single activity process.

pub mod backend;
pub mod executor_loop;
pub mod task_runner;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use executor_loop::spawn_executor;
