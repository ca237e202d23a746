// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of a raw mpsc sender,
//! so tests can replace process execution with scripted results.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::engine::RuntimeEvent;
use crate::errors::{Error, Result};
use crate::flow::ActivityRequest;

use super::executor_loop::spawn_executor;

/// Trait abstracting how activities are executed.
///
/// Implementations must eventually answer every request with a
/// `RuntimeEvent::ActivityFinished` for the same task.
pub trait ExecutorBackend: Send {
    fn dispatch(
        &mut self,
        requests: Vec<ActivityRequest>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Executor backend used in production.
///
/// Forwards requests over an mpsc channel to the loop started by
/// [`spawn_executor`].
pub struct RealExecutorBackend {
    tx: mpsc::Sender<ActivityRequest>,
}

impl RealExecutorBackend {
    /// Spawns the background executor loop immediately.
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        let tx = spawn_executor(runtime_tx);
        Self { tx }
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn dispatch(
        &mut self,
        requests: Vec<ActivityRequest>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Clone the sender so the future doesn't borrow `self` across `await`.
        let tx = self.tx.clone();

        Box::pin(async move {
            for request in requests {
                tx.send(request).await.map_err(Error::from)?;
            }
            Ok(())
        })
    }
}
