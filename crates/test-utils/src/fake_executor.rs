use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use linkflow::engine::RuntimeEvent;
use linkflow::errors::{ActivityError, Result};
use linkflow::exec::ExecutorBackend;
use linkflow::flow::ActivityRequest;

type Script = HashMap<String, VecDeque<std::result::Result<String, ActivityError>>>;

/// A fake executor that:
/// - records which activities were requested, as `(task, attempt)`
/// - immediately reports `ActivityFinished` for each request, using the
///   scripted results for the task (empty stdout once the script runs out)
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<(String, u32)>>>,
    script: Script,
}

impl FakeExecutor {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        executed: Arc<Mutex<Vec<(String, u32)>>>,
    ) -> Self {
        Self {
            runtime_tx,
            executed,
            script: HashMap::new(),
        }
    }

    /// Queue the result of the next run of `task`.
    pub fn script(mut self, task: &str, result: std::result::Result<&str, ActivityError>) -> Self {
        self.script
            .entry(task.to_string())
            .or_default()
            .push_back(result.map(str::to_string));
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn dispatch(
        &mut self,
        requests: Vec<ActivityRequest>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);

        let finished: Vec<_> = requests
            .into_iter()
            .map(|r| {
                let result = self
                    .script
                    .get_mut(&r.task)
                    .and_then(VecDeque::pop_front)
                    .unwrap_or_else(|| Ok(String::new()));
                (r, result)
            })
            .collect();

        Box::pin(async move {
            for (request, result) in finished {
                {
                    let mut guard = executed.lock().unwrap();
                    guard.push((request.task.clone(), request.attempt));
                }

                tx.send(RuntimeEvent::ActivityFinished {
                    task: request.task,
                    result,
                })
                .await
                .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}
