// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! The core consumes [`RuntimeEvent`]s and produces:
//! - an updated flow instance
//! - a list of [`CoreCommand`]s describing what the IO shell should do next
//!
//! It has no channels, no timers and no processes, so it can be unit tested
//! by feeding events by hand.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, error, info, warn};

use crate::behavior::{SimpleTaskBehavior, TaskBehavior};
use crate::engine::{CoreCommand, CoreStep, FlowReport, FlowState, RuntimeEvent};
use crate::errors::FlowError;
use crate::flow::{FlowGraph, FlowInstance, MemoryRepeatStore};
use crate::model::{EnterResult, EvalResult, Propagation, TaskEntry, TaskName, TaskStatus};

/// Unit of work inside one `drive` pass.
#[derive(Debug)]
enum Work {
    Enter(TaskName),
    Eval(TaskName),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Eval,
    PostEval,
}

#[derive(Debug)]
pub struct CoreRuntime<B: TaskBehavior = SimpleTaskBehavior> {
    instance: FlowInstance,
    repeats: MemoryRepeatStore,
    behavior: B,
    state: FlowState,
    /// Tasks with a delayed evaluation outstanding.
    scheduled: HashSet<TaskName>,
    notified: Vec<TaskName>,
}

impl CoreRuntime<SimpleTaskBehavior> {
    pub fn new(graph: FlowGraph) -> Self {
        Self::with_behavior(graph, SimpleTaskBehavior::new())
    }
}

impl<B: TaskBehavior> CoreRuntime<B> {
    pub fn with_behavior(graph: FlowGraph, behavior: B) -> Self {
        Self {
            instance: FlowInstance::new(graph),
            repeats: MemoryRepeatStore::new(),
            behavior,
            state: FlowState::Running,
            scheduled: HashSet::new(),
            notified: Vec::new(),
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn instance(&self) -> &FlowInstance {
        &self.instance
    }

    pub fn repeats(&self) -> &MemoryRepeatStore {
        &self.repeats
    }

    /// End tasks that notified the flow so far.
    pub fn notified(&self) -> &[TaskName] {
        &self.notified
    }

    pub fn report(&self) -> FlowReport {
        FlowReport {
            flow: self.instance.graph().name().to_string(),
            state: self.state.clone(),
            tasks: self.instance.task_statuses(),
            notified: self.notified.clone(),
        }
    }

    /// Admit every root task.
    pub fn start(&mut self) -> CoreStep {
        let roots = self.instance.graph().root_tasks();
        info!(flow = %self.instance.graph().name(), ?roots, "starting flow");

        let queue = roots.into_iter().map(Work::Enter).collect();
        self.drive(queue)
    }

    /// Handle a single runtime event.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        if !self.state.is_running() {
            debug!(?event, state = %self.state, "flow no longer running; ignoring event");
            return CoreStep {
                commands: Vec::new(),
                keep_running: false,
            };
        }

        match event {
            RuntimeEvent::ActivityFinished { task, result } => {
                debug!(task = %task, ok = result.is_ok(), "activity finished");
                let mut queue = VecDeque::new();
                if self.instance.finish_activity(&task, result) {
                    queue.push_back(Work::Eval(task));
                }
                self.drive(queue)
            }
            RuntimeEvent::EvalRequested { task } => {
                self.scheduled.remove(&task);
                let mut queue = VecDeque::new();
                if self.instance.status(&task) == TaskStatus::Ready {
                    queue.push_back(Work::Eval(task));
                } else {
                    debug!(task = %task, "delayed evaluation for a task that is not ready; ignoring");
                }
                self.drive(queue)
            }
            RuntimeEvent::ShutdownRequested => {
                info!("shutdown requested; cancelling flow");
                self.state = FlowState::Cancelled;
                self.finish_step(Vec::new())
            }
        }
    }

    fn drive(&mut self, mut queue: VecDeque<Work>) -> CoreStep {
        let mut commands = Vec::new();

        while let Some(work) = queue.pop_front() {
            if !self.state.is_running() {
                break;
            }
            match work {
                Work::Enter(task) => self.enter(task, &mut queue),
                Work::Eval(task) => self.evaluate(task, Phase::Eval, &mut queue, &mut commands),
            }
        }

        self.finish_step(commands)
    }

    fn enter(&mut self, task: TaskName, queue: &mut VecDeque<Work>) {
        let status = self.instance.status(&task);
        if !status.accepts_entry() {
            debug!(task = %task, %status, "task already past entry; ignoring entry");
            return;
        }

        let entered = self
            .instance
            .context(&task)
            .map(|mut ctx| self.behavior.enter(&mut ctx));
        let result = match entered {
            Ok(result) => result,
            Err(err) => return self.fail_flow(&task, err),
        };

        match result {
            EnterResult::NotReady => {}
            EnterResult::Eval => queue.push_back(Work::Eval(task)),
            EnterResult::Skip => self.propagate_skip(&task, queue),
        }
    }

    fn evaluate(
        &mut self,
        task: TaskName,
        phase: Phase,
        queue: &mut VecDeque<Work>,
        commands: &mut Vec<CoreCommand>,
    ) {
        let behavior = &self.behavior;
        let repeats = &mut self.repeats;
        let result = self
            .instance
            .context(&task)
            .map(|mut ctx| match phase {
                Phase::Eval => behavior.eval(&mut ctx, repeats),
                Phase::PostEval => behavior.post_eval(&mut ctx, repeats),
            })
            .unwrap_or_else(EvalResult::Fail);

        match (result, phase) {
            (EvalResult::Wait, _) => self.wait(task, queue, commands),
            (EvalResult::Done, Phase::Eval) => self.evaluate(task, Phase::PostEval, queue, commands),
            (EvalResult::Done, Phase::PostEval) => self.complete(&task, queue),
            (EvalResult::Skip, _) => self.propagate_skip(&task, queue),
            (EvalResult::Fail(err), _) => self.route_fault(&task, err, queue),
        }
    }

    /// The task is waiting either for its running activity or for a repeat.
    fn wait(&mut self, task: TaskName, queue: &mut VecDeque<Work>, commands: &mut Vec<CoreCommand>) {
        if self.instance.is_running(&task) {
            debug!(task = %task, "waiting for activity");
            return;
        }

        match self.repeats.take_delay(&task) {
            Some(delay) if !delay.is_zero() => {
                debug!(task = %task, delay_ms = delay.as_millis() as u64, "scheduling delayed evaluation");
                self.scheduled.insert(task.clone());
                commands.push(CoreCommand::ScheduleEval { task, delay });
            }
            _ => queue.push_back(Work::Eval(task)),
        }
    }

    fn complete(&mut self, task: &str, queue: &mut VecDeque<Work>) {
        let result = self
            .instance
            .context(task)
            .and_then(|mut ctx| self.behavior.done(&mut ctx));

        match result {
            Ok(propagation) => self.propagate(task, propagation, queue),
            Err(err) => {
                error!(task = %task, error = %err, "resolving outgoing links failed");
                self.fail_flow(task, err);
            }
        }
    }

    fn propagate_skip(&mut self, task: &str, queue: &mut VecDeque<Work>) {
        let skipped = self
            .instance
            .context(task)
            .map(|mut ctx| self.behavior.skip(&mut ctx));
        match skipped {
            Ok(propagation) => self.propagate(task, propagation, queue),
            Err(err) => self.fail_flow(task, err),
        }
    }

    fn route_fault(&mut self, task: &str, err: FlowError, queue: &mut VecDeque<Work>) {
        let routed = self
            .instance
            .context(task)
            .map(|mut ctx| self.behavior.error(&mut ctx, &err));
        let routing = match routed {
            Ok(routing) => routing,
            Err(lookup) => return self.fail_flow(task, lookup),
        };

        if routing.handled {
            warn!(task = %task, error = %err, "task failed; following error links");
            queue.extend(routing.entries.into_iter().map(enter_work));
        } else {
            error!(task = %task, error = %err, "task failed and no error link handles it");
            self.fail_flow(task, err);
        }
    }

    fn propagate(&mut self, task: &str, propagation: Propagation, queue: &mut VecDeque<Work>) {
        if propagation.notify_flow {
            debug!(task = %task, "end task notified flow");
            self.notified.push(task.to_string());
        }
        queue.extend(propagation.entries.into_iter().map(enter_work));
    }

    fn fail_flow(&mut self, task: &str, err: FlowError) {
        self.state = FlowState::Failed {
            task: task.to_string(),
            error: err.to_string(),
        };
    }

    fn finish_step(&mut self, mut commands: Vec<CoreCommand>) -> CoreStep {
        if self.state.is_running() {
            let requests = self.instance.take_requests();
            if !requests.is_empty() {
                commands.push(CoreCommand::DispatchActivities(requests));
            }

            if self.scheduled.is_empty() && self.instance.running_count() == 0 {
                info!(flow = %self.instance.graph().name(), "no work left; flow completed");
                self.state = FlowState::Completed;
            }
        }

        if self.state.is_running() {
            return CoreStep {
                commands,
                keep_running: true,
            };
        }

        // Requests queued before the flow stopped are dropped.
        commands.retain(|c| !matches!(c, CoreCommand::DispatchActivities(_)));
        commands.push(CoreCommand::Finish(self.state.clone()));
        CoreStep {
            commands,
            keep_running: false,
        }
    }
}

fn enter_work(entry: TaskEntry) -> Work {
    Work::Enter(entry.task)
}
