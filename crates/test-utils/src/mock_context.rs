#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use linkflow::behavior::TaskContext;
use linkflow::errors::{ActivityError, FlowError};
use linkflow::model::{
    ActivityConfig, Link, LinkId, LinkInstance, LinkStatus, LinkType, Task, TaskStatus,
};

/// Number of calls made to each unit-of-work hook.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub eval_activity: usize,
    pub post_eval_activity: usize,
    pub eval_link: usize,
    pub eval_expression: usize,
}

/// A scripted `TaskContext` for driving the behavior without a flow
/// instance.
///
/// - link ids are handed out in the order links are added
/// - scripted activity results are consumed front to back; once exhausted,
///   `eval_activity` reports `Ok(true)` and `post_eval_activity` `Ok(())`
/// - every status and link write is recorded
pub struct MockTaskContext {
    pub task: Task,
    pub status: TaskStatus,
    pub status_history: Vec<TaskStatus>,
    pub incoming: Vec<LinkInstance>,
    pub outgoing: Vec<LinkInstance>,
    pub link_writes: Vec<(LinkId, LinkStatus)>,
    pub activity_results: VecDeque<Result<bool, ActivityError>>,
    pub post_results: VecDeque<Result<(), ActivityError>>,
    /// Result of `eval_link` per target task; missing targets evaluate false.
    pub link_results: HashMap<String, Result<bool, String>>,
    pub expression_results: VecDeque<Result<bool, String>>,
    pub calls: CallCounts,
    next_id: usize,
}

impl MockTaskContext {
    pub fn new(name: &str) -> Self {
        Self {
            task: Task::new(name, ActivityConfig::new(&format!("echo {name}"))),
            status: TaskStatus::NotStarted,
            status_history: Vec::new(),
            incoming: Vec::new(),
            outgoing: Vec::new(),
            link_writes: Vec::new(),
            activity_results: VecDeque::new(),
            post_results: VecDeque::new(),
            link_results: HashMap::new(),
            expression_results: VecDeque::new(),
            calls: CallCounts::default(),
            next_id: 0,
        }
    }

    fn next_link(&mut self, from: &str, to: &str, link_type: LinkType) -> Link {
        let link = Link::new(self.next_id, from, to, link_type);
        self.next_id += 1;
        link
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn incoming(mut self, from: &str, status: LinkStatus) -> Self {
        let name = self.task.name.clone();
        let link = self.next_link(from, &name, LinkType::Normal);
        self.incoming.push(LinkInstance::new(Arc::new(link), status));
        self
    }

    pub fn outgoing(mut self, to: &str, link_type: LinkType) -> Self {
        let name = self.task.name.clone();
        let mut link = self.next_link(&name, to, link_type);
        if link_type == LinkType::Expression {
            link.condition = Some(format!("go-{to}"));
        }
        self.outgoing
            .push(LinkInstance::new(Arc::new(link), LinkStatus::Pending));
        self
    }

    /// Outgoing expression link whose condition evaluates to `result`.
    pub fn expression(mut self, to: &str, result: bool) -> Self {
        self.link_results.insert(to.to_string(), Ok(result));
        self.outgoing(to, LinkType::Expression)
    }

    /// Outgoing expression link whose evaluation fails.
    pub fn broken_expression(mut self, to: &str, message: &str) -> Self {
        self.link_results
            .insert(to.to_string(), Err(message.to_string()));
        self.outgoing(to, LinkType::Expression)
    }

    pub fn activity(mut self, result: Result<bool, ActivityError>) -> Self {
        self.activity_results.push_back(result);
        self
    }

    pub fn post_activity(mut self, result: Result<(), ActivityError>) -> Self {
        self.post_results.push_back(result);
        self
    }

    pub fn expression_result(mut self, result: Result<bool, String>) -> Self {
        self.expression_results.push_back(result);
        self
    }

    /// Last status written for the link towards `to`.
    pub fn written(&self, to: &str) -> Option<LinkStatus> {
        let id = self
            .outgoing
            .iter()
            .find(|inst| inst.link.to == to)?
            .id();
        self.link_writes
            .iter()
            .rev()
            .find(|(link, _)| *link == id)
            .map(|(_, status)| *status)
    }

    /// Number of writes per link; a correct behavior writes each at most once.
    pub fn writes_per_link(&self) -> HashMap<LinkId, usize> {
        let mut counts = HashMap::new();
        for (id, _) in &self.link_writes {
            *counts.entry(*id).or_insert(0) += 1;
        }
        counts
    }
}

impl TaskContext for MockTaskContext {
    fn task(&self) -> &Task {
        &self.task
    }

    fn status(&self) -> TaskStatus {
        self.status
    }

    fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
        self.status_history.push(status);
    }

    fn from_link_instances(&self) -> Vec<LinkInstance> {
        self.incoming.clone()
    }

    fn to_link_instances(&self) -> Vec<LinkInstance> {
        self.outgoing.clone()
    }

    fn set_link_status(&mut self, link: LinkId, status: LinkStatus) {
        self.link_writes.push((link, status));
        for inst in self.incoming.iter_mut().chain(self.outgoing.iter_mut()) {
            if inst.id() == link {
                inst.status = status;
            }
        }
    }

    fn eval_activity(&mut self) -> Result<bool, ActivityError> {
        self.calls.eval_activity += 1;
        self.activity_results.pop_front().unwrap_or(Ok(true))
    }

    fn post_eval_activity(&mut self) -> Result<(), ActivityError> {
        self.calls.post_eval_activity += 1;
        self.post_results.pop_front().unwrap_or(Ok(()))
    }

    fn eval_link(&mut self, link: &Link) -> Result<bool, FlowError> {
        self.calls.eval_link += 1;
        match self.link_results.get(&link.to) {
            Some(Ok(result)) => Ok(*result),
            Some(Err(message)) => Err(FlowError::LinkEval {
                link: link.id,
                message: message.clone(),
            }),
            None => Ok(false),
        }
    }

    fn eval_expression(&mut self, _source: &str) -> Result<bool, FlowError> {
        self.calls.eval_expression += 1;
        match self.expression_results.pop_front() {
            Some(Ok(result)) => Ok(result),
            Some(Err(message)) => Err(FlowError::Expression(message)),
            None => Ok(false),
        }
    }
}
