// src/flow/graph.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::FlowFile;
use crate::errors::{FlowError, Result};
use crate::model::{Link, LinkId, Task, TaskName};

/// Internal node structure: the task plus its ordered link adjacency.
#[derive(Debug, Clone)]
struct TaskNode {
    task: Task,
    incoming: Vec<LinkId>,
    outgoing: Vec<LinkId>,
}

/// Static flow definition: tasks keyed by name, links indexed by [`LinkId`].
///
/// Acyclicity is checked when the definition is validated; here we only
/// keep adjacency for the scheduler and task contexts.
#[derive(Debug, Clone)]
pub struct FlowGraph {
    name: String,
    nodes: BTreeMap<TaskName, TaskNode>,
    links: Vec<Arc<Link>>,
}

impl FlowGraph {
    /// Build a graph from a validated [`FlowFile`].
    pub fn from_flow(flow: &FlowFile) -> Self {
        let tasks = flow
            .task
            .iter()
            .map(|(name, cfg)| cfg.to_task(name))
            .collect();

        let links = flow
            .link
            .iter()
            .enumerate()
            .map(|(idx, cfg)| Link {
                id: LinkId(idx),
                from: cfg.from.clone(),
                to: cfg.to.clone(),
                link_type: cfg.link_type,
                condition: cfg.condition.clone(),
            })
            .collect();

        Self::build(&flow.flow.name, tasks, links)
    }

    /// Build a graph from already constructed tasks and links.
    ///
    /// Link ids are reassigned to their position in `links`. Fails if a link
    /// refers to a task that is not in `tasks`.
    pub fn new(name: &str, tasks: Vec<Task>, links: Vec<Link>) -> Result<Self> {
        for link in &links {
            for endpoint in [&link.from, &link.to] {
                if !tasks.iter().any(|t| &t.name == endpoint) {
                    return Err(FlowError::TaskNotFound(endpoint.clone()));
                }
            }
        }
        Ok(Self::build(name, tasks, links))
    }

    fn build(name: &str, tasks: Vec<Task>, links: Vec<Link>) -> Self {
        let mut nodes: BTreeMap<TaskName, TaskNode> = tasks
            .into_iter()
            .map(|task| {
                (
                    task.name.clone(),
                    TaskNode {
                        task,
                        incoming: Vec::new(),
                        outgoing: Vec::new(),
                    },
                )
            })
            .collect();

        let mut stored = Vec::with_capacity(links.len());
        for (idx, mut link) in links.into_iter().enumerate() {
            link.id = LinkId(idx);

            if let Some(node) = nodes.get_mut(&link.from) {
                node.outgoing.push(link.id);
            }
            if let Some(node) = nodes.get_mut(&link.to) {
                node.incoming.push(link.id);
            }
            stored.push(Arc::new(link));
        }

        Self {
            name: name.to_string(),
            nodes,
            links: stored,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn task(&self, name: &str) -> Option<&Task> {
        self.nodes.get(name).map(|n| &n.task)
    }

    /// All tasks, ordered by name.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.nodes.values().map(|n| &n.task)
    }

    pub fn link(&self, id: LinkId) -> Option<&Arc<Link>> {
        self.links.get(id.0)
    }

    pub fn links(&self) -> &[Arc<Link>] {
        &self.links
    }

    /// Incoming links of a task, in definition order.
    pub fn incoming(&self, name: &str) -> &[LinkId] {
        self.nodes
            .get(name)
            .map(|n| n.incoming.as_slice())
            .unwrap_or(&[])
    }

    /// Outgoing links of a task, in definition order.
    pub fn outgoing(&self, name: &str) -> &[LinkId] {
        self.nodes
            .get(name)
            .map(|n| n.outgoing.as_slice())
            .unwrap_or(&[])
    }

    /// Tasks without incoming links, ordered by name; a flow instance
    /// starts here.
    pub fn root_tasks(&self) -> Vec<TaskName> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.incoming.is_empty())
            .map(|(name, _)| name.clone())
            .collect()
    }
}
