// src/config/validate.rs

use std::collections::HashSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{FlowFile, RawFlowFile};
use crate::errors::{FlowError, Result};
use crate::expr::Condition;
use crate::model::LinkType;

impl TryFrom<RawFlowFile> for FlowFile {
    type Error = FlowError;

    fn try_from(raw: RawFlowFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_flow(&raw)?;
        Ok(FlowFile::new_unchecked(raw.flow, raw.task, raw.link))
    }
}

fn validate_raw_flow(flow: &RawFlowFile) -> Result<()> {
    ensure_has_tasks(flow)?;
    validate_tasks(flow)?;
    validate_links(flow)?;
    validate_dag(flow)?;
    Ok(())
}

fn ensure_has_tasks(flow: &RawFlowFile) -> Result<()> {
    if flow.task.is_empty() {
        return Err(FlowError::Config(
            "flow must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_tasks(flow: &RawFlowFile) -> Result<()> {
    for (name, task) in flow.task.iter() {
        if task.cmd.trim().is_empty() {
            return Err(FlowError::Config(format!(
                "task '{}' has an empty `cmd`",
                name
            )));
        }

        if let Some(expect) = &task.expect_stdout {
            check_condition(expect, || format!("task '{}' `expect_stdout`", name))?;
        }

        if let Some(repeat) = &task.repeat_while {
            if repeat.condition.trim().is_empty() {
                return Err(FlowError::Config(format!(
                    "task '{}' has an empty `repeat_while.condition`",
                    name
                )));
            }
            check_condition(&repeat.condition, || {
                format!("task '{}' `repeat_while.condition`", name)
            })?;
        }
    }
    Ok(())
}

fn validate_links(flow: &RawFlowFile) -> Result<()> {
    let mut otherwise_sources: HashSet<&str> = HashSet::new();

    for (idx, link) in flow.link.iter().enumerate() {
        for endpoint in [&link.from, &link.to] {
            if !flow.task.contains_key(endpoint) {
                return Err(FlowError::Config(format!(
                    "link #{} ({} -> {}) refers to unknown task '{}'",
                    idx, link.from, link.to, endpoint
                )));
            }
        }

        if link.from == link.to {
            return Err(FlowError::Config(format!(
                "link #{} connects task '{}' to itself",
                idx, link.from
            )));
        }

        match (link.link_type, &link.condition) {
            (LinkType::Expression, Some(condition)) => {
                check_condition(condition, || {
                    format!("link #{} ({} -> {}) condition", idx, link.from, link.to)
                })?;
            }
            (LinkType::Expression, None) => {
                return Err(FlowError::Config(format!(
                    "expression link #{} ({} -> {}) needs a `condition`",
                    idx, link.from, link.to
                )));
            }
            (LinkType::Normal | LinkType::Otherwise | LinkType::Error, Some(_)) => {
                return Err(FlowError::Config(format!(
                    "{} link #{} ({} -> {}) cannot have a `condition`",
                    link.link_type, idx, link.from, link.to
                )));
            }
            (LinkType::Normal | LinkType::Otherwise | LinkType::Error, None) => {}
        }

        if link.link_type == LinkType::Otherwise && !otherwise_sources.insert(link.from.as_str()) {
            return Err(FlowError::Config(format!(
                "task '{}' has more than one otherwise link",
                link.from
            )));
        }
    }
    Ok(())
}

fn validate_dag(flow: &RawFlowFile) -> Result<()> {
    // Edge direction follows the link: from -> to.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in flow.task.keys() {
        graph.add_node(name.as_str());
    }

    for link in flow.link.iter() {
        graph.add_edge(link.from.as_str(), link.to.as_str(), ());
    }

    // A topological sort will fail if there is a cycle.
    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(FlowError::DagCycle(format!(
                "cycle detected in flow involving task '{}'",
                node
            )))
        }
    }
}

fn check_condition(source: &str, what: impl FnOnce() -> String) -> Result<()> {
    Condition::parse(source)
        .map(|_| ())
        .map_err(|e| FlowError::Config(format!("{}: {}", what(), e)))
}
