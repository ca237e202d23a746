#![allow(dead_code)]

use std::collections::BTreeMap;

use linkflow::config::{
    FlowFile, FlowSection, LinkConfig, RawFlowFile, RepeatOnErrorConfig, RepeatWhileConfig,
    TaskConfig,
};
use linkflow::flow::FlowGraph;
use linkflow::model::LinkType;

/// Builder for `FlowFile` to simplify test setup.
pub struct FlowBuilder {
    flow: RawFlowFile,
}

impl FlowBuilder {
    pub fn new() -> Self {
        Self {
            flow: RawFlowFile {
                flow: FlowSection::default(),
                task: BTreeMap::new(),
                link: Vec::new(),
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.flow.flow.name = name.to_string();
        self
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.flow.task.insert(name.to_string(), task);
        self
    }

    /// Shorthand for a task whose command is `echo <name>`.
    pub fn task(self, name: &str) -> Self {
        let cmd = format!("echo {name}");
        self.with_task(name, TaskConfigBuilder::new(&cmd).build())
    }

    pub fn with_link(mut self, from: &str, to: &str, link_type: LinkType, condition: Option<&str>) -> Self {
        self.flow.link.push(LinkConfig {
            from: from.to_string(),
            to: to.to_string(),
            link_type,
            condition: condition.map(str::to_string),
        });
        self
    }

    pub fn link(self, from: &str, to: &str) -> Self {
        self.with_link(from, to, LinkType::Normal, None)
    }

    pub fn expression(self, from: &str, to: &str, condition: &str) -> Self {
        self.with_link(from, to, LinkType::Expression, Some(condition))
    }

    pub fn otherwise(self, from: &str, to: &str) -> Self {
        self.with_link(from, to, LinkType::Otherwise, None)
    }

    pub fn error_link(self, from: &str, to: &str) -> Self {
        self.with_link(from, to, LinkType::Error, None)
    }

    pub fn build_raw(self) -> RawFlowFile {
        self.flow
    }

    pub fn build(self) -> FlowFile {
        FlowFile::try_from(self.flow).expect("Failed to build valid flow from builder")
    }

    pub fn graph(self) -> FlowGraph {
        FlowGraph::from_flow(&self.build())
    }
}

impl Default for FlowBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                cmd: cmd.to_string(),
                ..TaskConfig::default()
            },
        }
    }

    pub fn retriable_exit_codes(mut self, codes: &[i32]) -> Self {
        self.task.retriable_exit_codes = codes.to_vec();
        self
    }

    pub fn expect_stdout(mut self, pattern: &str) -> Self {
        self.task.expect_stdout = Some(pattern.to_string());
        self
    }

    pub fn repeat_on_error(mut self, count: u32, interval_ms: u64) -> Self {
        self.task.repeat_on_error = Some(RepeatOnErrorConfig { count, interval_ms });
        self
    }

    pub fn repeat_while(mut self, condition: &str, count: u32, interval_ms: u64) -> Self {
        self.task.repeat_while = Some(RepeatWhileConfig {
            condition: condition.to_string(),
            count,
            interval_ms,
        });
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
