// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::model::{ActivityConfig, LinkType, RepeatPolicy, RepeatSettings, Task};

/// Flow definition exactly as read from a TOML file, before validation.
///
/// ```toml
/// [flow]
/// name = "release"
///
/// [task.build]
/// cmd = "make build"
/// repeat_on_error = { count = 3, interval_ms = 200 }
///
/// [task.deploy]
/// cmd = "make deploy"
///
/// [[link]]
/// from = "build"
/// to = "deploy"
/// type = "expression"
/// condition = "BUILD OK"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawFlowFile {
    #[serde(default)]
    pub flow: FlowSection,

    /// All tasks from `[task.<name>]`, keyed and ordered by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,

    /// All `[[link]]` entries, in file order.
    #[serde(default)]
    pub link: Vec<LinkConfig>,
}

/// Validated flow definition. Build one with `FlowFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct FlowFile {
    pub flow: FlowSection,
    pub task: BTreeMap<String, TaskConfig>,
    pub link: Vec<LinkConfig>,
}

impl FlowFile {
    pub(crate) fn new_unchecked(
        flow: FlowSection,
        task: BTreeMap<String, TaskConfig>,
        link: Vec<LinkConfig>,
    ) -> Self {
        Self { flow, task, link }
    }
}

/// `[flow]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct FlowSection {
    #[serde(default = "default_flow_name")]
    pub name: String,
}

fn default_flow_name() -> String {
    "flow".to_string()
}

impl Default for FlowSection {
    fn default() -> Self {
        Self {
            name: default_flow_name(),
        }
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskConfig {
    /// The command executed as the task's activity.
    pub cmd: String,

    /// Exit codes that are reported as retriable errors.
    #[serde(default)]
    pub retriable_exit_codes: Vec<i32>,

    /// Condition the activity output must satisfy after it finishes.
    #[serde(default)]
    pub expect_stdout: Option<String>,

    #[serde(default)]
    pub repeat_on_error: Option<RepeatOnErrorConfig>,

    #[serde(default)]
    pub repeat_while: Option<RepeatWhileConfig>,
}

impl TaskConfig {
    pub fn to_task(&self, name: &str) -> Task {
        Task {
            name: name.to_string(),
            activity: ActivityConfig {
                cmd: self.cmd.clone(),
                retriable_exit_codes: self.retriable_exit_codes.clone(),
                expect_stdout: self.expect_stdout.clone(),
            },
            repeat: RepeatSettings {
                on_error: self.repeat_on_error.as_ref().map(|r| RepeatPolicy {
                    count: r.count,
                    condition: String::new(),
                    interval: Duration::from_millis(r.interval_ms),
                }),
                while_condition: self.repeat_while.as_ref().map(|r| RepeatPolicy {
                    count: r.count,
                    condition: r.condition.clone(),
                    interval: Duration::from_millis(r.interval_ms),
                }),
            },
        }
    }
}

/// `repeat_on_error = { count = 3, interval_ms = 200 }`
#[derive(Debug, Clone, Deserialize)]
pub struct RepeatOnErrorConfig {
    /// How many times a retriable failure is re-run.
    pub count: u32,
    #[serde(default)]
    pub interval_ms: u64,
}

/// `repeat_while = { condition = "PENDING", count = 10, interval_ms = 1000 }`
#[derive(Debug, Clone, Deserialize)]
pub struct RepeatWhileConfig {
    pub condition: String,
    /// Maximum number of repeats; `0` repeats for as long as the condition holds.
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub interval_ms: u64,
}

/// One `[[link]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkConfig {
    pub from: String,
    pub to: String,
    #[serde(default, rename = "type")]
    pub link_type: LinkType,
    /// Required for `type = "expression"`, rejected otherwise.
    #[serde(default)]
    pub condition: Option<String>,
}
