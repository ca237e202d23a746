// src/model/link.rs

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use crate::model::status::LinkStatus;
use crate::model::task::TaskName;

/// Kind of an edge, fixed when the flow is defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    #[default]
    Normal,
    /// Followed when its condition holds.
    Expression,
    /// Followed only if no other outgoing link was followed.
    Otherwise,
    /// Followed only when the source task fails.
    Error,
}

impl FromStr for LinkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Ok(LinkType::Normal),
            "expression" => Ok(LinkType::Expression),
            "otherwise" => Ok(LinkType::Otherwise),
            "error" => Ok(LinkType::Error),
            other => Err(format!(
                "invalid link type: {other} (expected \"normal\", \"expression\", \"otherwise\" or \"error\")"
            )),
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LinkType::Normal => "normal",
            LinkType::Expression => "expression",
            LinkType::Otherwise => "otherwise",
            LinkType::Error => "error",
        };
        f.write_str(s)
    }
}

/// Position of a link in its flow definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(pub usize);

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Directed edge between two tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub id: LinkId,
    pub from: TaskName,
    pub to: TaskName,
    pub link_type: LinkType,
    /// Condition source for `Expression` links.
    pub condition: Option<String>,
}

impl Link {
    pub fn new(id: usize, from: &str, to: &str, link_type: LinkType) -> Self {
        Self {
            id: LinkId(id),
            from: from.to_string(),
            to: to.to_string(),
            link_type,
            condition: None,
        }
    }

    pub fn with_condition(mut self, condition: &str) -> Self {
        self.condition = Some(condition.to_string());
        self
    }
}

/// Snapshot of a link's state in one flow instance.
///
/// Status changes are written back through
/// [`TaskContext::set_link_status`](crate::behavior::TaskContext::set_link_status).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkInstance {
    pub link: Arc<Link>,
    pub status: LinkStatus,
}

impl LinkInstance {
    pub fn new(link: Arc<Link>, status: LinkStatus) -> Self {
        Self { link, status }
    }

    pub fn id(&self) -> LinkId {
        self.link.id
    }

    pub fn link_type(&self) -> LinkType {
        self.link.link_type
    }
}
