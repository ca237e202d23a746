// src/errors.rs

//! Crate-wide error types.
//!
//! [`FlowError`] covers definition loading and everything the task behavior
//! can surface. [`ActivityError`] is what a unit of work reports; whether it
//! may be retried is a property of the error value itself.

use thiserror::Error;

use crate::model::LinkId;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cycle detected in flow: {0}")]
    DagCycle(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("activity of task '{task}' failed: {source}")]
    Activity {
        task: String,
        #[source]
        source: ActivityError,
    },

    #[error("repeat data for task '{task}' unavailable: {message}")]
    RepeatData { task: String, message: String },

    #[error("evaluating link {link} failed: {message}")]
    LinkEval { link: LinkId, message: String },

    #[error("invalid expression: {0}")]
    Expression(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FlowError {
    /// The activity error wrapped by this value, if any.
    pub fn activity_error(&self) -> Option<&ActivityError> {
        match self {
            FlowError::Activity { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Error reported by a task's unit of work.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActivityError {
    #[error("process exited with code {code}")]
    ExitStatus { code: i32, retriable: bool },

    #[error("could not launch activity: {0}")]
    Launch(String),

    #[error("output did not match expected pattern '{pattern}'")]
    UnexpectedOutput { pattern: String },

    #[error("{message}")]
    Failed { message: String, retriable: bool },
}

impl ActivityError {
    /// Whether a repeat-on-error policy may re-run the activity.
    pub fn is_retriable(&self) -> bool {
        match self {
            ActivityError::ExitStatus { retriable, .. } => *retriable,
            ActivityError::Failed { retriable, .. } => *retriable,
            ActivityError::UnexpectedOutput { .. } => true,
            ActivityError::Launch(_) => false,
        }
    }

    pub fn retriable(message: impl Into<String>) -> Self {
        ActivityError::Failed {
            message: message.into(),
            retriable: true,
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        ActivityError::Failed {
            message: message.into(),
            retriable: false,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, FlowError>;
