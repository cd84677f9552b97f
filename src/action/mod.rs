// src/action/mod.rs

//! Executable behaviour attached to a task.
//!
//! - [`callable`] wraps an in-process function and discovers the artifacts
//!   among its bound arguments.
//! - [`process`] spawns an external command, substituting the task's
//!   dependency/target paths into `%(name)s` placeholders.
//! - [`template`] implements the placeholder expansion.

pub mod callable;
pub mod process;
pub mod template;

use std::collections::BTreeMap;

use crate::artifact::Artifact;

pub use callable::{ArgValue, CallArgs, CallableAction, TargetHandle};
pub use process::{CommandLine, ProcessAction};

#[derive(Debug, Clone)]
pub enum Action {
    Callable(CallableAction),
    Process(ProcessAction),
}

impl Action {
    /// Dependency artifacts found among the action's own arguments.
    pub fn discovered_dependencies(&self) -> Vec<&Artifact> {
        match self {
            Action::Callable(c) => c.discovered_dependencies(),
            Action::Process(_) => Vec::new(),
        }
    }

    /// Target artifacts found among the action's own arguments.
    pub fn discovered_targets(&self) -> Vec<&Artifact> {
        match self {
            Action::Callable(c) => c.discovered_targets(),
            Action::Process(_) => Vec::new(),
        }
    }

    pub async fn execute(&self, ctx: &ActionContext<'_>) -> anyhow::Result<()> {
        match self {
            Action::Callable(c) => c.execute(),
            Action::Process(p) => p.execute(ctx).await,
        }
    }
}

impl From<CallableAction> for Action {
    fn from(value: CallableAction) -> Self {
        Action::Callable(value)
    }
}

impl From<ProcessAction> for Action {
    fn from(value: ProcessAction) -> Self {
        Action::Process(value)
    }
}

/// Task-level information an action may need while executing.
#[derive(Debug, Clone)]
pub struct ActionContext<'a> {
    pub task: &'a str,
    pub dependencies: Vec<&'a Artifact>,
    pub targets: Vec<&'a Artifact>,
    /// Dependencies whose fingerprint differed on the last staleness check.
    pub changed: Vec<&'a Artifact>,
    pub options: &'a BTreeMap<String, String>,
}
