// src/task/mod.rs

//! Tasks: one action plus declared artifacts, task edges and policy flags.
//!
//! - [`staleness`] decides whether a task must run against backend history.

pub mod staleness;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{SecondsFormat, Utc};
use tracing::{debug, warn};

use crate::action::{Action, ActionContext};
use crate::artifact::Artifact;
use crate::backend::{Backend, RunWith};
use crate::errors::{DagError, Result};
use crate::types::{Fingerprint, TaskName};

pub use staleness::{Assessment, Decision, StaleReason};

/// A registered node of the DAG.
#[derive(Debug, Clone)]
pub struct Task {
    name: TaskName,
    action: Action,
    implicit_dependencies: Vec<Artifact>,
    implicit_targets: Vec<Artifact>,
    implicit_task_dependencies: Vec<TaskName>,
    always_execute: bool,
    ignore: bool,
    continue_on_failure: bool,
    options: BTreeMap<String, String>,
}

impl Task {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn implicit_dependencies(&self) -> &[Artifact] {
        &self.implicit_dependencies
    }

    pub fn implicit_targets(&self) -> &[Artifact] {
        &self.implicit_targets
    }

    pub fn task_dependencies(&self) -> &[TaskName] {
        &self.implicit_task_dependencies
    }

    pub fn always_execute(&self) -> bool {
        self.always_execute
    }

    pub fn ignore(&self) -> bool {
        self.ignore
    }

    pub fn continue_on_failure(&self) -> bool {
        self.continue_on_failure
    }

    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    pub(crate) fn set_ignore(&mut self, ignore: bool) {
        self.ignore = ignore;
    }

    /// Implicit dependencies followed by the action's discovered ones, with
    /// repeated labels collapsed to their first occurrence.
    pub fn dependencies(&self) -> Vec<&Artifact> {
        dedup_by_label(
            self.implicit_dependencies
                .iter()
                .chain(self.action.discovered_dependencies()),
        )
    }

    /// Implicit targets followed by the action's discovered ones.
    pub fn targets(&self) -> Vec<&Artifact> {
        dedup_by_label(
            self.implicit_targets
                .iter()
                .chain(self.action.discovered_targets()),
        )
    }

    /// True when there is neither an artifact nor a task dependency.
    pub fn has_no_dependencies(&self) -> bool {
        self.implicit_task_dependencies.is_empty() && self.dependencies().is_empty()
    }

    /// Context handed to the action for one execution.
    pub fn action_context<'a>(&'a self, changed: Vec<&'a Artifact>) -> ActionContext<'a> {
        ActionContext {
            task: &self.name,
            dependencies: self.dependencies(),
            targets: self.targets(),
            changed,
            options: &self.options,
        }
    }

    /// Record a successful execution.
    ///
    /// The run-with map is rebuilt from scratch out of freshly computed
    /// fingerprints and replaces the previous one; then the task's own
    /// fingerprint counter is bumped.
    pub fn record_success(&self, backend: &mut dyn Backend) -> Result<()> {
        let mut run_with = RunWith::new();

        for dep in &self.implicit_task_dependencies {
            let fp = backend
                .task_fingerprint(dep)
                .ok_or_else(|| DagError::InconsistentBackend {
                    task: self.name.clone(),
                    dependency: dep.clone(),
                })?;
            run_with.insert(dep.clone(), fp);
        }

        for dep in self.dependencies() {
            match dep.fingerprint() {
                Ok(fp) => {
                    run_with.insert(dep.label().to_string(), fp);
                }
                Err(err) => {
                    // Left out of the map, so the next run sees it as new.
                    warn!(
                        task = %self.name,
                        label = %dep.label(),
                        error = %err,
                        "dependency has no fingerprint after execution"
                    );
                }
            }
        }

        debug!(task = %self.name, entries = run_with.len(), "recording run-with map");
        backend.set_run_with(&self.name, run_with);

        let previous = backend.task_fingerprint(&self.name);
        backend.set_task_fingerprint(&self.name, next_task_fingerprint(previous.as_deref()));
        Ok(())
    }
}

fn dedup_by_label<'a>(artifacts: impl Iterator<Item = &'a Artifact>) -> Vec<&'a Artifact> {
    let mut seen = BTreeSet::new();
    artifacts.filter(|a| seen.insert(a.label())).collect()
}

/// Next value of a task fingerprint: `<counter>|<timestamp>`.
///
/// The counter starts at 0 and is incremented from whatever `previous` holds;
/// an unparseable previous value restarts it.
pub fn next_task_fingerprint(previous: Option<&str>) -> Fingerprint {
    let counter = previous
        .and_then(task_run_counter)
        .map_or(0, |c| c.saturating_add(1));
    format!(
        "{counter}|{}",
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

/// Run counter encoded in a task fingerprint.
pub fn task_run_counter(fingerprint: &str) -> Option<u64> {
    fingerprint.split('|').next()?.parse().ok()
}

/// Reference to a registered task, used to declare task-to-task edges.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    name: TaskName,
}

impl TaskHandle {
    pub(crate) fn new(name: TaskName) -> Self {
        Self { name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl From<&TaskHandle> for TaskName {
    fn from(handle: &TaskHandle) -> Self {
        handle.name.clone()
    }
}

impl From<TaskHandle> for TaskName {
    fn from(handle: TaskHandle) -> Self {
        handle.name
    }
}

/// Registration request for [`Dag::add_task`](crate::dag::Dag::add_task).
///
/// `always_execute` and `continue_on_failure` fall back to the DAG-level
/// defaults when left unset.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    name: TaskName,
    action: Action,
    dependencies: Vec<Artifact>,
    targets: Vec<Artifact>,
    after: Vec<TaskName>,
    always_execute: Option<bool>,
    ignore: bool,
    continue_on_failure: Option<bool>,
    options: BTreeMap<String, String>,
}

impl TaskSpec {
    pub fn new(name: impl Into<TaskName>, action: impl Into<Action>) -> Self {
        Self {
            name: name.into(),
            action: action.into(),
            dependencies: Vec::new(),
            targets: Vec::new(),
            after: Vec::new(),
            always_execute: None,
            ignore: false,
            continue_on_failure: None,
            options: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare an artifact dependency (stored in dependency role).
    pub fn depends_on(mut self, artifact: Artifact) -> Self {
        self.dependencies.push(artifact.as_dependency());
        self
    }

    pub fn depends_on_all(mut self, artifacts: impl IntoIterator<Item = Artifact>) -> Self {
        self.dependencies
            .extend(artifacts.into_iter().map(|a| a.as_dependency()));
        self
    }

    /// Declare a produced artifact (stored in target role).
    pub fn target(mut self, artifact: Artifact) -> Self {
        self.targets.push(artifact.as_target());
        self
    }

    pub fn targets(mut self, artifacts: impl IntoIterator<Item = Artifact>) -> Self {
        self.targets
            .extend(artifacts.into_iter().map(|a| a.as_target()));
        self
    }

    /// Order this task after another one without an artifact between them.
    pub fn after(mut self, task: impl Into<TaskName>) -> Self {
        self.after.push(task.into());
        self
    }

    pub fn always_execute(mut self, value: bool) -> Self {
        self.always_execute = Some(value);
        self
    }

    pub fn ignore(mut self, value: bool) -> Self {
        self.ignore = value;
        self
    }

    pub fn continue_on_failure(mut self, value: bool) -> Self {
        self.continue_on_failure = Some(value);
        self
    }

    /// Named value available to process commands as `%(key)s`.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub(crate) fn into_task(self, default_always: bool, default_continue: bool) -> Task {
        let mut after = Vec::with_capacity(self.after.len());
        for name in self.after {
            if !after.contains(&name) {
                after.push(name);
            }
        }

        Task {
            name: self.name,
            action: self.action,
            implicit_dependencies: self.dependencies,
            implicit_targets: self.targets,
            implicit_task_dependencies: after,
            always_execute: self.always_execute.unwrap_or(default_always),
            ignore: self.ignore,
            continue_on_failure: self.continue_on_failure.unwrap_or(default_continue),
            options: self.options,
        }
    }

    pub(crate) fn after_names(&self) -> &[TaskName] {
        &self.after
    }
}
