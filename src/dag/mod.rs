// src/dag/mod.rs

//! DAG container and scheduling.
//!
//! - [`graph`] holds the combined task/artifact dependency graph and its
//!   topological waves.
//! - [`scheduler`] drives one `run()` over those waves against a backend.

pub mod graph;
pub mod scheduler;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::debug;

use crate::errors::{DagError, Result};
use crate::reporter::{LogReporter, Reporter};
use crate::task::{Task, TaskHandle, TaskSpec};
use crate::types::TaskName;

pub use graph::DepGraph;

/// DAG-wide defaults for tasks that do not set their own policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DagOptions {
    pub always_execute: bool,
    pub continue_on_failure: bool,
}

/// Named collection of tasks plus the reporter notified on each run.
pub struct Dag {
    name: String,
    options: DagOptions,
    tasks: BTreeMap<TaskName, Task>,
    reporter: Box<dyn Reporter>,
}

impl fmt::Debug for Dag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dag")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("tasks", &self.tasks.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Dag {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_options(name, DagOptions::default())
    }

    pub fn with_options(name: impl Into<String>, options: DagOptions) -> Self {
        Self {
            name: name.into(),
            options,
            tasks: BTreeMap::new(),
            reporter: Box::new(LogReporter),
        }
    }

    /// Replace the default [`LogReporter`].
    pub fn with_reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    pub fn set_reporter(&mut self, reporter: impl Reporter + 'static) {
        self.reporter = Box::new(reporter);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> DagOptions {
        self.options
    }

    pub fn reporter(&self) -> &dyn Reporter {
        self.reporter.as_ref()
    }

    /// Register a task.
    ///
    /// Task dependencies named with [`TaskSpec::after`] need not exist yet;
    /// they are resolved when the graph is built.
    pub fn add_task(&mut self, spec: TaskSpec) -> Result<TaskHandle> {
        if spec.name().is_empty() {
            return Err(DagError::ConfigError("task name must not be empty".into()));
        }
        if self.tasks.contains_key(spec.name()) {
            return Err(DagError::DuplicateTask(spec.name().to_string()));
        }
        if spec.after_names().iter().any(|n| n == spec.name()) {
            return Err(DagError::ConfigError(format!(
                "task '{}' cannot run after itself",
                spec.name()
            )));
        }

        let task = spec.into_task(self.options.always_execute, self.options.continue_on_failure);
        let name = task.name().to_string();
        debug!(
            dag = %self.name,
            task = %name,
            dependencies = task.dependencies().len(),
            targets = task.targets().len(),
            "registered task"
        );
        self.tasks.insert(name.clone(), task);
        Ok(TaskHandle::new(name))
    }

    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Toggle the `ignore` flag of a registered task between runs.
    pub fn set_ignore(&mut self, name: &str, ignore: bool) -> Result<()> {
        let task = self
            .tasks
            .get_mut(name)
            .ok_or_else(|| DagError::TaskNotFound(name.to_string()))?;
        task.set_ignore(ignore);
        Ok(())
    }

    /// Validate the shared namespace of task names and artifact labels.
    ///
    /// Fails with [`DagError::NameCollision`] when an artifact label equals a
    /// task name, and with [`DagError::TaskNotFound`] when a task dependency
    /// names an unregistered task.
    pub fn check_labels(&self) -> Result<()> {
        let mut collisions = BTreeSet::new();
        for task in self.tasks.values() {
            for artifact in task.dependencies().into_iter().chain(task.targets()) {
                if self.tasks.contains_key(artifact.label()) {
                    collisions.insert(artifact.label().to_string());
                }
            }
        }
        if !collisions.is_empty() {
            return Err(DagError::NameCollision(collisions.into_iter().collect()));
        }

        for task in self.tasks.values() {
            if let Some(missing) = task
                .task_dependencies()
                .iter()
                .find(|dep| !self.tasks.contains_key(dep.as_str()))
            {
                return Err(DagError::TaskNotFound(format!(
                    "'{missing}' (required by task '{}')",
                    task.name()
                )));
            }
        }
        Ok(())
    }

    /// Build the dependency graph, restricted to `targets` and their
    /// transitive dependencies when given.
    pub fn graph(&self, targets: Option<&[&str]>) -> Result<DepGraph> {
        self.check_labels()?;
        let graph = DepGraph::from_tasks(self.tasks.values());
        Ok(match targets {
            Some(labels) => {
                let sub = graph.subgraph(labels);
                debug!(
                    dag = %self.name,
                    requested = labels.len(),
                    nodes = sub.len(),
                    "restricted graph to targets"
                );
                sub
            }
            None => graph,
        })
    }
}
