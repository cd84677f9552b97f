// src/task/staleness.rs

//! Per-task staleness decision.
//!
//! Conditions are evaluated in a fixed order and the first one that holds
//! decides the outcome:
//!
//! 1. `ignore` set → [`Decision::Ignored`]
//! 2. `always_execute` set → [`Decision::AlwaysRun`]
//! 3. no artifact and no task dependencies → [`Decision::NoDependencies`]
//! 4. a task dependency's fingerprint differs from (or is absent in) the
//!    run-with map → [`Decision::Stale`]
//! 5. an artifact dependency's fingerprint differs, is absent, or cannot be
//!    computed → [`Decision::Stale`]
//! 6. a target does not exist → [`Decision::Stale`]
//! 7. otherwise → [`Decision::UpToDate`]

use std::fmt;

use tracing::trace;

use crate::artifact::Artifact;
use crate::backend::Backend;
use crate::errors::{DagError, Result};
use crate::reporter::TaskEvent;
use crate::task::Task;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    NewTaskDependency(String),
    TaskDependencyUpdated(String),
    NewDependency(String),
    DependencyUpdated(String),
    DependencyMissing(String),
    TargetMissing(String),
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleReason::NewTaskDependency(t) => write!(f, "new task dependency '{t}'"),
            StaleReason::TaskDependencyUpdated(t) => write!(f, "task dependency '{t}' updated"),
            StaleReason::NewDependency(l) => write!(f, "new dependency '{l}'"),
            StaleReason::DependencyUpdated(l) => write!(f, "dependency '{l}' updated"),
            StaleReason::DependencyMissing(l) => write!(f, "dependency '{l}' missing"),
            StaleReason::TargetMissing(l) => write!(f, "target '{l}' missing"),
        }
    }
}

/// Outcome of the staleness check for one run attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Ignored,
    AlwaysRun,
    NoDependencies,
    Stale(StaleReason),
    UpToDate,
}

impl Decision {
    pub fn should_run(&self) -> bool {
        matches!(
            self,
            Decision::AlwaysRun | Decision::NoDependencies | Decision::Stale(_)
        )
    }

    pub fn event(&self) -> TaskEvent {
        match self {
            Decision::Ignored => TaskEvent::Ignore,
            Decision::UpToDate => TaskEvent::Skip,
            Decision::AlwaysRun | Decision::NoDependencies | Decision::Stale(_) => {
                TaskEvent::Execute
            }
        }
    }

    /// Short human-readable reason carried by the reporter event.
    pub fn reason(&self) -> String {
        match self {
            Decision::Ignored => "ignored".to_string(),
            Decision::AlwaysRun => "always executed".to_string(),
            Decision::NoDependencies => "no dependencies".to_string(),
            Decision::Stale(reason) => reason.to_string(),
            Decision::UpToDate => "up to date".to_string(),
        }
    }
}

/// Decision plus the artifact dependencies considered changed.
#[derive(Debug, Clone)]
pub struct Assessment<'t> {
    pub decision: Decision,
    /// Dependencies whose fingerprint differs from the run-with map (or can't
    /// be computed). Every dependency counts as changed when the run is forced
    /// without a check.
    pub changed: Vec<&'t Artifact>,
}

/// Evaluate the staleness of `task` against `backend`.
///
/// The only error is an inconsistent backend: a task dependency that has no
/// recorded fingerprint of its own.
pub fn assess<'t>(task: &'t Task, backend: &dyn Backend) -> Result<Assessment<'t>> {
    if task.ignore() {
        return Ok(Assessment {
            decision: Decision::Ignored,
            changed: Vec::new(),
        });
    }

    if task.always_execute() {
        return Ok(Assessment {
            decision: Decision::AlwaysRun,
            changed: task.dependencies(),
        });
    }

    if task.has_no_dependencies() {
        return Ok(Assessment {
            decision: Decision::NoDependencies,
            changed: Vec::new(),
        });
    }

    if let Some(reason) = task_dependency_change(task, backend)? {
        let (changed, _) = artifact_changes(task, backend);
        return Ok(Assessment {
            decision: Decision::Stale(reason),
            changed,
        });
    }

    let (changed, first_reason) = artifact_changes(task, backend);
    if let Some(reason) = first_reason {
        return Ok(Assessment {
            decision: Decision::Stale(reason),
            changed,
        });
    }

    if let Some(missing) = task.targets().into_iter().find(|t| !t.exists()) {
        return Ok(Assessment {
            decision: Decision::Stale(StaleReason::TargetMissing(missing.label().to_string())),
            changed,
        });
    }

    Ok(Assessment {
        decision: Decision::UpToDate,
        changed,
    })
}

fn task_dependency_change(task: &Task, backend: &dyn Backend) -> Result<Option<StaleReason>> {
    for dep in task.task_dependencies() {
        let current = backend
            .task_fingerprint(dep)
            .ok_or_else(|| DagError::InconsistentBackend {
                task: task.name().to_string(),
                dependency: dep.clone(),
            })?;

        match backend.run_with(task.name(), dep) {
            None => return Ok(Some(StaleReason::NewTaskDependency(dep.clone()))),
            Some(recorded) if recorded != current => {
                return Ok(Some(StaleReason::TaskDependencyUpdated(dep.clone())));
            }
            Some(_) => {}
        }
    }
    Ok(None)
}

/// Artifact dependencies that differ from the run-with map, and the reason for
/// the first of them.
fn artifact_changes<'t>(
    task: &'t Task,
    backend: &dyn Backend,
) -> (Vec<&'t Artifact>, Option<StaleReason>) {
    let mut changed = Vec::new();
    let mut first = None;

    for dep in task.dependencies() {
        let label = dep.label().to_string();
        let reason = match dep.fingerprint() {
            Err(err) => {
                trace!(task = %task.name(), label = %label, error = %err, "no fingerprint");
                Some(StaleReason::DependencyMissing(label))
            }
            Ok(current) => match backend.run_with(task.name(), &label) {
                None => Some(StaleReason::NewDependency(label)),
                Some(recorded) if recorded != current => {
                    Some(StaleReason::DependencyUpdated(label))
                }
                Some(_) => None,
            },
        };

        if let Some(reason) = reason {
            changed.push(dep);
            first.get_or_insert(reason);
        }
    }

    (changed, first)
}
