// src/reporter.rs

//! Observability sink for scheduler events.
//!
//! Reporters never influence scheduling or persistence; they only receive
//! one task event per visited task and a `START`/`DONE` pair per run.

use std::collections::HashSet;
use std::fmt;

use tracing::info;

/// Outcome of the staleness decision for one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskEvent {
    Skip,
    Ignore,
    Execute,
}

impl fmt::Display for TaskEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaskEvent::Skip => "SKIP",
            TaskEvent::Ignore => "IGNORE",
            TaskEvent::Execute => "EXECUTE",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DagEvent {
    Start,
    Done,
}

impl fmt::Display for DagEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DagEvent::Start => "START",
            DagEvent::Done => "DONE",
        })
    }
}

pub trait Reporter: Send + Sync {
    fn task_event(&self, event: TaskEvent, task: &str, reason: &str);

    fn dag_event(&self, event: DagEvent, dag: &str);
}

impl<R: Reporter + ?Sized> Reporter for Box<R> {
    fn task_event(&self, event: TaskEvent, task: &str, reason: &str) {
        (**self).task_event(event, task, reason)
    }

    fn dag_event(&self, event: DagEvent, dag: &str) {
        (**self).dag_event(event, dag)
    }
}

/// Default reporter: one `info!` record per event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn task_event(&self, event: TaskEvent, task: &str, reason: &str) {
        info!(task = %task, event = %event, "{task}: {event}: {reason}");
    }

    fn dag_event(&self, event: DagEvent, dag: &str) {
        info!(dag = %dag, event = %event, "{dag}: {event}");
    }
}

/// Wraps a reporter and drops the given task events.
#[derive(Debug, Clone)]
pub struct FilteredReporter<R> {
    inner: R,
    hidden: HashSet<TaskEvent>,
}

impl<R: Reporter> FilteredReporter<R> {
    pub fn new(inner: R, hidden: impl IntoIterator<Item = TaskEvent>) -> Self {
        Self {
            inner,
            hidden: hidden.into_iter().collect(),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }
}

impl<R: Reporter> Reporter for FilteredReporter<R> {
    fn task_event(&self, event: TaskEvent, task: &str, reason: &str) {
        if !self.hidden.contains(&event) {
            self.inner.task_event(event, task, reason);
        }
    }

    fn dag_event(&self, event: DagEvent, dag: &str) {
        self.inner.dag_event(event, dag);
    }
}

pub trait ReporterExt: Reporter + Sized {
    /// Hide `events` (e.g. `[TaskEvent::Skip]`) from this reporter.
    fn filter_out(self, events: impl IntoIterator<Item = TaskEvent>) -> FilteredReporter<Self> {
        FilteredReporter::new(self, events)
    }
}

impl<R: Reporter> ReporterExt for R {}
