// src/dag/scheduler.rs

//! One `run()` over the DAG.
//!
//! Waves are processed in order and the tasks of a wave one after another;
//! artifact nodes are only markers and need no work. A fatal failure stops
//! the loop, but the backend is still flushed and `DONE` still reported
//! before the error reaches the caller.

use tracing::{debug, error, info, warn};

use crate::backend::Backend;
use crate::dag::Dag;
use crate::errors::{DagError, Result};
use crate::reporter::DagEvent;
use crate::task::{Task, staleness};
use crate::types::Label;

impl Dag {
    /// Execute every stale task, optionally restricted to `targets` and what
    /// they depend on, and persist the results in `backend`.
    ///
    /// Configuration errors (name collisions, unknown task dependencies,
    /// cycles) are returned before anything is reported or executed.
    pub async fn run(&self, backend: &mut dyn Backend, targets: Option<&[&str]>) -> Result<()> {
        let graph = self.graph(targets)?;
        let waves = graph.waves()?;

        if backend.dag_name() != self.name() {
            warn!(
                dag = %self.name(),
                backend_dag = %backend.dag_name(),
                "backend was opened for a different DAG"
            );
        }

        self.reporter().dag_event(DagEvent::Start, self.name());

        match self.run_waves(&waves, backend).await {
            Ok(()) => {
                let flushed = backend.flush();
                self.reporter().dag_event(DagEvent::Done, self.name());
                flushed
            }
            Err(err) => {
                error!(dag = %self.name(), error = %err, "run aborted");
                if let Err(flush_err) = backend.flush() {
                    error!(dag = %self.name(), error = %flush_err, "flush after failure failed");
                }
                self.reporter().dag_event(DagEvent::Done, self.name());
                Err(err)
            }
        }
    }

    async fn run_waves(&self, waves: &[Vec<Label>], backend: &mut dyn Backend) -> Result<()> {
        for (i, wave) in waves.iter().enumerate() {
            debug!(dag = %self.name(), wave = i, nodes = wave.len(), "processing wave");
            for node in wave {
                if let Some(task) = self.task(node) {
                    self.run_task(task, backend).await?;
                }
            }
        }
        Ok(())
    }

    async fn run_task(&self, task: &Task, backend: &mut dyn Backend) -> Result<()> {
        let assessment = staleness::assess(task, &*backend)?;
        let decision = &assessment.decision;
        self.reporter()
            .task_event(decision.event(), task.name(), &decision.reason());

        if !decision.should_run() {
            return Ok(());
        }

        info!(task = %task.name(), reason = %decision.reason(), "executing task");
        let ctx = task.action_context(assessment.changed.clone());

        match task.action().execute(&ctx).await {
            Ok(()) => task.record_success(backend),
            Err(err) if task.continue_on_failure() => {
                warn!(
                    task = %task.name(),
                    error = %format!("{err:#}"),
                    "task failed, continuing"
                );
                Ok(())
            }
            Err(source) => Err(DagError::TaskFailed {
                task: task.name().to_string(),
                source,
            }),
        }
    }
}
