use std::sync::{Arc, Mutex};

use dagrun::reporter::{DagEvent, Reporter, TaskEvent};

/// One event seen by a [`RecordingReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedEvent {
    Task {
        event: TaskEvent,
        task: String,
        reason: String,
    },
    Dag {
        event: DagEvent,
        dag: String,
    },
}

/// A reporter that:
/// - records every task and DAG event in order
/// - shares its log between clones, so a test can keep one clone and hand
///   the other to the DAG.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    /// `(task, event)` pairs in emission order.
    pub fn task_events(&self) -> Vec<(String, TaskEvent)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RecordedEvent::Task { event, task, .. } => Some((task, event)),
                RecordedEvent::Dag { .. } => None,
            })
            .collect()
    }

    /// Event of the last occurrence of `task`, if it was visited.
    pub fn event_for(&self, task: &str) -> Option<TaskEvent> {
        self.task_events()
            .into_iter()
            .rev()
            .find(|(name, _)| name == task)
            .map(|(_, event)| event)
    }

    /// Reason string of the last occurrence of `task`.
    pub fn reason_for(&self, task: &str) -> Option<String> {
        self.events().into_iter().rev().find_map(|e| match e {
            RecordedEvent::Task { task: name, reason, .. } if name == task => Some(reason),
            _ => None,
        })
    }

    /// Names of tasks that reported `EXECUTE`, in order.
    pub fn executed(&self) -> Vec<String> {
        self.task_events()
            .into_iter()
            .filter(|(_, event)| *event == TaskEvent::Execute)
            .map(|(task, _)| task)
            .collect()
    }

    pub fn dag_events(&self) -> Vec<DagEvent> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RecordedEvent::Dag { event, .. } => Some(event),
                RecordedEvent::Task { .. } => None,
            })
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn task_event(&self, event: TaskEvent, task: &str, reason: &str) {
        self.events.lock().unwrap().push(RecordedEvent::Task {
            event,
            task: task.to_string(),
            reason: reason.to_string(),
        });
    }

    fn dag_event(&self, event: DagEvent, dag: &str) {
        self.events.lock().unwrap().push(RecordedEvent::Dag {
            event,
            dag: dag.to_string(),
        });
    }
}
