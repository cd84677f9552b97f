// src/backend/document.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{Fingerprint, Label, TaskName};

/// Dependency label (artifact label or task name) → fingerprint recorded at
/// the end of the task's last successful execution.
pub type RunWith = BTreeMap<Label, Fingerprint>;

/// Everything persisted for one task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Fingerprint>,

    #[serde(default)]
    pub run_with: RunWith,
}

/// The whole persisted state: DAG name → task name → record.
///
/// ```json
/// {
///   "main": {
///     "compile": {
///       "fingerprint": "3|2026-10-18T09:12:44.120Z",
///       "run_with": { "[File] /src/a.c": "9f86d0..." }
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendDocument {
    dags: BTreeMap<String, BTreeMap<TaskName, TaskRecord>>,
}

impl BackendDocument {
    pub fn records(&self, dag: &str) -> Option<&BTreeMap<TaskName, TaskRecord>> {
        self.dags.get(dag)
    }

    pub fn record(&self, dag: &str, task: &str) -> Option<&TaskRecord> {
        self.dags.get(dag)?.get(task)
    }

    pub fn record_mut(&mut self, dag: &str, task: &str) -> &mut TaskRecord {
        self.dags
            .entry(dag.to_string())
            .or_default()
            .entry(task.to_string())
            .or_default()
    }

    pub fn task_fingerprint(&self, dag: &str, task: &str) -> Option<Fingerprint> {
        self.record(dag, task)?.fingerprint.clone()
    }

    pub fn run_with(&self, dag: &str, task: &str, label: &str) -> Option<Fingerprint> {
        self.record(dag, task)?.run_with.get(label).cloned()
    }

    pub fn dag_names(&self) -> impl Iterator<Item = &str> {
        self.dags.keys().map(String::as_str)
    }
}
