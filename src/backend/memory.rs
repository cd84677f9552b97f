// src/backend/memory.rs

use std::collections::BTreeMap;

use tracing::debug;

use crate::backend::{Backend, BackendDocument, RunWith, TaskRecord};
use crate::errors::Result;
use crate::types::{Fingerprint, TaskName};

/// Stores task state in memory only.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    dag_name: String,
    document: BackendDocument,
}

impl MemoryBackend {
    pub fn new(dag_name: impl Into<String>) -> Self {
        Self {
            dag_name: dag_name.into(),
            document: BackendDocument::default(),
        }
    }

    /// Start from an existing document, e.g. one loaded elsewhere.
    pub fn from_document(dag_name: impl Into<String>, document: BackendDocument) -> Self {
        Self {
            dag_name: dag_name.into(),
            document,
        }
    }

    pub fn document(&self) -> &BackendDocument {
        &self.document
    }

    /// Records of this backend's DAG, if any task has been recorded yet.
    pub fn records(&self) -> Option<&BTreeMap<TaskName, TaskRecord>> {
        self.document.records(&self.dag_name)
    }
}

impl Backend for MemoryBackend {
    fn dag_name(&self) -> &str {
        &self.dag_name
    }

    fn task_fingerprint(&self, task: &str) -> Option<Fingerprint> {
        self.document.task_fingerprint(&self.dag_name, task)
    }

    fn set_task_fingerprint(&mut self, task: &str, fingerprint: Fingerprint) {
        self.document.record_mut(&self.dag_name, task).fingerprint = Some(fingerprint);
    }

    fn run_with(&self, task: &str, label: &str) -> Option<Fingerprint> {
        self.document.run_with(&self.dag_name, task, label)
    }

    fn set_run_with(&mut self, task: &str, run_with: RunWith) {
        self.document.record_mut(&self.dag_name, task).run_with = run_with;
    }

    fn flush(&mut self) -> Result<()> {
        debug!(dag = %self.dag_name, "memory backend flush (no-op)");
        Ok(())
    }
}
