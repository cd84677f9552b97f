// src/backend/mod.rs

//! Durable storage of per-task fingerprints and run-with maps.
//!
//! - [`MemoryBackend`] keeps everything in process memory (lost on exit).
//! - [`JsonFileBackend`] loads a JSON document eagerly and rewrites it on
//!   [`Backend::flush`].
//!
//! Absent keys are reported as `None`, never as an empty value: the
//! staleness check treats "missing" and "different" alike but must tell both
//! apart from "there are no dependencies at all".

pub mod document;
pub mod json;
pub mod memory;

use crate::errors::Result;
use crate::types::Fingerprint;

pub use document::{BackendDocument, RunWith, TaskRecord};
pub use json::JsonFileBackend;
pub use memory::MemoryBackend;

/// Abstract storage for task state.
pub trait Backend: Send {
    /// Name of the DAG whose records this backend reads and writes.
    fn dag_name(&self) -> &str;

    fn task_fingerprint(&self, task: &str) -> Option<Fingerprint>;

    fn set_task_fingerprint(&mut self, task: &str, fingerprint: Fingerprint);

    /// Fingerprint of `label` recorded by `task`'s last successful run.
    fn run_with(&self, task: &str, label: &str) -> Option<Fingerprint>;

    /// Replace (not merge) the run-with map of `task`.
    fn set_run_with(&mut self, task: &str, run_with: RunWith);

    /// Make all accumulated state durable.
    fn flush(&mut self) -> Result<()>;
}
