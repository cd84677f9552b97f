// src/backend/json.rs

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::backend::{Backend, BackendDocument, RunWith, TaskRecord};
use crate::errors::Result;
use crate::types::{Fingerprint, TaskName};

/// Default location of the state document, relative to the project root.
pub const DEFAULT_STATE_PATH: &str = ".dagrun/state.json";

/// Stores task state in a JSON document on disk.
///
/// The whole document is read when the backend is opened and written back
/// wholesale by [`Backend::flush`]. Records of other DAGs sharing the file are
/// carried through untouched.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    dag_name: String,
    path: PathBuf,
    document: BackendDocument,
}

impl JsonFileBackend {
    /// Open (or start) the document at `path` for the DAG named `dag_name`.
    pub fn open(dag_name: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self> {
        let dag_name = dag_name.into();
        let path = path.into();
        let document = load_document(&path)?;
        debug!(dag = %dag_name, ?path, "opened JSON backend");
        Ok(Self {
            dag_name,
            path,
            document,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &BackendDocument {
        &self.document
    }

    pub fn records(&self) -> Option<&BTreeMap<TaskName, TaskRecord>> {
        self.document.records(&self.dag_name)
    }
}

impl Backend for JsonFileBackend {
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
        save_document(&self.path, &self.document)?;
        info!(dag = %self.dag_name, path = ?self.path, "flushed backend state");
        Ok(())
    }
}

fn load_document(path: &Path) -> Result<BackendDocument> {
    if !path.exists() {
        return Ok(BackendDocument::default());
    }
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Write to a sibling temp file, sync it, then rename it over `path`, so a
/// crash mid-flush leaves the previous document intact.
fn save_document(path: &Path, document: &BackendDocument) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp = temp_path(path);
    let result = write_synced(&tmp, document).and_then(|()| Ok(fs::rename(&tmp, path)?));
    if result.is_err() {
        if let Err(err) = fs::remove_file(&tmp) {
            warn!(path = ?tmp, error = %err, "could not remove partial state file");
        }
    }
    result
}

fn write_synced(path: &Path, document: &BackendDocument) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, document)?;
    writer.write_all(b"\n")?;
    let file = writer.into_inner().map_err(|err| err.into_error())?;
    file.sync_all()?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
