// src/artifact/memory.rs

//! In-memory artifacts and the label → value store backing them.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use once_cell::sync::Lazy;
use tracing::debug;

use crate::artifact::hash::compute_bytes_hash;
use crate::errors::{DagError, Result};
use crate::types::{Fingerprint, Label};

static GLOBAL_STORE: Lazy<MemoryStore> = Lazy::new(MemoryStore::new);

/// Shared table from artifact label to its current value.
///
/// Cloning a store yields another handle to the same table. The process-wide
/// table is available through [`MemoryStore::global`]; independent DAGs (and
/// tests) can use their own store with [`MemoryStore::new`] to stay isolated.
/// Nothing is ever reset automatically: call [`MemoryStore::clear`] between
/// runs that reuse labels but must not see each other's values.
#[derive(Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<Label, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the process-wide store.
    pub fn global() -> Self {
        GLOBAL_STORE.clone()
    }

    fn values(&self) -> MutexGuard<'_, HashMap<Label, Vec<u8>>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn put(&self, label: &str, data: impl Into<Vec<u8>>) {
        let data = data.into();
        debug!(label = %label, bytes = data.len(), "storing in-memory artifact");
        self.values().insert(label.to_string(), data);
    }

    pub fn get(&self, label: &str) -> Option<Vec<u8>> {
        self.values().get(label).cloned()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.values().contains_key(label)
    }

    pub fn remove(&self, label: &str) -> Option<Vec<u8>> {
        self.values().remove(label)
    }

    pub fn clear(&self) {
        self.values().clear();
    }

    pub fn len(&self) -> usize {
        self.values().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.len())
            .finish()
    }
}

/// An artifact whose content lives in a [`MemoryStore`] under its label.
#[derive(Debug, Clone)]
pub struct MemoryArtifact {
    label: Label,
    store: MemoryStore,
}

impl MemoryArtifact {
    pub fn new(label: impl Into<Label>, store: &MemoryStore) -> Self {
        Self {
            label: label.into(),
            store: store.clone(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn exists(&self) -> bool {
        self.store.contains(&self.label)
    }

    pub fn fingerprint(&self) -> Result<Fingerprint> {
        self.store
            .get(&self.label)
            .map(|data| compute_bytes_hash(&data))
            .ok_or_else(|| DagError::MissingArtifact(self.label.clone()))
    }

    pub fn data(&self) -> Result<Vec<u8>> {
        self.store
            .get(&self.label)
            .ok_or_else(|| DagError::MissingArtifact(self.label.clone()))
    }

    pub(crate) fn write(&self, data: &[u8]) {
        self.store.put(&self.label, data);
    }
}
