// src/artifact/mod.rs

//! Named, fingerprintable units of state.
//!
//! - [`file`] holds file-backed artifacts (fingerprint = digest of the bytes).
//! - [`memory`] holds in-memory artifacts and the [`MemoryStore`] behind them.
//! - [`hash`] contains the streaming content hashers.
//!
//! An [`Artifact`] is one *occurrence* of a resource: the resource itself plus
//! the role it plays for the task that mentions it. Two occurrences with the
//! same label are the same resource; only target occurrences may be written.

pub mod file;
pub mod hash;
pub mod memory;

use std::path::{Path, PathBuf};

use crate::errors::{DagError, Result};
use crate::types::Fingerprint;

pub use file::{FileArtifact, file_label};
pub use memory::{MemoryArtifact, MemoryStore};

/// Role an artifact occurrence plays for the task mentioning it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Dependency,
    Target,
}

/// The underlying resource.
#[derive(Debug, Clone)]
pub enum ArtifactKind {
    File(FileArtifact),
    Memory(MemoryArtifact),
}

#[derive(Debug, Clone)]
pub struct Artifact {
    kind: ArtifactKind,
    role: Role,
}

impl Artifact {
    pub fn new(kind: ArtifactKind, role: Role) -> Self {
        Self { kind, role }
    }

    pub fn file_dep(path: impl AsRef<Path>) -> Self {
        Self::new(ArtifactKind::File(FileArtifact::new(path)), Role::Dependency)
    }

    pub fn file_target(path: impl AsRef<Path>) -> Self {
        Self::new(ArtifactKind::File(FileArtifact::new(path)), Role::Target)
    }

    pub fn memory_dep(label: impl Into<String>, store: &MemoryStore) -> Self {
        Self::new(
            ArtifactKind::Memory(MemoryArtifact::new(label, store)),
            Role::Dependency,
        )
    }

    pub fn memory_target(label: impl Into<String>, store: &MemoryStore) -> Self {
        Self::new(
            ArtifactKind::Memory(MemoryArtifact::new(label, store)),
            Role::Target,
        )
    }

    /// The same resource in dependency role.
    pub fn as_dependency(&self) -> Self {
        Self::new(self.kind.clone(), Role::Dependency)
    }

    /// The same resource in target role.
    pub fn as_target(&self) -> Self {
        Self::new(self.kind.clone(), Role::Target)
    }

    pub fn kind(&self) -> &ArtifactKind {
        &self.kind
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_target(&self) -> bool {
        self.role == Role::Target
    }

    /// Graph/backend key, unique per resource.
    pub fn label(&self) -> &str {
        match &self.kind {
            ArtifactKind::File(f) => f.label(),
            ArtifactKind::Memory(m) => m.label(),
        }
    }

    /// Whether the resource currently has materialized content. Never fails.
    pub fn exists(&self) -> bool {
        match &self.kind {
            ArtifactKind::File(f) => f.exists(),
            ArtifactKind::Memory(m) => m.exists(),
        }
    }

    /// Content fingerprint, recomputed on every call.
    ///
    /// Fails if the content does not exist; callers treat that as "no
    /// fingerprint obtainable", never as an empty fingerprint.
    pub fn fingerprint(&self) -> Result<Fingerprint> {
        match &self.kind {
            ArtifactKind::File(f) => f.fingerprint(),
            ArtifactKind::Memory(m) => m.fingerprint(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.kind {
            ArtifactKind::File(f) => Some(f.path()),
            ArtifactKind::Memory(_) => None,
        }
    }

    /// String form used in command substitution: the path for files, the
    /// label for in-memory artifacts.
    pub fn display_value(&self) -> String {
        match &self.kind {
            ArtifactKind::File(f) => f.path().display().to_string(),
            ArtifactKind::Memory(m) => m.label().to_string(),
        }
    }

    /// Resolve a dependency occurrence to the value handed to a callable.
    pub fn resolve(&self) -> Result<Resolved> {
        match &self.kind {
            ArtifactKind::File(f) => Ok(Resolved::Path(f.path().to_path_buf())),
            ArtifactKind::Memory(m) => Ok(Resolved::Data(m.data()?)),
        }
    }

    /// Replace the resource's content. Only legal through a target occurrence.
    pub fn write(&self, data: impl AsRef<[u8]>) -> Result<()> {
        if !self.is_target() {
            return Err(DagError::NotATarget(self.label().to_string()));
        }
        match &self.kind {
            ArtifactKind::File(f) => f.write(data.as_ref()),
            ArtifactKind::Memory(m) => {
                m.write(data.as_ref());
                Ok(())
            }
        }
    }
}

/// A dependency argument after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// File dependency: the callable reads the file itself.
    Path(PathBuf),
    /// In-memory dependency: the current payload.
    Data(Vec<u8>),
}

impl Resolved {
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Resolved::Path(p) => Some(p),
            Resolved::Data(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Resolved::Path(_) => None,
            Resolved::Data(d) => Some(d),
        }
    }

    /// Read the value as UTF-8 text, loading the file for path values.
    pub fn read_to_string(&self) -> Result<String> {
        match self {
            Resolved::Path(p) => Ok(std::fs::read_to_string(p)?),
            Resolved::Data(d) => String::from_utf8(d.clone())
                .map_err(|e| DagError::Other(anyhow::anyhow!("invalid UTF-8 in artifact: {e}"))),
        }
    }
}
