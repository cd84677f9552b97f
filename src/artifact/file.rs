// src/artifact/file.rs

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::artifact::hash::compute_file_hash;
use crate::errors::Result;
use crate::types::{Fingerprint, Label};

/// Prefix shared by every file artifact label.
pub const FILE_LABEL_PREFIX: &str = "[File] ";

/// A file-backed artifact.
///
/// The path is made absolute and lexically normalized at construction
/// (without touching the filesystem), so two occurrences naming the same file
/// through different spellings (`x.txt`, `./sub/../x.txt`) share one label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileArtifact {
    path: PathBuf,
    label: Label,
}

impl FileArtifact {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = absolute(path.as_ref());
        let label = format!("{FILE_LABEL_PREFIX}{}", path.display());
        Self { path, label }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn fingerprint(&self) -> Result<Fingerprint> {
        compute_file_hash(&self.path)
    }

    pub(crate) fn write(&self, data: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, data)?;
        Ok(())
    }
}

/// Label a file artifact at `path` gets; relative paths resolve against the
/// current directory.
pub fn file_label(path: &Path) -> Label {
    format!("{FILE_LABEL_PREFIX}{}", absolute(path).display())
}

fn absolute(path: &Path) -> PathBuf {
    let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    normalize(&path)
}

/// Drop `.` and fold `..` into its parent. Symlinks are not resolved.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `/..` is `/`
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    out
}

