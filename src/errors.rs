// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Duplicate task name: {0}")]
    DuplicateTask(String),

    #[error("Artifact shares name with task: {0:?}")]
    NameCollision(Vec<String>),

    #[error("Cycle detected in DAG: {0}")]
    DagCycle(String),

    #[error("Invalid action binding: {0}")]
    InvalidAction(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error(
        "Inconsistent backend: task '{task}' depends on task '{dependency}' which has no recorded fingerprint"
    )]
    InconsistentBackend { task: String, dependency: String },

    #[error("Artifact has no content: {0}")]
    MissingArtifact(String),

    #[error("Artifact is not a target and cannot be written: {0}")]
    NotATarget(String),

    #[error("Task '{task}' failed: {source:#}")]
    TaskFailed {
        task: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DagError>;
