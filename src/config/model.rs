// src/config/model.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::backend::json::DEFAULT_STATE_PATH;

/// Configuration exactly as deserialized from TOML, before validation.
///
/// ```toml
/// [dag]
/// name = "build"
///
/// [task.compile]
/// cmd = "cc -o %(targets)s %(dependencies)s"
/// deps = ["src/**/*.c"]
/// targets = ["out/app"]
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub dag: DagSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated configuration. Only obtainable through
/// `ConfigFile::try_from(RawConfigFile)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    dag: DagSection,
    task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(dag: DagSection, task: BTreeMap<String, TaskConfig>) -> Self {
        Self { dag, task }
    }

    pub fn dag_section(&self) -> &DagSection {
        &self.dag
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.task
    }
}

/// `[dag]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DagSection {
    #[serde(default = "default_dag_name")]
    pub name: String,

    /// Default for tasks that leave `always_execute` unset.
    #[serde(default)]
    pub always_execute: bool,

    /// Default for tasks that leave `continue_on_failure` unset.
    #[serde(default)]
    pub continue_on_failure: bool,

    /// State document, relative to the directory holding the config file.
    #[serde(default = "default_backend_path")]
    pub backend: String,
}

fn default_dag_name() -> String {
    "main".to_string()
}

fn default_backend_path() -> String {
    DEFAULT_STATE_PATH.to_string()
}

impl Default for DagSection {
    fn default() -> Self {
        Self {
            name: default_dag_name(),
            always_execute: false,
            continue_on_failure: false,
            backend: default_backend_path(),
        }
    }
}

/// `cmd = "..."` runs through the shell, `cmd = ["prog", "arg"]` does not.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CommandSpec {
    Shell(String),
    Argv(Vec<String>),
}

impl CommandSpec {
    pub fn is_empty(&self) -> bool {
        match self {
            CommandSpec::Shell(s) => s.trim().is_empty(),
            CommandSpec::Argv(v) => v.is_empty(),
        }
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaskConfig {
    pub cmd: CommandSpec,

    /// File dependencies; entries with glob metacharacters are expanded.
    #[serde(default)]
    pub deps: Vec<String>,

    /// Files produced by the command.
    #[serde(default)]
    pub targets: Vec<String>,

    /// Tasks that must run first, without an artifact between them.
    #[serde(default)]
    pub after: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub always_execute: Option<bool>,

    #[serde(default)]
    pub ignore: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continue_on_failure: Option<bool>,

    /// Extra `%(name)s` substitutions for the command.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}
