#![allow(dead_code)]

use std::collections::BTreeMap;
use dagrun::config::{CommandSpec, ConfigFile, DagSection, RawConfigFile, TaskConfig};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                dag: DagSection::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.config.dag.name = name.to_string();
        self
    }

    pub fn always_execute(mut self, val: bool) -> Self {
        self.config.dag.always_execute = val;
        self
    }

    pub fn continue_on_failure(mut self, val: bool) -> Self {
        self.config.dag.continue_on_failure = val;
        self
    }

    pub fn backend(mut self, path: &str) -> Self {
        self.config.dag.backend = path.to_string();
        self
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    /// The unvalidated config, e.g. to assert on validation errors.
    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    /// TOML text of the config, for tests that go through the loader.
    pub fn to_toml(&self) -> String {
        toml::to_string(&self.config).expect("config serializes to TOML")
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    /// Shell command.
    pub fn new(cmd: &str) -> Self {
        Self::from_command(CommandSpec::Shell(cmd.to_string()))
    }

    /// Argument vector, spawned without a shell.
    pub fn argv(args: &[&str]) -> Self {
        Self::from_command(CommandSpec::Argv(args.iter().map(|a| a.to_string()).collect()))
    }

    fn from_command(cmd: CommandSpec) -> Self {
        Self {
            task: TaskConfig {
                cmd,
                deps: vec![],
                targets: vec![],
                after: vec![],
                always_execute: None,
                ignore: false,
                continue_on_failure: None,
                options: BTreeMap::new(),
            },
        }
    }

    pub fn dep(mut self, path: &str) -> Self {
        self.task.deps.push(path.to_string());
        self
    }

    pub fn target(mut self, path: &str) -> Self {
        self.task.targets.push(path.to_string());
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn always_execute(mut self, val: bool) -> Self {
        self.task.always_execute = Some(val);
        self
    }

    pub fn ignore(mut self, val: bool) -> Self {
        self.task.ignore = val;
        self
    }

    pub fn continue_on_failure(mut self, val: bool) -> Self {
        self.task.continue_on_failure = Some(val);
        self
    }

    pub fn option(mut self, key: &str, value: &str) -> Self {
        self.task.options.insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
