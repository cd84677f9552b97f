// src/config/build.rs

//! Turn a validated [`ConfigFile`] into a runnable [`Dag`].

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use globset::{Glob, GlobMatcher};
use tracing::{debug, warn};

use crate::action::ProcessAction;
use crate::artifact::Artifact;
use crate::config::model::{CommandSpec, ConfigFile, TaskConfig};
use crate::dag::{Dag, DagOptions};
use crate::errors::Result;
use crate::task::TaskSpec;

/// Build a DAG of process tasks; relative paths resolve against `root`,
/// which is also each command's working directory.
pub fn build_dag(cfg: &ConfigFile, root: &Path) -> Result<Dag> {
    let section = cfg.dag_section();
    let mut dag = Dag::with_options(
        section.name.clone(),
        DagOptions {
            always_execute: section.always_execute,
            continue_on_failure: section.continue_on_failure,
        },
    );

    for (name, task) in cfg.tasks() {
        let spec = task_spec(name, task, root)?;
        dag.add_task(spec)?;
    }

    debug!(dag = %dag.name(), tasks = dag.len(), root = ?root, "built DAG from config");
    Ok(dag)
}

fn task_spec(name: &str, task: &TaskConfig, root: &Path) -> Result<TaskSpec> {
    let action = match &task.cmd {
        CommandSpec::Shell(cmd) => ProcessAction::shell(cmd.clone()),
        CommandSpec::Argv(argv) => ProcessAction::argv(argv.iter().cloned()),
    }
    .current_dir(root);

    let mut spec = TaskSpec::new(name, action)
        .depends_on_all(expand_dependencies(name, &task.deps, root)?)
        .targets(task.targets.iter().map(|t| Artifact::file_target(root.join(t))))
        .ignore(task.ignore);

    for after in &task.after {
        spec = spec.after(after.clone());
    }
    if let Some(always) = task.always_execute {
        spec = spec.always_execute(always);
    }
    if let Some(cont) = task.continue_on_failure {
        spec = spec.continue_on_failure(cont);
    }
    for (key, value) in &task.options {
        spec = spec.option(key.clone(), value.clone());
    }
    Ok(spec)
}

fn expand_dependencies(task: &str, entries: &[String], root: &Path) -> Result<Vec<Artifact>> {
    let mut artifacts = Vec::new();
    let mut files: Option<Vec<PathBuf>> = None;

    for entry in entries {
        if !is_glob(entry) {
            artifacts.push(Artifact::file_dep(root.join(entry)));
            continue;
        }

        let matcher = Glob::new(entry)
            .with_context(|| format!("invalid glob pattern '{entry}' in task '{task}'"))?
            .compile_matcher();

        if files.is_none() {
            files = Some(walk_files(root)?);
        }
        let matched = matching_files(&matcher, root, files.as_deref().unwrap_or_default());
        if matched.is_empty() {
            warn!(task = %task, pattern = %entry, "dependency pattern matched no files");
        }
        artifacts.extend(matched.into_iter().map(Artifact::file_dep));
    }

    Ok(artifacts)
}

fn is_glob(entry: &str) -> bool {
    entry.contains(['*', '?', '[', '{'])
}

fn matching_files(matcher: &GlobMatcher, root: &Path, files: &[PathBuf]) -> Vec<PathBuf> {
    let mut matched: Vec<PathBuf> = files
        .iter()
        .filter(|path| {
            path.strip_prefix(root)
                .map(|rel| matcher.is_match(rel.to_string_lossy().replace('\\', "/")))
                .unwrap_or(false)
        })
        .cloned()
        .collect();
    matched.sort();
    matched
}

/// Every regular file below `root`, skipping hidden directories such as the
/// backend's own state directory.
fn walk_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                let hidden = path
                    .file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with('.'));
                if !hidden {
                    stack.push(path);
                }
            } else if path.is_file() {
                files.push(path);
            }
        }
    }

    Ok(files)
}
