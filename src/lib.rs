// src/lib.rs

pub mod action;
pub mod artifact;
pub mod backend;
pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod logging;
pub mod reporter;
pub mod task;
pub mod types;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

pub use crate::action::{Action, CallArgs, CallableAction, ProcessAction};
pub use crate::artifact::{Artifact, MemoryStore};
pub use crate::backend::{Backend, JsonFileBackend, MemoryBackend};
pub use crate::dag::{Dag, DagOptions, DepGraph};
pub use crate::errors::DagError;
pub use crate::reporter::{DagEvent, LogReporter, Reporter, ReporterExt, TaskEvent};
pub use crate::task::{TaskHandle, TaskSpec};

use crate::action::CommandLine;
use crate::artifact::file_label;
use crate::cli::CliArgs;
use crate::config::loader::{config_root_dir, load_and_validate};
use crate::config::build_dag;
use crate::types::Label;

/// High-level entry point used by `main.rs`.
///
/// Loads the config, builds the DAG, then either prints it (`--dry-run`,
/// `--graph`) or runs it against the JSON backend.
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    let root = config_root_dir(&config_path);
    let dag = build_dag(&cfg, &root)?;

    let labels = resolve_targets(&dag, &args.targets, &root);
    let label_refs: Vec<&str> = labels.iter().map(String::as_str).collect();
    let targets = (!label_refs.is_empty()).then_some(label_refs.as_slice());

    if args.dry_run {
        print_dry_run(&dag);
        return Ok(());
    }

    if args.graph {
        print!("{}", dag.graph(targets)?.to_dot());
        return Ok(());
    }

    let backend_path = match &args.backend {
        Some(path) => PathBuf::from(path),
        None => root.join(&cfg.dag_section().backend),
    };
    let mut backend = JsonFileBackend::open(dag.name(), &backend_path)?;

    info!(dag = %dag.name(), backend = ?backend_path, targets = ?labels, "starting run");
    dag.run(&mut backend, targets).await?;
    Ok(())
}

/// Map CLI targets to graph labels: task names stay as they are, anything
/// else is taken as a file path relative to `root`.
pub fn resolve_targets(dag: &Dag, targets: &[String], root: &Path) -> Vec<Label> {
    targets
        .iter()
        .map(|target| {
            if dag.task(target).is_some() {
                target.clone()
            } else {
                let label = file_label(&root.join(target));
                debug!(target = %target, label = %label, "resolved target to file label");
                label
            }
        })
        .collect()
}

fn print_dry_run(dag: &Dag) {
    println!("dagrun dry-run");
    println!("  dag = {}", dag.name());
    println!("  always_execute = {}", dag.options().always_execute);
    println!("  continue_on_failure = {}", dag.options().continue_on_failure);
    println!();

    println!("tasks ({}):", dag.len());
    for task in dag.tasks() {
        println!("  - {}", task.name());
        if let Action::Process(process) = task.action() {
            match process.command() {
                CommandLine::Shell(cmd) => println!("      cmd: {cmd}"),
                CommandLine::Argv(argv) => println!("      cmd: {argv:?}"),
            }
        }
        let deps = task.dependencies();
        if !deps.is_empty() {
            println!("      deps:");
            for dep in deps {
                println!("        {}", dep.display_value());
            }
        }
        let targets = task.targets();
        if !targets.is_empty() {
            println!("      targets:");
            for target in targets {
                println!("        {}", target.display_value());
            }
        }
        if !task.task_dependencies().is_empty() {
            println!("      after: {:?}", task.task_dependencies());
        }
        if task.always_execute() {
            println!("      always_execute: true");
        }
        if task.ignore() {
            println!("      ignore: true");
        }
        if task.continue_on_failure() {
            println!("      continue_on_failure: true");
        }
    }

    debug!("dry-run complete (no execution)");
}
