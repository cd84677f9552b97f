// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{DagError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = DagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.dag, raw.task))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_dag_section(cfg)?;
    validate_commands(cfg)?;
    validate_task_dependencies(cfg)?;
    validate_after_order(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(DagError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_dag_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.dag.name.trim().is_empty() {
        return Err(DagError::ConfigError(
            "[dag].name must not be empty".to_string(),
        ));
    }
    if cfg.dag.backend.trim().is_empty() {
        return Err(DagError::ConfigError(
            "[dag].backend must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_commands(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in &cfg.task {
        if task.cmd.is_empty() {
            return Err(DagError::ConfigError(format!(
                "task '{name}' has an empty `cmd`"
            )));
        }
    }
    Ok(())
}

fn validate_task_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in &cfg.task {
        for dep in &task.after {
            if dep == name {
                return Err(DagError::ConfigError(format!(
                    "task '{name}' cannot depend on itself in `after`"
                )));
            }
            if !cfg.task.contains_key(dep) {
                return Err(DagError::ConfigError(format!(
                    "task '{name}' has unknown dependency '{dep}' in `after`"
                )));
            }
        }
    }
    Ok(())
}

/// Edge direction: dep -> task, so `after = ["A"]` on B adds A -> B.
fn validate_after_order(cfg: &RawConfigFile) -> Result<()> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }
    for (name, task) in &cfg.task {
        for dep in &task.after {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_) => Ok(()),
        Err(cycle) => Err(DagError::DagCycle(format!(
            "cycle detected in `after` edges involving task '{}'",
            cycle.node_id()
        ))),
    }
}
