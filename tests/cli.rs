// tests/cli.rs
mod common;
use crate::common::*;

use std::fs;

use clap::Parser;
use tracing::Level;

use dagrun::artifact::file_label;
use dagrun::backend::{Backend, JsonFileBackend};
use dagrun::cli::{CliArgs, LogLevel};
use dagrun::config::{build_dag, parse_and_validate};
use dagrun::logging::resolve_level;
use dagrun::resolve_targets;

#[test]
fn parses_flags() {
    let args = CliArgs::parse_from([
        "dagrun",
        "--config",
        "ci/Dagfile.toml",
        "--target",
        "build",
        "--target",
        "out/app",
        "--log-level",
        "debug",
        "--graph",
    ]);
    assert_eq!(args.config, "ci/Dagfile.toml");
    assert_eq!(args.targets, vec!["build", "out/app"]);
    assert_eq!(args.log_level, Some(LogLevel::Debug));
    assert!(args.graph);
    assert!(!args.dry_run);
    assert!(args.backend.is_none());

    let defaults = CliArgs::parse_from(["dagrun"]);
    assert_eq!(defaults.config, "Dagfile.toml");
    assert!(defaults.targets.is_empty());

    assert!(CliArgs::try_parse_from(["dagrun", "--graph", "--dry-run"]).is_err());
}

#[test]
fn log_level_priority() {
    assert_eq!(resolve_level(Some(LogLevel::Trace), Some("error")), Level::TRACE);
    assert_eq!(resolve_level(None, Some(" Warning ")), Level::WARN);
    assert_eq!(resolve_level(None, Some("nonsense")), Level::INFO);
    assert_eq!(resolve_level(None, None), Level::INFO);
}

#[test]
fn targets_resolve_to_task_names_or_file_labels() -> TestResult {
    let dir = tempfile::tempdir()?;
    let cfg = parse_and_validate(
        r#"
[task.build]
cmd = "true"
targets = ["out/app"]
"#,
    )?;
    let dag = build_dag(&cfg, dir.path())?;

    let labels = resolve_targets(&dag, &["build".to_string(), "out/app".to_string()], dir.path());
    assert_eq!(labels[0], "build");
    assert_eq!(labels[1], file_label(&dir.path().join("out/app")));

    let graph = dag.graph(Some(&[labels[1].as_str()]))?;
    assert!(graph.contains("build"));
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn run_uses_the_configured_backend_path() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let root = dir.path();
    fs::write(root.join("msg.txt"), "hello")?;
    let config = root.join("Dagfile.toml");
    fs::write(
        &config,
        r#"
[dag]
name = "site"

[task.render]
cmd = "cp %(dependencies)s %(targets)s"
deps = ["msg.txt"]
targets = ["public/msg.txt"]
after = ["prepare"]

[task.prepare]
cmd = "mkdir -p public"
"#,
    )?;

    let args = CliArgs::parse_from(["dagrun", "--config", config.to_str().unwrap()]);
    with_timeout(dagrun::run(args)).await?;

    assert_eq!(fs::read_to_string(root.join("public/msg.txt"))?, "hello");
    let state = root.join(".dagrun/state.json");
    let backend = JsonFileBackend::open("site", &state)?;
    assert!(backend.task_fingerprint("render").is_some());
    assert!(backend.task_fingerprint("prepare").is_some());

    let custom = root.join("elsewhere.json");
    let args = CliArgs::parse_from([
        "dagrun",
        "--config",
        config.to_str().unwrap(),
        "--backend",
        custom.to_str().unwrap(),
        "--target",
        "prepare",
    ]);
    dagrun::run(args).await?;
    let backend = JsonFileBackend::open("site", &custom)?;
    assert!(backend.task_fingerprint("prepare").is_some());
    assert!(backend.task_fingerprint("render").is_none());
    Ok(())
}

#[tokio::test]
async fn dry_run_and_graph_do_not_execute() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let config = dir.path().join("Dagfile.toml");
    fs::write(&config, "[task.never]\ncmd = \"exit 1\"\n")?;

    for flag in ["--dry-run", "--graph"] {
        let args = CliArgs::parse_from(["dagrun", "--config", config.to_str().unwrap(), flag]);
        dagrun::run(args).await?;
    }
    assert!(!dir.path().join(".dagrun").exists());
    Ok(())
}
