// tests/config.rs
mod common;
use crate::common::*;

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use dagrun::action::{Action, CommandLine};
use dagrun::backend::{Backend, MemoryBackend};
use dagrun::config::{CommandSpec, ConfigFile, build_dag, load_and_validate, parse_and_validate};
use dagrun::errors::DagError;
use dagrun::reporter::TaskEvent;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn full_config_loads_with_defaults() -> TestResult {
    let file = write_config(
        r#"
[task.generate]
cmd = ["python3", "gen.py"]
targets = ["gen/out.txt"]

[task.compile]
cmd = "cc %(flags)s -o %(targets)s %(dependencies)s"
deps = ["src/*.c"]
targets = ["app"]
after = ["generate"]
continue_on_failure = true
options = { flags = "-O2" }
"#,
    );

    let cfg = load_and_validate(file.path())?;
    assert_eq!(cfg.dag_section().name, "main");
    assert_eq!(cfg.dag_section().backend, ".dagrun/state.json");
    assert!(!cfg.dag_section().always_execute);

    let generate = &cfg.tasks()["generate"];
    assert_eq!(
        generate.cmd,
        CommandSpec::Argv(vec!["python3".into(), "gen.py".into()])
    );
    let compile = &cfg.tasks()["compile"];
    assert_eq!(compile.after, vec!["generate"]);
    assert_eq!(compile.continue_on_failure, Some(true));
    assert_eq!(compile.always_execute, None);
    assert_eq!(compile.options["flags"], "-O2");
    Ok(())
}

#[test]
fn dag_cycle_returns_structured_error() {
    let file = write_config(
        r#"
[task.A]
cmd = "echo A"
after = ["B"]

[task.B]
cmd = "echo B"
after = ["A"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(DagError::DagCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains('A') || msg.contains('B'));
        }
        Err(e) => panic!("Expected DagCycle error, got: {e:?}"),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn unknown_dependency_returns_config_error() {
    let file = write_config(
        r#"
[task.A]
cmd = "echo A"
after = ["NonExistent"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(DagError::ConfigError(msg)) => {
            assert!(msg.contains("unknown dependency"));
            assert!(msg.contains("NonExistent"));
        }
        Err(e) => panic!("Expected ConfigError, got: {e:?}"),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn invalid_configs_are_rejected() {
    let cases = [
        ("[dag]\nname = \"x\"\n", "at least one"),
        ("[dag]\nname = \"\"\n[task.a]\ncmd = \"true\"\n", "name must not be empty"),
        ("[task.a]\ncmd = \"true\"\nafter = [\"a\"]\n", "itself"),
        ("[task.a]\ncmd = \"  \"\n", "empty `cmd`"),
        ("[task.a]\ncmd = []\n", "empty `cmd`"),
    ];
    for (text, needle) in cases {
        match parse_and_validate(text) {
            Err(DagError::ConfigError(msg)) => assert!(msg.contains(needle), "{msg} / {needle}"),
            other => panic!("expected ConfigError for {text:?}, got {other:?}"),
        }
    }

    assert!(matches!(
        parse_and_validate("[task.a]\nafter = []\n"),
        Err(DagError::TomlError(_))
    ));
}

#[test]
fn builder_raw_config_goes_through_validation() {
    let raw = ConfigFileBuilder::new()
        .with_task("a", TaskConfigBuilder::argv(&["true"]).after("ghost").build())
        .build_raw();
    assert_eq!(raw.dag.name, "main");

    match ConfigFile::try_from(raw) {
        Err(DagError::ConfigError(msg)) => {
            assert!(msg.contains("unknown dependency"), "msg: {msg}");
            assert!(msg.contains("ghost"), "msg: {msg}");
        }
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn builder_output_round_trips_through_toml() -> TestResult {
    let builder = ConfigFileBuilder::new()
        .name("roundtrip")
        .continue_on_failure(true)
        .with_task(
            "a",
            TaskConfigBuilder::new("echo %(msg)s")
                .dep("in.txt")
                .target("out.txt")
                .option("msg", "hi")
                .build(),
        )
        .with_task("b", TaskConfigBuilder::argv(&["true"]).after("a").build());

    let cfg: ConfigFile = parse_and_validate(&builder.to_toml())?;
    assert_eq!(cfg.dag_section().name, "roundtrip");
    assert!(cfg.dag_section().continue_on_failure);
    assert_eq!(cfg.tasks()["b"].after, vec!["a"]);
    assert_eq!(cfg.tasks()["a"].deps, vec!["in.txt"]);
    Ok(())
}

fn touch(root: &Path, rel: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, rel).unwrap();
}

#[test]
fn build_expands_globs_and_keeps_literals() -> TestResult {
    let dir = tempfile::tempdir()?;
    let root = dir.path();
    for rel in ["src/b.c", "src/a.c", "src/sub/c.c", "src/readme.md", ".hidden/d.c"] {
        touch(root, rel);
    }

    let cfg = ConfigFileBuilder::new()
        .name("globs")
        .with_task(
            "compile",
            TaskConfigBuilder::new("cc -o %(targets)s %(dependencies)s")
                .dep("src/**/*.c")
                .dep("vendor/missing.h")
                .dep("nothing/*.zz")
                .target("out/app")
                .build(),
        )
        .build();

    let dag = build_dag(&cfg, root)?;
    assert_eq!(dag.name(), "globs");
    let task = dag.task("compile").unwrap();

    let deps: Vec<_> = task.dependencies().iter().map(|a| a.path().unwrap().to_path_buf()).collect();
    assert_eq!(
        deps,
        vec![
            root.join("src/a.c"),
            root.join("src/b.c"),
            root.join("src/sub/c.c"),
            root.join("vendor/missing.h"),
        ]
    );
    assert_eq!(task.targets()[0].path(), Some(root.join("out/app").as_path()));

    match task.action() {
        Action::Process(p) => assert_eq!(
            p.command(),
            &CommandLine::Shell("cc -o %(targets)s %(dependencies)s".into())
        ),
        other => panic!("expected a process action, got {other:?}"),
    }
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn configured_dag_runs_incrementally() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let root = dir.path();
    fs::write(root.join("in.txt"), "one")?;

    let cfg = ConfigFileBuilder::new()
        .name("cfg")
        .with_task(
            "upper",
            TaskConfigBuilder::new("tr a-z A-Z < %(dependencies)s > %(targets)s")
                .dep("in.txt")
                .target("upper.txt")
                .build(),
        )
        .with_task(
            "stamp",
            TaskConfigBuilder::new("echo %(tag)s >> stamps.txt")
                .after("upper")
                .option("tag", "ran")
                .build(),
        )
        .build();

    let reporter = RecordingReporter::new();
    let dag = build_dag(&cfg, root)?.with_reporter(reporter.clone());
    let mut backend = MemoryBackend::new("cfg");

    dag.run(&mut backend, None).await?;
    assert_eq!(fs::read_to_string(root.join("upper.txt"))?, "ONE");
    assert_eq!(reporter.executed(), vec!["upper", "stamp"]);

    reporter.clear();
    dag.run(&mut backend, None).await?;
    assert_eq!(reporter.event_for("upper"), Some(TaskEvent::Skip));
    assert_eq!(reporter.event_for("stamp"), Some(TaskEvent::Skip));

    fs::write(root.join("in.txt"), "two")?;
    reporter.clear();
    dag.run(&mut backend, None).await?;
    assert_eq!(reporter.executed(), vec!["upper", "stamp"]);
    assert_eq!(fs::read_to_string(root.join("stamps.txt"))?, "ran\nran\n");
    assert!(backend.task_fingerprint("stamp").is_some());
    Ok(())
}
