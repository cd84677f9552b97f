// tests/failure_policy.rs
mod common;
use crate::common::*;

use dagrun::action::{CallArgs, CallableAction};
use dagrun::artifact::Artifact;
use dagrun::backend::{Backend, JsonFileBackend, MemoryBackend};
use dagrun::dag::{Dag, DagOptions};
use dagrun::errors::DagError;
use dagrun::reporter::{DagEvent, TaskEvent};
use dagrun::task::TaskSpec;

fn failing(name: &str, attempts: &Counter) -> CallableAction {
    let attempts = attempts.clone();
    CallableAction::new(name, move |_: &CallArgs| {
        attempts.bump();
        anyhow::bail!("{} is broken", "step")
    })
}

#[tokio::test]
async fn swallowed_failure_leaves_task_stale_for_next_run() -> TestResult {
    init_tracing();
    let store = store();
    store.put("in", "v");
    let reporter = RecordingReporter::new();
    let attempts = Counter::default();
    let downstream = Counter::default();

    let mut dag = Dag::new("flaky").with_reporter(reporter.clone());
    dag.add_task(
        TaskSpec::new("flaky", failing("flaky", &attempts))
            .depends_on(Artifact::memory_dep("in", &store))
            .target(Artifact::memory_target("out", &store))
            .continue_on_failure(true),
    )?;
    dag.add_task(
        TaskSpec::new("consume", counting("consume", &downstream))
            .depends_on(Artifact::memory_dep("out", &store)),
    )?;
    let mut backend = MemoryBackend::new("flaky");

    dag.run(&mut backend, None).await?;
    assert_eq!(attempts.get(), 1);
    assert!(backend.task_fingerprint("flaky").is_none());
    assert!(backend.run_with("flaky", "in").is_none());
    // The run went on; the missing artifact makes the consumer stale.
    assert_eq!(reporter.event_for("consume"), Some(TaskEvent::Execute));
    assert_eq!(
        reporter.reason_for("consume").as_deref(),
        Some("dependency 'out' missing")
    );

    reporter.clear();
    dag.run(&mut backend, None).await?;
    assert_eq!(reporter.event_for("flaky"), Some(TaskEvent::Execute));
    assert_eq!(attempts.get(), 2);
    assert_eq!(reporter.dag_events(), vec![DagEvent::Start, DagEvent::Done]);
    Ok(())
}

#[tokio::test]
async fn dag_default_applies_unless_task_overrides() -> TestResult {
    init_tracing();
    let attempts = Counter::default();
    let options = DagOptions {
        always_execute: false,
        continue_on_failure: true,
    };

    let mut lenient = Dag::with_options("lenient", options).with_reporter(RecordingReporter::new());
    lenient.add_task(TaskSpec::new("f", failing("f", &attempts)))?;
    lenient.run(&mut MemoryBackend::new("lenient"), None).await?;

    let mut strict = Dag::with_options("strict", options).with_reporter(RecordingReporter::new());
    strict.add_task(TaskSpec::new("f", failing("f", &attempts)).continue_on_failure(false))?;
    let err = strict
        .run(&mut MemoryBackend::new("strict"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, DagError::TaskFailed { .. }));
    assert_eq!(attempts.get(), 2);
    Ok(())
}

#[tokio::test]
async fn fatal_failure_flushes_completed_work_and_stops() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let state = dir.path().join("state.json");
    let store = store();
    store.put("src", "s");
    let reporter = RecordingReporter::new();
    let (ok_runs, later_runs, attempts) = (Counter::default(), Counter::default(), Counter::default());

    let mid = Artifact::memory_target("mid", &store);
    let mut dag = Dag::new("main").with_reporter(reporter.clone());
    dag.add_task(TaskSpec::new(
        "ok",
        copier("ok", &Artifact::memory_dep("src", &store), &mid, &ok_runs),
    ))?;
    dag.add_task(
        TaskSpec::new("bad", failing("bad", &attempts))
            .depends_on(mid.clone())
            .target(Artifact::memory_target("broken", &store)),
    )?;
    dag.add_task(
        TaskSpec::new("later", counting("later", &later_runs))
            .depends_on(Artifact::memory_dep("broken", &store)),
    )?;

    let mut backend = JsonFileBackend::open("main", &state)?;
    let err = dag.run(&mut backend, None).await.unwrap_err();

    match &err {
        DagError::TaskFailed { task, source } => {
            assert_eq!(task, "bad");
            assert!(format!("{source:#}").contains("step is broken"));
        }
        other => panic!("expected TaskFailed, got {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        "Task 'bad' failed: callable 'bad': step is broken"
    );
    assert_eq!(later_runs.get(), 0);
    assert_eq!(reporter.event_for("later"), None);
    assert_eq!(
        reporter.dag_events(),
        vec![DagEvent::Start, DagEvent::Done]
    );

    // "ok" was persisted before the failure propagated.
    let reloaded = JsonFileBackend::open("main", &state)?;
    assert!(reloaded.task_fingerprint("ok").is_some());
    assert!(reloaded.task_fingerprint("bad").is_none());
    Ok(())
}

#[tokio::test]
async fn each_run_reports_one_start_done_pair() -> TestResult {
    init_tracing();
    let reporter = RecordingReporter::new();
    let mut dag = Dag::new("pairs").with_reporter(reporter.clone());
    dag.add_task(TaskSpec::new("a", counting("a", &Counter::default())))?;
    dag.add_task(TaskSpec::new("b", counting("b", &Counter::default())))?;
    let mut backend = MemoryBackend::new("pairs");

    dag.run(&mut backend, None).await?;
    dag.run(&mut backend, Some(&["b"])).await?;

    assert_eq!(
        reporter.dag_events(),
        vec![DagEvent::Start, DagEvent::Done, DagEvent::Start, DagEvent::Done]
    );
    assert_eq!(reporter.executed(), vec!["a", "b", "b"]);
    Ok(())
}
