// tests/reporter.rs
mod common;
use crate::common::*;

use dagrun::artifact::Artifact;
use dagrun::backend::MemoryBackend;
use dagrun::dag::Dag;
use dagrun::reporter::{DagEvent, LogReporter, Reporter, ReporterExt, TaskEvent};
use dagrun::task::TaskSpec;

#[test]
fn event_names() {
    assert_eq!(TaskEvent::Skip.to_string(), "SKIP");
    assert_eq!(TaskEvent::Ignore.to_string(), "IGNORE");
    assert_eq!(TaskEvent::Execute.to_string(), "EXECUTE");
    assert_eq!(DagEvent::Start.to_string(), "START");
    assert_eq!(DagEvent::Done.to_string(), "DONE");
}

#[test]
fn filtered_reporter_hides_only_the_given_task_events() {
    let recorder = RecordingReporter::new();
    let filtered = recorder.clone().filter_out([TaskEvent::Skip]);

    filtered.dag_event(DagEvent::Start, "d");
    filtered.task_event(TaskEvent::Skip, "a", "up to date");
    filtered.task_event(TaskEvent::Execute, "b", "no dependencies");
    filtered.dag_event(DagEvent::Done, "d");

    assert_eq!(
        recorder.events(),
        vec![
            RecordedEvent::Dag { event: DagEvent::Start, dag: "d".into() },
            RecordedEvent::Task {
                event: TaskEvent::Execute,
                task: "b".into(),
                reason: "no dependencies".into(),
            },
            RecordedEvent::Dag { event: DagEvent::Done, dag: "d".into() },
        ]
    );
}

#[tokio::test]
async fn filtering_does_not_change_scheduling() -> TestResult {
    init_tracing();
    let store = store();
    store.put("in", "v");
    let recorder = RecordingReporter::new();
    let runs = Counter::default();

    let mut dag = Dag::new("quiet").with_reporter(recorder.clone().filter_out([TaskEvent::Skip]));
    dag.add_task(
        TaskSpec::new("t", counting("t", &runs)).depends_on(Artifact::memory_dep("in", &store)),
    )?;
    let mut backend = MemoryBackend::new("quiet");

    dag.run(&mut backend, None).await?;
    dag.run(&mut backend, None).await?;

    assert_eq!(runs.get(), 1);
    assert_eq!(recorder.task_events(), vec![("t".to_string(), TaskEvent::Execute)]);
    assert_eq!(recorder.dag_events().len(), 4);
    Ok(())
}

#[tokio::test]
async fn log_reporter_is_the_default() -> TestResult {
    init_tracing();
    let mut dag = Dag::new("logged");
    dag.add_task(TaskSpec::new("t", counting("t", &Counter::default())))?;
    dag.run(&mut MemoryBackend::new("logged"), None).await?;

    let boxed: Box<dyn Reporter> = Box::new(LogReporter);
    boxed.task_event(TaskEvent::Skip, "t", "up to date");
    boxed.dag_event(DagEvent::Done, "logged");
    Ok(())
}
