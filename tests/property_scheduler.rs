// tests/property_scheduler.rs
mod common;
use crate::common::*;

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use proptest::prelude::*;

use dagrun::action::{CallArgs, CallableAction};
use dagrun::artifact::Artifact;
use dagrun::backend::MemoryBackend;
use dagrun::dag::Dag;
use dagrun::reporter::TaskEvent;
use dagrun::task::TaskSpec;

/// Per task: indices of earlier tasks whose output it reads, and indices of
/// earlier tasks it runs after. Only `j < i` is kept, so the graph is acyclic.
#[derive(Debug, Clone)]
struct Shape {
    reads: Vec<BTreeSet<usize>>,
    after: Vec<BTreeSet<usize>>,
}

fn shape_strategy(max_tasks: usize) -> impl Strategy<Value = Shape> {
    (1..=max_tasks).prop_flat_map(|n| {
        let edges = proptest::collection::vec(
            (
                proptest::collection::vec(any::<usize>(), 0..3),
                proptest::collection::vec(any::<usize>(), 0..2),
            ),
            n,
        );
        edges.prop_map(|raw| {
            let sanitize = |i: usize, picks: Vec<usize>| -> BTreeSet<usize> {
                if i == 0 {
                    BTreeSet::new()
                } else {
                    picks.into_iter().map(|p| p % i).collect()
                }
            };
            let (reads, after) = raw
                .into_iter()
                .enumerate()
                .map(|(i, (r, a))| (sanitize(i, r), sanitize(i, a)))
                .unzip();
            Shape { reads, after }
        })
    })
}

fn build(shape: &Shape, log: &Arc<Mutex<Vec<String>>>, reporter: &RecordingReporter) -> Dag {
    let store = store();
    store.put("seed", "s");
    let mut dag = Dag::new("prop").with_reporter(reporter.clone());

    for (i, (reads, after)) in shape.reads.iter().zip(&shape.after).enumerate() {
        let name = format!("task_{i}");
        let log = log.clone();
        let label = name.clone();
        let action = CallableAction::builder(name.clone(), move |args: &CallArgs| {
            log.lock().unwrap().push(label.clone());
            args.output("out")?.write(label.as_bytes())?;
            Ok(())
        })
        .kwarg("out", Artifact::memory_target(format!("out_{i}"), &store))
        .build()
        .unwrap();

        let mut spec = TaskSpec::new(name, action).depends_on(Artifact::memory_dep("seed", &store));
        for j in reads {
            spec = spec.depends_on(Artifact::memory_dep(format!("out_{j}"), &store));
        }
        for j in after {
            spec = spec.after(format!("task_{j}"));
        }
        dag.add_task(spec).unwrap();
    }
    dag
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn tasks_run_after_their_dependencies_and_rerun_is_idempotent(shape in shape_strategy(8)) {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let reporter = RecordingReporter::new();
        let dag = build(&shape, &log, &reporter);
        let mut backend = MemoryBackend::new("prop");

        rt.block_on(dag.run(&mut backend, None)).unwrap();

        let order = log.lock().unwrap().clone();
        prop_assert_eq!(order.len(), shape.reads.len());
        let position: HashMap<&str, usize> =
            order.iter().enumerate().map(|(p, name)| (name.as_str(), p)).collect();
        for (i, (reads, after)) in shape.reads.iter().zip(&shape.after).enumerate() {
            let me = position[format!("task_{i}").as_str()];
            for j in reads.iter().chain(after) {
                let dep = position[format!("task_{j}").as_str()];
                prop_assert!(dep < me, "task_{} ran before its dependency task_{}", i, j);
            }
        }

        reporter.clear();
        rt.block_on(dag.run(&mut backend, None)).unwrap();
        for (task, event) in reporter.task_events() {
            prop_assert_eq!(event, TaskEvent::Skip, "task {} re-executed", task);
        }
        prop_assert_eq!(log.lock().unwrap().len(), shape.reads.len());
    }
}
