#![allow(dead_code)]

use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dagrun::action::{CallArgs, CallableAction};
use dagrun::artifact::{Artifact, MemoryStore};

pub use dagrun_test_utils::{
    ConfigFileBuilder, RecordedEvent, RecordingReporter, TaskConfigBuilder, init_tracing,
    with_timeout,
};

pub type TestResult = Result<(), Box<dyn Error>>;

/// Shared call counter for callables.
#[derive(Debug, Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Callable that counts its invocations and does nothing else.
pub fn counting(name: &str, counter: &Counter) -> CallableAction {
    let counter = counter.clone();
    CallableAction::new(name, move |_| {
        counter.bump();
        Ok(())
    })
}

/// Callable writing `payload` into target `target`.
pub fn writer(name: &str, target: &Artifact, payload: &'static str) -> CallableAction {
    CallableAction::builder(name, move |args: &CallArgs| {
        args.output(0)?.write(payload)?;
        Ok(())
    })
    .arg(target.as_target())
    .build()
    .expect("valid binding")
}

/// Callable copying dependency `from` (in-memory) into target `to`, with a suffix.
pub fn copier(name: &str, from: &Artifact, to: &Artifact, counter: &Counter) -> CallableAction {
    let counter = counter.clone();
    CallableAction::builder(name, move |args: &CallArgs| {
        counter.bump();
        let input = args.input("src")?.read_to_string()?;
        args.output("dst")?.write(format!("{input}!"))?;
        Ok(())
    })
    .kwarg("src", from.as_dependency())
    .kwarg("dst", to.as_target())
    .build()
    .expect("valid binding")
}

/// Fresh isolated store for in-memory artifacts.
pub fn store() -> MemoryStore {
    MemoryStore::new()
}
