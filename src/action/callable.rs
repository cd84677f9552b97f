// src/action/callable.rs

//! In-process function actions with bound arguments.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use tracing::debug;

use crate::artifact::{Artifact, Resolved, Role};
use crate::errors::{DagError, Result};

/// Signature of the function wrapped by a [`CallableAction`].
pub type CallableFn = dyn Fn(&CallArgs) -> anyhow::Result<()> + Send + Sync;

/// One argument bound at construction time.
#[derive(Debug, Clone)]
pub enum Arg {
    Text(String),
    Artifact(Artifact),
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Text(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Text(value)
    }
}

impl From<Artifact> for Arg {
    fn from(value: Artifact) -> Self {
        Arg::Artifact(value)
    }
}

impl From<&Artifact> for Arg {
    fn from(value: &Artifact) -> Self {
        Arg::Artifact(value.clone())
    }
}

/// Argument as seen by the function at call time.
#[derive(Debug, Clone)]
pub enum ArgValue {
    Text(String),
    /// A dependency, resolved to its path or payload.
    Input(Resolved),
    /// A target, which the function fills through [`TargetHandle::write`].
    Output(TargetHandle),
}

/// Write access to a target artifact from inside a callable.
#[derive(Debug, Clone)]
pub struct TargetHandle {
    artifact: Artifact,
}

impl TargetHandle {
    pub fn label(&self) -> &str {
        self.artifact.label()
    }

    pub fn path(&self) -> Option<&Path> {
        self.artifact.path()
    }

    pub fn write(&self, data: impl AsRef<[u8]>) -> Result<()> {
        self.artifact.write(data)
    }
}

/// Positional index or keyword name used to look up a call argument.
#[derive(Debug, Clone)]
pub enum ArgKey {
    Index(usize),
    Name(String),
}

impl From<usize> for ArgKey {
    fn from(value: usize) -> Self {
        ArgKey::Index(value)
    }
}

impl From<&str> for ArgKey {
    fn from(value: &str) -> Self {
        ArgKey::Name(value.to_string())
    }
}

impl fmt::Display for ArgKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgKey::Index(i) => write!(f, "#{i}"),
            ArgKey::Name(n) => write!(f, "'{n}'"),
        }
    }
}

/// Resolved arguments handed to the wrapped function.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    positional: Vec<ArgValue>,
    keyword: BTreeMap<String, ArgValue>,
}

impl CallArgs {
    pub fn positional(&self) -> &[ArgValue] {
        &self.positional
    }

    pub fn keyword(&self) -> &BTreeMap<String, ArgValue> {
        &self.keyword
    }

    pub fn get(&self, key: impl Into<ArgKey>) -> Option<&ArgValue> {
        match key.into() {
            ArgKey::Index(i) => self.positional.get(i),
            ArgKey::Name(n) => self.keyword.get(&n),
        }
    }

    fn require(&self, key: ArgKey) -> anyhow::Result<&ArgValue> {
        match &key {
            ArgKey::Index(i) => self.positional.get(*i),
            ArgKey::Name(n) => self.keyword.get(n),
        }
        .ok_or_else(|| anyhow!("no argument {key}"))
    }

    pub fn text(&self, key: impl Into<ArgKey>) -> anyhow::Result<&str> {
        let key = key.into();
        match self.require(key.clone())? {
            ArgValue::Text(t) => Ok(t),
            other => Err(anyhow!("argument {key} is not text: {other:?}")),
        }
    }

    pub fn input(&self, key: impl Into<ArgKey>) -> anyhow::Result<&Resolved> {
        let key = key.into();
        match self.require(key.clone())? {
            ArgValue::Input(r) => Ok(r),
            other => Err(anyhow!("argument {key} is not a dependency: {other:?}")),
        }
    }

    pub fn output(&self, key: impl Into<ArgKey>) -> anyhow::Result<&TargetHandle> {
        let key = key.into();
        match self.require(key.clone())? {
            ArgValue::Output(t) => Ok(t),
            other => Err(anyhow!("argument {key} is not a target: {other:?}")),
        }
    }
}

/// Invokes an in-process function with arguments bound at construction.
///
/// Every bound artifact is classified by its role: dependency occurrences
/// become the action's discovered dependencies, target occurrences its
/// discovered targets.
#[derive(Clone)]
pub struct CallableAction {
    name: String,
    func: Arc<CallableFn>,
    args: Vec<Arg>,
    kwargs: BTreeMap<String, Arg>,
}

impl fmt::Debug for CallableAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallableAction")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("kwargs", &self.kwargs)
            .finish_non_exhaustive()
    }
}

impl CallableAction {
    pub fn builder<F>(name: impl Into<String>, func: F) -> CallableActionBuilder
    where
        F: Fn(&CallArgs) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        CallableActionBuilder {
            name: name.into(),
            func: Arc::new(func),
            args: Vec::new(),
            kwargs: Vec::new(),
        }
    }

    /// Shorthand for a function without bound arguments.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&CallArgs) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
            args: Vec::new(),
            kwargs: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn bound_artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.args
            .iter()
            .chain(self.kwargs.values())
            .filter_map(|arg| match arg {
                Arg::Artifact(a) => Some(a),
                Arg::Text(_) => None,
            })
    }

    pub fn discovered_dependencies(&self) -> Vec<&Artifact> {
        self.bound_artifacts()
            .filter(|a| a.role() == Role::Dependency)
            .collect()
    }

    pub fn discovered_targets(&self) -> Vec<&Artifact> {
        self.bound_artifacts()
            .filter(|a| a.role() == Role::Target)
            .collect()
    }

    /// Resolve the bound arguments and call the function.
    pub fn execute(&self) -> anyhow::Result<()> {
        let args = CallArgs {
            positional: self
                .args
                .iter()
                .map(resolve_arg)
                .collect::<anyhow::Result<_>>()?,
            keyword: self
                .kwargs
                .iter()
                .map(|(k, v)| Ok((k.clone(), resolve_arg(v)?)))
                .collect::<anyhow::Result<_>>()?,
        };

        debug!(
            callable = %self.name,
            positional = args.positional.len(),
            keyword = args.keyword.len(),
            "invoking callable"
        );

        (self.func)(&args).with_context(|| format!("callable '{}'", self.name))
    }
}

fn resolve_arg(arg: &Arg) -> anyhow::Result<ArgValue> {
    Ok(match arg {
        Arg::Text(t) => ArgValue::Text(t.clone()),
        Arg::Artifact(a) if a.is_target() => ArgValue::Output(TargetHandle {
            artifact: a.clone(),
        }),
        Arg::Artifact(a) => ArgValue::Input(
            a.resolve()
                .with_context(|| format!("resolving dependency '{}'", a.label()))?,
        ),
    })
}

/// Collects bound arguments and validates them in [`build`](Self::build).
pub struct CallableActionBuilder {
    name: String,
    func: Arc<CallableFn>,
    args: Vec<Arg>,
    kwargs: Vec<(String, Arg)>,
}

impl CallableActionBuilder {
    pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn kwarg(mut self, key: impl Into<String>, arg: impl Into<Arg>) -> Self {
        self.kwargs.push((key.into(), arg.into()));
        self
    }

    /// Validate the binding and produce the action.
    ///
    /// Rejects empty or repeated keyword names, and an artifact bound both as
    /// a dependency and as a target of the same action.
    pub fn build(self) -> Result<CallableAction> {
        let mut kwargs = BTreeMap::new();
        for (key, arg) in self.kwargs {
            if key.trim().is_empty() {
                return Err(DagError::InvalidAction(format!(
                    "callable '{}' has an empty keyword argument name",
                    self.name
                )));
            }
            if kwargs.contains_key(&key) {
                return Err(DagError::InvalidAction(format!(
                    "callable '{}' binds keyword argument '{}' more than once",
                    self.name, key
                )));
            }
            kwargs.insert(key, arg);
        }

        let action = CallableAction {
            name: self.name,
            func: self.func,
            args: self.args,
            kwargs,
        };

        check_roles(&action)?;
        Ok(action)
    }
}

fn check_roles(action: &CallableAction) -> Result<()> {
    let mut roles: HashMap<&str, Role> = HashMap::new();
    for artifact in action.bound_artifacts() {
        match roles.insert(artifact.label(), artifact.role()) {
            Some(previous) if previous != artifact.role() => {
                return Err(DagError::InvalidAction(format!(
                    "callable '{}' binds artifact '{}' as both dependency and target",
                    action.name,
                    artifact.label()
                )));
            }
            _ => {}
        }
    }
    Ok(())
}
