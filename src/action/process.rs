// src/action/process.rs

//! External command actions.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{Context, bail};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::action::ActionContext;
use crate::action::template::expand;

/// Command line of a [`ProcessAction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandLine {
    /// Run through the platform shell after placeholder expansion.
    Shell(String),
    /// Spawned directly; elements are passed verbatim.
    Argv(Vec<String>),
}

/// Spawns a subprocess; a non-zero exit status fails the task.
#[derive(Debug, Clone)]
pub struct ProcessAction {
    command: CommandLine,
    cwd: Option<PathBuf>,
    env: BTreeMap<String, String>,
}

impl ProcessAction {
    pub fn shell(command: impl Into<String>) -> Self {
        Self::from_command(CommandLine::Shell(command.into()))
    }

    pub fn argv<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_command(CommandLine::Argv(args.into_iter().map(Into::into).collect()))
    }

    fn from_command(command: CommandLine) -> Self {
        Self {
            command,
            cwd: None,
            env: BTreeMap::new(),
        }
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn command(&self) -> &CommandLine {
        &self.command
    }

    /// Final command for the given task context, as it would be spawned.
    pub fn expand(&self, ctx: &ActionContext<'_>) -> crate::errors::Result<CommandLine> {
        match &self.command {
            CommandLine::Shell(template) => {
                Ok(CommandLine::Shell(expand(template, &substitutions(ctx))?))
            }
            CommandLine::Argv(args) => Ok(CommandLine::Argv(args.clone())),
        }
    }

    pub async fn execute(&self, ctx: &ActionContext<'_>) -> anyhow::Result<()> {
        let command = self.expand(ctx)?;

        let (mut cmd, shown) = match &command {
            CommandLine::Shell(line) => {
                let cmd = if cfg!(windows) {
                    let mut c = Command::new("cmd");
                    c.arg("/C").arg(line);
                    c
                } else {
                    let mut c = Command::new("sh");
                    c.arg("-c").arg(line);
                    c
                };
                (cmd, line.clone())
            }
            CommandLine::Argv(args) => {
                let Some((program, rest)) = args.split_first() else {
                    bail!("empty argument vector for task '{}'", ctx.task);
                };
                let mut c = Command::new(program);
                c.args(rest);
                (c, args.join(" "))
            }
        };

        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd.envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!(task = %ctx.task, cmd = %shown, "starting task process");

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning process for task '{}'", ctx.task))?;

        // Drain both pipes so the child never blocks on a full buffer.
        let mut pumps = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            let task = ctx.task.to_string();
            pumps.push(tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    info!(task = %task, "stdout: {}", line);
                }
            }));
        }
        if let Some(stderr) = child.stderr.take() {
            let task = ctx.task.to_string();
            pumps.push(tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(task = %task, "stderr: {}", line);
                }
            }));
        }

        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for process of task '{}'", ctx.task))?;

        for pump in pumps {
            if let Err(err) = pump.await {
                warn!(task = %ctx.task, error = %err, "output reader for task process failed");
            }
        }

        let code = status.code().unwrap_or(-1);
        info!(
            task = %ctx.task,
            exit_code = code,
            success = status.success(),
            "task process exited"
        );

        if !status.success() {
            bail!("command `{shown}` returned {code}");
        }
        Ok(())
    }
}

/// Values available to `%(name)s` placeholders.
///
/// Task options come first so the reserved keys always win.
fn substitutions(ctx: &ActionContext<'_>) -> BTreeMap<String, String> {
    let join = |artifacts: &[&crate::artifact::Artifact]| {
        artifacts
            .iter()
            .map(|a| a.display_value())
            .collect::<Vec<_>>()
            .join(" ")
    };

    let mut values = ctx.options.clone();
    values.insert("targets".to_string(), join(&ctx.targets));
    values.insert("dependencies".to_string(), join(&ctx.dependencies));
    values.insert("changed".to_string(), join(&ctx.changed));
    values
}
