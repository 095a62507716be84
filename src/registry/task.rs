use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use serde_json::{json, Value};

use crate::filters::Filter;

/// Data source called with the owning capability's name
pub type CallbackFn = dyn Fn(&str) -> Result<String> + Send + Sync;

/// A command either as an argument vector or as a shell string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSpec {
    Argv(Vec<String>),
    Shell(String),
}

impl CommandSpec {
    pub fn argv<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::Argv(args.into_iter().map(Into::into).collect())
    }

    pub fn shell(command: &str) -> Self {
        CommandSpec::Shell(command.to_string())
    }

    /// Default label: the argv joined by spaces, or the string itself
    pub fn label(&self) -> String {
        match self {
            CommandSpec::Argv(args) => args.join(" "),
            CommandSpec::Shell(command) => command.clone(),
        }
    }

    /// The executable to look up before running.
    ///
    /// Shell strings have none: builtins, assignments and pipelines are
    /// resolved by `/bin/sh` when the command runs.
    pub fn program(&self) -> Option<&str> {
        match self {
            CommandSpec::Argv(args) => args.first().map(String::as_str),
            CommandSpec::Shell(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CommandSpec::Argv(args) => args.is_empty(),
            CommandSpec::Shell(command) => command.trim().is_empty(),
        }
    }
}

impl From<Vec<String>> for CommandSpec {
    fn from(args: Vec<String>) -> Self {
        CommandSpec::Argv(args)
    }
}

impl From<&[&str]> for CommandSpec {
    fn from(args: &[&str]) -> Self {
        CommandSpec::argv(args.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for CommandSpec {
    fn from(args: [&str; N]) -> Self {
        CommandSpec::argv(args)
    }
}

impl From<&str> for CommandSpec {
    fn from(command: &str) -> Self {
        CommandSpec::shell(command)
    }
}

impl From<String> for CommandSpec {
    fn from(command: String) -> Self {
        CommandSpec::Shell(command)
    }
}

/// Where the data of a task comes from. Exactly one per task.
#[derive(Clone)]
pub enum TaskSource {
    Command(CommandSpec),
    File(PathBuf),
    Callback(Arc<CallbackFn>),
}

impl TaskSource {
    pub fn kind(&self) -> &'static str {
        match self {
            TaskSource::Command(_) => "command",
            TaskSource::File(_) => "file",
            TaskSource::Callback(_) => "callback",
        }
    }
}

impl PartialEq for TaskSource {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TaskSource::Command(a), TaskSource::Command(b)) => a == b,
            (TaskSource::File(a), TaskSource::File(b)) => a == b,
            (TaskSource::Callback(a), TaskSource::Callback(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for TaskSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskSource::Command(spec) => f.debug_tuple("Command").field(spec).finish(),
            TaskSource::File(path) => f.debug_tuple("File").field(path).finish(),
            TaskSource::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// One pending collection task.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub label: String,
    pub capability: String,
    pub source: TaskSource,
    pub filter: Option<Filter>,
}

impl Task {
    pub fn command(&self) -> Option<&CommandSpec> {
        match &self.source {
            TaskSource::Command(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn filename(&self) -> Option<&Path> {
        match &self.source {
            TaskSource::File(path) => Some(path),
            _ => None,
        }
    }

    /// JSON description used by the `plan` output
    pub fn describe(&self) -> Value {
        let mut value = json!({
            "label": self.label,
            "capability": self.capability,
            "kind": self.source.kind(),
            "filter": self.filter.as_ref().map(Filter::name),
        });
        match &self.source {
            TaskSource::Command(CommandSpec::Argv(args)) => value["cmd_args"] = json!(args),
            TaskSource::Command(CommandSpec::Shell(command)) => value["cmd_args"] = json!(command),
            TaskSource::File(path) => value["filename"] = json!(path.to_string_lossy()),
            TaskSource::Callback(_) => {}
        }
        value
    }
}
