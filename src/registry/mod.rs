//! The collection registry.
//!
//! A [`CollectionSession`] holds the activated capabilities and the ordered
//! set of pending tasks for one run. Tasks are keyed by label; registering
//! a label again overwrites the earlier task in place. Every call is gated
//! on the capability being active and reports a [`RegistrationOutcome`]
//! instead of failing.

mod lookup;
mod outcome;
mod task;

pub use lookup::{CommandLookup, PathLookup};
pub use outcome::{RegistrationOutcome, SkipReason};
pub use task::{CallbackFn, CommandSpec, Task, TaskSource};

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use log::{debug, info, warn};
use serde_json::Value;

use crate::capabilities::ActivationSet;
use crate::filters::Filter;

pub struct CollectionSession {
    active: ActivationSet,
    tasks: Vec<Task>,
    index: HashMap<String, usize>,
    lookup: Box<dyn CommandLookup>,
    reported_missing: BTreeSet<String>,
}

impl CollectionSession {
    /// Session resolving commands against `PATH`
    pub fn new(active: ActivationSet) -> Self {
        Self::with_lookup(active, Box::new(PathLookup::from_env()))
    }

    pub fn with_lookup(active: ActivationSet, lookup: Box<dyn CommandLookup>) -> Self {
        Self {
            active,
            tasks: Vec::new(),
            index: HashMap::new(),
            lookup,
            reported_missing: BTreeSet::new(),
        }
    }

    pub fn active(&self) -> &ActivationSet {
        &self.active
    }

    pub fn is_active(&self, capability: &str) -> bool {
        self.active.contains(capability)
    }

    /// Tasks in registration order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, label: &str) -> Option<&Task> {
        self.index.get(label).map(|&i| &self.tasks[i])
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Register a command; the label defaults to the rendered command.
    ///
    /// Argument-vector commands whose program cannot be found are not
    /// registered. Shell strings are registered as given.
    pub fn register_command(
        &mut self,
        capability: &str,
        command: impl Into<CommandSpec>,
        label: Option<&str>,
        filter: Option<Filter>,
    ) -> RegistrationOutcome {
        let command = command.into();
        let outcome = self.add_command(capability, command, label, filter);
        self.report(outcome)
    }

    /// Register an `ls -l` listing for every path matching `patterns`
    pub fn register_files<S: AsRef<str>>(
        &mut self,
        capability: &str,
        patterns: &[S],
    ) -> Vec<RegistrationOutcome> {
        if !self.is_active(capability) {
            return vec![self.report(inactive(capability))];
        }

        let mut outcomes = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let paths = match glob::glob(pattern) {
                Ok(paths) => paths,
                Err(e) => {
                    outcomes.push(self.report(RegistrationOutcome::Skipped(
                        SkipReason::InvalidPattern {
                            pattern: pattern.to_string(),
                            error: e.to_string(),
                        },
                    )));
                    continue;
                }
            };

            let mut matched = 0;
            for entry in paths {
                match entry {
                    Ok(path) => {
                        matched += 1;
                        let path = path.to_string_lossy().into_owned();
                        let command = CommandSpec::argv(["ls", "-l", path.as_str()]);
                        let label = format!("ls -l {}", path);
                        let outcome = self.add_command(capability, command, Some(label.as_str()), None);
                        outcomes.push(self.report(outcome));
                    }
                    Err(e) => debug!("Unreadable glob entry for {}: {}", pattern, e),
                }
            }
            if matched == 0 {
                debug!("Pattern {} for {} matched nothing", pattern, capability);
            }
        }
        outcomes
    }

    /// Register each path as a file task labelled by the path itself
    pub fn register_file_copy<P: AsRef<Path>>(
        &mut self,
        capability: &str,
        paths: &[P],
    ) -> Vec<RegistrationOutcome> {
        if !self.is_active(capability) {
            return vec![self.report(inactive(capability))];
        }

        paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                let outcome = if path.exists() {
                    self.insert(Task {
                        label: path.to_string_lossy().into_owned(),
                        capability: capability.to_string(),
                        source: TaskSource::File(path.to_path_buf()),
                        filter: None,
                    })
                } else {
                    RegistrationOutcome::Skipped(SkipReason::MissingFile {
                        capability: capability.to_string(),
                        path: path.to_path_buf(),
                    })
                };
                self.report(outcome)
            })
            .collect()
    }

    /// Register a function producing the member's content
    pub fn register_callback<F>(
        &mut self,
        capability: &str,
        label: &str,
        callback: F,
    ) -> RegistrationOutcome
    where
        F: Fn(&str) -> Result<String> + Send + Sync + 'static,
    {
        self.register_callback_arc(capability, label, Arc::new(callback))
    }

    pub fn register_callback_arc(
        &mut self,
        capability: &str,
        label: &str,
        callback: Arc<CallbackFn>,
    ) -> RegistrationOutcome {
        let outcome = if self.is_active(capability) {
            self.insert(Task {
                label: label.to_string(),
                capability: capability.to_string(),
                source: TaskSource::Callback(callback),
                filter: None,
            })
        } else {
            inactive(capability)
        };
        self.report(outcome)
    }

    /// Every task described as JSON, in registration order
    pub fn plan(&self) -> Value {
        Value::Array(self.tasks.iter().map(Task::describe).collect())
    }

    fn add_command(
        &mut self,
        capability: &str,
        command: CommandSpec,
        label: Option<&str>,
        filter: Option<Filter>,
    ) -> RegistrationOutcome {
        if !self.is_active(capability) {
            return inactive(capability);
        }

        if command.is_empty() {
            return RegistrationOutcome::Skipped(SkipReason::EmptyCommand {
                capability: capability.to_string(),
            });
        }
        if let Some(program) = command.program() {
            if self.lookup.resolve(program).is_none() {
                return RegistrationOutcome::Skipped(SkipReason::MissingCommand {
                    capability: capability.to_string(),
                    program: program.to_string(),
                });
            }
        }

        let label = label.map_or_else(|| command.label(), str::to_string);
        self.insert(Task {
            label,
            capability: capability.to_string(),
            source: TaskSource::Command(command),
            filter,
        })
    }

    fn insert(&mut self, task: Task) -> RegistrationOutcome {
        match self.index.get(&task.label) {
            Some(&i) => {
                let label = task.label.clone();
                self.tasks[i] = task;
                RegistrationOutcome::Replaced(label)
            }
            None => {
                let label = task.label.clone();
                self.index.insert(label.clone(), self.tasks.len());
                self.tasks.push(task);
                RegistrationOutcome::Registered(label)
            }
        }
    }

    /// Central logging point for every registration
    fn report(&mut self, outcome: RegistrationOutcome) -> RegistrationOutcome {
        match &outcome {
            RegistrationOutcome::Registered(label) => debug!("Registered {}", label),
            RegistrationOutcome::Replaced(label) => debug!("Replaced earlier task {}", label),
            RegistrationOutcome::Skipped(reason @ SkipReason::Inactive { .. }) => {
                debug!("Skipped registration: {}", reason)
            }
            RegistrationOutcome::Skipped(reason @ SkipReason::MissingCommand { program, .. }) => {
                if self.reported_missing.insert(program.clone()) {
                    info!("{}", reason);
                }
            }
            RegistrationOutcome::Skipped(reason @ SkipReason::MissingFile { path, .. }) => {
                if self.reported_missing.insert(path.to_string_lossy().into_owned()) {
                    info!("{}", reason);
                }
            }
            RegistrationOutcome::Skipped(reason) => warn!("Skipped registration: {}", reason),
        }
        outcome
    }
}

fn inactive(capability: &str) -> RegistrationOutcome {
    RegistrationOutcome::Skipped(SkipReason::Inactive {
        capability: capability.to_string(),
    })
}
