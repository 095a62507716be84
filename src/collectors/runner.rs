//! Executes the registered tasks in order and writes their members.
//!
//! Every failure is turned into a log line and an omitted member; only
//! failing to create the output directory or the summary ends the run.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use chrono::Utc;
use log::{debug, error, info, warn};

use crate::capabilities::Capability;
use crate::constants::SUMMARY_FILE_NAME;
use crate::models::{CollectedEntry, OmittedEntry};
use crate::registry::{CollectionSession, CommandSpec, Task, TaskSource};
use crate::security::{file_member_path, label_member_name, safe_error_message};
use crate::utils::hash::sha256_hex;
use crate::utils::summary::create_collection_summary;

/// What happened to every task of a run
#[derive(Debug, Default, Clone)]
pub struct RunReport {
    pub collected: Vec<CollectedEntry>,
    pub omitted: Vec<OmittedEntry>,
}

pub struct TaskRunner {
    limits: HashMap<String, Option<u64>>,
    output_dir: PathBuf,
    hostname: String,
}

impl TaskRunner {
    pub fn new(capabilities: &[Capability], output_dir: &Path) -> Self {
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "unknown".to_string());
        Self {
            limits: capabilities
                .iter()
                .map(|cap| (cap.key.clone(), cap.size_limit()))
                .collect(),
            output_dir: output_dir.to_path_buf(),
            hostname,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run every task of `session` and write the collection summary
    pub fn run(&self, session: &CollectionSession) -> Result<RunReport> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create output directory {}", self.output_dir.display())
        })?;

        let started = Utc::now().to_rfc3339();
        let mut report = RunReport::default();
        let mut used_members = BTreeSet::new();

        info!("Running {} collection tasks", session.len());
        for task in session.tasks() {
            let written = self.run_task(task).and_then(|data| {
                self.write_member(task, &data, &mut used_members).map_err(|e| {
                    let message = safe_error_message(&format!("Failed to store {}", task.label), &e);
                    error!("{}", message);
                    message
                })
            });
            match written {
                Ok(entry) => report.collected.push(entry),
                Err(reason) => report.omitted.push(OmittedEntry {
                    label: task.label.clone(),
                    capability: task.capability.clone(),
                    reason,
                }),
            }
        }

        let capabilities: Vec<&str> = session.active().iter().collect();
        let summary = create_collection_summary(
            &self.hostname,
            &started,
            &capabilities,
            &report.collected,
            &report.omitted,
        )?;
        let summary_path = self.output_dir.join(SUMMARY_FILE_NAME);
        fs::write(&summary_path, summary)
            .with_context(|| format!("Failed to write {}", summary_path.display()))?;

        info!(
            "Collected {} members, omitted {}",
            report.collected.len(),
            report.omitted.len()
        );
        Ok(report)
    }

    /// Capture and filter one task. `Err` carries the omission reason,
    /// already logged.
    fn run_task(&self, task: &Task) -> std::result::Result<Vec<u8>, String> {
        let raw = match &task.source {
            TaskSource::File(path) => self.read_file(task, path)?,
            TaskSource::Command(spec) => self.run_command(task, spec)?,
            TaskSource::Callback(callback) => match callback(&task.capability) {
                Ok(output) => output.into_bytes(),
                Err(e) => {
                    let message = safe_error_message(&format!("Internal error in {}", task.label), &e);
                    error!("{}", message);
                    return Err(message);
                }
            },
        };

        let Some(filter) = &task.filter else {
            return Ok(raw);
        };
        filter.apply(&task.capability, &raw).map_err(|e| {
            let message = safe_error_message(
                &format!("Filter {} failed on {}", filter.name(), task.label),
                &e,
            );
            error!("{}", message);
            message
        })
    }

    fn read_file(&self, task: &Task, path: &Path) -> std::result::Result<Vec<u8>, String> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => {
                let message = format!("{} is not a regular file", path.display());
                warn!("{}", message);
                return Err(message);
            }
            Err(e) => {
                let message = format!("Unable to read {}: {}", path.display(), e);
                warn!("{}", message);
                return Err(message);
            }
        };

        self.check_size(task, &path.display().to_string(), metadata.len())?;

        let mut data = Vec::with_capacity(metadata.len() as usize);
        match fs::File::open(path).and_then(|mut file| file.read_to_end(&mut data)) {
            Ok(_) => Ok(data),
            Err(e) => {
                let message = format!("Unable to read {}: {}", path.display(), e);
                warn!("{}", message);
                Err(message)
            }
        }
    }

    fn run_command(&self, task: &Task, spec: &CommandSpec) -> std::result::Result<Vec<u8>, String> {
        let mut command = match spec {
            CommandSpec::Argv(args) => {
                let Some((program, rest)) = args.split_first() else {
                    return Err("empty command".to_string());
                };
                let mut command = Command::new(program);
                command.args(rest);
                command
            }
            CommandSpec::Shell(line) => {
                let mut command = Command::new("/bin/sh");
                command.arg("-c").arg(line);
                command
            }
        };

        debug!("Running {}", task.label);
        let output = command
            .stdin(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                let message = if e.kind() == ErrorKind::NotFound {
                    format!("{} command not found: {}", task.capability, task.label)
                } else {
                    safe_error_message(&format!("Failed to run {}", task.label), &e)
                };
                warn!("{}", message);
                message
            })?;

        // 127: the shell could not find the program
        if matches!(spec, CommandSpec::Shell(_)) && output.status.code() == Some(127) {
            let message = format!("{} command not found: {}", task.capability, task.label);
            warn!("{}", message);
            return Err(message);
        }
        if !output.status.success() {
            debug!(
                "{} exited with {}: {}",
                task.label,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        self.check_size(task, &task.label, output.stdout.len() as u64)?;
        Ok(output.stdout)
    }

    fn check_size(&self, task: &Task, what: &str, size: u64) -> std::result::Result<(), String> {
        match self.limits.get(&task.capability).copied().flatten() {
            Some(limit) if size > limit => {
                let message = format!(
                    "Omitting {}, size constraint of {} exceeded",
                    what, task.capability
                );
                info!("{}", message);
                Err(message)
            }
            _ => Ok(()),
        }
    }

    fn write_member(
        &self,
        task: &Task,
        data: &[u8],
        used: &mut BTreeSet<PathBuf>,
    ) -> Result<CollectedEntry> {
        let member = match &task.source {
            TaskSource::File(path) => file_member_path(path)?,
            _ => PathBuf::from(label_member_name(&task.label)),
        };
        let member = unique_member(member, used);

        let dest = self.output_dir.join(&member);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&dest, data).with_context(|| format!("Failed to write {}", dest.display()))?;
        debug!("Wrote {} ({} bytes)", member.display(), data.len());

        Ok(CollectedEntry {
            member: member.to_string_lossy().replace('\\', "/"),
            label: task.label.clone(),
            capability: task.capability.clone(),
            size: data.len() as u64,
            sha256: sha256_hex(data),
            filter: task.filter.as_ref().map(|f| f.name().to_string()),
            collection_time: Utc::now().to_rfc3339(),
        })
    }
}

/// Add a numeric suffix when two tasks map to the same member
fn unique_member(member: PathBuf, used: &mut BTreeSet<PathBuf>) -> PathBuf {
    if used.insert(member.clone()) {
        return member;
    }

    let stem = member
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "member".to_string());
    let extension = member
        .extension()
        .map(|s| format!(".{}", s.to_string_lossy()))
        .unwrap_or_default();

    let mut counter = 1;
    loop {
        let candidate = member.with_file_name(format!("{}_{}{}", stem, counter, extension));
        if used.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}
