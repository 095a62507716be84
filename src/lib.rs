//! # diag-collector
//!
//! A host diagnostic collector that removes secrets from everything it
//! captures before the bundle leaves the machine.
//!
//! ## Overview
//!
//! Collection is declared first and executed later. Static registration
//! code adds tasks (commands, file copies, callbacks) to a
//! [`registry::CollectionSession`], gated by the capabilities activated for
//! the run. The [`collectors::TaskRunner`] then runs each task, passes its
//! output through the attached redaction filter and writes the result.
//!
//! ## Usage
//!
//! ```no_run
//! use diag_collector::capabilities::ActivationSet;
//! use diag_collector::collectors::{register_builtin_tasks, TaskRunner};
//! use diag_collector::config::CollectorConfig;
//! use diag_collector::registry::CollectionSession;
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = CollectorConfig::default();
//! let active = ActivationSet::resolve(None, &config.capabilities);
//!
//! let mut session = CollectionSession::new(active);
//! register_builtin_tasks(&mut session, &config);
//!
//! let report = TaskRunner::new(&config.capabilities, Path::new("/tmp/bundle")).run(&session)?;
//! println!("Collected {} members", report.collected.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`capabilities`]: capability definitions and the activation set
//! - [`registry`]: the collection session and its registration operations
//! - [`filters`]: redaction filters for the database dump, SNMP, clusterd and xenstore
//! - [`collectors`]: built-in tasks and the task runner
//! - [`config`]: YAML configuration
//! - [`security`]: log scrubbing and member naming
//! - [`utils`]: hashing, summaries, bounded run log and small file parsers

/// Command-line interface definitions and argument parsing
pub mod cli;

/// Capability definitions and activation
pub mod capabilities;

/// Built-in task registration and task execution
pub mod collectors;

/// Configuration management
pub mod config;

/// Application constants and configuration values
pub mod constants;

/// Redaction filters
pub mod filters;

/// Core data models used in reports
pub mod models;

/// The collection registry
pub mod registry;

/// Log scrubbing and output naming
pub mod security;

/// Utility functions for hashing, summaries and file parsing
pub mod utils;
