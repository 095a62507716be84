//! Built-in task registration and task execution.
//!
//! ```text
//! CollectorConfig ──► register_builtin_tasks ──► CollectionSession
//!                                                      │
//!                                  TaskRunner::run ◄───┘
//!                                        │
//!                     members + collection_summary.json
//! ```

/// Static registration of the built-in tasks
pub mod catalogue;

/// Task execution and member output
pub mod runner;

pub use catalogue::register_builtin_tasks;
pub use runner::{RunReport, TaskRunner};
