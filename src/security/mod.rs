//! Safety helpers for what leaves the host.
//!
//! - Scrubbing of secrets from run log messages
//! - Mapping task labels and source paths to member paths that stay inside
//!   the output directory

pub mod log_scrubber;
pub mod member_path;

pub use log_scrubber::{safe_error_message, scrub_log_message};
pub use member_path::{file_member_path, label_member_name};
