//! Supporting utilities for the collector.
//!
//! ## Components
//!
//! - **db_conf**: database locations listed in the xapi `db.conf`
//! - **kv_file**: inventory-style `KEY='value'` files
//! - **bounded_log**: size and line limited writer backing the run log
//! - **hash**: SHA-256 of collected members
//! - **summary**: the `collection_summary.json` report
//!
//! ## Reading the host inventory
//!
//! ```no_run
//! use diag_collector::utils::kv_file::read_key_value_file;
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let inventory = read_key_value_file(Path::new("/etc/xensource-inventory"))?;
//! if let Some(uuid) = inventory.get("INSTALLATION_UUID") {
//!     println!("Host {}", uuid);
//! }
//! # Ok(())
//! # }
//! ```

/// Size and line bounded log writer
pub mod bounded_log;

/// Database paths from `db.conf`
pub mod db_conf;

/// Cryptographic hash calculation utilities
pub mod hash;

/// Key/value file parsing
pub mod kv_file;

/// Collection summary generation and reporting
pub mod summary;
