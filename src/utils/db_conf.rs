//! Parser for the xapi `db.conf` file.
//!
//! Each database is a section whose header is its path in brackets,
//! followed by `key:value` settings:
//!
//! ```text
//! [/var/lib/xcp/state.db]
//! mode:write_only
//! format:xml
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Paths of every database declared in `path`, in file order
pub fn read_db_conf(path: &Path) -> Result<Vec<PathBuf>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read database configuration {}", path.display()))?;
    Ok(parse_db_conf(&content))
}

pub fn parse_db_conf(content: &str) -> Vec<PathBuf> {
    content
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix('[')?.strip_suffix(']'))
        .map(str::trim)
        .filter(|section| !section.is_empty())
        .map(PathBuf::from)
        .collect()
}
