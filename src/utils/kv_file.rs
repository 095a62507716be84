//! Inventory-style `KEY=value` files such as `/etc/xensource-inventory`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

pub fn read_key_value_file(path: &Path) -> Result<BTreeMap<String, String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read key/value file {}", path.display()))?;
    Ok(parse_key_value(&content))
}

/// Parse `KEY='value'`, `KEY="value"` and `KEY=value` lines.
///
/// Blank lines, comments and lines without `=` are skipped. A later
/// assignment to the same key wins.
pub fn parse_key_value(content: &str) -> BTreeMap<String, String> {
    let mut entries = BTreeMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        entries.insert(key.to_string(), unquote(value.trim()).to_string());
    }
    entries
}

fn unquote(value: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
