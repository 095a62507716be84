//! Names of the members written into the output directory.

use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Result};

/// Member path of a copied file: the source path made relative.
///
/// `/etc/xensource-inventory` becomes `etc/xensource-inventory`. Paths that
/// would leave the output directory are rejected.
pub fn file_member_path(source: &Path) -> Result<PathBuf> {
    let mut relative = PathBuf::new();
    for component in source.components() {
        match component {
            Component::Normal(name) => relative.push(name),
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
            Component::ParentDir => {
                bail!("Path traversal attempt detected: {} contains '..'", source.display())
            }
        }
    }
    if relative.as_os_str().is_empty() {
        bail!("No member name for {}", source.display());
    }
    Ok(relative)
}

/// Flat member name for a command or callback label
pub fn label_member_name(label: &str) -> String {
    let mut sanitized = String::with_capacity(label.len() + 4);
    for ch in label.trim().chars() {
        match ch {
            '/' | '\\' | ' ' => sanitized.push('_'),
            '\0' => continue,
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '\'' => sanitized.push('_'),
            c if c.is_control() => sanitized.push('_'),
            c => sanitized.push(c),
        }
    }
    let sanitized = sanitized.trim_start_matches(['.', '_']);
    if sanitized.is_empty() {
        return "unnamed.out".to_string();
    }
    format!("{}.out", sanitized)
}
