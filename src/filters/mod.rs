//! Redaction filters.
//!
//! Every filter maps raw captured output to redacted output, keeps the
//! format of its input valid and only replaces sensitive leaf values with
//! [`REDACTION_MARKER`](crate::constants::REDACTION_MARKER). Filters are
//! independent of the registry; a task carries one as a [`Filter`] value.
//!
//! - [`db`]: structured filter for the xapi database dump
//! - [`literal`]: scanner for list literals embedded in database columns
//! - [`sexp`]: s-expression association lists
//! - [`snmp`]: SNMP configuration files
//! - [`clusterd`]: cluster daemon JSON state
//! - [`xenstore`]: xenstore listings

pub mod clusterd;
pub mod db;
pub mod literal;
pub mod sexp;
pub mod snmp;
pub mod xenstore;

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::debug;

pub use db::{DbFilter, DbRedactionRules};

/// Infallible text-to-text filter
pub type LineFn = dyn Fn(&str) -> String + Send + Sync;

/// Filter over a structured format that can fail to parse
pub type StructuredFn = dyn Fn(&str) -> Result<String> + Send + Sync;

#[derive(Clone)]
pub enum FilterKind {
    Line(Arc<LineFn>),
    Structured(Arc<StructuredFn>),
}

/// A named redaction filter attached to a collection task.
///
/// Two filters are equal when they are clones of the same filter.
#[derive(Clone)]
pub struct Filter {
    name: String,
    kind: FilterKind,
}

impl Filter {
    pub fn line<F>(name: &str, f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            kind: FilterKind::Line(Arc::new(f)),
        }
    }

    pub fn structured<F>(name: &str, f: F) -> Self
    where
        F: Fn(&str) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            kind: FilterKind::Structured(Arc::new(f)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FilterKind {
        &self.kind
    }

    /// Run the filter over captured output of a task owned by `capability`
    pub fn apply(&self, capability: &str, raw: &[u8]) -> Result<Vec<u8>> {
        debug!("Applying filter {} for capability {}", self.name, capability);
        match &self.kind {
            FilterKind::Line(f) => Ok(f(String::from_utf8_lossy(raw).as_ref()).into_bytes()),
            FilterKind::Structured(f) => {
                let text = std::str::from_utf8(raw)
                    .with_context(|| format!("{}: input is not valid UTF-8", self.name))?;
                let redacted = f(text).with_context(|| {
                    format!("{} failed for capability {}", self.name, capability)
                })?;
                Ok(redacted.into_bytes())
            }
        }
    }
}

impl PartialEq for Filter {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && match (&self.kind, &other.kind) {
                (FilterKind::Line(a), FilterKind::Line(b)) => Arc::ptr_eq(a, b),
                (FilterKind::Structured(a), FilterKind::Structured(b)) => Arc::ptr_eq(a, b),
                _ => false,
            }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            FilterKind::Line(_) => "line",
            FilterKind::Structured(_) => "structured",
        };
        f.debug_struct("Filter")
            .field("name", &self.name)
            .field("kind", &kind)
            .finish()
    }
}

/// Names accepted by [`builtin_filter`]
pub const FILTER_NAMES: [&str; 6] = [
    "xapi-db",
    "xapi-clusterd-db",
    "snmp-xs-conf",
    "snmpd-xs-conf",
    "snmpd-conf",
    "xenstore-ls",
];

/// Look up one of the built-in text filters by name.
///
/// `rules` configures the database filter and `xenstore_keys` the secret
/// keys of the xenstore listing filter.
pub fn builtin_filter(
    name: &str,
    rules: &DbRedactionRules,
    xenstore_keys: &[String],
) -> Option<Filter> {
    let filter = match name {
        "xapi-db" => {
            let db = DbFilter::new(rules.clone());
            Filter::structured("filter_xapi_db", move |text| db.output(text))
        }
        "xapi-clusterd-db" => {
            Filter::structured("filter_xapi_clusterd_db", clusterd::redact_xapi_clusterd_db)
        }
        "snmp-xs-conf" => Filter::line("filter_snmp_xs_conf", snmp::redact_snmp_xs_conf),
        "snmpd-xs-conf" => Filter::line("filter_snmpd_xs_conf", snmp::redact_snmpd_xs_conf),
        "snmpd-conf" => Filter::line("filter_snmpd_conf", snmp::redact_snmpd_conf),
        "xenstore-ls" => xenstore::xenstore_filter(xenstore_keys),
        _ => return None,
    };
    Some(filter)
}

/// Read a whole file, `None` when it does not exist
pub(crate) fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("{} does not exist, nothing to filter", path.display());
            Ok(None)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}
