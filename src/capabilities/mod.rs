//! Capabilities: named, independently enableable categories of data.
//!
//! A capability is defined once (statically or from the configuration file)
//! and is read-only during a run. Which capabilities are active for the run
//! is decided once by [`ActivationSet::resolve`].

mod activation;

pub use activation::ActivationSet;

use serde::{Deserialize, Serialize};
use std::fmt;

pub const CAP_DISK_INFO: &str = "disk-info";
pub const CAP_KERNEL_INFO: &str = "kernel-info";
pub const CAP_PAM: &str = "pam";
pub const CAP_SNMP: &str = "snmp";
pub const CAP_XAPI_CLUSTERD: &str = "xapi-clusterd";
pub const CAP_XENSERVER_CONFIG: &str = "xenserver-config";
pub const CAP_XENSERVER_DATABASES: &str = "xenserver-databases";
pub const CAP_XENSERVER_LOGS: &str = "xenserver-logs";
pub const CAP_XENSTORE: &str = "xenstore";

/// How likely a capability's data is to carry personal information
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PiiLevel {
    No,
    Yes,
    Maybe,
    IfCustomized,
}

impl fmt::Display for PiiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PiiLevel::No => write!(f, "no"),
            PiiLevel::Yes => write!(f, "yes"),
            PiiLevel::Maybe => write!(f, "maybe"),
            PiiLevel::IfCustomized => write!(f, "if_customized"),
        }
    }
}

/// A named unit of collection with its limits.
///
/// Negative sizes and times mean "unlimited".
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Capability {
    pub key: String,
    #[serde(default = "default_pii")]
    pub pii: PiiLevel,
    #[serde(default = "unlimited")]
    pub min_size: i64,
    #[serde(default = "unlimited")]
    pub max_size: i64,
    #[serde(default = "unlimited")]
    pub min_time: i64,
    #[serde(default = "unlimited")]
    pub max_time: i64,
    #[serde(default = "default_mime")]
    pub mime: String,
    /// Enabled when no explicit capability list is given
    #[serde(default = "default_checked")]
    pub checked: bool,
    #[serde(default)]
    pub hidden: bool,
}

fn default_pii() -> PiiLevel {
    PiiLevel::Maybe
}

fn unlimited() -> i64 {
    -1
}

fn default_mime() -> String {
    "text/plain".to_string()
}

fn default_checked() -> bool {
    true
}

impl Capability {
    /// Create a capability with default limits
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            pii: default_pii(),
            min_size: unlimited(),
            max_size: unlimited(),
            min_time: unlimited(),
            max_time: unlimited(),
            mime: default_mime(),
            checked: default_checked(),
            hidden: false,
        }
    }

    pub fn with_pii(mut self, pii: PiiLevel) -> Self {
        self.pii = pii;
        self
    }

    pub fn with_max_size(mut self, max_size: i64) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_max_time(mut self, max_time: i64) -> Self {
        self.max_time = max_time;
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Size budget in bytes, `None` when unlimited
    pub fn size_limit(&self) -> Option<u64> {
        u64::try_from(self.max_size).ok()
    }
}
