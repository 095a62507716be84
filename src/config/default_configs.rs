use crate::capabilities::{
    Capability, PiiLevel, CAP_DISK_INFO, CAP_KERNEL_INFO, CAP_PAM, CAP_SNMP, CAP_XAPI_CLUSTERD,
    CAP_XENSERVER_CONFIG, CAP_XENSERVER_DATABASES, CAP_XENSERVER_LOGS, CAP_XENSTORE,
};
use crate::config::collector_config::{CollectorConfig, HostPaths, ListingRule, RunLogConfig};
use crate::constants::CAP_RUN_LOG;
use crate::filters::xenstore::default_secret_keys;
use crate::filters::DbRedactionRules;

const KB: i64 = 1024;
const MB: i64 = 1024 * KB;

/// Capabilities known without any configuration file
pub fn builtin_capabilities() -> Vec<Capability> {
    vec![
        Capability::new(CAP_DISK_INFO)
            .with_pii(PiiLevel::Maybe)
            .with_max_size(50 * KB)
            .with_max_time(20),
        Capability::new(CAP_KERNEL_INFO)
            .with_pii(PiiLevel::Maybe)
            .with_max_size(120 * KB)
            .with_max_time(5),
        Capability::new(CAP_PAM)
            .with_pii(PiiLevel::No)
            .with_max_size(50 * KB)
            .with_max_time(5),
        Capability::new(CAP_SNMP)
            .with_pii(PiiLevel::No)
            .with_max_size(KB)
            .with_max_time(5),
        Capability::new(CAP_XAPI_CLUSTERD)
            .with_pii(PiiLevel::No)
            .with_max_size(64 * KB)
            .with_max_time(5),
        Capability::new(CAP_XENSERVER_CONFIG)
            .with_pii(PiiLevel::Maybe)
            .with_max_size(80 * KB)
            .with_max_time(5),
        Capability::new(CAP_XENSERVER_DATABASES)
            .with_pii(PiiLevel::Yes)
            .with_max_size(500 * KB)
            .with_max_time(40),
        Capability::new(CAP_XENSERVER_LOGS)
            .with_pii(PiiLevel::Maybe)
            .with_max_size(70 * MB)
            .with_max_time(30)
            .with_checked(false),
        Capability::new(CAP_XENSTORE)
            .with_pii(PiiLevel::Maybe)
            .with_max_size(50 * KB)
            .with_max_time(5),
        Capability::new(CAP_RUN_LOG)
            .with_pii(PiiLevel::No)
            .with_hidden(true),
    ]
}

impl CollectorConfig {
    /// Default configuration for a XenServer host
    pub fn default_host() -> Self {
        CollectorConfig {
            version: "1.0".into(),
            description: "Default host diagnostic collection".into(),
            capabilities: builtin_capabilities(),
            paths: HostPaths::default(),
            listings: vec![
                ListingRule {
                    capability: CAP_XENSERVER_CONFIG.into(),
                    patterns: vec!["/etc/xensource/*".into(), "/etc/xapi.d/*".into()],
                },
                ListingRule {
                    capability: CAP_DISK_INFO.into(),
                    patterns: vec!["/dev/disk/by-id/*".into()],
                },
                ListingRule {
                    capability: CAP_XENSERVER_LOGS.into(),
                    patterns: vec!["/var/log/xensource.log*".into()],
                },
            ],
            db_redaction: DbRedactionRules::default(),
            xenstore_secret_keys: default_secret_keys(),
            run_log: RunLogConfig::default(),
            output_dir: None,
        }
    }

    /// Default configuration without any listings
    pub fn default_minimal() -> Self {
        CollectorConfig {
            description: "Minimal diagnostic collection".into(),
            listings: Vec::new(),
            ..Self::default_host()
        }
    }
}
