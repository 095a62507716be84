//! Global constants for the diagnostic collector.
//!
//! This module centralizes hardcoded values such as well-known file
//! locations and default limits.

/// Marker written in place of every redacted value
pub const REDACTION_MARKER: &str = "REMOVED";

// Well-known host paths
/// xapi database configuration listing the state database files
pub const XAPI_DB_CONF: &str = "/etc/xensource/db.conf";

/// On-disk state of the cluster coordination daemon
pub const XAPI_CLUSTERD_DB: &str = "/var/opt/xapi-clusterd/db";

/// User-facing SNMP configuration (JSON-like key/value lines)
pub const SNMP_XS_CONF: &str = "/etc/snmp/snmp.xs.conf";

/// SNMP daemon configuration with the `com2sec` directive
pub const SNMPD_XS_CONF: &str = "/etc/snmp/snmpd.xs.conf";

/// SNMP daemon persistent state holding `usmUser` lines
pub const SNMPD_CONF: &str = "/var/lib/net-snmp/snmpd.conf";

/// Host inventory in `KEY='value'` form
pub const XENSOURCE_INVENTORY: &str = "/etc/xensource-inventory";

/// Name of the summary written next to the collected members
pub const SUMMARY_FILE_NAME: &str = "collection_summary.json";

// Run log limits
/// Default maximum size of the run log (1MB)
pub const DEFAULT_RUN_LOG_MAX_BYTES: u64 = 1024 * 1024;

/// Default maximum number of lines in the run log
pub const DEFAULT_RUN_LOG_MAX_LINES: u64 = 10_000;

/// Notice appended once when the run log limit is hit
pub const RUN_LOG_TRUNCATED_NOTICE: &str = "[run log truncated: size limit reached]\n";

/// Capability used for the collector's own run log
pub const CAP_RUN_LOG: &str = "xen-bugtool";
