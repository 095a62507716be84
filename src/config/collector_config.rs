use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::capabilities::Capability;
use crate::constants::{
    DEFAULT_RUN_LOG_MAX_BYTES, DEFAULT_RUN_LOG_MAX_LINES, SNMPD_CONF, SNMPD_XS_CONF, SNMP_XS_CONF,
    XAPI_CLUSTERD_DB, XAPI_DB_CONF, XENSOURCE_INVENTORY,
};
use crate::filters::xenstore::default_secret_keys;
use crate::filters::DbRedactionRules;

/// Locations of the files the built-in tasks read
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct HostPaths {
    pub db_conf: PathBuf,
    pub clusterd_db: PathBuf,
    pub snmp_xs_conf: PathBuf,
    pub snmpd_xs_conf: PathBuf,
    pub snmpd_conf: PathBuf,
    pub inventory: PathBuf,
}

impl Default for HostPaths {
    fn default() -> Self {
        Self {
            db_conf: XAPI_DB_CONF.into(),
            clusterd_db: XAPI_CLUSTERD_DB.into(),
            snmp_xs_conf: SNMP_XS_CONF.into(),
            snmpd_xs_conf: SNMPD_XS_CONF.into(),
            snmpd_conf: SNMPD_CONF.into(),
            inventory: XENSOURCE_INVENTORY.into(),
        }
    }
}

/// Glob patterns listed with `ls -l` under a capability
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ListingRule {
    pub capability: String,
    pub patterns: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct RunLogConfig {
    pub max_bytes: u64,
    pub max_lines: u64,
}

impl Default for RunLogConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_RUN_LOG_MAX_BYTES,
            max_lines: DEFAULT_RUN_LOG_MAX_LINES,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CollectorConfig {
    pub version: String,
    pub description: String,
    pub capabilities: Vec<Capability>,
    #[serde(default)]
    pub paths: HostPaths,
    #[serde(default)]
    pub listings: Vec<ListingRule>,
    #[serde(default)]
    pub db_redaction: DbRedactionRules,
    #[serde(default = "default_secret_keys")]
    pub xenstore_secret_keys: Vec<String>,
    #[serde(default)]
    pub run_log: RunLogConfig,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        match std::env::consts::OS {
            "linux" => Self::default_host(),
            _ => Self::default_minimal(),
        }
    }
}

impl CollectorConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: CollectorConfig =
            serde_yaml::from_str(&content).context("Failed to parse YAML config")?;

        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save_to_yaml_file(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        fs::write(path, yaml).context(format!("Failed to write config to {}", path.display()))?;

        info!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Create a default configuration YAML file
    pub fn create_default_config_file(path: &Path) -> Result<()> {
        CollectorConfig::default().save_to_yaml_file(path)
    }

    pub fn capability(&self, key: &str) -> Option<&Capability> {
        self.capabilities.iter().find(|cap| cap.key == key)
    }
}

/// Load a configuration file or create a default one.
///
/// With a path, the file is loaded if it exists and otherwise written with
/// the defaults. Without one, the defaults are used as is.
///
/// # Returns
///
/// * `Ok(CollectorConfig)` - The loaded or created configuration
/// * `Err` - If config file exists but cannot be parsed
pub fn load_or_create_config(config_path: Option<&Path>) -> Result<CollectorConfig> {
    match config_path {
        Some(path) if path.exists() => CollectorConfig::from_yaml_file(path),
        Some(path) => {
            info!("Creating default config at {}", path.display());
            let default_config = CollectorConfig::default();
            default_config.save_to_yaml_file(path)?;
            Ok(default_config)
        }
        None => {
            info!("No config path provided, using default configuration");
            Ok(CollectorConfig::default())
        }
    }
}
