// Re-export all items from the submodules
mod collector_config;
mod default_configs;

pub use collector_config::{
    load_or_create_config,
    CollectorConfig,
    HostPaths,
    ListingRule,
    RunLogConfig,
};

pub use default_configs::builtin_capabilities;
