use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the diag-collector tool.
///
/// Without a subcommand the collector activates capabilities, registers
/// the built-in tasks and writes the redacted members into the output
/// directory.
#[derive(Parser, Debug)]
#[clap(name = "diag-collector", about = "Host diagnostic collector with secret redaction")]
pub struct Args {
    /// Output directory (default: /tmp/diag-collector)
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// Verbose logging
    #[clap(short, long)]
    pub verbose: bool,

    /// Path to configuration YAML file
    #[clap(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Capabilities to collect (comma-separated, default: all checked ones)
    #[clap(short = 'e', long, value_delimiter = ',')]
    pub entries: Option<Vec<String>>,

    /// Write the run log to this file as well as the console
    #[clap(long)]
    pub log_file: Option<PathBuf>,

    /// Subcommands
    #[clap(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands for the collector.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a default configuration file
    InitConfig {
        /// Path to output configuration file
        #[clap(default_value = "config.yaml")]
        path: PathBuf,
    },

    /// Run one redaction filter over a file and print the result
    Filter {
        /// Filter name (xapi-db, xapi-clusterd-db, snmp-xs-conf, snmpd-xs-conf, snmpd-conf, xenstore-ls)
        kind: String,

        /// File to read
        path: PathBuf,
    },

    /// Print the tasks that would run, as JSON
    Plan,
}
