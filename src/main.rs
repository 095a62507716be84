use std::env;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use log::{info, warn, LevelFilter};
use simplelog::{
    ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};

use diag_collector::capabilities::ActivationSet;
use diag_collector::cli::{Args, Commands};
use diag_collector::collectors::{register_builtin_tasks, TaskRunner};
use diag_collector::config::{load_or_create_config, CollectorConfig, RunLogConfig};
use diag_collector::constants::CAP_RUN_LOG;
use diag_collector::filters::{builtin_filter, FILTER_NAMES};
use diag_collector::registry::CollectionSession;
use diag_collector::utils::bounded_log::BoundedLogWriter;
use diag_collector::utils::kv_file::read_key_value_file;

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(Commands::InitConfig { path }) = &args.command {
        initialize_logging(args.verbose, None, RunLogConfig::default())?;
        info!("Creating default configuration file at {}", path.display());
        CollectorConfig::create_default_config_file(path)?;
        info!("Configuration created successfully");
        return Ok(());
    }

    let config = load_or_create_config(args.config.as_deref())?;
    initialize_logging(args.verbose, args.log_file.as_deref(), config.run_log)?;

    match &args.command {
        Some(Commands::Filter { kind, path }) => run_filter(kind, path, &config),
        Some(Commands::Plan) => {
            let session = build_session(&args, &config);
            let plan = serde_json::to_string_pretty(&session.plan())
                .context("Failed to serialize collection plan")?;
            println!("{}", plan);
            Ok(())
        }
        Some(Commands::InitConfig { .. }) => Ok(()),
        None => run_collection(&args, &config),
    }
}

/// Initialize console logging, plus a bounded run log when requested
fn initialize_logging(verbose: bool, log_file: Option<&Path>, limits: RunLogConfig) -> Result<()> {
    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    loggers.push(TermLogger::new(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ));

    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create run log {}", path.display()))?;
        loggers.push(WriteLogger::new(
            log_level,
            Config::default(),
            BoundedLogWriter::new(file, limits.max_bytes, limits.max_lines),
        ));
    }

    CombinedLogger::init(loggers).context("Failed to initialize logger")?;
    Ok(())
}

fn run_filter(kind: &str, path: &Path, config: &CollectorConfig) -> Result<()> {
    let filter = builtin_filter(kind, &config.db_redaction, &config.xenstore_secret_keys)
        .ok_or_else(|| {
            anyhow!("Unknown filter {}, expected one of: {}", kind, FILTER_NAMES.join(", "))
        })?;

    let raw = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let redacted = filter.apply("cli", &raw)?;
    print!("{}", String::from_utf8_lossy(&redacted));
    Ok(())
}

fn build_session(args: &Args, config: &CollectorConfig) -> CollectionSession {
    let active = ActivationSet::resolve(args.entries.as_deref(), &config.capabilities);
    info!("Activated {} capabilities", active.len());

    let mut session = CollectionSession::new(active);
    register_builtin_tasks(&mut session, config);
    if let Some(log_file) = &args.log_file {
        session.register_file_copy(CAP_RUN_LOG, &[log_file]);
    }
    session
}

fn run_collection(args: &Args, config: &CollectorConfig) -> Result<()> {
    info!("Starting diagnostic collection");

    let session = build_session(args, config);
    if session.is_empty() {
        bail!("Nothing to collect: no task was registered for the active capabilities");
    }

    let bundle_dir = bundle_directory(args, config)?;
    let runner = TaskRunner::new(&config.capabilities, &bundle_dir);
    let report = runner.run(&session)?;

    if !report.omitted.is_empty() {
        warn!("{} tasks produced no output", report.omitted.len());
    }
    info!("Collection written to {}", bundle_dir.display());
    Ok(())
}

/// `<output>/<host id>-<timestamp>`, where the host id is the installation
/// UUID from the inventory when available
fn bundle_directory(args: &Args, config: &CollectorConfig) -> Result<PathBuf> {
    let output_dir = args
        .output
        .clone()
        .or_else(|| config.output_dir.clone())
        .unwrap_or_else(|| env::temp_dir().join("diag-collector"));

    let host_id = match read_key_value_file(&config.paths.inventory) {
        Ok(inventory) => inventory.get("INSTALLATION_UUID").cloned(),
        Err(e) => {
            info!("No host inventory: {:#}", e);
            None
        }
    };
    let host_id = match host_id {
        Some(uuid) => uuid,
        None => hostname::get()
            .map_err(|e| anyhow!("Failed to get hostname: {}", e))?
            .to_string_lossy()
            .to_string(),
    };

    let timestamp = chrono::Utc::now().format("%Y%m%d-%H%M%S").to_string();
    Ok(output_dir.join(format!("{}-{}", host_id, timestamp)))
}
