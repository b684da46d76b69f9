//! Pattermer - batch rename files with ordered regular-expression variables
//!
//! Main entry point for the command line application.
//!
//! # Overview
//!
//! This binary parses the command line and initializes:
//! - Configuration loading ([`ConfigManager`], settings file + `PATTERMER_*` variables)
//! - Logging infrastructure (daily rotated file, optional stderr mirror)
//! - Tokio async runtime (directory listing, renames, Ctrl-C handling)
//! - State management ([`StateManager`])
//! - The command controller ([`CliController`])
//!
//! # Execution Flow
//!
//! 1. Parse arguments
//! 2. Load settings from `Pattermer Data/Pattermer Settings.yaml`
//! 3. Initialize logging → `Pattermer Data/logs/pattermer.<date>`
//! 4. Create the tokio runtime and StateManager
//! 5. Run the command; output goes to stdout, logs never do
//! 6. Log the metrics summary and shut down the runtime with a 5s timeout
//!
//! # Configuration Files
//!
//! Expected in the config directory (`--config-dir`, default `Pattermer Data/`):
//! - `Pattermer Settings.yaml`: logging options, last preset and template
//! - `presets/<name>.yaml`: variables and search queue

use anyhow::Result;
use camino::Utf8PathBuf;
use clap::Parser;
use pattermer::logging::{LoggingOptions, setup_logging};
use pattermer::ui::{Cli, CliController};
use pattermer::{APP_NAME, ConfigManager, StateManager, VERSION};
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_manager = ConfigManager::new(&cli.config_dir)?;
    let settings = config_manager.load_settings()?;

    let mut log_options = LoggingOptions::from(&settings);
    log_options.debug_mode |= cli.debug;

    let log_dir = Utf8PathBuf::from(&settings.log_dir);
    let log_dir = if log_dir.is_absolute() {
        log_dir
    } else {
        config_manager.config_dir().join(log_dir)
    };

    // Held until the end of main so buffered log lines are flushed
    let _log_guard = setup_logging(&log_dir, APP_NAME, log_options)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("pattermer-worker")
        .build()?;

    let state_manager = Arc::new(StateManager::new());

    let controller = CliController::new(
        Arc::clone(&state_manager),
        config_manager,
        settings,
        runtime.handle().clone(),
    );

    let result = controller.run(cli.command, cli.preset, &mut std::io::stdout().lock());

    if let Err(e) = &result {
        tracing::error!("Command failed: {:#}", e);
    }

    state_manager.metrics().log_summary();
    runtime.shutdown_timeout(Duration::from_secs(5));

    tracing::info!("Shutdown complete");
    result
}
