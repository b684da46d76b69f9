use crate::models::Settings;
use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Logging behaviour, usually derived from [`Settings`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoggingOptions {
    /// Use debug level instead of info (ignored when `RUST_LOG` is set)
    pub debug_mode: bool,

    /// Also log to stderr with ANSI colors
    pub console_output: bool,

    /// Write the log file as JSON lines
    pub json_format: bool,
}

impl From<&Settings> for LoggingOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            debug_mode: settings.debug_mode,
            console_output: settings.console_logging,
            json_format: settings.json_logs,
        }
    }
}

/// Setup logging with a daily rotating file appender.
///
/// Console output goes to stderr so stdout stays free for command output.
///
/// # Arguments
/// * `log_dir` - Directory for log files (created if missing)
/// * `log_prefix` - Prefix for log files (e.g., "pattermer")
/// * `options` - Level, console mirroring and file format
///
/// # Returns
/// A guard that must be held for the duration of the program to keep logging active
pub fn setup_logging(
    log_dir: &Utf8Path,
    log_prefix: &str,
    options: LoggingOptions,
) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    create_log_dir(log_dir)?;

    // Create daily rotating file appender
    let file_appender = rolling::daily(log_dir, log_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if options.debug_mode { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (json_layer, text_layer) = if options.json_format {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_target(true)
            .with_file(true)
            .with_line_number(true);
        (Some(layer), None)
    } else {
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false) // No ANSI codes in log files
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);
        (None, Some(layer))
    };

    let console_layer = options.console_output.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install global tracing subscriber")?;

    tracing::info!(
        "Logging initialized: dir={}, prefix={}, debug={}, console={}, json={}",
        log_dir,
        log_prefix,
        options.debug_mode,
        options.console_output,
        options.json_format
    );

    Ok(guard)
}

fn create_log_dir(log_dir: &Utf8Path) -> Result<()> {
    if !log_dir.exists() {
        fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_setup_logging_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let log_dir = Utf8PathBuf::try_from(temp_dir.path().join("logs")).unwrap();

        // A second global subscriber in the same test binary fails to install,
        // but the directory is created either way
        let _result = setup_logging(&log_dir, "test", LoggingOptions::default());

        assert!(log_dir.exists());
    }

    #[test]
    fn test_create_log_dir_nested() {
        let temp_dir = TempDir::new().unwrap();
        let log_dir = Utf8PathBuf::try_from(temp_dir.path().join("a").join("b")).unwrap();

        create_log_dir(&log_dir).unwrap();
        create_log_dir(&log_dir).unwrap();

        assert!(log_dir.exists());
    }

    #[test]
    fn test_options_from_settings() {
        let settings = Settings {
            debug_mode: true,
            json_logs: true,
            ..Settings::default()
        };

        let options = LoggingOptions::from(&settings);
        assert!(options.debug_mode);
        assert!(options.json_format);
        assert!(!options.console_output);
    }
}
