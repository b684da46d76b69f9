use serde::{Deserialize, Serialize};

/// User settings from `Pattermer Settings.yaml`, overridable with `PATTERMER_*`
/// environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Log at debug level instead of info
    pub debug_mode: bool,

    /// Mirror log output to stderr
    pub console_logging: bool,

    /// Write the log file as JSON lines
    pub json_logs: bool,

    /// Log directory; relative paths resolve against the config directory
    pub log_dir: String,

    /// Preset used when none is given on the command line
    pub last_preset: Option<String>,

    /// Template used when none is given on the command line
    pub last_template: Option<String>,

    /// Include dotfiles when listing a directory
    pub include_hidden: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug_mode: false,
            console_logging: false,
            json_logs: false,
            log_dir: "logs".to_string(),
            last_preset: None,
            last_template: None,
            include_hidden: false,
        }
    }
}

impl Settings {
    /// Preset to load, falling back to [`DEFAULT_PRESET`]
    pub fn preset_name(&self) -> &str {
        self.last_preset.as_deref().unwrap_or(DEFAULT_PRESET)
    }
}

/// Preset name used before any preset was chosen
pub const DEFAULT_PRESET: &str = "default";
