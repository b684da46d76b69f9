use crate::models::{Preset, Settings};
use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, Environment, File, FileFormat};
use std::fs;

/// Settings file name inside the configuration directory
pub const SETTINGS_FILE: &str = "Pattermer Settings.yaml";

/// Preset subdirectory inside the configuration directory
pub const PRESETS_DIR: &str = "presets";

/// Prefix of environment variables that override settings (`PATTERMER_DEBUG_MODE=true`)
pub const ENV_PREFIX: &str = "PATTERMER";

const PRESET_EXTENSION: &str = "yaml";

/// Configuration manager for settings and presets.
///
/// Manages:
/// - Settings (`Pattermer Settings.yaml`): layered with `PATTERMER_*` environment variables
/// - Presets (`presets/<name>.yaml`): variables and search queue, one file per preset
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    settings_path: Utf8PathBuf,
    presets_dir: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager, creating the directory layout if needed.
    ///
    /// # Arguments
    /// * `config_dir` - Directory holding settings and presets (e.g., "Pattermer Data")
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();
        let presets_dir = config_dir.join(PRESETS_DIR);

        if !presets_dir.exists() {
            fs::create_dir_all(&presets_dir)
                .with_context(|| format!("Failed to create presets directory: {}", presets_dir))?;
        }

        Ok(Self {
            settings_path: config_dir.join(SETTINGS_FILE),
            presets_dir,
            config_dir,
        })
    }

    /// Load settings from the settings file and the process environment.
    ///
    /// # Returns
    /// The merged Settings; defaults fill anything neither source sets
    pub fn load_settings(&self) -> Result<Settings> {
        self.build_settings(Environment::with_prefix(ENV_PREFIX))
    }

    /// Load settings using `env` in place of the process environment.
    pub fn load_settings_with_env(&self, env: config::Map<String, String>) -> Result<Settings> {
        self.build_settings(Environment::with_prefix(ENV_PREFIX).source(Some(env)))
    }

    fn build_settings(&self, environment: Environment) -> Result<Settings> {
        if !self.settings_path.exists() {
            tracing::warn!(
                "Settings file not found at {}, using defaults",
                self.settings_path
            );
        }

        let settings: Settings = Config::builder()
            .add_source(File::new(self.settings_path.as_str(), FileFormat::Yaml).required(false))
            .add_source(environment.try_parsing(true))
            .build()
            .with_context(|| format!("Failed to read settings: {}", self.settings_path))?
            .try_deserialize()
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        tracing::debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    /// Save the settings file.
    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(settings).context("Failed to serialize settings to YAML")?;

        fs::write(&self.settings_path, yaml_string)
            .with_context(|| format!("Failed to write settings: {}", self.settings_path))?;

        tracing::info!("Saved settings to {}", self.settings_path);
        Ok(())
    }

    /// Load a preset by name.
    ///
    /// # Returns
    /// The loaded Preset, or an empty one if the file doesn't exist
    pub fn load_preset(&self, name: &str) -> Result<Preset> {
        let path = self.preset_path(name)?;

        if !path.exists() {
            tracing::warn!("Preset {} not found at {}, starting empty", name, path);
            return Ok(Preset::default());
        }

        let file_contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read preset: {}", path))?;

        let preset: Preset = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse preset: {}", path))?;

        let undefined = preset.undefined_queue_entries();
        if !undefined.is_empty() {
            tracing::warn!(
                "Preset {} queues undefined variables: {}",
                name,
                undefined.join(", ")
            );
        }

        tracing::info!("Loaded preset from {}", path);
        Ok(preset)
    }

    /// Save a preset by name.
    pub fn save_preset(&self, name: &str, preset: &Preset) -> Result<()> {
        let path = self.preset_path(name)?;

        let yaml_string =
            serde_yaml_ng::to_string(preset).context("Failed to serialize preset to YAML")?;

        fs::write(&path, yaml_string)
            .with_context(|| format!("Failed to write preset: {}", path))?;

        tracing::info!("Saved preset to {}", path);
        Ok(())
    }

    /// Names of all saved presets, sorted.
    pub fn list_presets(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.presets_dir)
            .with_context(|| format!("Failed to read presets directory: {}", self.presets_dir))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| {
                format!("Failed to read entry in presets directory: {}", self.presets_dir)
            })?;

            let Ok(path) = Utf8PathBuf::try_from(entry.path()) else {
                continue;
            };
            if path.extension() != Some(PRESET_EXTENSION) || !path.is_file() {
                continue;
            }
            if let Some(stem) = path.file_stem() {
                names.push(stem.to_string());
            }
        }

        names.sort();
        Ok(names)
    }

    /// Delete a preset.
    ///
    /// # Returns
    /// `true` if a preset file was removed, `false` if it did not exist
    pub fn delete_preset(&self, name: &str) -> Result<bool> {
        let path = self.preset_path(name)?;

        if !path.exists() {
            return Ok(false);
        }

        fs::remove_file(&path).with_context(|| format!("Failed to delete preset: {}", path))?;

        tracing::info!("Deleted preset {}", path);
        Ok(true)
    }

    /// Path of the preset file for `name`.
    ///
    /// # Errors
    /// Fails when the name is empty or could escape the presets directory
    pub fn preset_path(&self, name: &str) -> Result<Utf8PathBuf> {
        if name.trim().is_empty() {
            bail!("Preset name must not be empty");
        }
        if name.contains(['/', '\\']) || name.contains("..") {
            bail!("Invalid preset name: {}", name);
        }

        Ok(self
            .presets_dir
            .join(format!("{}.{}", name, PRESET_EXTENSION)))
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn presets_dir(&self) -> &Utf8Path {
        &self.presets_dir
    }
}
