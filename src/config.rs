use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Queue used to serialize scene transitions unless configured otherwise
pub const DEFAULT_SCENE_QUEUE: &str = "scene_transition";

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_scene_queue() -> String {
    DEFAULT_SCENE_QUEUE.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// tracing filter directive used when RUST_LOG is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Also write logs to a daily-rotated file
    #[serde(default)]
    pub log_to_file: bool,

    /// Directory for log files (platform config dir when unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Modality applied by `PopupManager::open` when none is given
    #[serde(default = "default_true")]
    pub popup_modal_by_default: bool,

    /// Re-dispatch every message as `MESSAGE_DISPATCHED` after delivery
    #[serde(default = "default_true")]
    pub emit_dispatch_notifications: bool,

    /// Name of the sync queue scene transitions are serialized on
    #[serde(default = "default_scene_queue")]
    pub scene_queue_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            log_to_file: false,
            log_dir: None,
            popup_modal_by_default: true,
            emit_dispatch_notifications: true,
            scene_queue_name: default_scene_queue(),
        }
    }
}

impl Config {
    /// Load configuration from the platform-specific config directory.
    /// Creates default config if file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let config = Self::load_from(&config_path)?;
            tracing::info!("✓ Loaded config from: {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            tracing::info!("✓ Created default config at: {}", config_path.display());
            Ok(config)
        }
    }

    /// Load and validate configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::DirectoryCreationFailed {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;
        fs::write(path, json).map_err(|e| ConfigError::SaveFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::Invalid("log_filter must not be empty".to_string()));
        }
        if self.scene_queue_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "scene_queue_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the config file path (in the user config directory)
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("olympus").join("config.json"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Directory log files are written to
    pub fn resolved_log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| {
            dirs::config_dir()
                .map(|dir| dir.join("olympus").join("logs"))
                .unwrap_or_else(|| PathBuf::from("logs"))
        })
    }
}
