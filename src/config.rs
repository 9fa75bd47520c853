use crate::errors::{TrackingError, TrackingResult};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

// Re-export shared types for convenience
pub use crate::shared::config::{Config, NtfyConfig, PermissionMessages, TrackingConfig};

const CONFIG_DIR_NAME: &str = ".tracking-notify";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Dotted keys accepted by [`ConfigManager::get`] and [`ConfigManager::set`]
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "tracking.tick_interval_secs",
    "tracking.grace_period_secs",
    "tracking.default_title",
    "tracking.default_channel_id",
    "tracking.icon",
    "ntfy.server_url",
    "ntfy.topic",
    "ntfy.auth_token",
    "ntfy.timeout_secs",
    "logging.log_level",
    "logging.log_path",
    "permissions.locationAlwaysAndWhenInUsePermission",
    "permissions.locationWhenInUsePermission",
];

/// Configuration manager for the tracking notification service
///
/// Handles loading, saving, and editing configuration for both project-level
/// and global configurations. Project configuration takes precedence.
///
/// # Configuration Hierarchy
///
/// 1. **Project-level**: `.tracking-notify/config.toml` in the project root
/// 2. **Global**: `tracking-notify/config.toml` in the user config directory
///
/// # Example
///
/// ```rust,no_run
/// use tracking_notify::config::ConfigManager;
/// use std::path::PathBuf;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config_manager = ConfigManager::new(Some(PathBuf::from("/path/to/project")))?;
///     println!("Tick: {}s", config_manager.config().tracking.tick_interval_secs);
///     Ok(())
/// }
/// ```
pub struct ConfigManager {
    config_path: PathBuf,
    config: Config,
}

impl ConfigManager {
    /// Creates a new ConfigManager instance
    ///
    /// With a project path, an existing project config wins, then an existing
    /// global config; if neither exists a default project config is written.
    /// Without a project path the global config is used (and created).
    ///
    /// # Errors
    ///
    /// Fails when the configuration directory cannot be created, or the file
    /// cannot be read, parsed or validated.
    pub fn new(project_path: Option<PathBuf>) -> TrackingResult<Self> {
        if let Some(ref path) = project_path {
            let project_config_path = Self::get_config_path(Some(path.clone()))?;

            if project_config_path.exists() {
                return Self::open(project_config_path);
            }

            let global_config_path = Self::get_config_path(None)?;
            if global_config_path.exists() {
                return Self::open(global_config_path);
            }

            Self::open(project_config_path)
        } else {
            Self::open(Self::get_config_path(None)?)
        }
    }

    /// Always creates or uses the project-level configuration, even if a
    /// global config exists.
    pub fn new_project_config(project_path: PathBuf) -> TrackingResult<Self> {
        Self::open(Self::get_config_path(Some(project_path))?)
    }

    /// Creates a manager around an in-memory config that saves to `path`
    pub fn with_config(config_path: PathBuf, config: Config) -> Self {
        Self {
            config_path,
            config,
        }
    }

    fn open(config_path: PathBuf) -> TrackingResult<Self> {
        let config = Self::load_or_create(&config_path)?;
        config.validate()?;
        Ok(ConfigManager {
            config_path,
            config,
        })
    }

    pub fn get_config_path(project_path: Option<PathBuf>) -> TrackingResult<PathBuf> {
        let base_path = if let Some(path) = project_path {
            path.join(CONFIG_DIR_NAME)
        } else {
            let dirs = ProjectDirs::from("", "", "tracking-notify")
                .ok_or_else(|| TrackingError::config("Failed to get config directory"))?;
            dirs.config_dir().to_path_buf()
        };

        fs::create_dir_all(&base_path).map_err(|e| {
            TrackingError::io_with_source(&base_path, "create config directory", e)
        })?;

        Ok(base_path.join(CONFIG_FILE_NAME))
    }

    fn load_or_create(path: &Path) -> TrackingResult<Config> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| TrackingError::io_with_source(path, "read config file", e))?;
            Ok(toml::from_str(&content)?)
        } else {
            let config = Config::default();
            let content = toml::to_string_pretty(&config).map_err(|e| {
                TrackingError::config_with_source("Failed to serialize default config", e)
            })?;
            fs::write(path, content)
                .map_err(|e| TrackingError::io_with_source(path, "write default config", e))?;
            Ok(config)
        }
    }

    /// Saves the current configuration back to the file it was loaded from
    pub fn save(&self) -> TrackingResult<()> {
        let content = toml::to_string_pretty(&self.config)
            .map_err(|e| TrackingError::config_with_source("Failed to serialize config", e))?;
        fs::write(&self.config_path, content).map_err(|e| {
            TrackingError::io_with_source(&self.config_path, "write config file", e)
        })?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Reads a dotted configuration key. Unset optional values read as `None`.
    pub fn get(&self, key: &str) -> TrackingResult<Option<String>> {
        Self::check_key(key)?;
        let c = &self.config;
        let value = match key {
            "tracking.tick_interval_secs" => Some(c.tracking.tick_interval_secs.to_string()),
            "tracking.grace_period_secs" => Some(c.tracking.grace_period_secs.to_string()),
            "tracking.default_title" => Some(c.tracking.default_title.clone()),
            "tracking.default_channel_id" => Some(c.tracking.default_channel_id.clone()),
            "tracking.icon" => c.tracking.icon.clone(),
            "ntfy.server_url" => Some(c.ntfy.server_url.clone()),
            "ntfy.topic" => Some(c.ntfy.topic.clone()),
            "ntfy.auth_token" => c.ntfy.auth_token.clone(),
            "ntfy.timeout_secs" => c.ntfy.timeout_secs.map(|t| t.to_string()),
            "logging.log_level" => Some(c.logging.log_level.clone()),
            "logging.log_path" => c.logging.log_path.clone(),
            "permissions.locationAlwaysAndWhenInUsePermission" => {
                Some(c.permissions.location_always().to_string())
            }
            "permissions.locationWhenInUsePermission" => {
                Some(c.permissions.location_when_in_use().to_string())
            }
            _ => None,
        };
        Ok(value)
    }

    /// Sets a dotted configuration key in memory. Call [`save`](Self::save)
    /// to persist. The resulting config is validated before it is accepted.
    pub fn set(&mut self, key: &str, value: &str) -> TrackingResult<()> {
        let mut updated = self.config.clone();
        let c = &mut updated;
        match key {
            "tracking.tick_interval_secs" => {
                c.tracking.tick_interval_secs = parse_number(key, value)?
            }
            "tracking.grace_period_secs" => {
                c.tracking.grace_period_secs = parse_number(key, value)?
            }
            "tracking.default_title" => c.tracking.default_title = value.to_string(),
            "tracking.default_channel_id" => c.tracking.default_channel_id = value.to_string(),
            "tracking.icon" => c.tracking.icon = Some(value.to_string()),
            "ntfy.server_url" => {
                url::Url::parse(value)?;
                c.ntfy.server_url = value.to_string();
            }
            "ntfy.topic" => c.ntfy.topic = value.to_string(),
            "ntfy.auth_token" => c.ntfy.auth_token = Some(value.to_string()),
            "ntfy.timeout_secs" => c.ntfy.timeout_secs = Some(parse_number(key, value)?),
            "logging.log_level" => c.logging.log_level = value.to_string(),
            "logging.log_path" => c.logging.log_path = Some(value.to_string()),
            "permissions.locationAlwaysAndWhenInUsePermission" => {
                c.permissions.location_always_and_when_in_use_permission = Some(value.to_string())
            }
            "permissions.locationWhenInUsePermission" => {
                c.permissions.location_when_in_use_permission = Some(value.to_string())
            }
            _ => return Err(unknown_key(key)),
        }
        updated.validate()?;
        self.config = updated;
        Ok(())
    }

    fn check_key(key: &str) -> TrackingResult<()> {
        if !VALID_CONFIG_KEYS.contains(&key) {
            return Err(unknown_key(key));
        }
        Ok(())
    }
}

fn unknown_key(key: &str) -> TrackingError {
    TrackingError::config(format!(
        "Unknown configuration key: {}. Valid keys are: {}",
        key,
        VALID_CONFIG_KEYS.join(", ")
    ))
}

fn parse_number(key: &str, value: &str) -> TrackingResult<u64> {
    value.parse::<u64>().map_err(|e| {
        TrackingError::config_with_source(format!("'{}' expects a whole number", key), e)
    })
}
