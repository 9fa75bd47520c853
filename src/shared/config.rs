use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::{TrackingError, TrackingResult};

/// Main configuration structure for the tracking notification service
///
/// Contains the auto-update timer settings, body templates, the
/// configuration-time permission messages, the ntfy backend settings and
/// logging options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub templates: TemplateConfig,
    #[serde(default)]
    pub permissions: PermissionMessages,
    #[serde(default)]
    pub ntfy: NtfyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub tick_interval_secs: u64,
    pub grace_period_secs: u64,
    pub default_title: String,
    pub default_channel_id: String,
    pub icon: Option<String>,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 6,
            grace_period_secs: 5,
            default_title: "Tracking location".to_string(),
            default_channel_id: "tracking".to_string(),
            icon: None,
        }
    }
}

/// Handlebars overrides for the countdown body text, keyed by template name
/// (`countdown`, `arrived`)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TemplateConfig {
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

pub const DEFAULT_LOCATION_ALWAYS_MESSAGE: &str =
    "Allow this app to use your location in the background to keep your arrival time up to date.";
pub const DEFAULT_LOCATION_WHEN_IN_USE_MESSAGE: &str =
    "Allow this app to use your location to show your arrival time.";

/// Usage-description strings the platform shows when asking for location.
/// Unset keys fall back to the built-in English messages.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PermissionMessages {
    pub location_always_and_when_in_use_permission: Option<String>,
    pub location_when_in_use_permission: Option<String>,
}

impl PermissionMessages {
    pub fn location_always(&self) -> &str {
        self.location_always_and_when_in_use_permission
            .as_deref()
            .unwrap_or(DEFAULT_LOCATION_ALWAYS_MESSAGE)
    }

    pub fn location_when_in_use(&self) -> &str {
        self.location_when_in_use_permission
            .as_deref()
            .unwrap_or(DEFAULT_LOCATION_WHEN_IN_USE_MESSAGE)
    }
}

/// Settings for the ntfy notification backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NtfyConfig {
    pub server_url: String,
    pub topic: String,
    pub auth_token: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Default for NtfyConfig {
    fn default() -> Self {
        Self {
            server_url: "https://ntfy.sh".to_string(),
            topic: "tracking-notify".to_string(),
            auth_token: None,
            timeout_secs: Some(30),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_level: String,
    pub log_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_path: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> TrackingResult<()> {
        if self.tracking.tick_interval_secs == 0 {
            return Err(TrackingError::config(
                "tracking.tick_interval_secs must be greater than zero",
            ));
        }
        if self.tracking.default_channel_id.trim().is_empty() {
            return Err(TrackingError::config(
                "tracking.default_channel_id cannot be empty",
            ));
        }
        if self.ntfy.topic.trim().is_empty() {
            return Err(TrackingError::config("ntfy.topic cannot be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.tracking.tick_interval_secs, 6);
        assert_eq!(config.tracking.grace_period_secs, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_tick_rejected() {
        let mut config = Config::default();
        config.tracking.tick_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_permission_messages_fallback() {
        let messages = PermissionMessages::default();
        assert_eq!(messages.location_always(), DEFAULT_LOCATION_ALWAYS_MESSAGE);

        let messages: PermissionMessages = serde_json::from_str(
            r#"{"locationWhenInUsePermission": "We need your location"}"#,
        )
        .unwrap();
        assert_eq!(messages.location_when_in_use(), "We need your location");
        assert_eq!(messages.location_always(), DEFAULT_LOCATION_ALWAYS_MESSAGE);
    }

    #[test]
    fn test_partial_toml_uses_section_defaults() {
        let config: Config = toml::from_str(
            r#"
            [tracking]
            tick_interval_secs = 10
            grace_period_secs = 0
            default_title = "On the way"
            default_channel_id = "trips"
            "#,
        )
        .unwrap();
        assert_eq!(config.tracking.tick_interval_secs, 10);
        assert_eq!(config.ntfy.server_url, "https://ntfy.sh");
        assert_eq!(config.logging.log_level, "info");
    }

    #[test]
    fn test_partial_section_fills_missing_keys() {
        let config: Config = toml::from_str("[ntfy]\ntopic = \"bus-42\"\n").unwrap();
        assert_eq!(config.ntfy.topic, "bus-42");
        assert_eq!(config.ntfy.timeout_secs, Some(30));
        assert_eq!(config.tracking.default_channel_id, "tracking");
    }
}
