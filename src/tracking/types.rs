//! Data model for tracked notifications
//!
//! `StartOptions`, `NotificationContent` and friends are the loosely-checked
//! shapes that arrive across the bridge (camelCase, optional fields).
//! Validation turns them into a [`TrackedNotification`], which is what the
//! controller owns and the renderer draws.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum number of action buttons a notification carries. Extra actions are
/// dropped silently.
pub const MAX_ACTIONS: usize = 3;

/// Action identifier with built-in stop behavior
pub const STOP_TRACKING_ACTION: &str = "stop-tracking";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl NotificationContent {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationAction {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub triggers_foreground: bool,
}

impl NotificationAction {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            triggers_foreground: false,
        }
    }

    pub fn foreground(mut self) -> Self {
        self.triggers_foreground = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Min,
    Low,
    #[default]
    Default,
    High,
    Max,
}

impl NotificationPriority {
    /// Position on a 1-5 scale, lowest first
    pub fn level(self) -> u8 {
        match self {
            Self::Min => 1,
            Self::Low => 2,
            Self::Default => 3,
            Self::High => 4,
            Self::Max => 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub max: u32,
    pub current: u32,
    #[serde(default)]
    pub indeterminate: bool,
}

/// Styling passed through to the platform untouched
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<NotificationPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
}

/// Options for starting a tracked notification, as received from the app
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartOptions {
    pub id: String,
    pub content: NotificationContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_minutes: Option<f64>,
    #[serde(default)]
    pub actions: Vec<NotificationAction>,
    #[serde(default)]
    pub platform_style: PlatformStyle,
}

impl StartOptions {
    pub fn new(id: impl Into<String>, content: NotificationContent) -> Self {
        Self {
            id: id.into(),
            content,
            arrival_minutes: None,
            actions: Vec::new(),
            platform_style: PlatformStyle::default(),
        }
    }

    pub fn with_arrival_minutes(mut self, minutes: f64) -> Self {
        self.arrival_minutes = Some(minutes);
        self
    }

    pub fn with_actions(mut self, actions: Vec<NotificationAction>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_style(mut self, style: PlatformStyle) -> Self {
        self.platform_style = style;
        self
    }
}

/// The single ongoing notification owned by the lifecycle controller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedNotification {
    pub id: String,
    pub content: NotificationContent,
    pub actions: Vec<NotificationAction>,
    pub platform_style: PlatformStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub is_running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<String>,
}

impl ServiceStatus {
    pub fn running(id: impl Into<String>) -> Self {
        Self {
            is_running: true,
            notification_id: Some(id.into()),
        }
    }

    pub fn stopped(id: impl Into<String>) -> Self {
        Self {
            is_running: false,
            notification_id: Some(id.into()),
        }
    }

    pub fn idle() -> Self {
        Self {
            is_running: false,
            notification_id: None,
        }
    }
}

/// A user pressed an action button
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionEvent {
    pub notification_id: String,
    pub action_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ActionEvent {
    pub fn new(notification_id: impl Into<String>, action_id: impl Into<String>) -> Self {
        Self {
            notification_id: notification_id.into(),
            action_id: action_id.into(),
            data: None,
        }
    }

    pub fn is_stop(&self) -> bool {
        self.action_id == STOP_TRACKING_ACTION
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChannelImportance {
    Min,
    Low,
    #[default]
    Default,
    High,
    Max,
}

/// Notification channel description, consumed by platforms that group
/// notifications into channels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelConfig {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub importance: ChannelImportance,
    #[serde(default)]
    pub vibrate: bool,
    #[serde(default = "default_true")]
    pub sound: bool,
    #[serde(default = "default_true")]
    pub show_badge: bool,
}

fn default_true() -> bool {
    true
}

impl ChannelConfig {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            importance: ChannelImportance::Default,
            vibrate: false,
            sound: true,
            show_badge: true,
        }
    }
}
