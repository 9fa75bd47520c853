use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::TrackingResult;
use crate::tracking::types::{ChannelConfig, NotificationAction, PlatformStyle};

/// A notification as handed to the OS notification surface
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformNotification {
    pub id: String,
    pub channel_id: String,
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub actions: Vec<NotificationAction>,
    pub style: PlatformStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Not dismissible by the user while tracking is active
    pub ongoing: bool,
}

/// OS notification surface: posts, replaces and removes notifications
#[async_trait]
pub trait NotificationSurface: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    async fn create_channel(&self, channel: &ChannelConfig) -> TrackingResult<()>;

    /// Post a new notification. A refusal is `PlatformRejected`.
    async fn show(&self, notification: &PlatformNotification) -> TrackingResult<()>;

    /// Replace the content of a posted notification in place
    async fn update(&self, notification: &PlatformNotification) -> TrackingResult<()>;

    async fn cancel(&self, id: &str) -> TrackingResult<()>;

    /// Small icon override. No-op on surfaces without one.
    async fn set_icon(&self, _name: &str) -> TrackingResult<()> {
        Ok(())
    }
}

/// Durable execution primitive that keeps the process alive while tracking
#[async_trait]
pub trait BackgroundTask: Send + Sync {
    async fn start(&self, id: &str) -> TrackingResult<()>;

    async fn stop(&self, id: &str) -> TrackingResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionGrant {
    Granted,
    Denied,
    Undetermined,
}

impl PermissionGrant {
    pub fn is_granted(self) -> bool {
        self == Self::Granted
    }
}

/// Per-domain answer straight from the platform, before reduction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawPermissions {
    pub notifications: PermissionGrant,
    /// `None` when the platform does not need location for this feature
    pub location: Option<PermissionGrant>,
    /// Whether the platform distinguishes "never asked" from "denied"
    pub tri_state: bool,
}

#[async_trait]
pub trait PermissionBackend: Send + Sync {
    /// Current state without prompting
    async fn query(&self) -> TrackingResult<RawPermissions>;

    /// Prompt the user and resolve once the platform callback fires
    async fn request(&self) -> TrackingResult<RawPermissions>;
}
