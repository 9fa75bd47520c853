//! Notification Renderer
//!
//! Translates a [`TrackedNotification`] into the platform representation and
//! pushes it to the notification surface. Style fields pass through untouched.

use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::errors::TrackingResult;
use crate::platform::{NotificationSurface, PlatformNotification};
use crate::tracking::types::{ChannelConfig, TrackedNotification};

pub struct NotificationRenderer {
    surface: Arc<dyn NotificationSurface>,
    default_channel_id: String,
    ongoing: bool,
    icon: RwLock<Option<String>>,
}

impl NotificationRenderer {
    pub fn new(
        surface: Arc<dyn NotificationSurface>,
        default_channel_id: impl Into<String>,
        ongoing: bool,
    ) -> Self {
        Self {
            surface,
            default_channel_id: default_channel_id.into(),
            ongoing,
            icon: RwLock::new(None),
        }
    }

    pub fn render(&self, notification: &TrackedNotification) -> PlatformNotification {
        let channel_id = notification
            .platform_style
            .channel_id
            .clone()
            .unwrap_or_else(|| self.default_channel_id.clone());

        PlatformNotification {
            id: notification.id.clone(),
            channel_id,
            title: notification.content.title.clone(),
            body: notification.content.body.clone(),
            data: notification.content.data.clone(),
            actions: notification.actions.clone(),
            style: notification.platform_style.clone(),
            icon: self.icon.read().ok().and_then(|icon| icon.clone()),
            ongoing: self.ongoing,
        }
    }

    pub async fn show(&self, notification: &TrackedNotification) -> TrackingResult<()> {
        debug!(id = %notification.id, surface = self.surface.name(), "Rendering new notification");
        self.surface.show(&self.render(notification)).await
    }

    pub async fn update(&self, notification: &TrackedNotification) -> TrackingResult<()> {
        debug!(id = %notification.id, surface = self.surface.name(), "Re-rendering notification");
        self.surface.update(&self.render(notification)).await
    }

    pub async fn remove(&self, id: &str) -> TrackingResult<()> {
        self.surface.cancel(id).await
    }

    pub async fn create_channel(&self, channel: &ChannelConfig) -> TrackingResult<()> {
        self.surface.create_channel(channel).await
    }

    /// Applies to every later render and is forwarded to the surface
    pub async fn set_icon(&self, name: &str) -> TrackingResult<()> {
        if let Ok(mut icon) = self.icon.write() {
            *icon = Some(name.to_string());
        }
        self.surface.set_icon(name).await
    }
}
