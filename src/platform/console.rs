use async_trait::async_trait;
use tracing::info;

use super::traits::{
    BackgroundTask, NotificationSurface, PermissionBackend, PermissionGrant, PlatformNotification,
    RawPermissions,
};
use crate::errors::TrackingResult;
use crate::tracking::types::ChannelConfig;

/// Surface that prints each render to stdout and logs it
#[derive(Debug, Default, Clone)]
pub struct ConsoleSurface;

impl ConsoleSurface {
    fn print(&self, verb: &str, notification: &PlatformNotification) {
        let actions: Vec<&str> = notification.actions.iter().map(|a| a.title.as_str()).collect();
        println!(
            "[{}] {} | {} | {}{}",
            notification.id,
            verb,
            notification.title,
            notification.body,
            if actions.is_empty() {
                String::new()
            } else {
                format!(" | actions: {}", actions.join(", "))
            }
        );
    }
}

#[async_trait]
impl NotificationSurface for ConsoleSurface {
    fn name(&self) -> &'static str {
        "console"
    }

    async fn create_channel(&self, channel: &ChannelConfig) -> TrackingResult<()> {
        info!("Created notification channel '{}' ({})", channel.id, channel.name);
        Ok(())
    }

    async fn show(&self, notification: &PlatformNotification) -> TrackingResult<()> {
        info!(id = %notification.id, "Showing notification");
        self.print("show", notification);
        Ok(())
    }

    async fn update(&self, notification: &PlatformNotification) -> TrackingResult<()> {
        info!(id = %notification.id, "Updating notification");
        self.print("update", notification);
        Ok(())
    }

    async fn cancel(&self, id: &str) -> TrackingResult<()> {
        info!(id = %id, "Cancelling notification");
        println!("[{}] cancel", id);
        Ok(())
    }

    async fn set_icon(&self, name: &str) -> TrackingResult<()> {
        info!("Notification icon set to '{}'", name);
        Ok(())
    }
}

/// Background task stand-in that only logs acquire/release
#[derive(Debug, Default, Clone)]
pub struct ConsoleBackgroundTask;

#[async_trait]
impl BackgroundTask for ConsoleBackgroundTask {
    async fn start(&self, id: &str) -> TrackingResult<()> {
        info!(id = %id, "Background task acquired");
        Ok(())
    }

    async fn stop(&self, id: &str) -> TrackingResult<()> {
        info!(id = %id, "Background task released");
        Ok(())
    }
}

/// A desktop terminal has nothing to ask: everything reads as granted
#[derive(Debug, Default, Clone)]
pub struct ConsolePermissions;

#[async_trait]
impl PermissionBackend for ConsolePermissions {
    async fn query(&self) -> TrackingResult<RawPermissions> {
        Ok(RawPermissions {
            notifications: PermissionGrant::Granted,
            location: Some(PermissionGrant::Granted),
            tri_state: false,
        })
    }

    async fn request(&self) -> TrackingResult<RawPermissions> {
        self.query().await
    }
}
