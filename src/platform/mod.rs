//! Platform collaborators
//!
//! The core never talks to an OS directly. It calls into three seams:
//!
//! - **NotificationSurface**: show / update / cancel a notification
//! - **BackgroundTask**: keep the process alive while tracking (durable-task
//!   platforms only)
//! - **PermissionBackend**: query / request notification and location access
//!
//! Backends shipped with the crate:
//!
//! - [`memory`]: in-process recording backend with failure injection
//! - [`console`]: logs renders through `tracing` and prints a summary line
//! - [`ntfy`]: pushes notifications to an ntfy server

use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod console;
pub mod memory;
pub mod ntfy;
pub mod traits;

pub use traits::{
    BackgroundTask, NotificationSurface, PermissionBackend, PermissionGrant, PlatformNotification,
    RawPermissions,
};

/// How a platform keeps tracking alive while the app is in the background
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlatformKind {
    /// A foreground service holds the process; timers keep firing
    DurableTask,
    /// No durable task; the notification is dismissible and rescheduled
    ScheduledNotification,
}

/// The set of collaborators one platform provides
#[derive(Clone)]
pub struct Platform {
    pub kind: PlatformKind,
    pub surface: Arc<dyn NotificationSurface>,
    pub background: Option<Arc<dyn BackgroundTask>>,
    pub permissions: Arc<dyn PermissionBackend>,
}

impl Platform {
    pub fn durable(
        surface: Arc<dyn NotificationSurface>,
        background: Arc<dyn BackgroundTask>,
        permissions: Arc<dyn PermissionBackend>,
    ) -> Self {
        Self {
            kind: PlatformKind::DurableTask,
            surface,
            background: Some(background),
            permissions,
        }
    }

    pub fn scheduled(
        surface: Arc<dyn NotificationSurface>,
        permissions: Arc<dyn PermissionBackend>,
    ) -> Self {
        Self {
            kind: PlatformKind::ScheduledNotification,
            surface,
            background: None,
            permissions,
        }
    }

    /// Durable-task platforms pin the notification; scheduled ones let the
    /// user swipe it away
    pub fn ongoing_notifications(&self) -> bool {
        self.kind == PlatformKind::DurableTask
    }
}
