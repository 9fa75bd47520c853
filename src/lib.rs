//! Tracking Notify Library
//!
//! Ongoing "tracking" notifications: a single persistent notification with an
//! optional auto-updating arrival countdown, action buttons routed back to the
//! app, lifecycle events, and permission state reduced to one answer.

pub mod cli;
pub mod config;
pub mod errors;
pub mod events;
pub mod module;
pub mod permissions;
pub mod platform;
pub mod renderer;
pub mod shared;
pub mod templates;
pub mod tracking;

// Re-export commonly used types for convenience
pub use config::{Config, ConfigManager};
pub use errors::{TrackingError, TrackingResult};
pub use events::{Event, EventBridge, Subscription};
pub use module::TrackingModule;
pub use permissions::{PermissionState, PermissionStatus};
pub use platform::{Platform, PlatformKind};
pub use tracking::{
    ActionEvent, ChannelConfig, NotificationAction, NotificationContent, ServiceStatus,
    StartOptions,
};
