//! Tracked notification core
//!
//! - [`types`]: data model shared with the bridge
//! - [`validator`]: boundary checks on caller-supplied options
//! - [`controller`]: the single active notification and its lifecycle
//! - [`timer`]: the auto-update countdown
//! - [`dispatcher`]: action-button routing

pub mod controller;
pub mod dispatcher;
pub mod timer;
pub mod types;
pub mod validator;

pub use controller::LifecycleController;
pub use dispatcher::ActionDispatcher;
pub use timer::{minutes_remaining, TimerSettings};
pub use types::{
    ActionEvent, ChannelConfig, ChannelImportance, NotificationAction, NotificationContent,
    NotificationPriority, PlatformStyle, Progress, ServiceStatus, StartOptions,
    TrackedNotification, MAX_ACTIONS, STOP_TRACKING_ACTION,
};
pub use validator::{DefaultOptionsValidator, OptionsValidator, ValidatedStart};
