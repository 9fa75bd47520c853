//! Types shared between the library core and the CLI

pub mod config;
pub mod manifest;

pub use config::{Config, NtfyConfig, PermissionMessages, TrackingConfig};
pub use manifest::CapabilityManifest;
