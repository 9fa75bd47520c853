//! Centralized error handling module
//!
//! Library code returns `TrackingResult`; the CLI wraps it in `anyhow` at the
//! outer edge.

pub mod context;
pub mod types;

pub use context::ErrorContextExt;
pub use types::{TrackingError, TrackingResult};
