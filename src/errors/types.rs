//! Error types for the tracking notification core
//!
//! The taxonomy mirrors what callers of the bridge can observe: malformed
//! options, a platform refusing an operation, and operations on an id that is
//! not being tracked. Everything else is plumbing (config, I/O, templates)
//! surfaced with the same structured shape.

use std::path::PathBuf;
use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for the tracking notification service
#[derive(Error, Debug)]
pub enum TrackingError {
    /// Caller supplied malformed or missing required fields
    #[error("Invalid options: {field} - {reason}")]
    InvalidOptions { field: String, reason: String },

    /// The OS (or notification backend) declined an operation
    #[error("Platform rejected '{operation}': {reason}")]
    PlatformRejected {
        operation: String,
        reason: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Operation referenced an id with no active tracked notification
    #[error("No active tracked notification with id '{id}'")]
    NotFound { id: String },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("File I/O error for '{}': {}", .path.display(), .operation)]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("Template error in '{name}': {message}")]
    Template {
        name: String,
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },
}

/// Convenience type alias for Results using TrackingError
pub type TrackingResult<T> = Result<T, TrackingError>;

impl TrackingError {
    pub fn invalid_options(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOptions {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn platform_rejected(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PlatformRejected {
            operation: operation.into(),
            reason: reason.into(),
            source: None,
        }
    }

    pub fn platform_rejected_with_source(
        operation: impl Into<String>,
        reason: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::PlatformRejected {
            operation: operation.into(),
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create a new Config error with context
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new Config error with source
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new I/O error with source
    pub fn io_with_source(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Io {
            path: path.into(),
            operation: operation.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn template_with_source(
        name: impl Into<String>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Template {
            name: name.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidOptions { .. } => "invalid_options",
            Self::PlatformRejected { .. } => "platform",
            Self::NotFound { .. } => "not_found",
            Self::Config { .. } => "config",
            Self::Io { .. } => "io",
            Self::Template { .. } => "template",
            Self::Internal { .. } => "internal",
        }
    }
}

impl From<toml::de::Error> for TrackingError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config {
            message: format!("TOML parsing error: {}", err.message()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<url::ParseError> for TrackingError {
    fn from(err: url::ParseError) -> Self {
        Self::Config {
            message: "invalid URL format".to_string(),
            source: Some(Box::new(err)),
        }
    }
}
