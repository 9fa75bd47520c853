//! Error context enhancement utilities
//!
//! Attaches operation context to foreign errors while converting them into
//! the structured `TrackingError` shape.

use super::types::TrackingError;

/// Extension trait for adding context to error types
pub trait ErrorContextExt<T> {
    /// Add operation context to the error
    fn with_context(self, operation: impl Into<String>) -> Result<T, TrackingError>;

    /// Report the failure as the platform declining `operation`
    fn rejected_by_platform(self, operation: impl Into<String>) -> Result<T, TrackingError>;
}

impl<T, E> ErrorContextExt<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_context(self, operation: impl Into<String>) -> Result<T, TrackingError> {
        self.map_err(|e| {
            let operation = operation.into();
            TrackingError::Internal {
                message: format!("{}: {}", operation, e),
                source: Some(Box::new(e)),
            }
        })
    }

    fn rejected_by_platform(self, operation: impl Into<String>) -> Result<T, TrackingError> {
        let operation = operation.into();
        self.map_err(|e| {
            let reason = e.to_string();
            TrackingError::platform_rejected_with_source(operation, reason, e)
        })
    }
}
