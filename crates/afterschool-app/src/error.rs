//! Afterschool — application error types.

use std::time::Duration;

use afterschool_core::error::{DomainError, EventError};
use thiserror::Error;

/// Startup, use-case and shutdown errors of the composed platform.
#[derive(Debug, Error)]
pub enum AppError {
    /// An environment variable is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The tracing subscriber could not be installed.
    #[error("telemetry error: {0}")]
    Telemetry(String),

    /// A use case was rejected or failed.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Wiring or delivery failed.
    #[error(transparent)]
    Event(#[from] EventError),

    /// In-flight deliveries did not finish before the drain timeout.
    #[error("shutdown timed out after {0:?} with deliveries still in flight")]
    ShutdownTimeout(Duration),
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_domain_error_is_transparent() {
        let id = Uuid::new_v4();

        let err = AppError::from(DomainError::NotFound(id));

        assert_eq!(err.to_string(), format!("record not found: {id}"));
    }

    #[test]
    fn test_shutdown_timeout_names_the_wait() {
        let err = AppError::ShutdownTimeout(Duration::from_millis(250));

        assert_eq!(
            err.to_string(),
            "shutdown timed out after 250ms with deliveries still in flight"
        );
    }
}
