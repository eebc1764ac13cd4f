//! Bounded retry for the side-effecting step of cross-context handlers.
//!
//! An operation is attempted once and, after a fixed delay, exactly one more
//! time. Only transient failures are retried.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{DomainError, EventError};

/// Delay before the single retry unless configured otherwise.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Fixed backoff used between the first and second attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy with the given backoff.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Backoff between attempts.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Builds the context for one retried operation.
    #[must_use]
    pub fn context<'a>(&self, operation_name: &'a str, subject_id: Uuid) -> RetryContext<'a> {
        RetryContext {
            operation_name,
            subject_id,
            policy: *self,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_DELAY)
    }
}

/// What is being retried, for traceability.
#[derive(Debug, Clone, Copy)]
pub struct RetryContext<'a> {
    /// Operation name logged on each attempt.
    pub operation_name: &'a str,
    /// Subject of the operation logged on each attempt.
    pub subject_id: Uuid,
    /// Backoff to apply.
    pub policy: RetryPolicy,
}

/// Classifies errors as worth retrying or not.
pub trait IsTransient {
    /// Returns `true` if the same call may succeed when repeated.
    fn is_transient(&self) -> bool;
}

impl IsTransient for DomainError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Infrastructure(_))
    }
}

impl IsTransient for EventError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Publish { .. } => true,
            Self::Domain(inner) => inner.is_transient(),
            Self::TransportClosed | Self::Dispatch(_) | Self::Handler(_) => false,
        }
    }
}

/// Runs `operation`, retrying it once after the policy's delay if it fails
/// with a transient error.
///
/// # Errors
///
/// Returns the permanent error immediately, or the second attempt's error.
pub async fn retry_with_backoff<F, Fut, T, E>(mut operation: F, context: RetryContext<'_>) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display + IsTransient,
{
    let RetryContext {
        operation_name,
        subject_id,
        policy,
    } = context;

    debug!(operation = operation_name, %subject_id, attempt = 1, "attempting operation");
    match operation().await {
        Ok(value) => return Ok(value),
        Err(err) if !err.is_transient() => {
            warn!(
                operation = operation_name,
                %subject_id,
                attempt = 1,
                error = %err,
                "operation failed with a permanent error, not retrying"
            );
            return Err(err);
        }
        Err(err) => {
            warn!(
                operation = operation_name,
                %subject_id,
                attempt = 1,
                error = %err,
                delay_ms = u64::try_from(policy.delay().as_millis()).unwrap_or(u64::MAX),
                "operation failed, retrying after delay"
            );
        }
    }

    tokio::time::sleep(policy.delay()).await;

    debug!(operation = operation_name, %subject_id, attempt = 2, "attempting operation");
    match operation().await {
        Ok(value) => {
            info!(operation = operation_name, %subject_id, attempt = 2, "operation succeeded after retry");
            Ok(value)
        }
        Err(err) => {
            error!(
                operation = operation_name,
                %subject_id,
                attempt = 2,
                error = %err,
                "operation failed after retry"
            );
            Err(err)
        }
    }
}
