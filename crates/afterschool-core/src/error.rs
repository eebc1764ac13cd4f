//! Error types shared by every context.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use crate::context::Context;
use crate::event::EventType;

/// Errors raised by a context's own operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The addressed record does not exist.
    #[error("record not found: {0}")]
    NotFound(Uuid),

    /// The record being created already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The input was rejected by domain rules.
    #[error("validation error: {0}")]
    Validation(String),

    /// A storage or infrastructure failure.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Returns `true` for duplicate-resource errors, which at-least-once
    /// consumers treat as success.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }
}

/// One handler that failed while the bus dispatched an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    /// Name of the failing handler.
    pub handler: &'static str,
    /// Human-readable failure reason.
    pub reason: String,
}

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.handler, self.reason)
    }
}

/// Every handler failure collected during one bus dispatch.
#[derive(Debug, Clone, Error)]
#[error("dispatch of {event_type} ({event_id}) in {context} failed: {}", summarize(.failures))]
pub struct DispatchError {
    /// Context whose handlers were invoked.
    pub context: Context,
    /// Type of the dispatched event.
    pub event_type: EventType,
    /// Identifier of the dispatched event.
    pub event_id: Uuid,
    /// Failures in registration order.
    pub failures: Vec<HandlerFailure>,
}

fn summarize(failures: &[HandlerFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors raised while moving events between handlers and contexts.
#[derive(Debug, Error)]
pub enum EventError {
    /// The transport rejected or could not deliver a publish.
    #[error("publish to {topic} failed: {reason}")]
    Publish {
        /// Topic the event was addressed to.
        topic: String,
        /// Failure reason.
        reason: String,
    },

    /// The transport no longer accepts events.
    #[error("transport is closed")]
    TransportClosed,

    /// One or more bus handlers failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// A context operation failed inside a handler.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A handler rejected the event (e.g. a malformed payload).
    #[error("handler error: {0}")]
    Handler(String),
}
