//! Application layer for the Participation context.

pub mod command_handlers;
pub mod subscribers;

use std::sync::Arc;

use afterschool_core::clock::Clock;
use afterschool_core::retry::RetryPolicy;

use crate::domain::records::ParticipationStore;

/// Collaborators shared by the Participation command handlers and
/// subscribers.
#[derive(Clone)]
pub struct ParticipationServices {
    /// Note and attendance storage.
    pub store: Arc<dyn ParticipationStore>,
    /// Timestamp source for new notes.
    pub clock: Arc<dyn Clock>,
    /// Backoff for retried redactions.
    pub retry: RetryPolicy,
}
