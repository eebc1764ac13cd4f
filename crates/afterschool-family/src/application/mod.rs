//! Application layer for the Family context.

pub mod command_handlers;
pub mod promotion;
pub mod subscribers;

use std::sync::Arc;

use afterschool_core::clock::Clock;
use afterschool_core::retry::RetryPolicy;
use afterschool_event_bus::EventBus;

use crate::domain::records::FamilyStore;

/// Collaborators shared by the Family command handlers and subscribers.
#[derive(Clone)]
pub struct FamilyServices {
    /// Parent profile and child storage.
    pub store: Arc<dyn FamilyStore>,
    /// Bus used to dispatch Family domain events.
    pub bus: EventBus,
    /// Timestamp source for new events.
    pub clock: Arc<dyn Clock>,
    /// Backoff for retried store writes.
    pub retry: RetryPolicy,
}
