//! Handler contracts implemented by every context that reacts to events.

use async_trait::async_trait;

use crate::error::EventError;
use crate::event::{DomainEvent, EventType, Message};

/// Event types a handler wants to receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interest {
    /// Every event type.
    All,
    /// Only the listed event types.
    Only(Vec<EventType>),
}

impl Interest {
    /// Interest in a fixed set of event types.
    #[must_use]
    pub fn only(event_types: impl IntoIterator<Item = EventType>) -> Self {
        Self::Only(event_types.into_iter().collect())
    }

    /// Returns `true` if `event_type` should be delivered.
    #[must_use]
    pub fn includes(&self, event_type: EventType) -> bool {
        match self {
            Self::All => true,
            Self::Only(types) => types.contains(&event_type),
        }
    }
}

/// Successful outcomes of handling an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handling {
    /// The handler acted on the event.
    Applied,
    /// The handler consciously did not act on the event.
    Ignored,
}

/// Result returned by every handler: `ok`, `ignored` or `error(reason)`.
pub type HandlerResult = Result<Handling, EventError>;

/// A handler registered on a context's event bus.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Name used in logs and failure reports.
    fn name(&self) -> &'static str;

    /// Event types this handler receives.
    fn subscribed_events(&self) -> Interest;

    /// Handles one domain event.
    async fn handle_event(&self, event: &DomainEvent) -> HandlerResult;
}

/// A handler attached to a transport topic.
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Name used in logs and failure reports.
    fn name(&self) -> &'static str;

    /// Event types this subscriber acts on. Other messages on its topics
    /// are acknowledged as ignored.
    fn subscribed_events(&self) -> Interest {
        Interest::All
    }

    /// Handles one message delivered on a subscribed topic.
    async fn handle_message(&self, message: &Message) -> HandlerResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_includes_every_event_type() {
        assert!(Interest::All.includes(EventType::MessageSent));
        assert!(Interest::All.includes(EventType::UserAnonymized));
    }

    #[test]
    fn test_only_includes_listed_event_types() {
        let interest = Interest::only([EventType::UserAnonymized]);

        assert!(interest.includes(EventType::UserAnonymized));
        assert!(!interest.includes(EventType::UserRegistered));
    }
}
