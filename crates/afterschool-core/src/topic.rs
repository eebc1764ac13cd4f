//! Topic naming conventions.
//!
//! These formats are shared with every subscriber and must not change.

use uuid::Uuid;

use crate::context::Context;
use crate::event::EventType;

/// Default topic for a domain event: `"{aggregate_type}:{event_type}"`.
#[must_use]
pub fn domain_topic(aggregate_type: &str, event_type: EventType) -> String {
    format!("{aggregate_type}:{event_type}")
}

/// Default topic for an integration event:
/// `"integration:{source_context}:{event_type}"`.
#[must_use]
pub fn integration_topic(source_context: Context, event_type: EventType) -> String {
    format!("integration:{source_context}:{event_type}")
}

/// UI topic for everything happening in one conversation.
#[must_use]
pub fn conversation_topic(conversation_id: Uuid) -> String {
    format!("conversation:{conversation_id}")
}

/// UI topic for one user's message badge and inbox.
#[must_use]
pub fn user_messages_topic(user_id: Uuid) -> String {
    format!("user:{user_id}:messages")
}
