//! Domain events for the Messaging context.
//!
//! Payloads are typed structs serialized into the event payload, so
//! consumers can read them back with [`MessageSent::from_payload`] and
//! [`ConversationRead::from_payload`].

use afterschool_core::clock::Clock;
use afterschool_core::error::DomainError;
use afterschool_core::event::{
    DomainEvent, EventMetadata, EventType, Payload, into_payload, payload_with_canonical,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::messages::ChatMessage;

/// Aggregate type of `message_sent`.
pub const MESSAGE_AGGREGATE_TYPE: &str = "message";

/// Aggregate type of `conversation_read`.
pub const CONVERSATION_AGGREGATE_TYPE: &str = "conversation";

/// Longest preview carried in `message_sent`, in characters.
pub const PREVIEW_CHARS: usize = 80;

/// Payload of `message_sent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSent {
    /// The message identifier.
    pub message_id: Uuid,
    /// The conversation identifier.
    pub conversation_id: Uuid,
    /// The sending user.
    pub sender_id: Uuid,
    /// The receiving user.
    pub recipient_id: Uuid,
    /// Start of the message body.
    pub preview: String,
}

/// Payload of `conversation_read`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRead {
    /// The conversation identifier.
    pub conversation_id: Uuid,
    /// The reading user.
    pub reader_id: Uuid,
    /// Messages that became read.
    pub message_ids: Vec<Uuid>,
}

impl MessageSent {
    /// Reads the typed payload back from an event payload.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the payload does not match.
    pub fn from_payload(payload: &Payload) -> Result<Self, DomainError> {
        decode(payload)
    }
}

impl ConversationRead {
    /// Reads the typed payload back from an event payload.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the payload does not match.
    pub fn from_payload(payload: &Payload) -> Result<Self, DomainError> {
        decode(payload)
    }
}

fn encode<T: Serialize>(body: &T) -> Result<Payload, DomainError> {
    serde_json::to_value(body)
        .map(into_payload)
        .map_err(|e| DomainError::Infrastructure(format!("payload serialization failed: {e}")))
}

fn decode<T: DeserializeOwned>(payload: &Payload) -> Result<T, DomainError> {
    serde_json::from_value(Value::Object(payload.clone()))
        .map_err(|e| DomainError::Validation(format!("unexpected payload: {e}")))
}

/// Builds `message_sent`. Normal criticality.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the payload cannot be encoded.
pub fn message_sent(
    message: &ChatMessage,
    correlation_id: Uuid,
    clock: &dyn Clock,
) -> Result<DomainEvent, DomainError> {
    let body = MessageSent {
        message_id: message.id,
        conversation_id: message.conversation_id,
        sender_id: message.sender_id,
        recipient_id: message.recipient_id,
        preview: message.body.chars().take(PREVIEW_CHARS).collect(),
    };
    Ok(DomainEvent::new(
        EventType::MessageSent,
        MESSAGE_AGGREGATE_TYPE,
        message.id,
        payload_with_canonical("message_id", message.id.to_string(), encode(&body)?),
        EventMetadata::normal()
            .with_correlation_id(correlation_id)
            .with_actor(message.sender_id),
        clock,
    ))
}

/// Builds `conversation_read`. Normal criticality.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the payload cannot be encoded.
pub fn conversation_read(
    body: &ConversationRead,
    correlation_id: Uuid,
    clock: &dyn Clock,
) -> Result<DomainEvent, DomainError> {
    Ok(DomainEvent::new(
        EventType::ConversationRead,
        CONVERSATION_AGGREGATE_TYPE,
        body.conversation_id,
        payload_with_canonical(
            "conversation_id",
            body.conversation_id.to_string(),
            encode(body)?,
        ),
        EventMetadata::normal()
            .with_correlation_id(correlation_id)
            .with_actor(body.reader_id),
        clock,
    ))
}
