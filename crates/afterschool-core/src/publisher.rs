//! Publisher contract implemented by the transport.

use async_trait::async_trait;

use crate::error::EventError;
use crate::event::Message;

/// Hands events to the cross-context transport.
///
/// A successful return means the event was handed off, not that every
/// subscriber has finished handling it.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publishes `message` on an explicit topic.
    ///
    /// # Errors
    ///
    /// Returns `EventError` if the transport rejects the event.
    async fn publish_to(&self, message: Message, topic: &str) -> Result<(), EventError>;

    /// Publishes `message` on the topic derived from its fields.
    ///
    /// # Errors
    ///
    /// Returns `EventError` if the transport rejects the event.
    async fn publish(&self, message: Message) -> Result<(), EventError> {
        let topic = message.default_topic();
        self.publish_to(message, &topic).await
    }

    /// Publishes `messages` one after another on their default topics.
    ///
    /// Not atomic: publishing stops at the first error, and events before it
    /// remain published.
    ///
    /// # Errors
    ///
    /// Returns the first `EventError` encountered.
    async fn publish_all(&self, messages: Vec<Message>) -> Result<(), EventError> {
        for message in messages {
            self.publish(message).await?;
        }
        Ok(())
    }
}
