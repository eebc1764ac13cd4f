//! Real-time UI fan-out of Messaging events.

use std::sync::Arc;

use afterschool_core::error::EventError;
use afterschool_core::event::{DomainEvent, EventType, Message};
use afterschool_core::handler::{EventHandler, HandlerResult, Handling, Interest};
use afterschool_core::publisher::Publisher;
use afterschool_core::topic::{conversation_topic, user_messages_topic};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::events::{ConversationRead, MessageSent};

/// Pushes `message_sent` to the conversation and recipient topics, and
/// `conversation_read` to the reader's topic.
///
/// Non-critical: every topic is attempted, and a failed publish is
/// reported to the dispatcher, which logs it at warn level.
pub struct RealtimeNotifier {
    publisher: Arc<dyn Publisher>,
}

impl RealtimeNotifier {
    /// Creates the notifier.
    #[must_use]
    pub fn new(publisher: Arc<dyn Publisher>) -> Self {
        Self { publisher }
    }

    fn topics(event: &DomainEvent) -> Result<Vec<String>, EventError> {
        match event.event_type() {
            EventType::MessageSent => {
                let body = MessageSent::from_payload(event.payload())?;
                Ok(vec![
                    conversation_topic(body.conversation_id),
                    user_messages_topic(body.recipient_id),
                ])
            }
            EventType::ConversationRead => {
                let body = ConversationRead::from_payload(event.payload())?;
                Ok(vec![user_messages_topic(body.reader_id)])
            }
            _ => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl EventHandler for RealtimeNotifier {
    fn name(&self) -> &'static str {
        "messaging.realtime_notifier"
    }

    fn subscribed_events(&self) -> Interest {
        Interest::only([EventType::MessageSent, EventType::ConversationRead])
    }

    async fn handle_event(&self, event: &DomainEvent) -> HandlerResult {
        let topics = Self::topics(event)?;
        if topics.is_empty() {
            return Ok(Handling::Ignored);
        }

        let mut first_failure = None;
        for topic in &topics {
            let message = Message::Domain(event.clone());
            match self.publisher.publish_to(message, topic).await {
                Ok(()) => debug!(topic, event_type = %event.event_type(), "pushed to ui topic"),
                Err(err) => {
                    warn!(topic, error = %err, "ui push failed");
                    if first_failure.is_none() {
                        first_failure = Some(err);
                    }
                }
            }
        }

        match first_failure {
            Some(err) => Err(err),
            None => Ok(Handling::Applied),
        }
    }
}
