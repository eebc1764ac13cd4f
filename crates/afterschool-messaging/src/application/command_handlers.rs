//! Command handlers for the Messaging context.

use afterschool_core::clock::Clock;
use afterschool_core::command::Command;
use afterschool_core::context::Context;
use afterschool_core::error::DomainError;
use afterschool_event_bus::Dispatcher;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::commands::{MarkConversationRead, SendMessage};
use crate::domain::events::{self, ConversationRead};
use crate::domain::messages::{ChatMessage, MessageStore};

/// Handles `SendMessage`: stores the message, then announces it.
///
/// The stored message is the outcome. Real-time delivery failures are
/// logged by the dispatcher and never fail the send.
///
/// # Errors
///
/// Returns `DomainError::Validation` for an empty body, or the store's error
/// if the message cannot be saved.
#[instrument(skip_all, fields(command = command.command_type(), context = %command.context(), conversation_id = %command.conversation_id))]
pub async fn handle_send_message(
    command: &SendMessage,
    clock: &dyn Clock,
    messages: &dyn MessageStore,
    dispatcher: &Dispatcher,
) -> Result<Uuid, DomainError> {
    if command.body.trim().is_empty() {
        return Err(DomainError::Validation("message body must not be empty".into()));
    }

    let message = ChatMessage {
        id: Uuid::new_v4(),
        conversation_id: command.conversation_id,
        sender_id: command.sender_id,
        recipient_id: command.recipient_id,
        body: command.body.clone(),
        sent_at: clock.now(),
        read_at: None,
    };
    messages.insert(message.clone()).await?;
    info!(message_id = %message.id, "message stored");

    let event = events::message_sent(&message, command.correlation_id, clock)?;
    dispatcher.dispatch(&event, Context::Messaging).await;
    Ok(message.id)
}

/// Handles `MarkConversationRead` and returns the messages that became
/// read. Nothing is announced when there was nothing to mark.
///
/// # Errors
///
/// Returns the store's error if the update fails.
#[instrument(skip_all, fields(command = command.command_type(), context = %command.context(), conversation_id = %command.conversation_id))]
pub async fn handle_mark_conversation_read(
    command: &MarkConversationRead,
    clock: &dyn Clock,
    messages: &dyn MessageStore,
    dispatcher: &Dispatcher,
) -> Result<Vec<Uuid>, DomainError> {
    let message_ids = messages
        .mark_read(command.conversation_id, command.reader_id, clock.now())
        .await?;
    if message_ids.is_empty() {
        debug!("no unread messages");
        return Ok(message_ids);
    }
    info!(read = message_ids.len(), "conversation marked read");

    let body = ConversationRead {
        conversation_id: command.conversation_id,
        reader_id: command.reader_id,
        message_ids,
    };
    let event = events::conversation_read(&body, command.correlation_id, clock)?;
    dispatcher.dispatch(&event, Context::Messaging).await;
    Ok(body.message_ids)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use afterschool_core::event::EventType;
    use afterschool_core::handler::{EventHandler, Interest};
    use afterschool_event_bus::{EventBus, HandlerRegistry};
    use afterschool_test_support::{FixedClock, RecordingHandler};

    use super::*;
    use crate::domain::messages::InMemoryMessageStore;

    fn dispatcher_with(handler: Arc<RecordingHandler>) -> Dispatcher {
        Dispatcher::new(EventBus::new(HandlerRegistry::new([(
            Context::Messaging,
            handler as Arc<dyn EventHandler>,
        )])))
    }

    fn send(conversation_id: Uuid, sender_id: Uuid, recipient_id: Uuid) -> SendMessage {
        SendMessage {
            correlation_id: Uuid::new_v4(),
            conversation_id,
            sender_id,
            recipient_id,
            body: "Reminder: bring indoor shoes tomorrow".into(),
        }
    }

    #[tokio::test]
    async fn test_send_message_stores_then_dispatches() {
        // Arrange
        let handler = Arc::new(RecordingHandler::new("recorder", Interest::All));
        let dispatcher = dispatcher_with(handler.clone());
        let store = InMemoryMessageStore::new();
        let conversation = Uuid::new_v4();

        // Act
        let message_id = handle_send_message(
            &send(conversation, Uuid::new_v4(), Uuid::new_v4()),
            &FixedClock::default(),
            &store,
            &dispatcher,
        )
        .await
        .unwrap();

        // Assert
        assert_eq!(store.conversation(conversation).await.unwrap()[0].id, message_id);
        let handled = handler.handled();
        assert_eq!(handled.len(), 1);
        assert_eq!(handled[0].event_type(), EventType::MessageSent);
        assert_eq!(handled[0].aggregate_id(), message_id);
    }

    #[tokio::test]
    async fn test_empty_body_is_rejected_before_storing() {
        let handler = Arc::new(RecordingHandler::new("recorder", Interest::All));
        let dispatcher = dispatcher_with(handler.clone());
        let store = InMemoryMessageStore::new();
        let conversation = Uuid::new_v4();
        let mut command = send(conversation, Uuid::new_v4(), Uuid::new_v4());
        command.body = " \n ".into();

        let result =
            handle_send_message(&command, &FixedClock::default(), &store, &dispatcher).await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(store.conversation(conversation).await.unwrap().is_empty());
        assert!(handler.handled().is_empty());
    }

    #[tokio::test]
    async fn test_send_succeeds_when_fan_out_fails() {
        let handler = Arc::new(RecordingHandler::failing(
            "realtime",
            Interest::All,
            "socket gateway down",
        ));
        let dispatcher = dispatcher_with(handler);
        let store = InMemoryMessageStore::new();

        let result = handle_send_message(
            &send(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()),
            &FixedClock::default(),
            &store,
            &dispatcher,
        )
        .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_mark_read_announces_only_when_something_changed() {
        // Arrange
        let handler = Arc::new(RecordingHandler::new("recorder", Interest::All));
        let dispatcher = dispatcher_with(handler.clone());
        let store = InMemoryMessageStore::new();
        let clock = FixedClock::default();
        let conversation = Uuid::new_v4();
        let parent = Uuid::new_v4();
        let message_id = handle_send_message(
            &send(conversation, Uuid::new_v4(), parent),
            &clock,
            &store,
            &dispatcher,
        )
        .await
        .unwrap();
        let command = MarkConversationRead {
            correlation_id: Uuid::new_v4(),
            conversation_id: conversation,
            reader_id: parent,
        };

        // Act
        let first = handle_mark_conversation_read(&command, &clock, &store, &dispatcher)
            .await
            .unwrap();
        let second = handle_mark_conversation_read(&command, &clock, &store, &dispatcher)
            .await
            .unwrap();

        // Assert
        assert_eq!(first, vec![message_id]);
        assert!(second.is_empty());
        let types: Vec<EventType> = handler.handled().iter().map(|e| e.event_type()).collect();
        assert_eq!(types, vec![EventType::MessageSent, EventType::ConversationRead]);
    }
}
