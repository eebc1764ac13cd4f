//! Commands for the Messaging context.

use afterschool_core::command::Command;
use afterschool_core::context::Context;
use uuid::Uuid;

/// Command to send a message within a conversation.
#[derive(Debug, Clone)]
pub struct SendMessage {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The conversation the message belongs to.
    pub conversation_id: Uuid,
    /// The sending user.
    pub sender_id: Uuid,
    /// The receiving user.
    pub recipient_id: Uuid,
    /// Message text.
    pub body: String,
}

impl Command for SendMessage {
    fn command_type(&self) -> &'static str {
        "messaging.send_message"
    }

    fn context(&self) -> Context {
        Context::Messaging
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to mark every message addressed to the reader in a
/// conversation as read.
#[derive(Debug, Clone)]
pub struct MarkConversationRead {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The conversation being read.
    pub conversation_id: Uuid,
    /// The reading user.
    pub reader_id: Uuid,
}

impl Command for MarkConversationRead {
    fn command_type(&self) -> &'static str {
        "messaging.mark_conversation_read"
    }

    fn context(&self) -> Context {
        Context::Messaging
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
