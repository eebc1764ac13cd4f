//! Chat messages and their store.

use std::sync::{Mutex, MutexGuard};

use afterschool_core::error::DomainError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A message between two users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Message identifier.
    pub id: Uuid,
    /// Conversation identifier.
    pub conversation_id: Uuid,
    /// Sending user.
    pub sender_id: Uuid,
    /// Receiving user.
    pub recipient_id: Uuid,
    /// Message text.
    pub body: String,
    /// When the message was sent.
    pub sent_at: DateTime<Utc>,
    /// When the recipient read it.
    pub read_at: Option<DateTime<Utc>>,
}

impl ChatMessage {
    /// Returns `true` until the recipient has read the message.
    #[must_use]
    pub fn is_unread(&self) -> bool {
        self.read_at.is_none()
    }
}

/// Storage for chat messages. The system of record for Messaging.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Stores a new message.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AlreadyExists` if the identifier is taken.
    async fn insert(&self, message: ChatMessage) -> Result<(), DomainError>;

    /// Messages of a conversation, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` on storage failure.
    async fn conversation(&self, conversation_id: Uuid) -> Result<Vec<ChatMessage>, DomainError>;

    /// Marks the reader's unread messages in a conversation as read and
    /// returns their identifiers.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` on storage failure.
    async fn mark_read(
        &self,
        conversation_id: Uuid,
        reader_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Vec<Uuid>, DomainError>;

    /// Every unread message, across all users.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` on storage failure.
    async fn unread(&self) -> Result<Vec<ChatMessage>, DomainError>;
}

/// In-process `MessageStore`.
#[derive(Debug, Default)]
pub struct InMemoryMessageStore {
    messages: Mutex<Vec<ChatMessage>>,
}

impl InMemoryMessageStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<ChatMessage>>, DomainError> {
        self.messages
            .lock()
            .map_err(|_| DomainError::Infrastructure("message store lock poisoned".into()))
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn insert(&self, message: ChatMessage) -> Result<(), DomainError> {
        let mut messages = self.lock()?;
        if messages.iter().any(|existing| existing.id == message.id) {
            return Err(DomainError::AlreadyExists(format!("message {}", message.id)));
        }
        messages.push(message);
        Ok(())
    }

    async fn conversation(&self, conversation_id: Uuid) -> Result<Vec<ChatMessage>, DomainError> {
        Ok(self
            .lock()?
            .iter()
            .filter(|message| message.conversation_id == conversation_id)
            .cloned()
            .collect())
    }

    async fn mark_read(
        &self,
        conversation_id: Uuid,
        reader_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Vec<Uuid>, DomainError> {
        let mut messages = self.lock()?;
        let mut read = Vec::new();
        for message in messages.iter_mut().filter(|message| {
            message.conversation_id == conversation_id
                && message.recipient_id == reader_id
                && message.is_unread()
        }) {
            message.read_at = Some(at);
            read.push(message.id);
        }
        Ok(read)
    }

    async fn unread(&self) -> Result<Vec<ChatMessage>, DomainError> {
        Ok(self
            .lock()?
            .iter()
            .filter(|message| message.is_unread())
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn message(conversation_id: Uuid, sender_id: Uuid, recipient_id: Uuid) -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4(),
            conversation_id,
            sender_id,
            recipient_id,
            body: "Is pickup at 5:30 today?".into(),
            sent_at: Utc.with_ymd_and_hms(2026, 1, 15, 14, 0, 0).unwrap(),
            read_at: None,
        }
    }

    #[tokio::test]
    async fn test_mark_read_only_touches_readers_unread_messages() {
        // Arrange
        let store = InMemoryMessageStore::new();
        let conversation = Uuid::new_v4();
        let parent = Uuid::new_v4();
        let provider = Uuid::new_v4();
        let to_parent = message(conversation, provider, parent);
        let to_provider = message(conversation, parent, provider);
        store.insert(to_parent.clone()).await.unwrap();
        store.insert(to_provider.clone()).await.unwrap();
        let at = Utc.with_ymd_and_hms(2026, 1, 15, 15, 0, 0).unwrap();

        // Act
        let read = store.mark_read(conversation, parent, at).await.unwrap();
        let again = store.mark_read(conversation, parent, at).await.unwrap();

        // Assert
        assert_eq!(read, vec![to_parent.id]);
        assert!(again.is_empty());
        let unread = store.unread().await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].id, to_provider.id);
    }

    #[tokio::test]
    async fn test_duplicate_message_id_is_rejected() {
        let store = InMemoryMessageStore::new();
        let original = message(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        store.insert(original.clone()).await.unwrap();

        let result = store.insert(original).await;

        assert!(matches!(result, Err(DomainError::AlreadyExists(_))));
    }
}
