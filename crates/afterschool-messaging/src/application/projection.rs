//! Unread-message counters fed by the per-user UI topics.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use afterschool_core::error::{DomainError, EventError};
use afterschool_core::event::{EventType, Message};
use afterschool_core::handler::{HandlerResult, Handling, Interest, Subscriber};
use afterschool_core::topic::user_messages_topic;
use afterschool_event_bus::PubSub;
use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::events::{ConversationRead, MessageSent};
use crate::domain::messages::MessageStore;

#[derive(Debug, Default)]
struct ProjectionState {
    unread: HashMap<Uuid, HashSet<Uuid>>,
    watched: HashSet<Uuid>,
}

/// Per-user unread message counts.
///
/// Delivery is best-effort, so the projection is seeded from the message
/// store with [`bootstrap`](Self::bootstrap) and then kept current from
/// `user:{id}:messages`. Updates are keyed by message id, which makes
/// redelivered and replayed events harmless.
#[derive(Debug, Default)]
pub struct UnreadCountProjection {
    state: Mutex<ProjectionState>,
}

impl UnreadCountProjection {
    /// Creates an empty projection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ProjectionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Loads every unread message from the store. Returns how many were
    /// loaded.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the messages cannot be read.
    pub async fn bootstrap(&self, store: &dyn MessageStore) -> Result<usize, DomainError> {
        let unread = store.unread().await?;
        let mut state = self.state();
        for message in &unread {
            state
                .unread
                .entry(message.recipient_id)
                .or_default()
                .insert(message.id);
        }
        info!(messages = unread.len(), "unread counts bootstrapped");
        Ok(unread.len())
    }

    /// Starts following `user_id`'s message topic. Returns `false` if the
    /// user was already watched.
    ///
    /// # Errors
    ///
    /// Returns `EventError::TransportClosed` if the transport is closed.
    pub fn watch_user(self: &Arc<Self>, user_id: Uuid, pubsub: &PubSub) -> Result<bool, EventError> {
        if !self.state().watched.insert(user_id) {
            return Ok(false);
        }
        let subscriber = Arc::clone(self);
        if let Err(err) = pubsub.subscribe(user_messages_topic(user_id), subscriber) {
            self.state().watched.remove(&user_id);
            return Err(err);
        }
        debug!(%user_id, "watching user messages");
        Ok(true)
    }

    /// Unread messages addressed to `user_id`.
    #[must_use]
    pub fn unread_count(&self, user_id: Uuid) -> usize {
        self.state().unread.get(&user_id).map_or(0, HashSet::len)
    }

    fn apply_sent(&self, body: &MessageSent) {
        self.state()
            .unread
            .entry(body.recipient_id)
            .or_default()
            .insert(body.message_id);
    }

    fn apply_read(&self, body: &ConversationRead) {
        if let Some(unread) = self.state().unread.get_mut(&body.reader_id) {
            for message_id in &body.message_ids {
                unread.remove(message_id);
            }
        }
    }
}

#[async_trait]
impl Subscriber for UnreadCountProjection {
    fn name(&self) -> &'static str {
        "messaging.unread_counts"
    }

    fn subscribed_events(&self) -> Interest {
        Interest::only([EventType::MessageSent, EventType::ConversationRead])
    }

    async fn handle_message(&self, message: &Message) -> HandlerResult {
        match message.event_type() {
            EventType::MessageSent => {
                self.apply_sent(&MessageSent::from_payload(message.payload())?);
                Ok(Handling::Applied)
            }
            EventType::ConversationRead => {
                self.apply_read(&ConversationRead::from_payload(message.payload())?);
                Ok(Handling::Applied)
            }
            _ => Ok(Handling::Ignored),
        }
    }
}
