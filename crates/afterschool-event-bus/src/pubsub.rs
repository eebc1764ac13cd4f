//! In-process topic transport.
//!
//! Each subscription owns a worker task fed by an unbounded channel, so a
//! subscriber sees its topic's messages in publish order while different
//! subscribers run concurrently. There is no backlog: a subscriber only
//! receives messages published after it subscribed.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use afterschool_core::error::EventError;
use afterschool_core::event::Message;
use afterschool_core::handler::{Handling, Subscriber};
use afterschool_core::publisher::Publisher;
use async_trait::async_trait;
use tokio::sync::{Notify, mpsc};
use tracing::{debug, error, warn};

use crate::isolation::isolated;

struct Delivery {
    topic: Arc<str>,
    message: Arc<Message>,
}

struct Slot {
    subscriber: &'static str,
    sender: mpsc::UnboundedSender<Delivery>,
}

#[derive(Default)]
struct Shared {
    topics: RwLock<HashMap<String, Vec<Slot>>>,
    closed: AtomicBool,
    in_flight: AtomicUsize,
    idle: Notify,
}

impl Shared {
    fn finish_delivery(&self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// Publish/subscribe transport for messages crossing context boundaries.
///
/// Cheap to clone; clones share subscriptions.
#[derive(Clone, Default)]
pub struct PubSub {
    shared: Arc<Shared>,
}

impl PubSub {
    /// Creates a transport with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `subscriber` to `topic` and starts its worker task.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `EventError::TransportClosed` after [`PubSub::close`].
    pub fn subscribe(
        &self,
        topic: impl Into<String>,
        subscriber: Arc<dyn Subscriber>,
    ) -> Result<(), EventError> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(EventError::TransportClosed);
        }

        let topic = topic.into();
        let (sender, receiver) = mpsc::unbounded_channel();
        let name = subscriber.name();

        self.shared
            .topics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(topic.clone())
            .or_default()
            .push(Slot {
                subscriber: name,
                sender,
            });

        debug!(subscriber = name, %topic, "subscriber attached");
        tokio::spawn(run_worker(Arc::clone(&self.shared), subscriber, receiver));
        Ok(())
    }

    /// Number of subscribers currently attached to `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.shared
            .topics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(topic)
            .map_or(0, Vec::len)
    }

    /// Deliveries handed off but not yet fully handled.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.shared.in_flight.load(Ordering::SeqCst)
    }

    /// Waits until every handed-off delivery has been handled, including
    /// deliveries published by subscribers while handling earlier ones.
    pub async fn drained(&self) {
        loop {
            let notified = self.shared.idle.notified();
            let mut notified = std::pin::pin!(notified);
            notified.as_mut().enable();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Stops accepting publishes and subscriptions. Workers finish their
    /// queued deliveries and exit.
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        self.shared
            .topics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        debug!("transport closed");
    }
}

#[async_trait]
impl Publisher for PubSub {
    async fn publish_to(&self, message: Message, topic: &str) -> Result<(), EventError> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(EventError::TransportClosed);
        }
        if topic.is_empty() {
            return Err(EventError::Publish {
                topic: String::new(),
                reason: "topic must not be empty".into(),
            });
        }

        let event_type = message.event_type();
        let event_id = message.event_id();
        let message = Arc::new(message);
        let topic_name: Arc<str> = Arc::from(topic);

        let topics = self
            .shared
            .topics
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(slots) = topics.get(topic) else {
            debug!(topic, %event_type, %event_id, "no subscribers; event dropped");
            return Ok(());
        };

        for slot in slots {
            self.shared.in_flight.fetch_add(1, Ordering::SeqCst);
            let delivery = Delivery {
                topic: Arc::clone(&topic_name),
                message: Arc::clone(&message),
            };
            if slot.sender.send(delivery).is_err() {
                self.shared.finish_delivery();
                warn!(subscriber = slot.subscriber, topic, %event_type, "subscriber worker stopped; delivery dropped");
            }
        }

        debug!(topic, %event_type, %event_id, subscribers = slots.len(), "event published");
        Ok(())
    }
}

impl fmt::Debug for PubSub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let topics = self
            .shared
            .topics
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("PubSub")
            .field("topics", &topics.len())
            .field("in_flight", &self.in_flight())
            .field("closed", &self.shared.closed.load(Ordering::SeqCst))
            .finish()
    }
}

async fn run_worker(
    shared: Arc<Shared>,
    subscriber: Arc<dyn Subscriber>,
    mut receiver: mpsc::UnboundedReceiver<Delivery>,
) {
    while let Some(delivery) = receiver.recv().await {
        deliver(subscriber.as_ref(), &delivery).await;
        shared.finish_delivery();
    }
    debug!(subscriber = subscriber.name(), "subscriber worker stopped");
}

async fn deliver(subscriber: &dyn Subscriber, delivery: &Delivery) {
    let message = delivery.message.as_ref();
    let topic = delivery.topic.as_ref();
    let event_type = message.event_type();

    if !subscriber.subscribed_events().includes(event_type) {
        debug!(subscriber = subscriber.name(), topic, %event_type, "event type not subscribed; ignored");
        return;
    }

    match isolated(subscriber.handle_message(message)).await {
        Ok(Handling::Applied) => {
            debug!(subscriber = subscriber.name(), topic, %event_type, "subscriber applied event");
        }
        Ok(Handling::Ignored) => {
            debug!(subscriber = subscriber.name(), topic, %event_type, "subscriber ignored event");
        }
        Err(err) if message.is_critical() => {
            error!(
                subscriber = subscriber.name(),
                topic,
                %event_type,
                event_id = %message.event_id(),
                error = %err,
                "subscriber failed to handle critical event"
            );
        }
        Err(err) => {
            warn!(
                subscriber = subscriber.name(),
                topic,
                %event_type,
                event_id = %message.event_id(),
                error = %err,
                "subscriber failed to handle event"
            );
        }
    }
}
