//! Promotion of Accounts domain events into integration events.

use std::sync::Arc;

use afterschool_core::clock::Clock;
use afterschool_core::context::Context;
use afterschool_core::event::{DomainEvent, EventType, IntegrationEvent, payload_with_canonical};
use afterschool_core::handler::{EventHandler, HandlerResult, Handling, Interest};
use afterschool_core::publisher::Publisher;
use async_trait::async_trait;
use tracing::info;

/// Translates an Accounts domain event into its public contract.
#[must_use]
pub fn to_integration_event(event: &DomainEvent, clock: &dyn Clock) -> IntegrationEvent {
    let payload = payload_with_canonical(
        "user_id",
        event.aggregate_id().to_string(),
        event.payload().clone(),
    );
    IntegrationEvent::promote(Context::Accounts, event, payload, clock)
}

/// Publishes `user_registered` and `user_anonymized` to other contexts.
///
/// Publish failures are returned, not swallowed, so the bus reports them
/// and critical flows can halt.
pub struct AccountsPromotion {
    publisher: Arc<dyn Publisher>,
    clock: Arc<dyn Clock>,
}

impl AccountsPromotion {
    /// Creates the promotion handler.
    #[must_use]
    pub fn new(publisher: Arc<dyn Publisher>, clock: Arc<dyn Clock>) -> Self {
        Self { publisher, clock }
    }
}

#[async_trait]
impl EventHandler for AccountsPromotion {
    fn name(&self) -> &'static str {
        "accounts.promotion"
    }

    fn subscribed_events(&self) -> Interest {
        Interest::only([EventType::UserRegistered, EventType::UserAnonymized])
    }

    async fn handle_event(&self, event: &DomainEvent) -> HandlerResult {
        let integration = to_integration_event(event, self.clock.as_ref());
        let topic = integration.default_topic();
        self.publisher.publish(integration.into()).await?;
        info!(user_id = %event.aggregate_id(), %topic, "accounts event promoted");
        Ok(Handling::Applied)
    }
}

#[cfg(test)]
mod tests {
    use afterschool_core::event::{EventMetadata, Message, Payload, payload_uuid};
    use afterschool_core::error::EventError;
    use afterschool_test_support::{FailingPublisher, FixedClock, RecordingPublisher};
    use uuid::Uuid;

    use super::*;
    use crate::domain::events;

    #[tokio::test]
    async fn test_publishes_user_anonymized_on_integration_topic() {
        // Arrange
        let publisher = Arc::new(RecordingPublisher::new());
        let promotion = AccountsPromotion::new(publisher.clone(), Arc::new(FixedClock::default()));
        let user_id = Uuid::new_v4();
        let event = events::user_anonymized(
            user_id,
            Payload::new(),
            EventMetadata::critical(),
            &FixedClock::default(),
        );

        // Act
        let outcome = promotion.handle_event(&event).await;

        // Assert
        assert_eq!(outcome.unwrap(), Handling::Applied);
        let published = publisher.published();
        assert_eq!(published.len(), 1);
        let (topic, message) = &published[0];
        assert_eq!(topic, "integration:accounts:user_anonymized");
        let Message::Integration(integration) = message else {
            panic!("expected an integration event, got {message:?}");
        };
        assert_eq!(integration.entity_id(), user_id);
        assert_eq!(payload_uuid(integration.payload(), "user_id"), Some(user_id));
        assert_eq!(integration.metadata().causation_id, Some(event.event_id()));
        assert!(integration.is_critical());
    }

    #[tokio::test]
    async fn test_propagates_publish_failure() {
        let publisher = Arc::new(FailingPublisher::new());
        let promotion = AccountsPromotion::new(publisher.clone(), Arc::new(FixedClock::default()));
        let event = events::user_anonymized(
            Uuid::new_v4(),
            Payload::new(),
            EventMetadata::critical(),
            &FixedClock::default(),
        );

        let outcome = promotion.handle_event(&event).await;

        assert!(matches!(outcome, Err(EventError::Publish { .. })));
        assert_eq!(publisher.attempts(), 1);
    }

    #[test]
    fn test_only_user_lifecycle_events_are_subscribed() {
        let promotion = AccountsPromotion::new(
            Arc::new(RecordingPublisher::new()),
            Arc::new(FixedClock::default()),
        );

        let interest = promotion.subscribed_events();

        assert!(interest.includes(EventType::UserAnonymized));
        assert!(interest.includes(EventType::UserRegistered));
        assert!(!interest.includes(EventType::MessageSent));
    }
}
