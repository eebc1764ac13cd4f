//! Promotion of Family domain events into integration events.

use std::sync::Arc;

use afterschool_core::clock::Clock;
use afterschool_core::context::Context;
use afterschool_core::event::{DomainEvent, EventType, IntegrationEvent, payload_with_canonical};
use afterschool_core::handler::{EventHandler, HandlerResult, Handling, Interest};
use afterschool_core::publisher::Publisher;
use async_trait::async_trait;
use tracing::info;

/// Publishes `child_data_anonymized` as
/// `integration:family:child_data_anonymized`.
///
/// Part of the GDPR critical path: a publish failure is returned so the
/// anonymization loop can halt.
pub struct ChildDataAnonymizedPromotion {
    publisher: Arc<dyn Publisher>,
    clock: Arc<dyn Clock>,
}

impl ChildDataAnonymizedPromotion {
    /// Creates the promotion handler.
    #[must_use]
    pub fn new(publisher: Arc<dyn Publisher>, clock: Arc<dyn Clock>) -> Self {
        Self { publisher, clock }
    }
}

#[async_trait]
impl EventHandler for ChildDataAnonymizedPromotion {
    fn name(&self) -> &'static str {
        "family.child_data_anonymized_promotion"
    }

    fn subscribed_events(&self) -> Interest {
        Interest::only([EventType::ChildDataAnonymized])
    }

    async fn handle_event(&self, event: &DomainEvent) -> HandlerResult {
        let child_id = event.aggregate_id();
        let payload =
            payload_with_canonical("child_id", child_id.to_string(), event.payload().clone());
        let integration =
            IntegrationEvent::promote(Context::Family, event, payload, self.clock.as_ref());

        self.publisher.publish(integration.into()).await?;
        info!(%child_id, "child anonymization promoted");
        Ok(Handling::Applied)
    }
}

#[cfg(test)]
mod tests {
    use afterschool_core::error::EventError;
    use afterschool_core::event::{EventMetadata, Message, Payload, payload_uuid};
    use afterschool_test_support::{FailingPublisher, FixedClock, RecordingPublisher};
    use uuid::Uuid;

    use super::*;
    use crate::domain::events;

    fn event(child_id: Uuid) -> DomainEvent {
        events::child_data_anonymized(
            child_id,
            Uuid::new_v4(),
            Payload::new(),
            EventMetadata::critical(),
            &FixedClock::default(),
        )
    }

    #[tokio::test]
    async fn test_publishes_on_family_integration_topic() {
        let publisher = Arc::new(RecordingPublisher::new());
        let promotion =
            ChildDataAnonymizedPromotion::new(publisher.clone(), Arc::new(FixedClock::default()));
        let child_id = Uuid::new_v4();

        promotion.handle_event(&event(child_id)).await.unwrap();

        let published = publisher.published();
        assert_eq!(published[0].0, "integration:family:child_data_anonymized");
        let Message::Integration(integration) = &published[0].1 else {
            panic!("expected an integration event");
        };
        assert_eq!(integration.source_context(), Context::Family);
        assert_eq!(payload_uuid(integration.payload(), "child_id"), Some(child_id));
    }

    #[tokio::test]
    async fn test_returns_publish_error() {
        let promotion = ChildDataAnonymizedPromotion::new(
            Arc::new(FailingPublisher::new()),
            Arc::new(FixedClock::default()),
        );

        let result = promotion.handle_event(&event(Uuid::new_v4())).await;

        assert!(matches!(result, Err(EventError::Publish { .. })));
    }
}
