//! Participation reactions to Family integration events.

use std::sync::Arc;

use afterschool_core::context::Context;
use afterschool_core::error::EventError;
use afterschool_core::event::{EventType, Message};
use afterschool_core::handler::{HandlerResult, Handling, Interest, Subscriber};
use afterschool_core::topic::integration_topic;
use afterschool_event_bus::PubSub;
use async_trait::async_trait;
use tracing::info;

use super::ParticipationServices;
use super::command_handlers::handle_redact_child_records;
use crate::domain::commands::RedactChildRecords;

/// Redacts a child's participation records once Family has anonymized the
/// child.
pub struct ChildDataAnonymizedSubscriber {
    services: ParticipationServices,
}

impl ChildDataAnonymizedSubscriber {
    /// Creates the subscriber.
    #[must_use]
    pub fn new(services: ParticipationServices) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Subscriber for ChildDataAnonymizedSubscriber {
    fn name(&self) -> &'static str {
        "participation.child_data_anonymized"
    }

    fn subscribed_events(&self) -> Interest {
        Interest::only([EventType::ChildDataAnonymized])
    }

    async fn handle_message(&self, message: &Message) -> HandlerResult {
        let child_id = message.payload_uuid("child_id").ok_or_else(|| {
            EventError::Handler("child_data_anonymized event carries no child_id".into())
        })?;

        let command = RedactChildRecords {
            correlation_id: message.metadata().correlation_id.unwrap_or(message.event_id()),
            causation_id: Some(message.event_id()),
            child_id,
        };
        handle_redact_child_records(&command, &self.services).await?;
        Ok(Handling::Applied)
    }
}

/// Attaches the Participation subscriber to the Family topic.
///
/// # Errors
///
/// Returns `EventError::TransportClosed` if the transport is closed.
pub fn start(pubsub: &PubSub, services: &ParticipationServices) -> Result<(), EventError> {
    pubsub.subscribe(
        integration_topic(Context::Family, EventType::ChildDataAnonymized),
        Arc::new(ChildDataAnonymizedSubscriber::new(services.clone())),
    )?;
    info!("participation subscribers started");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use afterschool_core::event::{EventMetadata, IntegrationEvent, into_payload};
    use afterschool_core::publisher::Publisher;
    use afterschool_core::retry::RetryPolicy;
    use afterschool_test_support::FixedClock;
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::domain::records::{
        BehavioralNote, InMemoryParticipationStore, ParticipationStore, REDACTED,
    };

    fn services() -> ParticipationServices {
        ParticipationServices {
            store: Arc::new(InMemoryParticipationStore::new()),
            clock: Arc::new(FixedClock::default()),
            retry: RetryPolicy::new(Duration::from_millis(100)),
        }
    }

    fn child_anonymized(child_id: Uuid) -> Message {
        IntegrationEvent::new(
            Context::Family,
            EventType::ChildDataAnonymized,
            "child",
            child_id,
            into_payload(json!({ "child_id": child_id.to_string() })),
            EventMetadata::critical(),
            &FixedClock::default(),
        )
        .into()
    }

    async fn seed_note(services: &ParticipationServices, child_id: Uuid) {
        services
            .store
            .add_note(BehavioralNote {
                id: Uuid::new_v4(),
                child_id,
                author_id: Uuid::new_v4(),
                note: "argued during game time".into(),
                recorded_at: FixedClock::default().0,
                redacted: false,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_redacts_records_named_by_the_event() {
        // Arrange
        let services = services();
        let child_id = Uuid::new_v4();
        seed_note(&services, child_id).await;
        let subscriber = ChildDataAnonymizedSubscriber::new(services.clone());

        // Act
        let result = subscriber.handle_message(&child_anonymized(child_id)).await;

        // Assert
        assert!(matches!(result, Ok(Handling::Applied)));
        assert_eq!(services.store.notes_for(child_id).await.unwrap()[0].note, REDACTED);
    }

    #[tokio::test]
    async fn test_redelivery_is_harmless() {
        let services = services();
        let child_id = Uuid::new_v4();
        seed_note(&services, child_id).await;
        let subscriber = ChildDataAnonymizedSubscriber::new(services.clone());
        let message = child_anonymized(child_id);

        subscriber.handle_message(&message).await.unwrap();
        let second = subscriber.handle_message(&message).await;

        assert!(matches!(second, Ok(Handling::Applied)));
        assert_eq!(services.store.notes_for(child_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_started_subscriber_redacts_on_publish() {
        // Arrange
        let pubsub = PubSub::new();
        let services = services();
        let child_id = Uuid::new_v4();
        seed_note(&services, child_id).await;
        start(&pubsub, &services).unwrap();

        // Act
        pubsub.publish(child_anonymized(child_id)).await.unwrap();
        pubsub.drained().await;

        // Assert
        assert_eq!(services.store.notes_for(child_id).await.unwrap()[0].note, REDACTED);
    }
}
