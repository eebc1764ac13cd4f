//! Family reactions to Accounts integration events.

use std::sync::Arc;

use afterschool_core::context::Context;
use afterschool_core::error::EventError;
use afterschool_core::event::{EventType, Message};
use afterschool_core::handler::{HandlerResult, Handling, Interest, Subscriber};
use afterschool_core::topic::integration_topic;
use afterschool_event_bus::PubSub;
use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use super::FamilyServices;
use super::command_handlers::{handle_anonymize_family, handle_create_parent_profile};
use crate::domain::commands::{AnonymizeFamily, CreateParentProfile};

/// Creates a parent profile for every registered user.
pub struct UserRegisteredSubscriber {
    services: FamilyServices,
}

impl UserRegisteredSubscriber {
    /// Creates the subscriber.
    #[must_use]
    pub fn new(services: FamilyServices) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Subscriber for UserRegisteredSubscriber {
    fn name(&self) -> &'static str {
        "family.user_registered"
    }

    fn subscribed_events(&self) -> Interest {
        Interest::only([EventType::UserRegistered])
    }

    async fn handle_message(&self, message: &Message) -> HandlerResult {
        let user_id = required_user_id(message)?;
        let display_name = message
            .payload()
            .get("display_name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();

        let command = CreateParentProfile {
            correlation_id: message.metadata().correlation_id.unwrap_or(message.event_id()),
            user_id,
            display_name,
        };
        handle_create_parent_profile(&command, &self.services).await?;
        Ok(Handling::Applied)
    }
}

/// Continues the GDPR cascade: anonymizes the parent profile and every
/// child of a deleted account.
pub struct UserAnonymizedSubscriber {
    services: FamilyServices,
}

impl UserAnonymizedSubscriber {
    /// Creates the subscriber.
    #[must_use]
    pub fn new(services: FamilyServices) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Subscriber for UserAnonymizedSubscriber {
    fn name(&self) -> &'static str {
        "family.user_anonymized"
    }

    fn subscribed_events(&self) -> Interest {
        Interest::only([EventType::UserAnonymized])
    }

    async fn handle_message(&self, message: &Message) -> HandlerResult {
        let user_id = required_user_id(message)?;
        let command = AnonymizeFamily {
            correlation_id: message.metadata().correlation_id.unwrap_or(message.event_id()),
            causation_id: Some(message.event_id()),
            user_id,
        };
        handle_anonymize_family(&command, &self.services).await?;
        Ok(Handling::Applied)
    }
}

fn required_user_id(message: &Message) -> Result<uuid::Uuid, EventError> {
    message.payload_uuid("user_id").ok_or_else(|| {
        EventError::Handler(format!("{} event carries no user_id", message.event_type()))
    })
}

/// Attaches the Family subscribers to their Accounts topics.
///
/// # Errors
///
/// Returns `EventError::TransportClosed` if the transport is closed.
pub fn start(pubsub: &PubSub, services: &FamilyServices) -> Result<(), EventError> {
    pubsub.subscribe(
        integration_topic(Context::Accounts, EventType::UserRegistered),
        Arc::new(UserRegisteredSubscriber::new(services.clone())),
    )?;
    pubsub.subscribe(
        integration_topic(Context::Accounts, EventType::UserAnonymized),
        Arc::new(UserAnonymizedSubscriber::new(services.clone())),
    )?;
    info!("family subscribers started");
    Ok(())
}
