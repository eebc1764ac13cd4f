//! Command handlers for the Accounts context.
//!
//! Each handler performs the local write first and then dispatches the
//! resulting domain event through the fire-and-forget `Dispatcher`: once the
//! write succeeded, delivery problems are logged but never undo it.

use afterschool_core::clock::Clock;
use afterschool_core::command::Command;
use afterschool_core::context::Context;
use afterschool_core::error::DomainError;
use afterschool_core::event::{Criticality, DomainEvent, Payload};
use afterschool_event_bus::Dispatcher;
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::commands::{AnonymizeUser, RegisterUser};
use crate::domain::events;
use crate::domain::users::{User, UserStore};

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct AccountsCommandResult {
    /// The user affected or created by the command.
    pub user_id: Uuid,
    /// The domain events dispatched.
    pub events: Vec<DomainEvent>,
}

/// Handles `RegisterUser`: stores the account and announces it.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a blank name or malformed email, or
/// `DomainError::AlreadyExists` if the email is taken.
#[instrument(skip_all, fields(command = command.command_type(), context = %command.context(), correlation_id = %command.correlation_id()))]
pub async fn handle_register_user(
    command: &RegisterUser,
    clock: &dyn Clock,
    users: &dyn UserStore,
    dispatcher: &Dispatcher,
) -> Result<AccountsCommandResult, DomainError> {
    let display_name = command.display_name.trim();
    if display_name.is_empty() {
        return Err(DomainError::Validation("display name must not be blank".into()));
    }
    if !command.email.contains('@') {
        return Err(DomainError::Validation(format!(
            "invalid email address: {}",
            command.email
        )));
    }

    let user = User {
        id: Uuid::new_v4(),
        display_name: display_name.to_owned(),
        email: command.email.clone(),
        anonymized_at: None,
    };
    users.insert(user.clone()).await?;
    info!(user_id = %user.id, "user registered");

    let event = events::user_registered(&user, command.correlation_id, clock);
    dispatcher.dispatch(&event, Context::Accounts).await;

    Ok(AccountsCommandResult {
        user_id: user.id,
        events: vec![event],
    })
}

/// Handles `AnonymizeUser`: redacts the account and starts the GDPR cascade
/// with a critical `user_anonymized` event.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the user does not exist, or the
/// store's error if the redaction fails.
#[instrument(skip_all, fields(command = command.command_type(), context = %command.context(), user_id = %command.user_id))]
pub async fn handle_anonymize_user(
    command: &AnonymizeUser,
    clock: &dyn Clock,
    users: &dyn UserStore,
    dispatcher: &Dispatcher,
) -> Result<AccountsCommandResult, DomainError> {
    let user = users.anonymize(command.user_id, clock.now()).await?;
    info!("user personal data redacted");

    let mut metadata = command.event_metadata(Criticality::Critical);
    if let Some(actor) = command.requested_by {
        metadata = metadata.with_actor(actor);
    }
    let mut payload = Payload::new();
    if let Some(anonymized_at) = user.anonymized_at {
        payload.insert("anonymized_at".into(), Value::String(anonymized_at.to_rfc3339()));
    }

    let event = events::user_anonymized(user.id, payload, metadata, clock);
    dispatcher.dispatch(&event, Context::Accounts).await;

    Ok(AccountsCommandResult {
        user_id: user.id,
        events: vec![event],
    })
}
