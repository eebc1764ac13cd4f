//! Command handlers for the Family context.

use afterschool_core::command::Command;
use afterschool_core::context::Context;
use afterschool_core::error::{DomainError, EventError};
use afterschool_core::event::{Criticality, Payload};
use afterschool_core::retry::retry_with_backoff;
use serde_json::Value;
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::FamilyServices;
use crate::domain::commands::{AddChild, AnonymizeFamily, CreateParentProfile};
use crate::domain::events;
use crate::domain::records::{Child, ParentProfile};

/// Outcome of `CreateParentProfile`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileOutcome {
    /// A new profile was stored.
    Created,
    /// The profile already existed; treated as success because account
    /// events may be delivered more than once.
    AlreadyExisted,
}

/// Result of a completed family anonymization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyAnonymization {
    /// The parent's user identifier.
    pub user_id: Uuid,
    /// Whether a parent profile existed and was redacted.
    pub parent_redacted: bool,
    /// Children redacted and promoted, in processing order.
    pub children: Vec<Uuid>,
}

/// Handles `CreateParentProfile` with one retry on transient failure.
///
/// # Errors
///
/// Returns the store's error after the retry is exhausted, or immediately
/// for permanent errors other than a duplicate profile.
#[instrument(skip_all, fields(command = command.command_type(), context = %command.context(), user_id = %command.user_id))]
pub async fn handle_create_parent_profile(
    command: &CreateParentProfile,
    services: &FamilyServices,
) -> Result<ProfileOutcome, DomainError> {
    let store = services.store.as_ref();
    let profile = ParentProfile {
        user_id: command.user_id,
        display_name: command.display_name.clone(),
        anonymized: false,
    };

    let created = retry_with_backoff(
        move || store.create_parent_profile(profile.clone()),
        services.retry.context("create_parent_profile", command.user_id),
    )
    .await;

    match created {
        Ok(()) => {
            info!("parent profile created");
            Ok(ProfileOutcome::Created)
        }
        Err(err) if err.is_duplicate() => {
            info!("parent profile already exists");
            Ok(ProfileOutcome::AlreadyExisted)
        }
        Err(err) => Err(err),
    }
}

/// Handles `AddChild`.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a blank name, or
/// `DomainError::NotFound` if the parent has no profile.
#[instrument(skip_all, fields(command = command.command_type(), context = %command.context(), parent_id = %command.parent_id))]
pub async fn handle_add_child(
    command: &AddChild,
    services: &FamilyServices,
) -> Result<Uuid, DomainError> {
    let first_name = command.first_name.trim();
    if first_name.is_empty() {
        return Err(DomainError::Validation("child first name must not be blank".into()));
    }

    let child = Child {
        id: Uuid::new_v4(),
        parent_id: command.parent_id,
        first_name: first_name.to_owned(),
        medical_notes: command.medical_notes.clone(),
        anonymized: false,
    };
    let child_id = child.id;
    services.store.add_child(child).await?;
    info!(%child_id, "child added");
    Ok(child_id)
}

/// Handles `AnonymizeFamily`: redacts the parent profile, then each child in
/// turn, promoting `child_data_anonymized` after every child.
///
/// Stops at the first failure. Children processed before the failure stay
/// redacted and promoted; nothing is rolled back.
///
/// # Errors
///
/// Returns `EventError::Domain` if a redaction fails after its retry, or
/// `EventError::Dispatch` if a child's promotion fails.
#[instrument(skip_all, fields(command = command.command_type(), context = %command.context(), user_id = %command.user_id))]
pub async fn handle_anonymize_family(
    command: &AnonymizeFamily,
    services: &FamilyServices,
) -> Result<FamilyAnonymization, EventError> {
    let store = services.store.as_ref();
    let user_id = command.user_id;

    let parent_redacted = match retry_with_backoff(
        move || store.anonymize_parent(user_id),
        services.retry.context("anonymize_parent_profile", user_id),
    )
    .await
    {
        Ok(()) => true,
        Err(DomainError::NotFound(_)) => {
            info!("no parent profile for user; nothing to redact");
            false
        }
        Err(err) => return Err(err.into()),
    };

    let children = store.children_of(user_id).await?;
    let mut anonymized = Vec::with_capacity(children.len());

    for child in children {
        let child_id = child.id;
        retry_with_backoff(
            move || store.anonymize_child(child_id),
            services.retry.context("anonymize_child", child_id),
        )
        .await?;

        let metadata = command.event_metadata(Criticality::Critical);
        let mut payload = Payload::new();
        payload.insert("reason".into(), Value::String("parent_account_deleted".into()));
        let event = events::child_data_anonymized(
            child_id,
            user_id,
            payload,
            metadata,
            services.clock.as_ref(),
        );

        if let Err(err) = services.bus.dispatch(Context::Family, &event).await {
            error!(
                %child_id,
                completed = anonymized.len(),
                error = %err,
                "child anonymization promotion failed; halting"
            );
            return Err(err.into());
        }
        anonymized.push(child_id);
    }

    info!(children = anonymized.len(), "family anonymized");
    Ok(FamilyAnonymization {
        user_id,
        parent_redacted,
        children: anonymized,
    })
}
