//! Command handlers for the Catalog context.

use afterschool_core::clock::Clock;
use afterschool_core::command::Command;
use afterschool_core::context::Context;
use afterschool_core::error::DomainError;
use afterschool_event_bus::Dispatcher;
use tracing::{info, instrument};

use crate::domain::commands::UpdateProgramPolicy;
use crate::domain::events;
use crate::domain::policies::{PolicyStore, ProgramPolicy};

/// Handles `UpdateProgramPolicy`: stores the policy, then announces it.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the refund share exceeds 100 percent or the
/// capacity is zero, or the store's error if the policy cannot be saved.
#[instrument(skip_all, fields(command = command.command_type(), context = %command.context(), program_id = %command.program_id))]
pub async fn handle_update_program_policy(
    command: &UpdateProgramPolicy,
    clock: &dyn Clock,
    policies: &dyn PolicyStore,
    dispatcher: &Dispatcher,
) -> Result<ProgramPolicy, DomainError> {
    if command.refund_percent > 100 {
        return Err(DomainError::Validation(format!(
            "refund percent must be at most 100, got {}",
            command.refund_percent
        )));
    }
    if command.capacity == 0 {
        return Err(DomainError::Validation("capacity must be positive".into()));
    }

    let policy = ProgramPolicy {
        program_id: command.program_id,
        refund_percent: command.refund_percent,
        cancellation_notice_hours: command.cancellation_notice_hours,
        capacity: command.capacity,
        updated_at: clock.now(),
    };
    policies.upsert(policy.clone()).await?;
    info!("program policy updated");

    let event =
        events::program_policy_updated(&policy, command.updated_by, command.correlation_id, clock)?;
    dispatcher.dispatch(&event, Context::Catalog).await;
    Ok(policy)
}
