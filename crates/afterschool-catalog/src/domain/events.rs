//! Domain events for the Catalog context.

use afterschool_core::clock::Clock;
use afterschool_core::error::DomainError;
use afterschool_core::event::{
    DomainEvent, EventMetadata, EventType, into_payload, payload_with_canonical,
};
use uuid::Uuid;

use super::policies::ProgramPolicy;

/// Aggregate type of Catalog events.
pub const PROGRAM_AGGREGATE_TYPE: &str = "program";

/// Builds `program_policy_updated`. Normal criticality; the payload is the
/// new policy.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the policy cannot be encoded.
pub fn program_policy_updated(
    policy: &ProgramPolicy,
    updated_by: Uuid,
    correlation_id: Uuid,
    clock: &dyn Clock,
) -> Result<DomainEvent, DomainError> {
    let payload = serde_json::to_value(policy)
        .map(into_payload)
        .map_err(|e| DomainError::Infrastructure(format!("policy serialization failed: {e}")))?;
    Ok(DomainEvent::new(
        EventType::ProgramPolicyUpdated,
        PROGRAM_AGGREGATE_TYPE,
        policy.program_id,
        payload_with_canonical("program_id", policy.program_id.to_string(), payload),
        EventMetadata::normal()
            .with_correlation_id(correlation_id)
            .with_actor(updated_by),
        clock,
    ))
}
