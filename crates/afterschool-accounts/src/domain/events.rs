//! Domain events for the Accounts context.

use afterschool_core::clock::Clock;
use afterschool_core::event::{
    Criticality, DomainEvent, EventMetadata, EventType, Payload, payload_with_canonical,
};
use serde_json::Value;
use uuid::Uuid;

use super::users::User;

/// Aggregate type of every Accounts event.
pub const USER_AGGREGATE_TYPE: &str = "user";

/// Builds `user_registered`. Normal criticality.
#[must_use]
pub fn user_registered(user: &User, correlation_id: Uuid, clock: &dyn Clock) -> DomainEvent {
    let mut payload = Payload::new();
    payload.insert("display_name".into(), Value::String(user.display_name.clone()));
    payload.insert("email".into(), Value::String(user.email.clone()));
    DomainEvent::new(
        EventType::UserRegistered,
        USER_AGGREGATE_TYPE,
        user.id,
        payload_with_canonical("user_id", user.id.to_string(), payload),
        EventMetadata::normal().with_correlation_id(correlation_id),
        clock,
    )
}

/// Builds `user_anonymized`. Always critical; `user_id` in `payload` is
/// overwritten with `user_id`.
#[must_use]
pub fn user_anonymized(
    user_id: Uuid,
    payload: Payload,
    metadata: EventMetadata,
    clock: &dyn Clock,
) -> DomainEvent {
    let mut metadata = metadata;
    metadata.criticality = Criticality::Critical;
    DomainEvent::new(
        EventType::UserAnonymized,
        USER_AGGREGATE_TYPE,
        user_id,
        payload_with_canonical("user_id", user_id.to_string(), payload),
        metadata,
        clock,
    )
}
