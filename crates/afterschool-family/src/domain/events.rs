//! Domain events for the Family context.

use afterschool_core::clock::Clock;
use afterschool_core::event::{
    Criticality, DomainEvent, EventMetadata, EventType, Payload, payload_with_canonical,
};
use serde_json::Value;
use uuid::Uuid;

/// Aggregate type of child events.
pub const CHILD_AGGREGATE_TYPE: &str = "child";

/// Builds `child_data_anonymized`. Always critical.
///
/// `child_id` and `parent_id` in `payload` are overwritten with the
/// canonical values.
#[must_use]
pub fn child_data_anonymized(
    child_id: Uuid,
    parent_id: Uuid,
    payload: Payload,
    metadata: EventMetadata,
    clock: &dyn Clock,
) -> DomainEvent {
    let mut metadata = metadata;
    metadata.criticality = Criticality::Critical;
    let mut payload = payload_with_canonical("child_id", child_id.to_string(), payload);
    payload.insert("parent_id".into(), Value::String(parent_id.to_string()));
    DomainEvent::new(
        EventType::ChildDataAnonymized,
        CHILD_AGGREGATE_TYPE,
        child_id,
        payload,
        metadata,
        clock,
    )
}
