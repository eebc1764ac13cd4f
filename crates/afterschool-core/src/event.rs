//! Domain and integration events.
//!
//! Both kinds are immutable once built: identifiers and timestamps are fixed
//! at construction and exposed only through accessors.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::clock::Clock;
use crate::context::Context;
use crate::topic;

/// Event-specific fields, keyed by field name.
pub type Payload = Map<String, Value>;

/// Key under which [`EventMetadata::with_actor`] stores the acting user.
pub const ACTOR_KEY: &str = "actor_id";

/// Closed set of event types exchanged on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A user account was created.
    UserRegistered,
    /// A user's personal data was redacted (GDPR).
    UserAnonymized,
    /// A child's personal data was redacted as part of a parent's deletion.
    ChildDataAnonymized,
    /// A message was posted to a conversation.
    MessageSent,
    /// A participant read every message in a conversation.
    ConversationRead,
    /// A program's enrollment or cancellation policy changed.
    ProgramPolicyUpdated,
}

impl EventType {
    /// Returns the symbolic tag used in topics and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserRegistered => "user_registered",
            Self::UserAnonymized => "user_anonymized",
            Self::ChildDataAnonymized => "child_data_anonymized",
            Self::MessageSent => "message_sent",
            Self::ConversationRead => "conversation_read",
            Self::ProgramPolicyUpdated => "program_policy_updated",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a delivery failure halts a workflow or is merely logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    /// Failure must be surfaced (e.g. GDPR cascades).
    Critical,
    /// Failure only degrades responsiveness.
    #[default]
    Normal,
}

/// Cross-cutting information attached to every event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Delivery criticality.
    pub criticality: Criticality,
    /// Identifier shared by every event of one workflow.
    pub correlation_id: Option<Uuid>,
    /// Identifier of the event or command that caused this event.
    pub causation_id: Option<Uuid>,
    /// Additional context, such as the acting user.
    pub extra: Payload,
}

impl EventMetadata {
    /// Metadata with normal criticality and no tracing identifiers.
    #[must_use]
    pub fn normal() -> Self {
        Self::default()
    }

    /// Metadata with critical criticality.
    #[must_use]
    pub fn critical() -> Self {
        Self {
            criticality: Criticality::Critical,
            ..Self::default()
        }
    }

    /// Sets the correlation identifier.
    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Sets the causation identifier.
    #[must_use]
    pub fn with_causation_id(mut self, causation_id: Uuid) -> Self {
        self.causation_id = Some(causation_id);
        self
    }

    /// Records the user who triggered the event.
    #[must_use]
    pub fn with_actor(mut self, actor_id: Uuid) -> Self {
        self.extra
            .insert(ACTOR_KEY.to_owned(), Value::String(actor_id.to_string()));
        self
    }

    /// Returns `true` when delivery failures must be surfaced.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.criticality == Criticality::Critical
    }

    /// Returns the acting user, if one was recorded.
    #[must_use]
    pub fn actor_id(&self) -> Option<Uuid> {
        self.extra
            .get(ACTOR_KEY)
            .and_then(Value::as_str)
            .and_then(|raw| Uuid::parse_str(raw).ok())
    }
}

/// Merges a canonical subject field into a caller-supplied payload.
///
/// The canonical value is inserted last, so a same-named key in `payload`
/// can never replace the subject of the event.
#[must_use]
pub fn payload_with_canonical(key: &str, canonical: impl Into<Value>, payload: Payload) -> Payload {
    let mut merged = payload;
    merged.insert(key.to_owned(), canonical.into());
    merged
}

/// Converts a JSON object into a [`Payload`]. Non-object values yield an
/// empty payload.
#[must_use]
pub fn into_payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        _ => Payload::new(),
    }
}

/// An event meaningful within one context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    event_id: Uuid,
    event_type: EventType,
    aggregate_type: String,
    aggregate_id: Uuid,
    payload: Payload,
    metadata: EventMetadata,
    occurred_at: DateTime<Utc>,
}

impl DomainEvent {
    /// Builds a new domain event with a fresh identifier and the clock's
    /// current time.
    #[must_use]
    pub fn new(
        event_type: EventType,
        aggregate_type: impl Into<String>,
        aggregate_id: Uuid,
        payload: Payload,
        metadata: EventMetadata,
        clock: &dyn Clock,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type,
            aggregate_type: aggregate_type.into(),
            aggregate_id,
            payload,
            metadata,
            occurred_at: clock.now(),
        }
    }

    /// Unique event identifier.
    #[must_use]
    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    /// Symbolic event type.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Kind of entity the event is about.
    #[must_use]
    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    /// Identifier of the entity the event is about.
    #[must_use]
    pub fn aggregate_id(&self) -> Uuid {
        self.aggregate_id
    }

    /// Event-specific fields.
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Event metadata.
    #[must_use]
    pub fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    /// Construction timestamp.
    #[must_use]
    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// Returns `true` when the event is critical.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.metadata.is_critical()
    }

    /// Topic derived from the aggregate type and event type.
    #[must_use]
    pub fn default_topic(&self) -> String {
        topic::domain_topic(&self.aggregate_type, self.event_type)
    }
}

/// The stable cross-context form of a domain event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationEvent {
    event_id: Uuid,
    event_type: EventType,
    source_context: Context,
    entity_type: String,
    entity_id: Uuid,
    payload: Payload,
    metadata: EventMetadata,
    occurred_at: DateTime<Utc>,
}

impl IntegrationEvent {
    /// Builds a new integration event with a fresh identifier and the
    /// clock's current time.
    #[must_use]
    pub fn new(
        source_context: Context,
        event_type: EventType,
        entity_type: impl Into<String>,
        entity_id: Uuid,
        payload: Payload,
        metadata: EventMetadata,
        clock: &dyn Clock,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type,
            source_context,
            entity_type: entity_type.into(),
            entity_id,
            payload,
            metadata,
            occurred_at: clock.now(),
        }
    }

    /// Translates a domain event into its integration form.
    ///
    /// The entity is the domain event's aggregate. The domain event becomes
    /// the causation, and its correlation identifier is inherited (or
    /// started from the domain event when absent).
    #[must_use]
    pub fn promote(
        source_context: Context,
        domain_event: &DomainEvent,
        payload: Payload,
        clock: &dyn Clock,
    ) -> Self {
        let mut metadata = domain_event.metadata().clone();
        metadata.causation_id = Some(domain_event.event_id());
        metadata.correlation_id = metadata.correlation_id.or(Some(domain_event.event_id()));
        Self::new(
            source_context,
            domain_event.event_type(),
            domain_event.aggregate_type(),
            domain_event.aggregate_id(),
            payload,
            metadata,
            clock,
        )
    }

    /// Unique event identifier.
    #[must_use]
    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    /// Symbolic event type.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Context that produced the event.
    #[must_use]
    pub fn source_context(&self) -> Context {
        self.source_context
    }

    /// Kind of entity the event is about.
    #[must_use]
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Identifier of the entity the event is about.
    #[must_use]
    pub fn entity_id(&self) -> Uuid {
        self.entity_id
    }

    /// Event-specific fields.
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Event metadata.
    #[must_use]
    pub fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    /// Construction timestamp.
    #[must_use]
    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// Returns `true` when the event is critical.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.metadata.is_critical()
    }

    /// Topic derived from the source context and event type.
    #[must_use]
    pub fn default_topic(&self) -> String {
        topic::integration_topic(self.source_context, self.event_type)
    }
}

/// Envelope carried by the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    /// A domain event published outside its context (e.g. UI fan-out).
    Domain(DomainEvent),
    /// A cross-context integration event.
    Integration(IntegrationEvent),
}

impl Message {
    /// Unique identifier of the wrapped event.
    #[must_use]
    pub fn event_id(&self) -> Uuid {
        match self {
            Self::Domain(event) => event.event_id(),
            Self::Integration(event) => event.event_id(),
        }
    }

    /// Event type of the wrapped event.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Domain(event) => event.event_type(),
            Self::Integration(event) => event.event_type(),
        }
    }

    /// Identifier of the subject entity.
    #[must_use]
    pub fn subject_id(&self) -> Uuid {
        match self {
            Self::Domain(event) => event.aggregate_id(),
            Self::Integration(event) => event.entity_id(),
        }
    }

    /// Payload of the wrapped event.
    #[must_use]
    pub fn payload(&self) -> &Payload {
        match self {
            Self::Domain(event) => event.payload(),
            Self::Integration(event) => event.payload(),
        }
    }

    /// Metadata of the wrapped event.
    #[must_use]
    pub fn metadata(&self) -> &EventMetadata {
        match self {
            Self::Domain(event) => event.metadata(),
            Self::Integration(event) => event.metadata(),
        }
    }

    /// Returns `true` when the wrapped event is critical.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.metadata().is_critical()
    }

    /// Topic derived from the wrapped event's fields.
    #[must_use]
    pub fn default_topic(&self) -> String {
        match self {
            Self::Domain(event) => event.default_topic(),
            Self::Integration(event) => event.default_topic(),
        }
    }

    /// Reads a UUID-valued payload field.
    #[must_use]
    pub fn payload_uuid(&self, key: &str) -> Option<Uuid> {
        payload_uuid(self.payload(), key)
    }
}

impl From<DomainEvent> for Message {
    fn from(event: DomainEvent) -> Self {
        Self::Domain(event)
    }
}

impl From<IntegrationEvent> for Message {
    fn from(event: IntegrationEvent) -> Self {
        Self::Integration(event)
    }
}

/// Reads a UUID-valued field from a payload.
#[must_use]
pub fn payload_uuid(payload: &Payload, key: &str) -> Option<Uuid> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .and_then(|raw| Uuid::parse_str(raw).ok())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    struct StoppedClock(DateTime<Utc>);

    impl Clock for StoppedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn clock() -> StoppedClock {
        StoppedClock(Utc.with_ymd_and_hms(2026, 3, 2, 15, 30, 0).unwrap())
    }

    #[test]
    fn test_canonical_value_wins_over_payload_key() {
        // Arrange
        let child_id = Uuid::new_v4();
        let spoofed = Uuid::new_v4();
        let payload = into_payload(json!({ "child_id": spoofed.to_string(), "reason": "gdpr" }));

        // Act
        let merged = payload_with_canonical("child_id", child_id.to_string(), payload);

        // Assert
        assert_eq!(payload_uuid(&merged, "child_id"), Some(child_id));
        assert_eq!(merged["reason"], "gdpr");
    }

    #[test]
    fn test_domain_event_fixes_identity_and_timestamp_at_construction() {
        let clock = clock();
        let aggregate_id = Uuid::new_v4();

        let event = DomainEvent::new(
            EventType::UserAnonymized,
            "user",
            aggregate_id,
            Payload::new(),
            EventMetadata::critical(),
            &clock,
        );

        assert_eq!(event.aggregate_id(), aggregate_id);
        assert_eq!(event.occurred_at(), clock.0);
        assert!(event.is_critical());
        assert_eq!(event.default_topic(), "user:user_anonymized");
    }

    #[test]
    fn test_metadata_defaults_to_normal_criticality() {
        let metadata = EventMetadata::default();

        assert_eq!(metadata.criticality, Criticality::Normal);
        assert!(metadata.correlation_id.is_none());
        assert!(metadata.causation_id.is_none());
    }

    #[test]
    fn test_actor_round_trips_through_extra() {
        let actor = Uuid::new_v4();

        let metadata = EventMetadata::normal().with_actor(actor);

        assert_eq!(metadata.actor_id(), Some(actor));
    }

    #[test]
    fn test_promote_links_causation_and_inherits_correlation() {
        // Arrange
        let clock = clock();
        let correlation_id = Uuid::new_v4();
        let domain_event = DomainEvent::new(
            EventType::UserAnonymized,
            "user",
            Uuid::new_v4(),
            Payload::new(),
            EventMetadata::critical().with_correlation_id(correlation_id),
            &clock,
        );

        // Act
        let promoted =
            IntegrationEvent::promote(Context::Accounts, &domain_event, Payload::new(), &clock);

        // Assert
        assert_eq!(promoted.source_context(), Context::Accounts);
        assert_eq!(promoted.entity_type(), "user");
        assert_eq!(promoted.entity_id(), domain_event.aggregate_id());
        assert_eq!(promoted.metadata().causation_id, Some(domain_event.event_id()));
        assert_eq!(promoted.metadata().correlation_id, Some(correlation_id));
        assert!(promoted.is_critical());
        assert_ne!(promoted.event_id(), domain_event.event_id());
        assert_eq!(promoted.default_topic(), "integration:accounts:user_anonymized");
    }

    #[test]
    fn test_promote_starts_correlation_when_absent() {
        let clock = clock();
        let domain_event = DomainEvent::new(
            EventType::UserRegistered,
            "user",
            Uuid::new_v4(),
            Payload::new(),
            EventMetadata::normal(),
            &clock,
        );

        let promoted =
            IntegrationEvent::promote(Context::Accounts, &domain_event, Payload::new(), &clock);

        assert_eq!(promoted.metadata().correlation_id, Some(domain_event.event_id()));
    }

    #[test]
    fn test_message_serializes_with_kind_tag() {
        let clock = clock();
        let event = DomainEvent::new(
            EventType::MessageSent,
            "message",
            Uuid::new_v4(),
            Payload::new(),
            EventMetadata::normal(),
            &clock,
        );

        let value = serde_json::to_value(Message::from(event)).unwrap();

        assert_eq!(value["kind"], "domain");
        assert_eq!(value["event_type"], "message_sent");
        assert_eq!(value["metadata"]["criticality"], "normal");
    }
}
