//! Commands accepted by a bounded context.

use uuid::Uuid;

use crate::context::Context;
use crate::event::{Criticality, EventMetadata};

/// Trait that every context command implements.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The type name for this command (for logging).
    fn command_type(&self) -> &'static str;

    /// The context that owns and executes this command.
    fn context(&self) -> Context;

    /// Correlation ID carried into every event the command produces.
    fn correlation_id(&self) -> Uuid;

    /// The event that triggered this command, when it arrived through a
    /// subscriber rather than a user request.
    fn causation_id(&self) -> Option<Uuid> {
        None
    }

    /// Metadata for an event produced by this command, seeded with the
    /// command's correlation and causation identifiers.
    fn event_metadata(&self, criticality: Criticality) -> EventMetadata {
        let mut metadata = EventMetadata {
            criticality,
            ..EventMetadata::default()
        }
        .with_correlation_id(self.correlation_id());
        if let Some(causation_id) = self.causation_id() {
            metadata = metadata.with_causation_id(causation_id);
        }
        metadata
    }
}
