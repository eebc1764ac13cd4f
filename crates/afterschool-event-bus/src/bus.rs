//! Intra-context event bus.

use std::sync::Arc;

use afterschool_core::context::Context;
use afterschool_core::error::{DispatchError, HandlerFailure};
use afterschool_core::event::DomainEvent;
use afterschool_core::handler::Handling;
use tracing::{debug, instrument};

use crate::isolation::isolated;
use crate::registry::HandlerRegistry;

/// Dispatches domain events to the handlers registered for a context.
///
/// Handlers run one after another on the caller's task, in registration
/// order. Every interested handler is invoked even when an earlier one
/// fails; the bus neither retries nor suppresses failures, it reports all
/// of them to the caller.
#[derive(Debug, Clone)]
pub struct EventBus {
    registry: Arc<HandlerRegistry>,
}

impl EventBus {
    /// Creates a bus over a fully built registry.
    #[must_use]
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Registry backing this bus.
    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Invokes every handler of `context` interested in `event`.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError` listing each failed handler in registration
    /// order, if at least one failed.
    #[instrument(
        skip(self, event),
        fields(event_type = %event.event_type(), event_id = %event.event_id())
    )]
    pub async fn dispatch(&self, context: Context, event: &DomainEvent) -> Result<(), DispatchError> {
        let handlers = self.registry.handlers_for(context, event.event_type());
        let mut failures = Vec::new();

        for handler in handlers {
            match isolated(handler.handle_event(event)).await {
                Ok(Handling::Applied) => {
                    debug!(handler = handler.name(), "handler applied event");
                }
                Ok(Handling::Ignored) => {
                    debug!(handler = handler.name(), "handler ignored event");
                }
                Err(err) => failures.push(HandlerFailure {
                    handler: handler.name(),
                    reason: err.to_string(),
                }),
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DispatchError {
                context,
                event_type: event.event_type(),
                event_id: event.event_id(),
                failures,
            })
        }
    }
}
