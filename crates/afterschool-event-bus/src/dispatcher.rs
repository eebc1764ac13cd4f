//! Fire-and-forget dispatch helper.

use afterschool_core::context::Context;
use afterschool_core::event::DomainEvent;
use tracing::{debug, error, warn};

use crate::bus::EventBus;

/// Dispatches events for call sites whose control flow must not depend on
/// delivery.
///
/// Never returns an error. Failures are logged at `error` level for
/// critical events and `warn` level otherwise; criticality changes only
/// what is logged, not what the caller sees.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    bus: EventBus,
}

impl Dispatcher {
    /// Wraps `bus`.
    #[must_use]
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    /// Underlying bus, for orchestrators that must observe failures.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Dispatches `event` to `context`'s handlers and swallows failures.
    pub async fn dispatch(&self, event: &DomainEvent, context: Context) {
        match self.bus.dispatch(context, event).await {
            Ok(()) => {
                debug!(
                    %context,
                    event_type = %event.event_type(),
                    event_id = %event.event_id(),
                    "event dispatched"
                );
            }
            Err(err) if event.is_critical() => {
                error!(
                    %context,
                    event_type = %event.event_type(),
                    event_id = %event.event_id(),
                    failures = err.failures.len(),
                    error = %err,
                    "critical event dispatch failed"
                );
            }
            Err(err) => {
                warn!(
                    %context,
                    event_type = %event.event_type(),
                    event_id = %event.event_id(),
                    failures = err.failures.len(),
                    error = %err,
                    "event dispatch failed"
                );
            }
        }
    }
}
