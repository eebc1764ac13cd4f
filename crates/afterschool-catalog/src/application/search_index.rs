//! Search index hook for Catalog events.

use afterschool_core::event::{DomainEvent, EventType};
use afterschool_core::handler::{EventHandler, HandlerResult, Handling, Interest};
use async_trait::async_trait;
use tracing::debug;

/// Ready hook for a future program search index. Acknowledges policy
/// changes without side effects.
#[derive(Debug, Default)]
pub struct SearchIndexHook;

#[async_trait]
impl EventHandler for SearchIndexHook {
    fn name(&self) -> &'static str {
        "catalog.search_index"
    }

    fn subscribed_events(&self) -> Interest {
        Interest::only([EventType::ProgramPolicyUpdated])
    }

    async fn handle_event(&self, event: &DomainEvent) -> HandlerResult {
        debug!(
            program_id = %event.aggregate_id(),
            event_id = %event.event_id(),
            "search index hook acknowledged policy update"
        );
        Ok(Handling::Applied)
    }
}
