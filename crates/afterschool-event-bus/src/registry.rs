//! Static handler registry, built once at process start.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use afterschool_core::context::Context;
use afterschool_core::event::EventType;
use afterschool_core::handler::EventHandler;

/// Maps each context to its handlers in registration order.
///
/// The registry is immutable after construction; there is no runtime
/// registration.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<Context, Vec<Arc<dyn EventHandler>>>,
}

impl HandlerRegistry {
    /// Builds the registry from an explicit list of `(context, handler)`
    /// pairs. Order within a context is preserved.
    #[must_use]
    pub fn new<I>(registrations: I) -> Self
    where
        I: IntoIterator<Item = (Context, Arc<dyn EventHandler>)>,
    {
        let mut handlers: HashMap<Context, Vec<Arc<dyn EventHandler>>> = HashMap::new();
        for (context, handler) in registrations {
            handlers.entry(context).or_default().push(handler);
        }
        Self { handlers }
    }

    /// Handlers of `context` interested in `event_type`, in registration
    /// order.
    #[must_use]
    pub fn handlers_for(&self, context: Context, event_type: EventType) -> Vec<Arc<dyn EventHandler>> {
        self.handlers
            .get(&context)
            .map(|handlers| {
                handlers
                    .iter()
                    .filter(|handler| handler.subscribed_events().includes(event_type))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Total number of registrations across all contexts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for context in Context::ALL {
            if let Some(handlers) = self.handlers.get(&context) {
                let names: Vec<&str> = handlers.iter().map(|handler| handler.name()).collect();
                map.entry(&context.as_str(), &names);
            }
        }
        map.finish()
    }
}
