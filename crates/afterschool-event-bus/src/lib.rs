//! Afterschool Event Bus — moving events within and across contexts.
//!
//! - [`bus::EventBus`] dispatches a domain event synchronously, in
//!   registration order, to the handlers of one context.
//! - [`dispatcher::Dispatcher`] wraps the bus for fire-and-forget call sites
//!   and logs failures by criticality.
//! - [`pubsub::PubSub`] delivers messages asynchronously to topic
//!   subscribers in other contexts.

pub mod bus;
pub mod dispatcher;
mod isolation;
pub mod pubsub;
pub mod registry;

pub use bus::EventBus;
pub use dispatcher::Dispatcher;
pub use pubsub::PubSub;
pub use registry::HandlerRegistry;
