//! Afterschool — composition root.
//!
//! Wires the bounded contexts together: one shared transport, one event bus
//! built from a static `(context, handler)` list, and the cross-context
//! subscribers that carry cascades from one context to the next.

pub mod config;
pub mod error;
pub mod platform;
pub mod telemetry;
