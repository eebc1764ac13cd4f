//! Domain layer for the Messaging context.

pub mod commands;
pub mod events;
pub mod messages;
