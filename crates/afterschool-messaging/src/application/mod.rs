//! Application layer for the Messaging context.

pub mod command_handlers;
pub mod projection;
pub mod realtime;
