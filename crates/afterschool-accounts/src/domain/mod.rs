//! Domain layer for the Accounts context.

pub mod commands;
pub mod events;
pub mod users;
