//! Application layer for the Accounts context.

pub mod command_handlers;
pub mod promotion;
