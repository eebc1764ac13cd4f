//! Application layer for the Catalog context.

pub mod command_handlers;
pub mod search_index;
