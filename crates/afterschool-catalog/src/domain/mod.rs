//! Domain layer for the Catalog context.

pub mod commands;
pub mod events;
pub mod policies;
