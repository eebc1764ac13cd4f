//! Domain layer for the Family context.

pub mod commands;
pub mod events;
pub mod records;
