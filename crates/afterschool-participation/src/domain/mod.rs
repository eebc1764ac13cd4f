//! Domain layer for the Participation context.

pub mod commands;
pub mod records;
