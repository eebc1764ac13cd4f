//! Afterschool Core — event model and cross-context contracts.
//!
//! This crate defines the types every bounded context shares: domain and
//! integration events, the handler and publisher contracts, topic naming,
//! and the bounded retry helper. It contains no transport code.

pub mod clock;
pub mod command;
pub mod context;
pub mod error;
pub mod event;
pub mod handler;
pub mod publisher;
pub mod retry;
pub mod topic;
