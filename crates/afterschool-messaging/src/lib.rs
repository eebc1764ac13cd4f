//! Afterschool — Messaging bounded context.
//!
//! Parent/provider conversations. The message store is the system of
//! record; real-time UI fan-out and unread counters are derived from
//! `message_sent` and `conversation_read` on a best-effort basis.

pub mod application;
pub mod domain;
