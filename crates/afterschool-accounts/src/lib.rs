//! Afterschool — Accounts bounded context.
//!
//! Owns user accounts and initiates GDPR deletion: a user's own data is
//! redacted here first, then announced to the other contexts as
//! `integration:accounts:user_anonymized`.

pub mod application;
pub mod domain;
