//! Afterschool — Family bounded context.
//!
//! Owns parent profiles and the children enrolled under them. Reacts to
//! account lifecycle events from Accounts and continues the GDPR cascade by
//! promoting `child_data_anonymized` for every child of a deleted parent.

pub mod application;
pub mod domain;
