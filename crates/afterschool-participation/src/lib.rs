//! Afterschool — Participation bounded context.
//!
//! Keeps behavioral notes and attendance records per child. The last link
//! of the GDPR cascade: redacts a child's records when Family reports the
//! child as anonymized.

pub mod application;
pub mod domain;
