//! Afterschool — Catalog bounded context.
//!
//! Programs offered by providers and their booking policies.

pub mod application;
pub mod domain;
