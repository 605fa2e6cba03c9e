//! Persistence-independent domain logic for the visual-novel translation
//! tracker.
//!
//! Nothing in this crate talks to the database directly. Operations that
//! need storage are written against the port traits in [`statistics`],
//! [`screenshots`] and [`media`]; the `vnt-db` crate supplies the
//! PostgreSQL implementations.

pub mod catalog;
pub mod config;
pub mod delete_policy;
pub mod error;
pub mod media;
pub mod screenshots;
pub mod statistics;
pub mod types;
pub mod validation;
