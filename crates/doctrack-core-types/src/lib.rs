//! Core types shared across doctrack facilities
//!
//! This crate provides foundational types used by the change tracker,
//! the error facility and the logging facility:
//!
//! - **Identifiers**: DocumentId
//! - **Schema constants**: Canonical log field keys and event names

pub mod ids;
pub mod schema;

pub use ids::DocumentId;
