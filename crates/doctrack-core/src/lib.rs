//! doctrack Core - attribute change tracking and atomic diffs for documents
//!
//! This crate provides the dirty-tracking engine of a document mapper:
//! - Per-document change tracker with three generations of history
//! - Diff query API with optional `from`/`to` filters
//! - Atomic update builder with structural diffs for resizable fields
//! - Save lifecycle coordination (`move_changes` / `post_persist`)
//! - Embedded document trees with shallow (direct-child) change aggregation
//!
//! Persistence transport, validation and type coercion live outside this crate;
//! they interact with it through [`fields::FieldMetadataProvider`],
//! [`attributes::AttributeStore`] and the [`setters::Setters`] output.

pub mod accessors;
pub mod attributes;
pub mod config;
pub mod document;
pub mod errors;
pub mod fields;
pub mod filter;
pub mod lifecycle;
pub mod logging_facility;
pub mod query;
pub mod setters;
pub mod tracker;

#[doc(hidden)]
pub mod __private {
    pub use doctrack_core_types::schema;
    pub use tracing;
}

// Re-export commonly used types
pub use accessors::{FieldChanges, FieldChangesMut};
pub use attributes::{AttributeMap, AttributeStore, Attributes};
pub use document::Document;
pub use errors::{DocTrackError, ExError, ExErrorKind, Result};
pub use fields::{ArrayDiff, DefaultValue, FieldDefinition, FieldMetadataProvider, ResizableDiff, Schema};
pub use filter::ChangeFilter;
pub use lifecycle::DirtyState;
pub use setters::{Setter, Setters, UpdateDocument};
pub use tracker::{Change, ChangeTracker};
