//! Per-document change tracker
//!
//! Holds three generations of change state:
//!
//! - **pending**: originals captured since the last rotation (`changed_attributes`)
//! - **last save**: `previous_changes` / `previous_attributes`
//! - **before last save**: `changes_before_last_save` / `attributes_before_last_save`
//!
//! The tracker never owns live values. Every operation that needs them takes
//! the document's [`AttributeStore`], so the same state machine works over
//! any store implementation.
//!
//! A key in `changed_attributes` only means the attribute was flagged. Whether
//! it is actually changed is decided by comparing the captured original with
//! the live value, so a flag whose value was reverted reads as unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::attributes::{AttributeMap, AttributeStore};
use crate::filter::ChangeFilter;

/// Old and new value of one attribute
///
/// Serialises as a two-element array `[old, new]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(Value, Value)", into = "(Value, Value)")]
pub struct Change {
    pub old: Value,
    pub new: Value,
}

impl Change {
    pub fn new(old: Value, new: Value) -> Self {
        Self { old, new }
    }
}

impl From<(Value, Value)> for Change {
    fn from((old, new): (Value, Value)) -> Self {
        Self { old, new }
    }
}

impl From<Change> for (Value, Value) {
    fn from(change: Change) -> Self {
        (change.old, change.new)
    }
}

/// Change map keyed by database field name
pub type ChangeSet = BTreeMap<String, Change>;

/// Change state of a single document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeTracker {
    changed_attributes: AttributeMap,
    previous_changes: ChangeSet,
    changes_before_last_save: ChangeSet,
    previous_attributes: AttributeMap,
    attributes_before_last_save: AttributeMap,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Originals captured in the current generation
    pub fn changed_attributes(&self) -> &AttributeMap {
        &self.changed_attributes
    }

    pub fn previous_changes(&self) -> &ChangeSet {
        &self.previous_changes
    }

    pub fn changes_before_last_save(&self) -> &ChangeSet {
        &self.changes_before_last_save
    }

    pub fn previous_attributes(&self) -> &AttributeMap {
        &self.previous_attributes
    }

    pub fn attributes_before_last_save(&self) -> &AttributeMap {
        &self.attributes_before_last_save
    }

    /// Whether `attr` was flagged in the current generation
    pub fn is_flagged(&self, attr: &str) -> bool {
        self.changed_attributes.contains_key(attr)
    }

    /// Capture the original value of `attr` before it is mutated
    ///
    /// Only the first flag in a generation captures; later calls are no-ops.
    /// Returns `true` when a value was captured.
    pub fn flag_about_to_change<S>(&mut self, store: &S, attr: &str) -> bool
    where
        S: AttributeStore + ?Sized,
    {
        if self.changed_attributes.contains_key(attr) {
            return false;
        }
        let original = store.deep_copy(store.read_or_null(attr));
        tracing::trace!(attribute = attr, original = %original, "flagged attribute");
        self.changed_attributes.insert(attr.to_string(), original);
        true
    }

    /// Forget every pending flag
    pub fn clear_pending(&mut self) {
        self.changed_attributes.clear();
    }

    /// Forget the flag on `attr` without touching the live value
    pub fn remove_change(&mut self, attr: &str) -> Option<Value> {
        self.changed_attributes.remove(attr)
    }

    /// Restore the captured original of a changed attribute
    ///
    /// Returns the restored value, or the current live value when the
    /// attribute is not changed.
    pub fn reset_attribute<S>(&mut self, store: &mut S, attr: &str) -> Value
    where
        S: AttributeStore + ?Sized,
    {
        if !self.attribute_changed(&*store, attr, &ChangeFilter::any()) {
            return store.read_or_null(attr).clone();
        }
        match self.changed_attributes.remove(attr) {
            Some(original) => {
                tracing::debug!(attribute = attr, restored = %original, "reset attribute");
                store.write_raw(attr, original.clone());
                original
            }
            None => store.read_or_null(attr).clone(),
        }
    }

    /// Flagged, different from the live value, and inside `filter`
    pub fn attribute_changed<S>(&self, store: &S, attr: &str, filter: &ChangeFilter) -> bool
    where
        S: AttributeStore + ?Sized,
    {
        match self.changed_attributes.get(attr) {
            Some(original) => {
                let live = store.read_or_null(attr);
                original != live && filter.matches(original, live)
            }
            None => false,
        }
    }

    /// `(original, live)` for a changed attribute
    pub fn attribute_change<S>(&self, store: &S, attr: &str) -> Option<Change>
    where
        S: AttributeStore + ?Sized,
    {
        if !self.attribute_changed(store, attr, &ChangeFilter::any()) {
            return None;
        }
        let original = self.changed_attributes.get(attr)?;
        Some(Change::new(original.clone(), store.read_or_null(attr).clone()))
    }

    /// Flagged attributes whose value actually differs
    pub fn changed_attribute_names<S>(&self, store: &S) -> BTreeSet<String>
    where
        S: AttributeStore + ?Sized,
    {
        self.changed_attributes
            .keys()
            .filter(|attr| self.attribute_changed(store, attr, &ChangeFilter::any()))
            .cloned()
            .collect()
    }

    /// Current-generation change set
    pub fn current_changes<S>(&self, store: &S) -> ChangeSet
    where
        S: AttributeStore + ?Sized,
    {
        self.changed_attributes
            .keys()
            .filter_map(|attr| {
                self.attribute_change(store, attr)
                    .map(|change| (attr.clone(), change))
            })
            .collect()
    }

    /// Whether any flagged attribute differs from its original
    pub fn has_changes<S>(&self, store: &S) -> bool
    where
        S: AttributeStore + ?Sized,
    {
        self.changed_attributes
            .keys()
            .any(|attr| self.attribute_changed(store, attr, &ChangeFilter::any()))
    }

    /// Shift every generation back by one and start an empty pending set
    pub fn rotate_generations<S>(&mut self, store: &S)
    where
        S: AttributeStore + ?Sized,
    {
        let current = self.current_changes(store);
        tracing::debug!(changed_len = current.len(), "rotating change generations");

        self.changes_before_last_save = std::mem::replace(&mut self.previous_changes, current);
        self.attributes_before_last_save = std::mem::replace(
            &mut self.previous_attributes,
            store
                .all()
                .iter()
                .map(|(k, v)| (k.clone(), store.deep_copy(v)))
                .collect(),
        );
        self.changed_attributes.clear();
    }
}
