//! Per-field accessor handles
//!
//! `doc.field("name").changed()` reads like a generated `name_changed?`
//! method, but is a plain handle parameterised by the attribute name.

use serde_json::Value;

use crate::document::Document;
use crate::filter::ChangeFilter;
use crate::tracker::Change;

/// Read-only change queries for one attribute
#[derive(Debug, Clone, Copy)]
pub struct FieldChanges<'a> {
    doc: &'a Document,
    name: &'a str,
}

impl<'a> FieldChanges<'a> {
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn change(&self) -> Option<Change> {
        self.doc.attribute_change(self.name)
    }

    pub fn changed(&self) -> bool {
        self.doc.attribute_changed(self.name, &ChangeFilter::any())
    }

    pub fn changed_matching(&self, filter: &ChangeFilter) -> bool {
        self.doc.attribute_changed(self.name, filter)
    }

    pub fn will_save_change(&self, filter: &ChangeFilter) -> bool {
        self.doc.will_save_change_to(self.name, filter)
    }

    pub fn changed_from_default(&self) -> bool {
        self.doc.attribute_changed_from_default(self.name)
    }

    pub fn was(&self) -> Value {
        self.doc.attribute_was(self.name)
    }

    pub fn previously_was(&self) -> Option<Value> {
        self.doc.attribute_previously_was(self.name)
    }

    pub fn before_last_save(&self) -> Option<&'a Value> {
        self.doc.attribute_before_last_save(self.name)
    }

    pub fn saved_change(&self) -> Option<&'a Change> {
        self.doc.saved_change_to(self.name)
    }

    pub fn saved_change_matching(&self, filter: &ChangeFilter) -> bool {
        self.doc.saved_change_to_matches(self.name, filter)
    }

    pub fn previously_changed(&self) -> bool {
        self.doc.attribute_previously_changed(self.name)
    }

    pub fn previous_change(&self) -> Option<&'a Change> {
        self.doc.attribute_previous_change(self.name)
    }
}

/// Mutating change operations for one attribute
#[derive(Debug)]
pub struct FieldChangesMut<'a> {
    doc: &'a mut Document,
    name: &'a str,
}

impl FieldChangesMut<'_> {
    /// Flag the attribute before an in-place mutation
    pub fn will_change(&mut self) {
        self.doc.attribute_will_change(self.name);
    }

    /// Restore the original value; returns the value now stored
    pub fn reset(&mut self) -> Value {
        self.doc.reset_attribute(self.name)
    }

    pub fn reset_to_default(&mut self) {
        self.doc.reset_attribute_to_default(self.name);
    }
}

impl Document {
    pub fn field<'a>(&'a self, name: &'a str) -> FieldChanges<'a> {
        FieldChanges { doc: self, name }
    }

    pub fn field_mut<'a>(&'a mut self, name: &'a str) -> FieldChangesMut<'a> {
        FieldChangesMut { doc: self, name }
    }
}
