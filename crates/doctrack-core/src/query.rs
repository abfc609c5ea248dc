//! Diff query API
//!
//! Read-only predicates and accessors over a document's change state.
//! Every method resolves aliases to database field names first.

use serde_json::Value;
use std::collections::BTreeSet;

use crate::attributes::{AttributeMap, AttributeStore};
use crate::document::Document;
use crate::filter::ChangeFilter;
use crate::tracker::{Change, ChangeSet};

impl Document {
    /// Whether `name` changed in the current generation within `filter`
    pub fn attribute_changed(&self, name: &str, filter: &ChangeFilter) -> bool {
        let field_name = self.database_field_name(name);
        self.tracker
            .attribute_changed(&self.attributes, &field_name, filter)
    }

    /// Alias of [`Document::attribute_changed`], read before a save
    pub fn will_save_change_to(&self, name: &str, filter: &ChangeFilter) -> bool {
        self.attribute_changed(name, filter)
    }

    /// Names of attributes whose value differs from the captured original
    pub fn changed_attribute_names(&self) -> BTreeSet<String> {
        self.tracker.changed_attribute_names(&self.attributes)
    }

    /// Current-generation changes keyed by database field name
    pub fn changes(&self) -> ChangeSet {
        self.tracker.current_changes(&self.attributes)
    }

    /// `(original, live)` of a changed attribute
    pub fn attribute_change(&self, name: &str) -> Option<Change> {
        let field_name = self.database_field_name(name);
        self.tracker.attribute_change(&self.attributes, &field_name)
    }

    /// Own changes or a changed direct child
    ///
    /// Grandchildren are not consulted: a parent with a dirty grandchild and
    /// a clean child reads as unchanged.
    pub fn is_changed(&self) -> bool {
        self.has_own_changes() || self.children_changed()
    }

    /// Whether any direct embedded child has changes of its own
    pub fn children_changed(&self) -> bool {
        self.children.iter().any(Document::has_own_changes)
    }

    fn has_own_changes(&self) -> bool {
        self.tracker.has_changes(&self.attributes)
    }

    /// Captured original when changed, otherwise the live value
    pub fn attribute_was(&self, name: &str) -> Value {
        let field_name = self.database_field_name(name);
        if self
            .tracker
            .attribute_changed(&self.attributes, &field_name, &ChangeFilter::any())
        {
            if let Some(original) = self.tracker.changed_attributes().get(&field_name) {
                return original.clone();
            }
        }
        self.attributes.read_or_null(&field_name).clone()
    }

    /// Whether the live value differs from the declared default
    ///
    /// Undeclared attributes have no default and always return `false`.
    pub fn attribute_changed_from_default(&self, name: &str) -> bool {
        let field_name = self.database_field_name(name);
        match self.schema.field(&field_name) {
            Some(field) => {
                self.attributes.read_or_null(&field_name)
                    != &field.eval_default(self.attributes.all())
            }
            None => false,
        }
    }

    /// Value before the last save
    ///
    /// Taken from the last save's change when the attribute changed in it,
    /// otherwise from the snapshot taken at that save.
    pub fn attribute_previously_was(&self, name: &str) -> Option<Value> {
        let field_name = self.database_field_name(name);
        match self.tracker.previous_changes().get(&field_name) {
            Some(change) => Some(change.old.clone()),
            None => self.tracker.previous_attributes().get(&field_name).cloned(),
        }
    }

    /// Attribute value from the snapshot one save further back
    pub fn attribute_before_last_save(&self, name: &str) -> Option<&Value> {
        let field_name = self.database_field_name(name);
        self.tracker.attributes_before_last_save().get(&field_name)
    }

    /// Change recorded for `name` by the last save
    pub fn saved_change_to(&self, name: &str) -> Option<&Change> {
        let field_name = self.database_field_name(name);
        self.tracker.previous_changes().get(&field_name)
    }

    /// Whether the last save changed `name` within `filter`
    pub fn saved_change_to_matches(&self, name: &str, filter: &ChangeFilter) -> bool {
        match self.saved_change_to(name) {
            Some(change) => filter.matches(&change.old, &change.new),
            None => false,
        }
    }

    pub fn attribute_previously_changed(&self, name: &str) -> bool {
        self.saved_change_to(name).is_some()
    }

    pub fn attribute_previous_change(&self, name: &str) -> Option<&Change> {
        self.saved_change_to(name)
    }

    pub fn previous_changes(&self) -> &ChangeSet {
        self.tracker.previous_changes()
    }

    pub fn changes_before_last_save(&self) -> &ChangeSet {
        self.tracker.changes_before_last_save()
    }

    pub fn previous_attributes(&self) -> &AttributeMap {
        self.tracker.previous_attributes()
    }

    pub fn attributes_before_last_save(&self) -> &AttributeMap {
        self.tracker.attributes_before_last_save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{DefaultValue, FieldDefinition, Schema};
    use serde_json::json;
    use std::sync::Arc;

    fn person() -> Document {
        let schema = Schema::new()
            .with_field(FieldDefinition::new("n").aliased_as("name"))
            .with_field(FieldDefinition::new("title").with_default(DefaultValue::Static(json!("Sir"))));
        Document::instantiate(
            Arc::new(schema),
            AttributeMap::from([
                ("n".to_string(), json!("X")),
                ("title".to_string(), json!("Sir")),
            ]),
        )
    }

    #[test]
    fn test_alias_and_database_name_are_interchangeable() {
        let mut doc = person();
        doc.write_attribute("name", json!("Y"));

        assert!(doc.attribute_changed("name", &ChangeFilter::any()));
        assert!(doc.attribute_changed("n", &ChangeFilter::any()));
        assert_eq!(doc.changes().keys().collect::<Vec<_>>(), vec!["n"]);
        assert_eq!(doc.attribute_was("name"), json!("X"));
    }

    #[test]
    fn test_filtered_attribute_changed() {
        let mut doc = person();
        doc.write_attribute("name", json!("Y"));

        assert!(doc.attribute_changed("name", &ChangeFilter::between(json!("X"), json!("Y"))));
        assert!(doc.attribute_changed("name", &ChangeFilter::any().with_from(json!("X"))));
        assert!(doc.attribute_changed("name", &ChangeFilter::any().with_to(json!("Y"))));
        assert!(!doc.attribute_changed("name", &ChangeFilter::any().with_from(json!("Q"))));
        assert!(!doc.attribute_changed("name", &ChangeFilter::any().with_to(json!("Q"))));
        assert!(doc.will_save_change_to("name", &ChangeFilter::any().with_to(json!("Y"))));
    }

    #[test]
    fn test_attribute_was_unchanged_returns_live() {
        let doc = person();
        assert_eq!(doc.attribute_was("name"), json!("X"));
        assert_eq!(doc.attribute_was("missing"), Value::Null);
    }

    #[test]
    fn test_changed_from_default() {
        let mut doc = person();
        assert!(!doc.attribute_changed_from_default("title"));

        doc.write_attribute("title", json!("Madam"));
        assert!(doc.attribute_changed_from_default("title"));

        // no default declared means null is the default
        assert!(doc.attribute_changed_from_default("name"));
        // undeclared attribute is never "changed from default"
        doc.write_attribute("nickname", json!("x"));
        assert!(!doc.attribute_changed_from_default("nickname"));
    }

    #[test]
    fn test_grandchild_changes_do_not_reach_root() {
        let mut root = person();
        let mut child = person();
        child.embed_one("meta", person());
        root.embed_one("profile", child);

        let grandchild = &mut root.child_mut(0).unwrap().children[0];
        grandchild.write_attribute("name", json!("G"));

        assert!(root.children()[0].is_changed());
        assert!(!root.children_changed());
        assert!(!root.is_changed());
    }

    #[test]
    fn test_history_accessors_default_empty() {
        let doc = person();
        assert!(doc.previous_changes().is_empty());
        assert!(doc.changes_before_last_save().is_empty());
        assert!(doc.previous_attributes().is_empty());
        assert!(doc.attributes_before_last_save().is_empty());
        assert_eq!(doc.attribute_previously_was("name"), None);
        assert_eq!(doc.saved_change_to("name"), None);
        assert!(!doc.saved_change_to_matches("name", &ChangeFilter::any()));
        assert!(!doc.attribute_previously_changed("name"));
    }
}
