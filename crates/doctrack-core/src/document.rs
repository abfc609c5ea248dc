//! Tracked document
//!
//! A [`Document`] ties together the live attributes, the change tracker and
//! the field metadata, and owns its embedded children. Attribute names passed
//! to any method may be in-memory aliases; they are resolved to database
//! field names before touching tracker state.
//!
//! The query, setter and lifecycle operations are implemented in
//! [`crate::query`], [`crate::setters`] and [`crate::lifecycle`].

use doctrack_core_types::DocumentId;
use serde_json::Value;
use std::cell::OnceCell;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::attributes::{AttributeMap, AttributeStore, Attributes};
use crate::fields::{DefaultValue, FieldMetadataProvider};
use crate::filter::ChangeFilter;
use crate::tracker::ChangeTracker;

/// Where an embedded document sits inside its parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Embedding {
    pub(crate) relation: String,
    /// `None` for embeds-one relations
    pub(crate) index: Option<usize>,
}

/// An in-memory document with change tracking
#[derive(Debug)]
pub struct Document {
    pub(crate) id: DocumentId,
    pub(crate) schema: Arc<dyn FieldMetadataProvider>,
    pub(crate) attributes: Attributes,
    pub(crate) tracker: ChangeTracker,
    pub(crate) children: Vec<Document>,
    pub(crate) embedding: Option<Embedding>,
    pub(crate) atomic_position: Option<String>,
    pub(crate) atomic_unsets: BTreeSet<String>,
    pub(crate) new_record: bool,
    pub(crate) persisted_descendants: OnceCell<Vec<String>>,
}

impl Document {
    /// Create a new record, applying field defaults
    ///
    /// Non-null defaults are written through the tracked path, so a fresh
    /// document reports `[null, default]` changes for them. Static defaults
    /// are applied before computed ones so the latter can read them.
    pub fn new(schema: Arc<dyn FieldMetadataProvider>) -> Self {
        let mut doc = Self::with_attributes(schema, Attributes::new(), true);
        doc.apply_defaults();
        doc
    }

    /// Wrap attributes loaded from the backend; the document starts clean
    pub fn instantiate(schema: Arc<dyn FieldMetadataProvider>, attributes: AttributeMap) -> Self {
        Self::with_attributes(schema, Attributes::from_loaded(attributes), false)
    }

    fn with_attributes(
        schema: Arc<dyn FieldMetadataProvider>,
        attributes: Attributes,
        new_record: bool,
    ) -> Self {
        Self {
            id: DocumentId::new(),
            schema,
            attributes,
            tracker: ChangeTracker::new(),
            children: Vec::new(),
            embedding: None,
            atomic_position: None,
            atomic_unsets: BTreeSet::new(),
            new_record,
            persisted_descendants: OnceCell::new(),
        }
    }

    /// Replace the generated id, e.g. with the backend `_id`
    pub fn with_id(mut self, id: DocumentId) -> Self {
        self.id = id;
        self
    }

    fn apply_defaults(&mut self) {
        let schema = Arc::clone(&self.schema);
        let (computed, fixed): (Vec<_>, Vec<_>) = schema
            .fields()
            .into_iter()
            .partition(|field| field.default_value().is_computed());

        for field in fixed.into_iter().chain(computed) {
            if self.attributes.read_raw(field.name()).is_some() {
                continue;
            }
            if matches!(field.default_value(), DefaultValue::None) {
                continue;
            }
            let default = field.eval_default(self.attributes.all());
            if !default.is_null() {
                self.write_attribute(field.name(), default);
            }
        }
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    pub fn schema(&self) -> &dyn FieldMetadataProvider {
        self.schema.as_ref()
    }

    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    pub fn attributes(&self) -> &AttributeMap {
        self.attributes.all()
    }

    pub fn is_new_record(&self) -> bool {
        self.new_record
    }

    pub fn is_embedded(&self) -> bool {
        self.embedding.is_some()
    }

    /// Path prefix of this document inside its root, e.g. `addresses.0`
    pub fn atomic_position(&self) -> Option<&str> {
        self.atomic_position.as_deref()
    }

    /// Storage keys scheduled for removal in the next update
    pub fn atomic_unsets(&self) -> &BTreeSet<String> {
        &self.atomic_unsets
    }

    pub(crate) fn database_field_name(&self, name: &str) -> String {
        self.schema.database_field_name(name)
    }

    /// Backend key for a database field name, prefixed when embedded
    pub fn storage_key(&self, name: &str) -> String {
        let field_name = self.database_field_name(name);
        match &self.atomic_position {
            Some(position) => format!("{}.{}", position, field_name),
            None => field_name,
        }
    }

    // ----- attribute access -----

    /// Live value, `None` when absent
    pub fn read_attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.read_raw(&self.database_field_name(name))
    }

    /// Value as assigned, before coercion
    pub fn read_attribute_before_type_cast(&self, name: &str) -> Option<&Value> {
        self.attributes
            .read_before_type_cast(&self.database_field_name(name))
    }

    /// Assign a value, flagging the attribute when the value differs
    ///
    /// Writing the current value is not a change. Writing an attribute that
    /// was scheduled for removal cancels the removal.
    pub fn write_attribute(&mut self, name: &str, value: Value) {
        let field_name = self.database_field_name(name);
        let key = self.storage_key(&field_name);
        self.attributes
            .write_before_type_cast(&field_name, value.clone());

        let unchanged = self.attributes.read_or_null(&field_name) == &value;
        if !(unchanged
            || self
                .tracker
                .attribute_changed(&self.attributes, &field_name, &ChangeFilter::any()))
        {
            self.tracker
                .flag_about_to_change(&self.attributes, &field_name);
        }
        self.atomic_unsets.remove(&key);
        self.attributes.write_raw(&field_name, value);
    }

    /// Mutate a value in place after flagging it
    ///
    /// Use this for resizable values (e.g. appending to an array): the
    /// original is deep-copied before `f` runs. Like a write, it cancels a
    /// pending unset of the attribute.
    pub fn modify_attribute<F>(&mut self, name: &str, f: F)
    where
        F: FnOnce(&mut Value),
    {
        let field_name = self.database_field_name(name);
        let key = self.storage_key(&field_name);
        self.tracker
            .flag_about_to_change(&self.attributes, &field_name);
        self.atomic_unsets.remove(&key);
        f(self.attributes.entry_mut(&field_name));
    }

    /// Remove an attribute and schedule an unset of its storage key
    pub fn unset_attribute(&mut self, name: &str) -> Option<Value> {
        let field_name = self.database_field_name(name);
        self.tracker
            .flag_about_to_change(&self.attributes, &field_name);
        let key = self.storage_key(&field_name);
        tracing::debug!(document_id = %self.id, storage_key = %key, "unset attribute");
        self.atomic_unsets.insert(key);
        self.attributes.remove_raw(&field_name)
    }

    // ----- tracker operations -----

    /// Flag an attribute as about to change (captures its original once)
    pub fn attribute_will_change(&mut self, name: &str) {
        let field_name = self.database_field_name(name);
        self.tracker
            .flag_about_to_change(&self.attributes, &field_name);
    }

    /// Restore a changed attribute to its original value
    pub fn reset_attribute(&mut self, name: &str) -> Value {
        let field_name = self.database_field_name(name);
        self.tracker.reset_attribute(&mut self.attributes, &field_name)
    }

    /// Assign the field's default (or `null` for undeclared attributes)
    pub fn reset_attribute_to_default(&mut self, name: &str) {
        let field_name = self.database_field_name(name);
        let default = self
            .schema
            .field(&field_name)
            .map(|field| field.eval_default(self.attributes.all()))
            .unwrap_or(Value::Null);
        self.write_attribute(&field_name, default);
    }

    /// Drop the pending flag of one attribute without touching its value
    ///
    /// Used by single-field atomic operations that persist immediately.
    pub fn remove_change(&mut self, name: &str) {
        let field_name = self.database_field_name(name);
        self.tracker.remove_change(&field_name);
    }

    /// Forget all pending flags (the live values are kept)
    pub fn clear_pending_changes(&mut self) {
        self.tracker.clear_pending();
    }

    // ----- embedded documents -----

    /// Direct embedded children
    pub fn children(&self) -> &[Document] {
        &self.children
    }

    /// Mutable access to a direct child
    ///
    /// Drops this document's persisted-descendants memo, since the child
    /// subtree may change through the returned reference.
    pub fn child_mut(&mut self, index: usize) -> Option<&mut Document> {
        self.persisted_descendants.take();
        self.children.get_mut(index)
    }

    /// Embed `child` in an embeds-many relation; returns its child index
    pub fn embed_many(&mut self, relation: &str, child: Document) -> usize {
        let position = self
            .children
            .iter()
            .filter(|c| c.embedding.as_ref().map(|e| e.relation.as_str()) == Some(relation))
            .count();
        self.embed(
            child,
            Embedding {
                relation: relation.to_string(),
                index: Some(position),
            },
        )
    }

    /// Embed `child` in an embeds-one relation; returns its child index
    pub fn embed_one(&mut self, relation: &str, child: Document) -> usize {
        self.embed(
            child,
            Embedding {
                relation: relation.to_string(),
                index: None,
            },
        )
    }

    fn embed(&mut self, mut child: Document, embedding: Embedding) -> usize {
        child.embedding = Some(embedding);
        child.reposition(self.atomic_position.as_deref());
        self.children.push(child);
        self.persisted_descendants.take();
        self.children.len() - 1
    }

    /// Recompute atomic positions of this subtree under `parent_position`
    fn reposition(&mut self, parent_position: Option<&str>) {
        self.atomic_position = self.embedding.as_ref().map(|embedding| {
            let local = match embedding.index {
                Some(index) => format!("{}.{}", embedding.relation, index),
                None => embedding.relation.clone(),
            };
            match parent_position {
                Some(parent) => format!("{}.{}", parent, local),
                None => local,
            }
        });
        let position = self.atomic_position.clone();
        for child in &mut self.children {
            child.reposition(position.as_deref());
        }
    }
}
