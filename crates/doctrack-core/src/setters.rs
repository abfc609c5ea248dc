//! Atomic update builder
//!
//! [`Document::build_setters`] turns the current change set into per-key
//! update instructions for the persistence layer. Scalar fields become a
//! whole-value [`Setter::Set`]; resizable fields delegate to their
//! [`ResizableDiff`](crate::fields::ResizableDiff) translator, which may emit
//! [`Setter::Push`] / [`Setter::Pull`] instead.
//!
//! [`UpdateDocument`] renders setters plus pending unsets in the
//! `$set` / `$push` / `$pullAll` / `$unset` shape.

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::{btree_map, BTreeMap, BTreeSet};
use std::time::Instant;

use crate::document::Document;
use crate::errors::Result;
use crate::{log_op_end, log_op_error, log_op_start};

/// One update instruction for a storage key
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum Setter {
    /// Replace the whole value
    Set(Value),
    /// Append elements to an array
    Push(Vec<Value>),
    /// Remove every occurrence of the elements from an array
    Pull(Vec<Value>),
}

/// Update instructions keyed by storage key
///
/// Each key carries at most one instruction; writing a key again replaces
/// the earlier instruction.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Setters {
    entries: BTreeMap<String, Setter>,
}

impl Setters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.insert(key, Setter::Set(value));
    }

    pub fn push(&mut self, key: &str, values: Vec<Value>) {
        self.insert(key, Setter::Push(values));
    }

    pub fn pull(&mut self, key: &str, values: Vec<Value>) {
        self.insert(key, Setter::Pull(values));
    }

    fn insert(&mut self, key: &str, setter: Setter) {
        if let Some(previous) = self.entries.insert(key.to_string(), setter) {
            tracing::trace!(storage_key = key, replaced = ?previous, "setter replaced");
        }
    }

    pub fn get(&self, key: &str) -> Option<&Setter> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Setter> {
        self.entries.iter()
    }

    pub fn into_inner(self) -> BTreeMap<String, Setter> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a Setters {
    type Item = (&'a String, &'a Setter);
    type IntoIter = btree_map::Iter<'a, String, Setter>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Backend partial-update document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateDocument {
    #[serde(rename = "$set", skip_serializing_if = "Map::is_empty")]
    pub set: Map<String, Value>,
    #[serde(rename = "$push", skip_serializing_if = "Map::is_empty")]
    pub push: Map<String, Value>,
    #[serde(rename = "$pullAll", skip_serializing_if = "Map::is_empty")]
    pub pull_all: Map<String, Value>,
    #[serde(rename = "$unset", skip_serializing_if = "Map::is_empty")]
    pub unset: Map<String, Value>,
}

impl UpdateDocument {
    /// Group setters and unset keys by operator
    pub fn from_setters(setters: &Setters, unsets: &BTreeSet<String>) -> Self {
        let mut update = Self::default();
        for (key, setter) in setters {
            match setter {
                Setter::Set(value) => {
                    update.set.insert(key.clone(), value.clone());
                }
                Setter::Push(values) => {
                    update.push.insert(key.clone(), json!({ "$each": values }));
                }
                Setter::Pull(values) => {
                    update
                        .pull_all
                        .insert(key.clone(), Value::Array(values.clone()));
                }
            }
        }
        for key in unsets {
            update.unset.insert(key.clone(), Value::Bool(true));
        }
        update
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
            && self.push.is_empty()
            && self.pull_all.is_empty()
            && self.unset.is_empty()
    }

    /// Render as a JSON object
    ///
    /// # Errors
    ///
    /// `Serialization` if a value cannot be represented as JSON.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl Document {
    /// Build update instructions for the current changes
    ///
    /// Emits nothing for unchanged attributes, and nothing for a key that is
    /// scheduled for unset in the same update (scalar or resizable).
    ///
    /// # Errors
    ///
    /// Propagates translator failures for resizable fields unmodified; no
    /// partial setters are returned in that case.
    pub fn build_setters(&self) -> Result<Setters> {
        log_op_start!("build_setters", document_id = %self.id);
        let start = Instant::now();

        let setters = self.build_setters_impl().map_err(|e| {
            log_op_error!("build_setters", e.clone(), since = start, document_id = %self.id);
            e
        })?;

        log_op_end!(
            "build_setters",
            since = start,
            document_id = %self.id,
            setters_len = setters.len()
        );
        Ok(setters)
    }

    fn build_setters_impl(&self) -> Result<Setters> {
        let mut setters = Setters::new();
        for (name, change) in self.changes() {
            let key = self.storage_key(&name);
            if self.atomic_unsets.contains(&key) {
                tracing::trace!(storage_key = %key, "setter suppressed by pending unset");
                continue;
            }
            let translator = self
                .schema
                .field(&name)
                .and_then(|field| field.resizable_diff());
            match translator {
                Some(diff) => {
                    diff.add_atomic_changes(&name, &key, &change.old, &change.new, &mut setters)?;
                }
                None => setters.set(&key, change.new),
            }
        }
        Ok(setters)
    }

    /// Setters plus pending unsets rendered as a backend update document
    ///
    /// # Errors
    ///
    /// Same as [`Document::build_setters`].
    pub fn update_document(&self) -> Result<UpdateDocument> {
        let setters = self.build_setters()?;
        Ok(UpdateDocument::from_setters(&setters, &self.atomic_unsets))
    }
}
