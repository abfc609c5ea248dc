//! Field metadata
//!
//! A [`Schema`] declares, per database field name: an optional in-memory
//! alias, the default value, and whether the field is resizable. Resizable
//! fields carry a [`ResizableDiff`] translator that turns an old/new pair into
//! structural update operations instead of a whole-value replacement.
//!
//! Attributes without a declaration are dynamic: they are tracked like any
//! other attribute and always persisted with a plain set.

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::attributes::AttributeMap;
use crate::errors::{DocTrackError, Result};
use crate::setters::Setters;

/// Translates a change of a resizable field into atomic operations
pub trait ResizableDiff: fmt::Debug + Send + Sync {
    /// Append the operations that move the stored value from `old` to `new`
    ///
    /// `attribute` is the database field name, `key` the storage key the
    /// operations must be written under.
    ///
    /// # Errors
    ///
    /// Implementations return an error when the values cannot be diffed
    /// structurally; the caller must not fall back to a partial update.
    fn add_atomic_changes(
        &self,
        attribute: &str,
        key: &str,
        old: &Value,
        new: &Value,
        setters: &mut Setters,
    ) -> Result<()>;
}

/// Structural diff for array fields
///
/// - growth that keeps the old elements as a prefix pushes the tail
/// - shrinkage that only drops elements pulls the dropped values
/// - anything else replaces the whole array
///
/// `null` is treated as an empty array.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayDiff;

impl ArrayDiff {
    fn elements<'a>(attribute: &str, side: &str, value: &'a Value) -> Result<&'a [Value]> {
        match value {
            Value::Null => Ok(&[]),
            Value::Array(items) => Ok(items.as_slice()),
            other => Err(DocTrackError::IncompatibleResizableValues {
                attribute: attribute.to_string(),
                reason: format!("{} value is not an array: {}", side, other),
            }),
        }
    }
}

impl ResizableDiff for ArrayDiff {
    fn add_atomic_changes(
        &self,
        attribute: &str,
        key: &str,
        old: &Value,
        new: &Value,
        setters: &mut Setters,
    ) -> Result<()> {
        let old_items = Self::elements(attribute, "old", old)?;
        let new_items = Self::elements(attribute, "new", new)?;

        if new_items.len() > old_items.len() {
            if new_items[..old_items.len()] == *old_items {
                setters.push(key, new_items[old_items.len()..].to_vec());
            } else {
                setters.set(key, new.clone());
            }
        } else if new_items.len() < old_items.len() {
            let pulls: Vec<Value> = old_items
                .iter()
                .filter(|item| !new_items.contains(item))
                .cloned()
                .collect();
            let remaining: Vec<&Value> = old_items
                .iter()
                .filter(|item| !pulls.contains(item))
                .collect();
            if remaining.iter().copied().eq(new_items.iter()) {
                setters.pull(key, pulls);
            } else {
                setters.set(key, new.clone());
            }
        } else if new_items != old_items {
            setters.set(key, new.clone());
        }
        Ok(())
    }
}

/// Default value of a field
#[derive(Clone, Default)]
pub enum DefaultValue {
    /// No default; the attribute starts absent
    #[default]
    None,
    /// A fixed value
    Static(Value),
    /// Computed from the attributes assigned so far
    Computed(Arc<dyn Fn(&AttributeMap) -> Value + Send + Sync>),
}

impl DefaultValue {
    /// Build a computed default from a closure
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&AttributeMap) -> Value + Send + Sync + 'static,
    {
        DefaultValue::Computed(Arc::new(f))
    }

    /// Evaluate the default against the current attributes
    pub fn eval(&self, attributes: &AttributeMap) -> Value {
        match self {
            DefaultValue::None => Value::Null,
            DefaultValue::Static(value) => value.clone(),
            DefaultValue::Computed(f) => f(attributes),
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, DefaultValue::Computed(_))
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::None => write!(f, "None"),
            DefaultValue::Static(value) => f.debug_tuple("Static").field(value).finish(),
            DefaultValue::Computed(_) => write!(f, "Computed(<fn>)"),
        }
    }
}

/// Declaration of a single field
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    name: String,
    alias: Option<String>,
    default: DefaultValue,
    resizable: Option<Arc<dyn ResizableDiff>>,
}

impl FieldDefinition {
    /// Declare a scalar field stored under `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            default: DefaultValue::None,
            resizable: None,
        }
    }

    /// Declare an array field diffed with [`ArrayDiff`]
    pub fn array(name: impl Into<String>) -> Self {
        Self::new(name).with_resizable_diff(Arc::new(ArrayDiff))
    }

    /// Expose the field in memory under a different name
    pub fn aliased_as(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = default;
        self
    }

    /// Make the field resizable using a custom translator
    pub fn with_resizable_diff(mut self, diff: Arc<dyn ResizableDiff>) -> Self {
        self.resizable = Some(diff);
        self
    }

    /// Database field name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn default_value(&self) -> &DefaultValue {
        &self.default
    }

    pub fn is_resizable(&self) -> bool {
        self.resizable.is_some()
    }

    pub fn resizable_diff(&self) -> Option<&dyn ResizableDiff> {
        self.resizable.as_deref()
    }

    /// Evaluate this field's default against a snapshot of the attributes
    pub fn eval_default(&self, attributes: &AttributeMap) -> Value {
        self.default.eval(attributes)
    }
}

/// Source of per-attribute metadata for a document
pub trait FieldMetadataProvider: fmt::Debug + Send + Sync {
    /// Declaration for a database field name, `None` for dynamic attributes
    fn field(&self, name: &str) -> Option<&FieldDefinition>;

    /// Resolve an in-memory alias to its database field name
    ///
    /// Names that are not aliases are returned unchanged.
    fn database_field_name(&self, name: &str) -> String;

    /// All declared fields in declaration-independent (name) order
    fn fields(&self) -> Vec<&FieldDefinition>;
}

/// Immutable set of field declarations, shared between documents
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: BTreeMap<String, FieldDefinition>,
    aliases: HashMap<String, String>,
}

impl Schema {
    /// Create an empty schema (every attribute is dynamic)
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field declaration, replacing any previous one with the same name
    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        if let Some(alias) = field.alias() {
            self.aliases.insert(alias.to_string(), field.name().to_string());
        }
        self.fields.insert(field.name().to_string(), field);
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FieldMetadataProvider for Schema {
    fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }

    fn database_field_name(&self, name: &str) -> String {
        self.aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    fn fields(&self) -> Vec<&FieldDefinition> {
        self.fields.values().collect()
    }
}
