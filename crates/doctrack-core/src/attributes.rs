use serde_json::Value;
use std::collections::BTreeMap;

/// Attribute map keyed by database field name
///
/// `BTreeMap` keeps iteration (and therefore change sets and setters)
/// deterministic.
pub type AttributeMap = BTreeMap<String, Value>;

/// Value observed for an attribute that is not present in the store
pub(crate) static NULL: Value = Value::Null;

/// Live attribute storage of a document
///
/// The change tracker only needs raw reads and writes plus a full view of the
/// map; type coercion happens before values reach the store.
pub trait AttributeStore {
    /// Raw value of an attribute, `None` when the key is absent
    fn read_raw(&self, name: &str) -> Option<&Value>;

    /// Overwrite an attribute
    fn write_raw(&mut self, name: &str, value: Value);

    /// Remove an attribute entirely
    fn remove_raw(&mut self, name: &str) -> Option<Value>;

    /// All live attributes
    fn all(&self) -> &AttributeMap;

    /// Copy a value so later in-place mutation of the live value cannot
    /// affect the copy
    fn deep_copy(&self, value: &Value) -> Value {
        value.clone()
    }

    /// Raw value, reading an absent key as `null`
    fn read_or_null(&self, name: &str) -> &Value {
        self.read_raw(name).unwrap_or(&NULL)
    }
}

/// Default attribute store: live values plus the before-type-cast snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    live: AttributeMap,
    before_type_cast: AttributeMap,
}

impl Attributes {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from attributes loaded from the backend
    pub fn from_loaded(live: AttributeMap) -> Self {
        Self {
            before_type_cast: live.clone(),
            live,
        }
    }

    /// Value as it was assigned, before any coercion
    pub fn read_before_type_cast(&self, name: &str) -> Option<&Value> {
        self.before_type_cast.get(name)
    }

    /// Record the value as it was assigned
    pub fn write_before_type_cast(&mut self, name: &str, value: Value) {
        self.before_type_cast.insert(name.to_string(), value);
    }

    /// Replace the before-type-cast snapshot with a copy of the live values
    pub fn reset_before_type_cast(&mut self) {
        self.before_type_cast = self.live.clone();
    }

    /// Mutable access to a live value, inserting `null` when absent
    pub(crate) fn entry_mut(&mut self, name: &str) -> &mut Value {
        self.live.entry(name.to_string()).or_insert(Value::Null)
    }
}

impl AttributeStore for Attributes {
    fn read_raw(&self, name: &str) -> Option<&Value> {
        self.live.get(name)
    }

    fn write_raw(&mut self, name: &str, value: Value) {
        self.live.insert(name.to_string(), value);
    }

    fn remove_raw(&mut self, name: &str) -> Option<Value> {
        self.live.remove(name)
    }

    fn all(&self) -> &AttributeMap {
        &self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_reads_as_null() {
        let attrs = Attributes::new();
        assert_eq!(attrs.read_raw("name"), None);
        assert_eq!(attrs.read_or_null("name"), &Value::Null);
    }

    #[test]
    fn test_deep_copy_is_independent() {
        let mut attrs = Attributes::new();
        attrs.write_raw("tags", json!(["a"]));

        let copy = attrs.deep_copy(attrs.read_or_null("tags"));
        if let Value::Array(items) = attrs.entry_mut("tags") {
            items.push(json!("b"));
        }

        assert_eq!(copy, json!(["a"]));
        assert_eq!(attrs.read_or_null("tags"), &json!(["a", "b"]));
    }

    #[test]
    fn test_reset_before_type_cast_copies_live() {
        let mut attrs = Attributes::from_loaded(AttributeMap::from([(
            "age".to_string(),
            json!(30),
        )]));
        attrs.write_before_type_cast("age", json!("31"));
        attrs.write_raw("age", json!(31));
        assert_eq!(attrs.read_before_type_cast("age"), Some(&json!("31")));

        attrs.reset_before_type_cast();
        assert_eq!(attrs.read_before_type_cast("age"), Some(&json!(31)));
    }
}
