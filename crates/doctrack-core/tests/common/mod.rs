use doctrack_core::{AttributeMap, DefaultValue, Document, FieldDefinition, Schema};
use serde_json::{json, Value};
use std::sync::Arc;

/// Schema used across the integration tests
///
/// `n` is aliased as `name`, `tags` is a resizable array and `title`
/// defaults to "Sir".
#[allow(dead_code)]
pub fn person_schema() -> Arc<Schema> {
    Arc::new(
        Schema::new()
            .with_field(FieldDefinition::new("n").aliased_as("name"))
            .with_field(FieldDefinition::array("tags"))
            .with_field(FieldDefinition::new("title").with_default(DefaultValue::Static(json!("Sir")))),
    )
}

/// A document loaded from the backend with the given attributes
#[allow(dead_code)]
pub fn loaded(pairs: &[(&str, Value)]) -> Document {
    let attributes: AttributeMap = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    Document::instantiate(person_schema(), attributes)
}

/// A loaded document with `name = "X"` and `tags = ["a"]`
#[allow(dead_code)]
pub fn loaded_person() -> Document {
    loaded(&[("n", json!("X")), ("tags", json!(["a"])), ("title", json!("Sir"))])
}

/// Append `value` to an array attribute in place
#[allow(dead_code)]
pub fn push_tag(doc: &mut Document, value: Value) {
    doc.modify_attribute("tags", |tags| {
        if let Value::Array(items) = tags {
            items.push(value);
        }
    });
}
