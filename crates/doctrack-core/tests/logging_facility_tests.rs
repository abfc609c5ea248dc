#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::loaded_person;
use doctrack_core::logging_facility::test_capture::init_test_capture;
use doctrack_core_types::schema::{
    EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_ATTRIBUTE, FIELD_CHANGED_LEN, FIELD_DOCUMENT_ID,
    FIELD_DURATION_MS, FIELD_ERR_CODE, FIELD_ERR_KIND, FIELD_SETTERS_LEN, FIELD_STORAGE_KEY,
};
use serde_json::json;

#[test]
fn test_post_persist_emits_start_and_end() {
    let capture = init_test_capture();
    let mut doc = loaded_person();
    let id = doc.id().to_string();
    doc.write_attribute("name", json!("Y"));

    doc.post_persist();

    let events: Vec<_> = capture
        .events_for_op("post_persist")
        .into_iter()
        .filter(|e| e.field(FIELD_DOCUMENT_ID) == Some(id.as_str()))
        .collect();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event.as_deref(), Some(EVENT_START));
    assert_eq!(events[1].event.as_deref(), Some(EVENT_END));
    assert_eq!(events[1].field(FIELD_CHANGED_LEN), Some("1"));
    assert!(events[1].field(FIELD_DURATION_MS).is_some());
}

#[test]
fn test_build_setters_emits_setters_len() {
    let capture = init_test_capture();
    let mut doc = loaded_person();
    let id = doc.id().to_string();
    doc.write_attribute("name", json!("Y"));
    doc.write_attribute("title", json!("Madam"));

    doc.build_setters().unwrap();

    let end = capture
        .events_for_op("build_setters")
        .into_iter()
        .find(|e| {
            e.field(FIELD_DOCUMENT_ID) == Some(id.as_str()) && e.event.as_deref() == Some(EVENT_END)
        })
        .expect("build_setters end event");
    assert_eq!(end.field(FIELD_SETTERS_LEN), Some("2"));
}

#[test]
fn test_build_setters_failure_logs_error_code() {
    let capture = init_test_capture();
    let mut doc = loaded_person();
    let id = doc.id().to_string();
    doc.write_attribute("tags", json!("oops"));

    assert!(doc.build_setters().is_err());

    let errors: Vec<_> = capture
        .events_for_op("build_setters")
        .into_iter()
        .filter(|e| {
            e.event.as_deref() == Some(EVENT_END_ERROR)
                && e.field(FIELD_DOCUMENT_ID) == Some(id.as_str())
        })
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field(FIELD_ERR_CODE), Some("ERR_INCOMPATIBLE_VALUES"));
    assert_eq!(errors[0].field(FIELD_ERR_KIND), Some("IncompatibleValues"));

    assert_eq!(
        capture.count_events(|e| {
            e.op.as_deref() == Some("build_setters")
                && e.event.as_deref() == Some(EVENT_END)
                && e.field(FIELD_DOCUMENT_ID) == Some(id.as_str())
        }),
        0
    );
}

#[test]
fn test_tracker_events_carry_attribute_and_storage_key() {
    let capture = init_test_capture();
    let mut doc = loaded_person();
    doc.embed_many("entries", loaded_person());

    let entry = doc.child_mut(0).unwrap();
    entry.write_attribute("traced_flag_attribute", json!(1));
    entry.unset_attribute("traced_unset_attribute");

    assert!(capture.count_events(|e| e.field(FIELD_ATTRIBUTE) == Some("traced_flag_attribute")) >= 1);
    assert_eq!(
        capture.count_events(|e| {
            e.field(FIELD_STORAGE_KEY) == Some("entries.0.traced_unset_attribute")
                && e.field(FIELD_DOCUMENT_ID) == Some(entry.id().as_str())
        }),
        1
    );
}
