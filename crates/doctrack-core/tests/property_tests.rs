#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Property tests for tracker state transitions

mod common;

use common::loaded;
use doctrack_core::{Change, ChangeFilter};
use proptest::prelude::*;
use serde_json::{json, Value};

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-5i64..5).prop_map(|n| json!(n)),
        "[a-c]{1,2}".prop_map(Value::String),
        proptest::collection::vec((0i64..3).prop_map(|n| json!(n)), 0..3).prop_map(Value::Array),
    ]
}

fn optional_value() -> impl Strategy<Value = Option<Value>> {
    proptest::option::of(value_strategy())
}

proptest! {
    #[test]
    fn flagging_twice_keeps_first_original(
        original in value_strategy(),
        first in value_strategy(),
        second in value_strategy(),
    ) {
        let mut doc = loaded(&[("v", original.clone())]);
        doc.attribute_will_change("v");
        doc.write_attribute("v", first);
        doc.attribute_will_change("v");
        doc.write_attribute("v", second.clone());

        prop_assert_eq!(&doc.tracker().changed_attributes()["v"], &original);
        prop_assert_eq!(doc.attribute_changed("v", &ChangeFilter::any()), original != second);
    }

    #[test]
    fn writing_back_the_original_reverts(
        original in value_strategy(),
        other in value_strategy(),
    ) {
        let mut doc = loaded(&[("v", original.clone())]);
        doc.write_attribute("v", other);
        doc.write_attribute("v", original);

        prop_assert!(!doc.is_changed());
        prop_assert!(doc.changes().is_empty());
    }

    #[test]
    fn flag_then_reset_is_a_net_no_op(original in value_strategy()) {
        let mut doc = loaded(&[("n", original.clone())]);
        let live_before = doc.read_attribute("name").cloned();
        let changes_before = doc.changes();
        let names_before = doc.changed_attribute_names();

        doc.attribute_will_change("name");
        let returned = doc.reset_attribute("name");

        prop_assert_eq!(returned, original.clone());
        prop_assert_eq!(doc.read_attribute("name").cloned(), live_before);
        prop_assert_eq!(doc.changes(), changes_before);
        prop_assert_eq!(doc.changed_attribute_names(), names_before);
        prop_assert!(!doc.is_changed());
        // the unchanged flag stays behind as a placeholder; it never reads as a change
        prop_assert!(doc.tracker().is_flagged("n"));
        prop_assert_eq!(doc.tracker().changed_attributes().get("n"), Some(&original));
    }

    #[test]
    fn rotation_moves_changes_intact(
        original in value_strategy(),
        updated in value_strategy(),
    ) {
        let mut doc = loaded(&[("v", original.clone())]);
        doc.write_attribute("v", updated.clone());
        let before = doc.changes();

        doc.post_persist();

        prop_assert_eq!(doc.previous_changes(), &before);
        prop_assert!(doc.changes().is_empty());
        prop_assert_eq!(doc.previous_attributes().get("v"), Some(&updated));
        if original != updated {
            prop_assert_eq!(doc.saved_change_to("v"), Some(&Change::new(original, updated)));
        }
    }

    #[test]
    fn filter_checks_each_side_independently(
        old in value_strategy(),
        new in value_strategy(),
        from in optional_value(),
        to in optional_value(),
    ) {
        let mut filter = ChangeFilter::any();
        if let Some(from) = from.clone() {
            filter = filter.with_from(from);
        }
        if let Some(to) = to.clone() {
            filter = filter.with_to(to);
        }

        let expected = from.as_ref().map_or(true, |f| f == &old)
            && to.as_ref().map_or(true, |t| t == &new);
        prop_assert_eq!(filter.matches(&old, &new), expected);
    }
}
