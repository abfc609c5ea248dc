//! Save lifecycle
//!
//! After the persistence layer has written a document it calls
//! [`Document::post_persist`], which clears collaborator caches and rotates
//! the change generations. A document cycles between [`DirtyState::Clean`]
//! and [`DirtyState::Dirty`] for its whole lifetime:
//!
//! - `Clean -> Dirty` on any tracked mutation
//! - `Dirty -> Clean` on `move_changes` (new generation)
//! - `Dirty -> Clean` when every changed attribute is reset

use std::time::Instant;

use crate::document::Document;
use crate::{log_op_end, log_op_start};

/// Coarse change state of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirtyState {
    Clean,
    Dirty,
}

impl Document {
    pub fn dirty_state(&self) -> DirtyState {
        if self.is_changed() {
            DirtyState::Dirty
        } else {
            DirtyState::Clean
        }
    }

    /// Rotate change generations and drop pending atomic side channels
    pub fn move_changes(&mut self) {
        self.tracker.rotate_generations(&self.attributes);
        self.atomic_unsets.clear();
    }

    /// Post-write hook for the persistence layer
    ///
    /// Resets the memoised persisted descendants and the before-type-cast
    /// snapshot, then moves the changes. Embedded children are not touched;
    /// see [`Document::post_persist_tree`].
    #[doc(alias = "after_save")]
    pub fn post_persist(&mut self) {
        log_op_start!("post_persist", document_id = %self.id);
        let start = Instant::now();
        let changed_len = self.changed_attribute_names().len();

        self.reset_persisted_descendants();
        self.attributes.reset_before_type_cast();
        self.move_changes();

        log_op_end!(
            "post_persist",
            since = start,
            document_id = %self.id,
            changed_len = changed_len
        );
    }

    /// [`Document::post_persist`] for this document and every descendant
    ///
    /// For roots saved together with their embedded documents.
    pub fn post_persist_tree(&mut self) {
        for child in &mut self.children {
            child.post_persist_tree();
        }
        self.post_persist();
    }

    /// Record that this document and its descendants exist in the backend
    pub fn mark_persisted(&mut self) {
        self.new_record = false;
        for child in &mut self.children {
            child.mark_persisted();
        }
        self.reset_persisted_descendants();
    }

    /// Atomic positions of all persisted descendants
    ///
    /// Memoised until the next `post_persist`, `mark_persisted`, embed or
    /// [`Document::child_mut`] on this document.
    pub fn persisted_descendants(&self) -> &[String] {
        self.persisted_descendants.get_or_init(|| {
            let mut positions = Vec::new();
            collect_persisted(&self.children, &mut positions);
            positions
        })
    }

    pub(crate) fn reset_persisted_descendants(&mut self) {
        self.persisted_descendants.take();
    }
}

fn collect_persisted(children: &[Document], positions: &mut Vec<String>) {
    for child in children {
        if !child.new_record {
            if let Some(position) = child.atomic_position() {
                positions.push(position.to_string());
            }
        }
        collect_persisted(&child.children, positions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeMap;
    use crate::fields::Schema;
    use serde_json::json;
    use std::sync::Arc;

    fn loaded(name: &str) -> Document {
        Document::instantiate(
            Arc::new(Schema::new()),
            AttributeMap::from([("name".to_string(), json!(name))]),
        )
    }

    #[test]
    fn test_state_machine() {
        let mut doc = loaded("X");
        assert_eq!(doc.dirty_state(), DirtyState::Clean);

        doc.write_attribute("name", json!("Y"));
        assert_eq!(doc.dirty_state(), DirtyState::Dirty);

        doc.reset_attribute("name");
        assert_eq!(doc.dirty_state(), DirtyState::Clean);

        doc.write_attribute("name", json!("Z"));
        doc.post_persist();
        assert_eq!(doc.dirty_state(), DirtyState::Clean);
        assert!(doc.attribute_previously_changed("name"));
    }

    #[test]
    fn test_post_persist_resets_before_type_cast_and_unsets() {
        let mut doc = loaded("X");
        doc.write_attribute("age", json!("31"));
        doc.unset_attribute("name");
        assert!(!doc.atomic_unsets().is_empty());

        doc.post_persist();

        assert!(doc.atomic_unsets().is_empty());
        assert!(doc.read_attribute_before_type_cast("name").is_none());
        assert_eq!(doc.read_attribute_before_type_cast("age"), Some(&json!("31")));
    }

    #[test]
    fn test_post_persist_tree_rotates_children() {
        let mut root = loaded("root");
        root.embed_many("items", loaded("a"));
        root.child_mut(0).unwrap().write_attribute("name", json!("b"));
        assert!(root.is_changed());

        root.post_persist();
        assert!(root.is_changed(), "plain post_persist leaves children dirty");

        root.post_persist_tree();
        assert!(!root.is_changed());
        assert!(root.children()[0].attribute_previously_changed("name"));
    }

    #[test]
    fn test_persisted_descendants_memo() {
        let mut root = loaded("root");
        let mut item = loaded("a");
        item.embed_one("meta", Document::new(Arc::new(Schema::new())));
        root.embed_many("items", item);

        assert_eq!(root.persisted_descendants(), &["items.0".to_string()]);

        root.mark_persisted();
        assert_eq!(
            root.persisted_descendants(),
            &["items.0".to_string(), "items.0.meta".to_string()]
        );
    }

    #[test]
    fn test_persisted_descendants_memo_sees_grandchild_added_via_child() {
        let mut root = loaded("root");
        root.embed_many("items", loaded("a"));
        assert_eq!(root.persisted_descendants(), &["items.0".to_string()]);

        root.child_mut(0).unwrap().embed_one("meta", loaded("m"));

        assert_eq!(
            root.persisted_descendants(),
            &["items.0".to_string(), "items.0.meta".to_string()]
        );
    }
}
