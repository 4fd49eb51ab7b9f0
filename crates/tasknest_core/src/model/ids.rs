//! Identifier generation for domain entities.
//!
//! Ids are opaque strings. They only need to be unique within one storage
//! blob, so a kind prefix plus a v4 UUID is plenty.

use uuid::Uuid;

/// Stable identifier of a [`crate::Project`].
pub type ProjectId = String;
/// Stable identifier of a [`crate::Todo`].
pub type TodoId = String;
/// Stable identifier of a [`crate::ChecklistItem`].
pub type ChecklistItemId = String;

pub fn new_project_id() -> ProjectId {
    prefixed("project")
}

pub fn new_todo_id() -> TodoId {
    prefixed("todo")
}

pub fn new_checklist_item_id() -> ChecklistItemId {
    prefixed("check")
}

fn prefixed(kind: &str) -> String {
    format!("{kind}-{}", Uuid::new_v4().simple())
}
