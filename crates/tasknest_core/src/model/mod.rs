//! Domain model for projects, todos and checklist items.
//!
//! # Responsibility
//! - Define the entities held by the controller and written by storage.
//! - Keep every field behind guarded setters so invariants hold without I/O.
//!
//! # Invariants
//! - Entity ids are generated once and never change afterwards.
//! - Setters either apply a validated change or leave state untouched.

use crate::model::ids::{new_checklist_item_id, new_project_id, new_todo_id};
use serde::{Deserialize, Deserializer};

pub mod ids;
pub mod project;
pub mod todo;

/// Deserializes a field that may be `null` in persisted data into its default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Placeholder adopted when persisted data carries a blank name or title.
pub const UNTITLED: &str = "Untitled";

/// Trims persisted display text; blank or `null` becomes [`UNTITLED`].
pub(crate) fn non_blank_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    let trimmed = raw.trim();
    Ok(if trimmed.is_empty() {
        UNTITLED.to_string()
    } else {
        trimmed.to_string()
    })
}

pub(crate) fn project_id_or_new<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    id_or_new(deserializer, new_project_id)
}

pub(crate) fn todo_id_or_new<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    id_or_new(deserializer, new_todo_id)
}

pub(crate) fn checklist_item_id_or_new<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    id_or_new(deserializer, new_checklist_item_id)
}

/// `null` and empty ids are treated like absent ones.
fn id_or_new<'de, D>(deserializer: D, generate: fn() -> String) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|id| !id.is_empty())
        .unwrap_or_else(generate))
}
