//! Todo domain model.
//!
//! # Responsibility
//! - Hold one task with scheduling, priority and checklist metadata.
//! - Provide guarded setters that silently ignore invalid input.
//!
//! # Invariants
//! - `id` is stable for the lifetime of the todo, including across reloads.
//! - `title` is never blank; blank persisted titles load as [`UNTITLED`].
//! - Checklist order is insertion order; only explicit removal reorders it.

use crate::model::ids::{new_checklist_item_id, new_todo_id, ChecklistItemId, TodoId};
use crate::model::{
    checklist_item_id_or_new, non_blank_text, null_as_default, todo_id_or_new, UNTITLED,
};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{Display, Formatter};

const LOCAL_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Urgency level of a todo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Stable wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    /// Parses an exact wire value. Anything else is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }

    /// Sort rank, `0` for the most urgent.
    pub fn rank(self) -> u8 {
        match self {
            Self::Urgent => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sub-task nested inside a todo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    /// Stable id; generated on load when absent or `null`.
    #[serde(
        default = "new_checklist_item_id",
        deserialize_with = "checklist_item_id_or_new"
    )]
    pub id: ChecklistItemId,
    /// Label shown next to the checkbox.
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed: bool,
}

impl ChecklistItem {
    /// Creates an unchecked item with a fresh id.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: new_checklist_item_id(),
            text: text.into(),
            completed: false,
        }
    }
}

/// Creation payload for a todo.
///
/// Optional fields fall back to `description=""`, `due_date=None`,
/// `priority=medium`, `notes=""` and an empty checklist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTodo {
    /// Required; trimmed, and blank titles are rejected.
    pub title: String,
    pub description: Option<String>,
    /// Date (`YYYY-MM-DD`) or timestamp; blank means no due date.
    pub due_date: Option<String>,
    /// Raw priority value; unknown values fall back to `medium`.
    pub priority: Option<String>,
    pub notes: Option<String>,
    /// Initial checklist, kept in the given order.
    pub checklist: Vec<ChecklistItem>,
}

impl NewTodo {
    /// Payload with only a title; every other field takes its default.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Partial update for a todo.
///
/// `None` means "leave untouched". `due_date: Some(None)` clears the date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    /// New title; blank values are ignored.
    pub title: Option<String>,
    pub description: Option<String>,
    /// `Some(None)` or a blank string clears the date.
    pub due_date: Option<Option<String>>,
    /// Raw priority value; unknown values are ignored.
    pub priority: Option<String>,
    pub notes: Option<String>,
    /// Explicit completion state, unlike the toggle operation.
    pub completed: Option<bool>,
}

impl TodoPatch {
    /// Returns whether the patch carries no field at all.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Single task owned by a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    #[serde(default = "new_todo_id", deserialize_with = "todo_id_or_new")]
    id: TodoId,
    #[serde(default = "untitled", deserialize_with = "non_blank_text")]
    title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    description: String,
    #[serde(default)]
    due_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_priority")]
    priority: Priority,
    #[serde(default, deserialize_with = "null_as_default")]
    notes: String,
    #[serde(default, deserialize_with = "null_as_default")]
    checklist: Vec<ChecklistItem>,
    #[serde(default, deserialize_with = "null_as_default")]
    completed: bool,
}

impl Todo {
    /// Creates a todo with defaults for every optional field.
    ///
    /// Returns `None` when `title` is blank after trimming.
    pub fn new(title: impl Into<String>) -> Option<Self> {
        Self::from_new(NewTodo::titled(title))
    }

    /// Creates a todo from a creation payload with a generated id.
    ///
    /// Returns `None` when the title is blank after trimming.
    pub fn from_new(data: NewTodo) -> Option<Self> {
        let title = normalized_title(&data.title)?;
        Some(Self {
            id: new_todo_id(),
            title,
            description: data.description.unwrap_or_default(),
            due_date: normalized_due_date(data.due_date),
            priority: data
                .priority
                .as_deref()
                .and_then(Priority::parse)
                .unwrap_or_default(),
            notes: data.notes.unwrap_or_default(),
            checklist: data.checklist,
            completed: false,
        })
    }

    /// Returns a content-identical todo under a freshly generated id.
    ///
    /// Completion state and checklist items are carried over unchanged.
    pub fn duplicate_with_new_id(&self) -> Self {
        Self {
            id: new_todo_id(),
            ..self.clone()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Trimmed, non-blank title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Free-form description; empty when unset.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Raw due date as stored, without calendar validation.
    pub fn due_date(&self) -> Option<&str> {
        self.due_date.as_deref()
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Longer notes; empty when unset.
    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Returns a copy of the checklist in display order.
    pub fn checklist(&self) -> Vec<ChecklistItem> {
        self.checklist.clone()
    }

    /// Number of checklist items without copying them.
    pub fn checklist_len(&self) -> usize {
        self.checklist.len()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Sets a trimmed title. Blank input is ignored.
    pub fn set_title(&mut self, title: &str) {
        if let Some(title) = normalized_title(title) {
            self.title = title;
        }
    }

    /// Replaces the description; `None` clears it.
    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description.unwrap_or_default();
    }

    /// Sets or clears the due date. Blank strings clear it.
    ///
    /// The value is not checked against the calendar; unparseable dates are
    /// kept and simply never count as overdue.
    pub fn set_due_date(&mut self, due_date: Option<String>) {
        self.due_date = normalized_due_date(due_date);
    }

    /// Sets priority from a raw wire value. Unknown values are ignored.
    pub fn set_priority(&mut self, priority: &str) {
        if let Some(priority) = Priority::parse(priority) {
            self.priority = priority;
        }
    }

    /// Replaces the notes; `None` clears them.
    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes.unwrap_or_default();
    }

    pub fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
    }

    /// Flips completion and returns the new state.
    pub fn toggle_complete(&mut self) -> bool {
        self.completed = !self.completed;
        self.completed
    }

    /// Applies only the fields present in `patch`.
    pub fn apply_patch(&mut self, patch: &TodoPatch) {
        if let Some(title) = &patch.title {
            self.set_title(title);
        }
        if let Some(description) = &patch.description {
            self.set_description(Some(description.clone()));
        }
        if let Some(due_date) = &patch.due_date {
            self.set_due_date(due_date.clone());
        }
        if let Some(priority) = &patch.priority {
            self.set_priority(priority);
        }
        if let Some(notes) = &patch.notes {
            self.set_notes(Some(notes.clone()));
        }
        if let Some(completed) = patch.completed {
            self.set_completed(completed);
        }
    }

    /// Appends an unchecked item. Duplicates are allowed.
    pub fn add_checklist_item(&mut self, text: impl Into<String>) {
        self.checklist.push(ChecklistItem::new(text));
    }

    /// Flips one item. Out-of-range indexes are ignored.
    pub fn toggle_checklist_item(&mut self, index: usize) {
        if let Some(item) = self.checklist.get_mut(index) {
            item.completed = !item.completed;
        }
    }

    /// Removes one item. Out-of-range indexes are ignored.
    pub fn remove_checklist_item(&mut self, index: usize) {
        if index < self.checklist.len() {
            self.checklist.remove(index);
        }
    }

    /// Parsed calendar date of `due_date`, if it parses.
    pub fn due_date_parsed(&self) -> Option<NaiveDate> {
        self.due_date.as_deref().and_then(parse_due_date)
    }

    /// Parsed local due moment; date-only values resolve to midnight.
    pub fn due_timestamp(&self) -> Option<NaiveDateTime> {
        self.due_date.as_deref().and_then(parse_due_timestamp)
    }

    /// Overdue relative to the local current date.
    pub fn is_overdue(&self) -> bool {
        self.is_overdue_on(Local::now().date_naive())
    }

    /// Overdue iff not completed and the due date is strictly before `today`.
    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        if self.completed {
            return false;
        }
        self.due_date_parsed().is_some_and(|due| due < today)
    }
}

/// Parses the date forms an ISO-8601 reader accepts for due dates.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps (converted to local time) and
/// offset-less `YYYY-MM-DDTHH:MM[:SS[.fff]]` local timestamps.
pub fn parse_due_date(value: &str) -> Option<NaiveDate> {
    parse_due_timestamp(value).map(|timestamp| timestamp.date())
}

/// Same forms as [`parse_due_date`], keeping the local time of day.
pub fn parse_due_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN));
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(timestamp.with_timezone(&Local).naive_local());
    }
    LOCAL_DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
}

fn normalized_title(title: &str) -> Option<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn normalized_due_date(due_date: Option<String>) -> Option<String> {
    due_date.filter(|value| !value.trim().is_empty())
}

fn untitled() -> String {
    UNTITLED.to_string()
}

fn lenient_priority<'de, D>(deserializer: D) -> Result<Priority, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Priority::parse).unwrap_or_default())
}
