//! Project domain model.
//!
//! # Responsibility
//! - Own an ordered collection of todos and expose count queries over it.
//! - Provide in-place reordering by due date or priority.
//!
//! # Invariants
//! - `id` is stable; `name` is never blank, including after a reload.
//! - No two todos in one project share an id.
//! - Counts are computed on demand and always match current contents.

use crate::model::ids::{new_project_id, ProjectId};
use crate::model::todo::{Todo, TodoPatch};
use crate::model::{non_blank_text, null_as_default, project_id_or_new, UNTITLED};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Name of the project created on a fresh install.
pub const DEFAULT_PROJECT_NAME: &str = "Inbox";

/// Reordering applied by [`Project::sort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoSort {
    /// Earliest due moment first; undated (or unparseable) todos last.
    DueDate,
    /// `urgent`, `high`, `medium`, `low`.
    Priority,
}

/// Named bucket of todos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ProjectRecord")]
pub struct Project {
    id: ProjectId,
    name: String,
    todos: Vec<Todo>,
}

/// Persisted shape before duplicate todo ids are dropped.
#[derive(Deserialize)]
struct ProjectRecord {
    #[serde(default = "new_project_id", deserialize_with = "project_id_or_new")]
    id: ProjectId,
    #[serde(default = "untitled", deserialize_with = "non_blank_text")]
    name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    todos: Vec<Todo>,
}

impl From<ProjectRecord> for Project {
    fn from(record: ProjectRecord) -> Self {
        let mut seen = HashSet::new();
        let todos = record
            .todos
            .into_iter()
            .filter(|todo| seen.insert(todo.id().to_string()))
            .collect();
        Self {
            id: record.id,
            name: record.name,
            todos,
        }
    }
}

fn untitled() -> String {
    UNTITLED.to_string()
}

impl Default for Project {
    /// Empty [`DEFAULT_PROJECT_NAME`] project under a fresh id.
    fn default() -> Self {
        Self {
            id: new_project_id(),
            name: DEFAULT_PROJECT_NAME.to_string(),
            todos: Vec::new(),
        }
    }
}

impl Project {
    /// Creates an empty project with a generated id.
    ///
    /// Returns `None` when `name` is blank after trimming.
    pub fn new(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            id: new_project_id(),
            name: name.to_string(),
            todos: Vec::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name, trimmed and never blank.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets a trimmed name. Blank input is ignored.
    pub fn set_name(&mut self, name: &str) {
        let trimmed = name.trim();
        if !trimmed.is_empty() {
            self.name = trimmed.to_string();
        }
    }

    /// Returns a copy of the todos in current order.
    pub fn todos(&self) -> Vec<Todo> {
        self.todos.clone()
    }

    /// Read-only iteration without copying.
    pub fn iter_todos(&self) -> impl Iterator<Item = &Todo> {
        self.todos.iter()
    }

    /// Looks up one todo by id.
    pub fn todo(&self, todo_id: &str) -> Option<&Todo> {
        self.todos.iter().find(|todo| todo.id() == todo_id)
    }

    pub(crate) fn todo_mut(&mut self, todo_id: &str) -> Option<&mut Todo> {
        self.todos.iter_mut().find(|todo| todo.id() == todo_id)
    }

    /// Number of todos, completed or not.
    pub fn todo_count(&self) -> usize {
        self.todos.len()
    }

    /// Number of todos marked completed.
    pub fn completed_count(&self) -> usize {
        self.todos.iter().filter(|todo| todo.is_completed()).count()
    }

    /// Number of todos still open.
    pub fn pending_count(&self) -> usize {
        self.todos.iter().filter(|todo| !todo.is_completed()).count()
    }

    /// Appends `todo`. Titles may repeat; an already present id is refused.
    pub fn add_todo(&mut self, todo: Todo) -> bool {
        if self.todo(todo.id()).is_some() {
            return false;
        }
        self.todos.push(todo);
        true
    }

    /// Removes the todo with `todo_id`; returns whether one was found.
    pub fn remove_todo(&mut self, todo_id: &str) -> bool {
        match self.todos.iter().position(|todo| todo.id() == todo_id) {
            Some(index) => {
                self.todos.remove(index);
                true
            }
            None => false,
        }
    }

    /// Applies a partial patch; returns `false` when no todo matches.
    pub fn update_todo(&mut self, todo_id: &str, patch: &TodoPatch) -> bool {
        match self.todo_mut(todo_id) {
            Some(todo) => {
                todo.apply_patch(patch);
                true
            }
            None => false,
        }
    }

    /// Reorders todos in place; ties keep their relative order.
    pub fn sort(&mut self, order: TodoSort) {
        match order {
            TodoSort::DueDate => self.sort_by_due_date(),
            TodoSort::Priority => self.sort_by_priority(),
        }
    }

    /// Stable ascending sort by due moment, undated todos last.
    ///
    /// Date-only values count as local midnight, so a timestamp later that
    /// day sorts after them.
    pub fn sort_by_due_date(&mut self) {
        self.todos
            .sort_by(|a, b| match (a.due_timestamp(), b.due_timestamp()) {
                (Some(left), Some(right)) => left.cmp(&right),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            });
    }

    /// Stable sort, most urgent first.
    pub fn sort_by_priority(&mut self) {
        self.todos.sort_by_key(|todo| todo.priority().rank());
    }
}
