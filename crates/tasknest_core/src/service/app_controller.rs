//! Application controller: the single mutation gateway over project state.
//!
//! # Responsibility
//! - Own the project collection and the active project selection.
//! - Expose every structural change as one operation with a success signal.
//! - Persist and notify after each successful mutation.
//!
//! # Invariants
//! - Every successful mutation triggers exactly one save and one notification.
//! - Rejected mutations trigger neither.
//! - Selecting a project notifies but does not persist.
//! - After `init()` at least one project exists and the active id resolves.
//! - Read accessors return copies or shared references, never `&mut`.

use crate::model::ids::ProjectId;
use crate::model::project::{Project, TodoSort};
use crate::model::todo::{NewTodo, Todo, TodoPatch};
use crate::storage::ProjectStorage;
use crate::store::KeyValueStore;
use chrono::{Local, NaiveDate};
use log::{debug, info, warn};

/// Callback fired after every successful state change.
pub type ChangeListener = Box<dyn FnMut()>;

/// Aggregate counters across all projects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppStats {
    pub total_projects: usize,
    /// Todos across every project.
    pub total_todos: usize,
    pub completed_todos: usize,
    /// Always `total_todos - completed_todos`.
    pub pending_todos: usize,
    /// Open todos whose due date is before today.
    pub overdue_todos: usize,
}

/// Owner of all projects and the only writer to them.
pub struct AppController<S: KeyValueStore> {
    storage: ProjectStorage<S>,
    projects: Vec<Project>,
    active_project_id: Option<ProjectId>,
    on_change: Option<ChangeListener>,
    ready: bool,
}

impl<S: KeyValueStore> AppController<S> {
    /// Creates an uninitialized controller over `storage`.
    pub fn new(storage: ProjectStorage<S>) -> Self {
        Self {
            storage,
            projects: Vec::new(),
            active_project_id: None,
            on_change: None,
            ready: false,
        }
    }

    /// Loads persisted state or bootstraps a default project.
    ///
    /// # Contract
    /// - Non-empty persisted collection: adopted, first project active.
    /// - Anything else (absent, corrupt, empty, unavailable): one
    ///   [`crate::DEFAULT_PROJECT_NAME`] project is created, activated and persisted.
    /// - Repeated calls are ignored.
    pub fn init(&mut self) {
        if self.ready {
            warn!("event=controller_init module=controller status=skipped reason=already_ready");
            return;
        }

        match self.storage.load_projects() {
            Some(projects) if !projects.is_empty() => {
                self.active_project_id = Some(projects[0].id().to_string());
                self.projects = projects;
                info!(
                    "event=controller_init module=controller status=ok source=storage projects={}",
                    self.projects.len()
                );
            }
            _ => {
                let inbox = Project::default();
                self.active_project_id = Some(inbox.id().to_string());
                self.projects = vec![inbox];
                self.save();
                info!("event=controller_init module=controller status=ok source=bootstrap");
            }
        }
        self.ready = true;
    }

    /// Returns whether [`Self::init`] has run.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Registers the change callback, replacing any previous one.
    pub fn on_change(&mut self, listener: impl FnMut() + 'static) {
        self.on_change = Some(Box::new(listener));
    }

    // Reads.

    /// Copy of all projects in creation order.
    pub fn projects(&self) -> Vec<Project> {
        self.projects.clone()
    }

    /// Number of projects without copying them.
    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    /// Shared view of one project.
    pub fn project(&self, project_id: &str) -> Option<&Project> {
        self.projects
            .iter()
            .find(|project| project.id() == project_id)
    }

    /// Active project, falling back to the first one.
    pub fn active_project(&self) -> Option<&Project> {
        self.active_project_id
            .as_deref()
            .and_then(|id| self.project(id))
            .or_else(|| self.projects.first())
    }

    pub fn active_project_id(&self) -> Option<&str> {
        self.active_project_id.as_deref()
    }

    /// Shared view of one todo inside `project_id`.
    pub fn todo(&self, project_id: &str, todo_id: &str) -> Option<&Todo> {
        self.project(project_id)?.todo(todo_id)
    }

    /// Aggregates counters using the local current date for overdue checks.
    pub fn stats(&self) -> AppStats {
        self.stats_on(Local::now().date_naive())
    }

    /// Aggregates counters with overdue evaluated against `today`.
    pub fn stats_on(&self, today: NaiveDate) -> AppStats {
        let mut stats = AppStats {
            total_projects: self.projects.len(),
            ..AppStats::default()
        };
        for todo in self.projects.iter().flat_map(|project| project.iter_todos()) {
            stats.total_todos += 1;
            if todo.is_completed() {
                stats.completed_todos += 1;
            }
            if todo.is_overdue_on(today) {
                stats.overdue_todos += 1;
            }
        }
        stats.pending_todos = stats.total_todos - stats.completed_todos;
        stats
    }

    // Projects.

    /// Selects the active project. Notifies without persisting.
    pub fn set_active_project(&mut self, project_id: &str) -> bool {
        if self.project(project_id).is_none() {
            return false;
        }
        self.active_project_id = Some(project_id.to_string());
        self.notify_change();
        true
    }

    /// Creates, appends and activates a project.
    pub fn add_project(&mut self, name: &str) -> Option<Project> {
        let project = Project::new(name)?;
        self.active_project_id = Some(project.id().to_string());
        self.projects.push(project.clone());
        debug!(
            "event=project_add module=controller status=ok project_id={}",
            project.id()
        );
        self.commit();
        Some(project)
    }

    /// Renames a project. Blank names and unknown ids are rejected.
    pub fn update_project(&mut self, project_id: &str, name: &str) -> bool {
        if name.trim().is_empty() {
            return false;
        }
        let Some(project) = self.project_mut(project_id) else {
            return false;
        };
        project.set_name(name);
        self.commit();
        true
    }

    /// Deletes a project unless it is the last one.
    ///
    /// When the active project is deleted the first remaining one becomes active.
    pub fn delete_project(&mut self, project_id: &str) -> bool {
        if self.projects.len() <= 1 {
            debug!("event=project_delete module=controller status=rejected reason=last_project");
            return false;
        }
        let Some(index) = self.project_index(project_id) else {
            return false;
        };
        self.projects.remove(index);
        if self.active_project_id.as_deref() == Some(project_id) {
            self.active_project_id = self.projects.first().map(|p| p.id().to_string());
        }
        self.commit();
        true
    }

    /// Reorders one project's todos in place.
    pub fn sort_project_todos(&mut self, project_id: &str, order: TodoSort) -> bool {
        let Some(project) = self.project_mut(project_id) else {
            return false;
        };
        project.sort(order);
        self.commit();
        true
    }

    // Todos.

    /// Creates a todo in `project_id` with defaults for omitted fields.
    ///
    /// Returns `None` when the project is missing or the title is blank.
    pub fn add_todo(&mut self, project_id: &str, data: NewTodo) -> Option<Todo> {
        let index = self.project_index(project_id)?;
        let todo = Todo::from_new(data)?;
        if !self.projects[index].add_todo(todo.clone()) {
            return None;
        }
        self.commit();
        Some(todo)
    }

    /// Applies `patch` to one todo; `false` when the project or todo is missing.
    pub fn update_todo(&mut self, project_id: &str, todo_id: &str, patch: &TodoPatch) -> bool {
        let updated = self
            .project_mut(project_id)
            .is_some_and(|project| project.update_todo(todo_id, patch));
        if updated {
            self.commit();
        }
        updated
    }

    /// Removes one todo; `false` when the project or todo is missing.
    pub fn delete_todo(&mut self, project_id: &str, todo_id: &str) -> bool {
        let removed = self
            .project_mut(project_id)
            .is_some_and(|project| project.remove_todo(todo_id));
        if removed {
            self.commit();
        }
        removed
    }

    /// Flips completion of one todo.
    pub fn toggle_todo_complete(&mut self, project_id: &str, todo_id: &str) -> bool {
        self.mutate_todo(project_id, todo_id, |todo| {
            todo.toggle_complete();
        })
    }

    /// Moves a todo by copying its content into `to_project_id` under a new
    /// id and then removing the original. Persists and notifies once.
    pub fn move_todo(&mut self, from_project_id: &str, to_project_id: &str, todo_id: &str) -> bool {
        let (Some(from), Some(to)) = (
            self.project_index(from_project_id),
            self.project_index(to_project_id),
        ) else {
            return false;
        };
        let Some(copy) = self.projects[from]
            .todo(todo_id)
            .map(Todo::duplicate_with_new_id)
        else {
            return false;
        };

        let new_todo_id = copy.id().to_string();
        if !self.projects[to].add_todo(copy) {
            warn!(
                "event=todo_move module=controller status=rejected reason=duplicate_id todo_id={}",
                todo_id
            );
            return false;
        }
        self.projects[from].remove_todo(todo_id);
        debug!(
            "event=todo_move module=controller status=ok todo_id={} new_todo_id={}",
            todo_id, new_todo_id
        );
        self.commit();
        true
    }

    // Checklist.

    /// Appends a trimmed checklist item. Blank text is rejected.
    pub fn add_checklist_item(&mut self, project_id: &str, todo_id: &str, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        self.mutate_todo(project_id, todo_id, |todo| todo.add_checklist_item(text))
    }

    /// Flips one checklist item. Succeeds whenever the todo exists, even if
    /// `index` is out of range.
    pub fn toggle_checklist_item(&mut self, project_id: &str, todo_id: &str, index: usize) -> bool {
        self.mutate_todo(project_id, todo_id, |todo| todo.toggle_checklist_item(index))
    }

    /// Removes one checklist item. Succeeds whenever the todo exists, even if
    /// `index` is out of range.
    pub fn remove_checklist_item(&mut self, project_id: &str, todo_id: &str, index: usize) -> bool {
        self.mutate_todo(project_id, todo_id, |todo| todo.remove_checklist_item(index))
    }

    // Internals.

    fn project_index(&self, project_id: &str) -> Option<usize> {
        self.projects
            .iter()
            .position(|project| project.id() == project_id)
    }

    fn project_mut(&mut self, project_id: &str) -> Option<&mut Project> {
        self.projects
            .iter_mut()
            .find(|project| project.id() == project_id)
    }

    fn mutate_todo(
        &mut self,
        project_id: &str,
        todo_id: &str,
        apply: impl FnOnce(&mut Todo),
    ) -> bool {
        let Some(todo) = self
            .project_mut(project_id)
            .and_then(|project| project.todo_mut(todo_id))
        else {
            return false;
        };
        apply(todo);
        self.commit();
        true
    }

    fn commit(&mut self) {
        self.save();
        self.notify_change();
    }

    fn save(&mut self) {
        // In-memory state stays authoritative when the write fails.
        let _ = self.storage.save_projects(&self.projects);
    }

    fn notify_change(&mut self) {
        if let Some(listener) = self.on_change.as_mut() {
            listener();
        }
    }
}
