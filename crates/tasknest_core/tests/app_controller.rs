use chrono::NaiveDate;
use std::cell::Cell;
use std::rc::Rc;
use tasknest_core::{
    AppController, AppStats, KeyValueStore, MemoryStore, NewTodo, Priority, ProjectStorage,
    StoreError, StoreResult, TodoPatch, TodoSort, DEFAULT_PROJECT_NAME, STORAGE_KEY,
};

/// Memory store that counts writes of the project blob.
#[derive(Clone, Default)]
struct CountingStore {
    inner: MemoryStore,
    writes: Rc<Cell<usize>>,
    refuse: bool,
}

impl KeyValueStore for CountingStore {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> StoreResult<()> {
        if self.refuse {
            return Err(StoreError::Unavailable("quota exceeded".to_string()));
        }
        if key == STORAGE_KEY {
            self.writes.set(self.writes.get() + 1);
        }
        self.inner.set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) -> StoreResult<()> {
        self.inner.remove_item(key)
    }
}

struct Harness {
    controller: AppController<CountingStore>,
    store: MemoryStore,
    writes: Rc<Cell<usize>>,
    notifications: Rc<Cell<usize>>,
}

impl Harness {
    fn over(store: CountingStore) -> Self {
        let writes = store.writes.clone();
        let memory = store.inner.clone();
        let mut controller = AppController::new(ProjectStorage::new(store));
        controller.init();

        let notifications = Rc::new(Cell::new(0));
        let counter = notifications.clone();
        controller.on_change(move || counter.set(counter.get() + 1));

        Self {
            controller,
            store: memory,
            writes,
            notifications,
        }
    }

    fn fresh() -> Self {
        let mut harness = Self::over(CountingStore::default());
        harness.reset();
        harness
    }

    fn reset(&mut self) {
        self.writes.set(0);
        self.notifications.set(0);
    }

    /// `(writes, notifications)` since the last reset.
    fn effects(&self) -> (usize, usize) {
        (self.writes.get(), self.notifications.get())
    }

    fn inbox_id(&self) -> String {
        self.controller.projects()[0].id().to_string()
    }

    fn add_titled(&mut self, project_id: &str, title: &str) -> String {
        let todo = self
            .controller
            .add_todo(project_id, NewTodo::titled(title))
            .unwrap();
        self.reset();
        todo.id().to_string()
    }
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn fresh_init_creates_and_persists_inbox() {
    let store = CountingStore::default();
    let writes = store.writes.clone();
    let memory = store.inner.clone();
    let mut controller = AppController::new(ProjectStorage::new(store));
    assert!(!controller.is_ready());

    controller.init();

    assert!(controller.is_ready());
    assert_eq!(writes.get(), 1);
    assert!(memory.contains_key(STORAGE_KEY));
    let projects = controller.projects();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].name(), DEFAULT_PROJECT_NAME);
    assert_eq!(controller.active_project_id(), Some(projects[0].id()));
}

#[test]
fn corrupt_or_non_array_blob_bootstraps_like_no_data() {
    for payload in ["{broken", r#"{"projects":[]}"#, "42", "[]"] {
        let mut store = CountingStore::default();
        store.inner.set_item(STORAGE_KEY, payload).unwrap();
        let harness = Harness::over(store);

        let projects = harness.controller.projects();
        assert_eq!(projects.len(), 1, "payload {payload}");
        assert_eq!(projects[0].name(), DEFAULT_PROJECT_NAME);
        assert_eq!(harness.writes.get(), 1);
    }
}

#[test]
fn init_adopts_persisted_projects_with_first_active() {
    let mut first = Harness::fresh();
    let work = first.controller.add_project("Work").unwrap();
    let todo_id = first.add_titled(work.id(), "carry over");

    let mut reloaded = Harness::over(CountingStore {
        inner: first.store.clone(),
        ..CountingStore::default()
    });
    reloaded.reset();

    let projects = reloaded.controller.projects();
    assert_eq!(projects.len(), 2);
    assert_eq!(reloaded.controller.active_project_id(), Some(projects[0].id()));
    assert_eq!(
        reloaded.controller.todo(work.id(), &todo_id).unwrap().title(),
        "carry over"
    );
    assert_eq!(reloaded.effects(), (0, 0));
}

#[test]
fn init_keeps_blob_with_null_ids_instead_of_bootstrapping() {
    let mut store = CountingStore::default();
    let payload = r#"[{
        "id": "project-work",
        "name": "Work",
        "todos": [
            { "id": "todo-kept", "title": "valid" },
            { "id": null, "title": "needs an id", "checklist": [{ "id": null, "text": "step" }] }
        ]
    }]"#;
    store.inner.set_item(STORAGE_KEY, payload).unwrap();

    let harness = Harness::over(store);

    let projects = harness.controller.projects();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].name(), "Work");
    assert_eq!(projects[0].todo_count(), 2);
    assert!(harness.controller.todo("project-work", "todo-kept").is_some());
    assert_eq!(harness.writes.get(), 0);
}

#[test]
fn add_project_appends_activates_and_commits_once() {
    let mut h = Harness::fresh();
    let before = h.controller.project_count();

    let project = h.controller.add_project("  Garden  ").unwrap();

    assert_eq!(project.name(), "Garden");
    assert_eq!(h.controller.project_count(), before + 1);
    assert_eq!(h.controller.active_project_id(), Some(project.id()));
    assert_eq!(h.controller.active_project().unwrap().name(), "Garden");
    assert_eq!(h.effects(), (1, 1));
}

#[test]
fn add_project_blank_has_no_effects() {
    let mut h = Harness::fresh();
    assert!(h.controller.add_project(" \n ").is_none());
    assert_eq!(h.controller.project_count(), 1);
    assert_eq!(h.effects(), (0, 0));
}

#[test]
fn set_active_project_notifies_without_persisting() {
    let mut h = Harness::fresh();
    let inbox = h.inbox_id();
    h.controller.add_project("Other").unwrap();
    h.reset();

    assert!(h.controller.set_active_project(&inbox));
    assert_eq!(h.controller.active_project_id(), Some(inbox.as_str()));
    assert_eq!(h.effects(), (0, 1));

    h.reset();
    assert!(!h.controller.set_active_project("project-missing"));
    assert_eq!(h.effects(), (0, 0));
}

#[test]
fn update_project_renames_or_rejects() {
    let mut h = Harness::fresh();
    let inbox = h.inbox_id();

    assert!(h.controller.update_project(&inbox, " Today "));
    assert_eq!(h.controller.project(&inbox).unwrap().name(), "Today");
    assert_eq!(h.effects(), (1, 1));

    h.reset();
    assert!(!h.controller.update_project(&inbox, "   "));
    assert!(!h.controller.update_project("project-missing", "Name"));
    assert_eq!(h.controller.project(&inbox).unwrap().name(), "Today");
    assert_eq!(h.effects(), (0, 0));
}

#[test]
fn deleting_last_project_is_refused() {
    let mut h = Harness::fresh();
    let inbox = h.inbox_id();
    let before = h.controller.projects();

    assert!(!h.controller.delete_project(&inbox));

    assert_eq!(h.controller.projects(), before);
    assert_eq!(h.controller.active_project_id(), Some(inbox.as_str()));
    assert_eq!(h.effects(), (0, 0));
}

#[test]
fn deleting_active_project_activates_first_remaining() {
    let mut h = Harness::fresh();
    let inbox = h.inbox_id();
    let work = h.controller.add_project("Work").unwrap();
    h.reset();

    assert!(h.controller.delete_project(work.id()));

    assert_eq!(h.controller.project_count(), 1);
    assert_eq!(h.controller.active_project_id(), Some(inbox.as_str()));
    assert_eq!(h.effects(), (1, 1));

    h.reset();
    h.controller.add_project("Again").unwrap();
    h.reset();
    assert!(!h.controller.delete_project("project-missing"));
    assert_eq!(h.effects(), (0, 0));
}

#[test]
fn deleting_inactive_project_keeps_selection() {
    let mut h = Harness::fresh();
    let inbox = h.inbox_id();
    let active = h.controller.add_project("Active").unwrap();
    h.reset();

    assert!(h.controller.delete_project(&inbox));
    assert_eq!(h.controller.active_project_id(), Some(active.id()));
}

#[test]
fn add_todo_applies_defaults() {
    let mut h = Harness::fresh();
    let inbox = h.inbox_id();

    let todo = h
        .controller
        .add_todo(&inbox, NewTodo::titled("Buy milk"))
        .unwrap();

    assert_eq!(todo.description(), "");
    assert_eq!(todo.due_date(), None);
    assert_eq!(todo.priority(), Priority::Medium);
    assert_eq!(todo.notes(), "");
    assert!(todo.checklist().is_empty());
    assert!(!todo.is_completed());
    assert_eq!(h.controller.project(&inbox).unwrap().todo_count(), 1);
    assert_eq!(h.effects(), (1, 1));
}

#[test]
fn add_todo_rejects_missing_project_and_blank_title() {
    let mut h = Harness::fresh();
    let inbox = h.inbox_id();

    assert!(h
        .controller
        .add_todo("project-missing", NewTodo::titled("x"))
        .is_none());
    assert!(h.controller.add_todo(&inbox, NewTodo::titled("  ")).is_none());
    assert_eq!(h.controller.project(&inbox).unwrap().todo_count(), 0);
    assert_eq!(h.effects(), (0, 0));
}

#[test]
fn update_todo_patch_leaves_other_fields_untouched() {
    let mut h = Harness::fresh();
    let inbox = h.inbox_id();
    let todo = h
        .controller
        .add_todo(
            &inbox,
            NewTodo {
                due_date: Some("2024-04-01".to_string()),
                priority: Some("urgent".to_string()),
                notes: Some("bring receipt".to_string()),
                ..NewTodo::titled("Return parcel")
            },
        )
        .unwrap();
    h.reset();

    let patch = TodoPatch {
        title: Some("Return parcel today".to_string()),
        ..TodoPatch::default()
    };
    assert!(h.controller.update_todo(&inbox, todo.id(), &patch));

    let updated = h.controller.todo(&inbox, todo.id()).unwrap();
    assert_eq!(updated.title(), "Return parcel today");
    assert_eq!(updated.priority(), Priority::Urgent);
    assert_eq!(updated.notes(), "bring receipt");
    assert_eq!(updated.due_date(), Some("2024-04-01"));
    assert_eq!(h.effects(), (1, 1));
}

#[test]
fn update_todo_invalid_priority_keeps_previous_value() {
    let mut h = Harness::fresh();
    let inbox = h.inbox_id();
    let todo_id = h.add_titled(&inbox, "prioritize");

    let patch = TodoPatch {
        priority: Some("whenever".to_string()),
        ..TodoPatch::default()
    };
    assert!(h.controller.update_todo(&inbox, &todo_id, &patch));
    assert_eq!(
        h.controller.todo(&inbox, &todo_id).unwrap().priority(),
        Priority::Medium
    );
}

#[test]
fn update_and_delete_todo_fail_without_match() {
    let mut h = Harness::fresh();
    let inbox = h.inbox_id();
    let patch = TodoPatch {
        notes: Some("n".to_string()),
        ..TodoPatch::default()
    };

    assert!(!h.controller.update_todo(&inbox, "todo-missing", &patch));
    assert!(!h.controller.update_todo("project-missing", "todo-missing", &patch));
    assert!(!h.controller.delete_todo(&inbox, "todo-missing"));
    assert!(!h.controller.toggle_todo_complete(&inbox, "todo-missing"));
    assert_eq!(h.effects(), (0, 0));
}

#[test]
fn delete_and_toggle_todo_commit_once_each() {
    let mut h = Harness::fresh();
    let inbox = h.inbox_id();
    let todo_id = h.add_titled(&inbox, "toggle me");

    assert!(h.controller.toggle_todo_complete(&inbox, &todo_id));
    assert!(h.controller.todo(&inbox, &todo_id).unwrap().is_completed());
    assert_eq!(h.effects(), (1, 1));

    h.reset();
    assert!(h.controller.delete_todo(&inbox, &todo_id));
    assert!(h.controller.todo(&inbox, &todo_id).is_none());
    assert_eq!(h.effects(), (1, 1));
}

#[test]
fn move_todo_copies_content_under_new_id() {
    let mut h = Harness::fresh();
    let inbox = h.inbox_id();
    let work = h.controller.add_project("Work").unwrap();
    let original = h
        .controller
        .add_todo(
            &inbox,
            NewTodo {
                description: Some("slides".to_string()),
                due_date: Some("2024-05-02".to_string()),
                priority: Some("high".to_string()),
                notes: Some("room 4".to_string()),
                ..NewTodo::titled("Prepare talk")
            },
        )
        .unwrap();
    h.controller
        .add_checklist_item(&inbox, original.id(), "outline");
    h.controller.toggle_todo_complete(&inbox, original.id());
    let original = h.controller.todo(&inbox, original.id()).unwrap().clone();
    h.reset();

    assert!(h.controller.move_todo(&inbox, work.id(), original.id()));
    assert_eq!(h.effects(), (1, 1));

    assert!(h.controller.todo(&inbox, original.id()).is_none());
    let moved = h.controller.project(work.id()).unwrap().todos();
    assert_eq!(moved.len(), 1);
    let moved = &moved[0];
    assert_ne!(moved.id(), original.id());
    assert_eq!(moved.title(), original.title());
    assert_eq!(moved.description(), original.description());
    assert_eq!(moved.due_date(), original.due_date());
    assert_eq!(moved.priority(), original.priority());
    assert_eq!(moved.notes(), original.notes());
    assert_eq!(moved.checklist(), original.checklist());
    assert!(moved.is_completed());
}

#[test]
fn move_todo_rejects_missing_endpoints() {
    let mut h = Harness::fresh();
    let inbox = h.inbox_id();
    let work = h.controller.add_project("Work").unwrap();
    let todo_id = h.add_titled(&inbox, "stay");

    assert!(!h.controller.move_todo(&inbox, "project-missing", &todo_id));
    assert!(!h.controller.move_todo("project-missing", work.id(), &todo_id));
    assert!(!h.controller.move_todo(work.id(), &inbox, &todo_id));
    assert!(h.controller.todo(&inbox, &todo_id).is_some());
    assert_eq!(h.effects(), (0, 0));
}

#[test]
fn move_todo_within_one_project_reissues_id_at_the_end() {
    let mut h = Harness::fresh();
    let inbox = h.inbox_id();
    let first = h.add_titled(&inbox, "first");
    h.add_titled(&inbox, "second");

    assert!(h.controller.move_todo(&inbox, &inbox, &first));

    let todos = h.controller.project(&inbox).unwrap().todos();
    assert_eq!(todos.len(), 2);
    assert_eq!(todos[0].title(), "second");
    assert_eq!(todos[1].title(), "first");
    assert_ne!(todos[1].id(), first);
    assert_eq!(h.effects(), (1, 1));
}

#[test]
fn checklist_operations_delegate_and_commit() {
    let mut h = Harness::fresh();
    let inbox = h.inbox_id();
    let todo_id = h.add_titled(&inbox, "pack");

    assert!(h.controller.add_checklist_item(&inbox, &todo_id, "  socks "));
    assert!(h.controller.add_checklist_item(&inbox, &todo_id, "shoes"));
    assert!(h.controller.toggle_checklist_item(&inbox, &todo_id, 1));
    assert!(h.controller.remove_checklist_item(&inbox, &todo_id, 0));
    assert_eq!(h.effects(), (4, 4));

    let items = h.controller.todo(&inbox, &todo_id).unwrap().checklist();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].text, "shoes");
    assert!(items[0].completed);
}

#[test]
fn checklist_out_of_range_index_still_reports_success() {
    let mut h = Harness::fresh();
    let inbox = h.inbox_id();
    let todo_id = h.add_titled(&inbox, "empty list");

    assert!(h.controller.toggle_checklist_item(&inbox, &todo_id, 9));
    assert!(h.controller.remove_checklist_item(&inbox, &todo_id, 9));
    assert_eq!(h.effects(), (2, 2));
}

#[test]
fn checklist_rejections_have_no_effects() {
    let mut h = Harness::fresh();
    let inbox = h.inbox_id();
    let todo_id = h.add_titled(&inbox, "list");

    assert!(!h.controller.add_checklist_item(&inbox, &todo_id, "   "));
    assert!(!h.controller.add_checklist_item(&inbox, "todo-missing", "x"));
    assert!(!h.controller.toggle_checklist_item(&inbox, "todo-missing", 0));
    assert!(!h.controller.remove_checklist_item("project-missing", &todo_id, 0));
    assert_eq!(h.effects(), (0, 0));
}

#[test]
fn sort_project_todos_reorders_and_commits() {
    let mut h = Harness::fresh();
    let inbox = h.inbox_id();
    for (title, priority) in [("a", "low"), ("b", "urgent"), ("c", "medium")] {
        h.controller
            .add_todo(
                &inbox,
                NewTodo {
                    priority: Some(priority.to_string()),
                    ..NewTodo::titled(title)
                },
            )
            .unwrap();
    }
    h.reset();

    assert!(h.controller.sort_project_todos(&inbox, TodoSort::Priority));
    let priorities: Vec<_> = h
        .controller
        .project(&inbox)
        .unwrap()
        .iter_todos()
        .map(|todo| todo.priority())
        .collect();
    assert_eq!(
        priorities,
        [Priority::Urgent, Priority::Medium, Priority::Low]
    );
    assert_eq!(h.effects(), (1, 1));

    h.reset();
    assert!(!h
        .controller
        .sort_project_todos("project-missing", TodoSort::DueDate));
    assert_eq!(h.effects(), (0, 0));
}

#[test]
fn stats_aggregate_across_projects() {
    let mut h = Harness::fresh();
    let inbox = h.inbox_id();
    let done = h.add_titled(&inbox, "one");
    h.add_titled(&inbox, "two");
    h.add_titled(&inbox, "three");
    h.controller.toggle_todo_complete(&inbox, &done);

    let errands = h.controller.add_project("Errands").unwrap();
    h.controller
        .add_todo(
            errands.id(),
            NewTodo {
                due_date: Some("2024-01-10".to_string()),
                ..NewTodo::titled("late")
            },
        )
        .unwrap();
    h.controller
        .add_todo(
            errands.id(),
            NewTodo {
                due_date: Some("2024-12-31".to_string()),
                ..NewTodo::titled("later")
            },
        )
        .unwrap();
    h.reset();

    let stats = h.controller.stats_on(day(2024, 6, 1));

    assert_eq!(
        stats,
        AppStats {
            total_projects: 2,
            total_todos: 5,
            completed_todos: 1,
            pending_todos: 4,
            overdue_todos: 1,
        }
    );
    assert_eq!(h.effects(), (0, 0));
}

#[test]
fn read_accessors_return_detached_copies() {
    let mut h = Harness::fresh();
    let inbox = h.inbox_id();
    h.add_titled(&inbox, "protected");

    let mut projects = h.controller.projects();
    projects[0].set_name("Hacked");
    projects.clear();
    let mut todos = h.controller.project(&inbox).unwrap().todos();
    todos[0].set_title("hacked too");

    assert_eq!(h.controller.project_count(), 1);
    let project = h.controller.project(&inbox).unwrap();
    assert_eq!(project.name(), DEFAULT_PROJECT_NAME);
    assert_eq!(project.todos()[0].title(), "protected");
}

#[test]
fn refused_saves_keep_in_memory_session_working() {
    let mut h = Harness::over(CountingStore {
        refuse: true,
        ..CountingStore::default()
    });
    h.reset();
    let inbox = h.inbox_id();

    let project = h.controller.add_project("Offline").unwrap();
    let todo = h
        .controller
        .add_todo(project.id(), NewTodo::titled("still works"))
        .unwrap();

    assert_eq!(h.controller.project_count(), 2);
    assert!(h.controller.todo(project.id(), todo.id()).is_some());
    assert!(h.controller.project(&inbox).is_some());
    assert_eq!(h.effects(), (0, 2));
    assert!(!h.store.contains_key(STORAGE_KEY));
}

#[test]
fn later_subscription_replaces_earlier_one() {
    let mut h = Harness::fresh();
    let second = Rc::new(Cell::new(0));
    let counter = second.clone();
    h.controller.on_change(move || counter.set(counter.get() + 1));

    h.controller.add_project("Replaced").unwrap();

    assert_eq!(second.get(), 1);
    assert_eq!(h.notifications.get(), 0);
}
