//! Core domain logic for TaskNest.
//! This crate is the single source of truth for project/todo invariants.

pub mod logging;
pub mod model;
pub mod service;
pub mod storage;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::ids::{ChecklistItemId, ProjectId, TodoId};
pub use model::project::{Project, TodoSort, DEFAULT_PROJECT_NAME};
pub use model::todo::{
    parse_due_date, parse_due_timestamp, ChecklistItem, NewTodo, Priority, Todo, TodoPatch,
};
pub use model::UNTITLED;
pub use service::app_controller::{AppController, AppStats, ChangeListener};
pub use storage::{ProjectStorage, StorageError, STORAGE_KEY};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
