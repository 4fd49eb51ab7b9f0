//! Subcommand definitions and their mapping onto controller operations.

use anyhow::{bail, Context, Result};
use clap::{Subcommand, ValueEnum};
use tasknest_core::{
    AppController, ChecklistItem, FileStore, NewTodo, Project, ProjectStorage, Todo, TodoPatch,
    TodoSort,
};

#[derive(Subcommand)]
pub(crate) enum Command {
    /// List projects with their counters.
    Projects,
    AddProject {
        name: String,
    },
    RenameProject {
        project: String,
        name: String,
    },
    DeleteProject {
        project: String,
    },
    /// List todos of one project (the active one by default).
    Todos {
        #[arg(long)]
        project: Option<String>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    AddTodo {
        title: String,
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// ISO date, e.g. 2024-03-15.
        #[arg(long)]
        due: Option<String>,
        /// low|medium|high|urgent
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Initial checklist entries; repeatable.
        #[arg(long = "check")]
        checklist: Vec<String>,
    },
    UpdateTodo {
        todo: String,
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        #[arg(long, default_value_t = false)]
        clear_due: bool,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        completed: Option<bool>,
    },
    Toggle {
        todo: String,
        #[arg(long)]
        project: Option<String>,
    },
    DeleteTodo {
        todo: String,
        #[arg(long)]
        project: Option<String>,
    },
    /// Move a todo between projects. The todo gets a new id.
    MoveTodo {
        todo: String,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: String,
    },
    CheckAdd {
        todo: String,
        text: String,
        #[arg(long)]
        project: Option<String>,
    },
    CheckToggle {
        todo: String,
        index: usize,
        #[arg(long)]
        project: Option<String>,
    },
    CheckRemove {
        todo: String,
        index: usize,
        #[arg(long)]
        project: Option<String>,
    },
    Sort {
        #[arg(value_enum)]
        by: SortKey,
        #[arg(long)]
        project: Option<String>,
    },
    Stats,
    /// Remove all persisted data.
    Clear,
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum SortKey {
    Due,
    Priority,
}

impl From<SortKey> for TodoSort {
    fn from(value: SortKey) -> Self {
        match value {
            SortKey::Due => TodoSort::DueDate,
            SortKey::Priority => TodoSort::Priority,
        }
    }
}

type Controller = AppController<FileStore>;

/// Runs one command against an initialized controller.
pub(crate) fn run(controller: &mut Controller, command: Command) -> Result<()> {
    match command {
        Command::Projects => {
            let active = controller.active_project_id().map(str::to_string);
            for project in controller.projects() {
                let marker = if active.as_deref() == Some(project.id()) {
                    "*"
                } else {
                    " "
                };
                println!(
                    "{marker} {}  {}  total={} done={} pending={}",
                    project.id(),
                    project.name(),
                    project.todo_count(),
                    project.completed_count(),
                    project.pending_count()
                );
            }
        }
        Command::AddProject { name } => {
            let project = controller
                .add_project(&name)
                .context("project name must not be blank")?;
            println!("{}", project.id());
        }
        Command::RenameProject { project, name } => {
            let id = resolve_project(controller, Some(project.as_str()))?;
            ensure(controller.update_project(&id, &name), "rename rejected")?;
        }
        Command::DeleteProject { project } => {
            let id = resolve_project(controller, Some(project.as_str()))?;
            ensure(
                controller.delete_project(&id),
                "cannot delete the last remaining project",
            )?;
        }
        Command::Todos { project, json } => {
            let id = resolve_project(controller, project.as_deref())?;
            let todos = controller
                .project(&id)
                .map(Project::todos)
                .unwrap_or_default();
            if json {
                println!("{}", serde_json::to_string_pretty(&todos)?);
            } else {
                todos.iter().for_each(print_todo);
            }
        }
        Command::AddTodo {
            title,
            project,
            description,
            due,
            priority,
            notes,
            checklist,
        } => {
            let id = resolve_project(controller, project.as_deref())?;
            let data = NewTodo {
                title,
                description,
                due_date: due,
                priority,
                notes,
                checklist: checklist
                    .iter()
                    .map(|text| text.trim())
                    .filter(|text| !text.is_empty())
                    .map(ChecklistItem::new)
                    .collect(),
            };
            let todo = controller
                .add_todo(&id, data)
                .context("todo title must not be blank")?;
            println!("{}", todo.id());
        }
        Command::UpdateTodo {
            todo,
            project,
            title,
            description,
            due,
            clear_due,
            priority,
            notes,
            completed,
        } => {
            let id = resolve_project(controller, project.as_deref())?;
            let patch = TodoPatch {
                title,
                description,
                due_date: if clear_due { Some(None) } else { due.map(Some) },
                priority,
                notes,
                completed,
            };
            if patch.is_empty() {
                bail!("nothing to update");
            }
            ensure(controller.update_todo(&id, &todo, &patch), "todo not found")?;
        }
        Command::Toggle { todo, project } => {
            let id = resolve_project(controller, project.as_deref())?;
            ensure(controller.toggle_todo_complete(&id, &todo), "todo not found")?;
        }
        Command::DeleteTodo { todo, project } => {
            let id = resolve_project(controller, project.as_deref())?;
            ensure(controller.delete_todo(&id, &todo), "todo not found")?;
        }
        Command::MoveTodo { todo, from, to } => {
            let from = resolve_project(controller, from.as_deref())?;
            let to = resolve_project(controller, Some(to.as_str()))?;
            ensure(controller.move_todo(&from, &to, &todo), "todo not found")?;
        }
        Command::CheckAdd {
            todo,
            text,
            project,
        } => {
            let id = resolve_project(controller, project.as_deref())?;
            ensure(
                controller.add_checklist_item(&id, &todo, &text),
                "todo not found or text blank",
            )?;
        }
        Command::CheckToggle {
            todo,
            index,
            project,
        } => {
            let id = resolve_project(controller, project.as_deref())?;
            ensure(
                controller.toggle_checklist_item(&id, &todo, index),
                "todo not found",
            )?;
        }
        Command::CheckRemove {
            todo,
            index,
            project,
        } => {
            let id = resolve_project(controller, project.as_deref())?;
            ensure(
                controller.remove_checklist_item(&id, &todo, index),
                "todo not found",
            )?;
        }
        Command::Sort { by, project } => {
            let id = resolve_project(controller, project.as_deref())?;
            ensure(controller.sort_project_todos(&id, by.into()), "project not found")?;
        }
        Command::Stats => {
            let stats = controller.stats();
            println!("projects:  {}", stats.total_projects);
            println!("todos:     {}", stats.total_todos);
            println!("completed: {}", stats.completed_todos);
            println!("pending:   {}", stats.pending_todos);
            println!("overdue:   {}", stats.overdue_todos);
        }
        Command::Clear => bail!("clear runs before the controller starts"),
    }
    Ok(())
}

/// Removes the persisted blob without bootstrapping a controller first.
pub(crate) fn clear(store: FileStore) -> Result<()> {
    let mut storage = ProjectStorage::new(store);
    ensure(storage.clear_data(), "storage is not available")
}

/// Resolves a project by id, then by exact name; `None` means the active one.
fn resolve_project(controller: &Controller, reference: Option<&str>) -> Result<String> {
    let Some(reference) = reference else {
        return controller
            .active_project()
            .map(|project| project.id().to_string())
            .context("no active project");
    };
    if let Some(project) = controller.project(reference) {
        return Ok(project.id().to_string());
    }
    controller
        .projects()
        .into_iter()
        .find(|project| project.name() == reference.trim())
        .map(|project| project.id().to_string())
        .with_context(|| format!("project not found: {reference}"))
}

fn ensure(ok: bool, message: &str) -> Result<()> {
    if !ok {
        bail!("{message}");
    }
    Ok(())
}

fn print_todo(todo: &Todo) {
    let mark = if todo.is_completed() { "x" } else { " " };
    let overdue = if todo.is_overdue() { " OVERDUE" } else { "" };
    println!(
        "[{mark}] {}  {} ({}{}){}",
        todo.id(),
        todo.title(),
        todo.priority(),
        todo.due_date()
            .map(|due| format!(", due {due}"))
            .unwrap_or_default(),
        overdue
    );
    for (index, item) in todo.checklist().iter().enumerate() {
        let check = if item.completed { "x" } else { " " };
        println!("      {index}. [{check}] {}", item.text);
    }
}
