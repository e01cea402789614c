use crate::cli::Command;
use crate::console::Console;
use crate::render;
use std::io::{BufRead, Write};
use tasklist_core::config::Palette;
use tasklist_core::error::AppError;
use tasklist_core::model::{Difficulty, Priority, Task, TaskDraft, TaskId, TaskStatus, TaskUpdate};
use tasklist_core::task_api::TaskSession;
use tasklist_core::validation::{self, parse_difficulty, parse_due_date, require_text};

pub struct RunOptions {
    pub json: bool,
    /// Missing fields are prompted for instead of rejected.
    pub interactive: bool,
    pub palette: Palette,
}

fn parse_task_id(raw: &str) -> Result<TaskId, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("id is required"));
    }
    Ok(TaskId::from(trimmed))
}

fn not_found(id: &TaskId) -> AppError {
    AppError::not_found(format!("task {id} not found"))
}

pub fn run_command<R: BufRead, W: Write>(
    command: Command,
    session: &mut TaskSession,
    console: &mut Console<R, W>,
    options: &RunOptions,
) -> Result<(), AppError> {
    match command {
        Command::Add {
            title,
            description,
            priority,
            status,
            due,
            difficulty,
        } => {
            let today = validation::today();
            let interactive = options.interactive;

            let title = match title {
                Some(value) => require_text("title", &value)?,
                None if interactive => console.ask_title()?,
                None => return Err(AppError::invalid_input("title is required")),
            };
            let description = match description {
                Some(value) => require_text("description", &value)?,
                None if interactive => console.ask_description()?,
                None => return Err(AppError::invalid_input("description is required")),
            };
            let priority = match priority {
                Some(value) => value,
                None if interactive => console.ask_priority()?,
                None => Priority::Medium,
            };
            let status = match status {
                Some(value) => value,
                None if interactive => console.ask_status()?,
                None => TaskStatus::Pending,
            };
            let due_at = match due {
                Some(value) => parse_due_date(&value, today)?,
                None if interactive => console.ask_due_date(today)?,
                None => return Err(AppError::invalid_input("due date is required (--due YYYY-MM-DD)")),
            };
            let difficulty = match difficulty {
                Some(value) => parse_difficulty(&value)?,
                None if interactive => console.ask_difficulty()?,
                None => Difficulty::DEFAULT,
            };

            let draft = TaskDraft::new(title, description, priority, status, due_at)
                .with_difficulty(difficulty);
            let task = session.add(draft)?;
            report_task(console, options, &task, "Added task")?;
        }
        Command::List {
            status,
            priority,
            sort,
            desc,
        } => {
            if let Some(criterion) = sort {
                session.sort_by(criterion, !desc);
            }

            let store = session.store();
            let tasks: Vec<&Task> = match (status, priority) {
                (Some(status), priority) => store
                    .filter_by_status(status)
                    .filter(|task| priority.is_none_or(|p| task.priority() == p))
                    .collect(),
                (None, Some(priority)) => store.filter_by_priority(priority).collect(),
                (None, None) => store.iter().collect(),
            };

            let out = console.output();
            if options.json {
                writeln!(out, "{}", render::tasks_json(&tasks))?;
            } else {
                if let Some(status) = status {
                    writeln!(out, "{}", options.palette.heading(&render::status_heading(status)))?;
                }
                writeln!(out, "{}", render::task_table(&tasks, &options.palette))?;
            }
        }
        Command::Show { id } => {
            let id = parse_task_id(&id)?;
            let task = session.get(&id).ok_or_else(|| not_found(&id))?;
            let out = console.output();
            if options.json {
                writeln!(out, "{}", render::task_json(task))?;
            } else {
                writeln!(out, "{}", render::task_detail(task, &options.palette))?;
            }
        }
        Command::Edit {
            id,
            title,
            description,
            priority,
            status,
            due,
            difficulty,
        } => {
            let id = parse_task_id(&id)?;
            if session.get(&id).is_none() {
                return Err(not_found(&id));
            }

            let today = validation::today();
            let mut updates = Vec::new();
            if let Some(value) = title {
                updates.push(TaskUpdate::Title(require_text("title", &value)?));
            }
            if let Some(value) = description {
                updates.push(TaskUpdate::Description(require_text("description", &value)?));
            }
            if let Some(value) = priority {
                updates.push(TaskUpdate::Priority(value));
            }
            if let Some(value) = status {
                updates.push(TaskUpdate::Status(value));
            }
            if let Some(value) = due {
                updates.push(TaskUpdate::DueAt(parse_due_date(&value, today)?));
            }
            if let Some(value) = difficulty {
                updates.push(TaskUpdate::Difficulty(parse_difficulty(&value)?));
            }

            if updates.is_empty() {
                if !options.interactive {
                    return Err(AppError::invalid_input("nothing to edit"));
                }
                updates.push(console.ask_field_update(today)?);
            }

            let mut latest = None;
            for update in updates {
                latest = Some(session.update(&id, update)?.ok_or_else(|| not_found(&id))?);
            }
            if let Some(task) = latest {
                report_task(console, options, &task, "Updated task")?;
            }
        }
        Command::Delete { id } => {
            let id = parse_task_id(&id)?;
            let task = session.remove(&id).ok_or_else(|| not_found(&id))?;
            report_task(console, options, &task, "Deleted task")?;
        }
        Command::Search { term } => {
            let tasks: Vec<&Task> = session.store().search(&term).collect();
            let out = console.output();
            if options.json {
                writeln!(out, "{}", render::tasks_json(&tasks))?;
            } else if tasks.is_empty() {
                writeln!(out, "No tasks match '{}'.", term.trim())?;
            } else {
                writeln!(out, "{}", render::task_table(&tasks, &options.palette))?;
            }
        }
        Command::Stats => {
            let out = console.output();
            if options.json {
                writeln!(out, "{}", render::stats_json(session.store()))?;
            } else {
                writeln!(out, "{}", render::stats_plain(session.store(), &options.palette))?;
            }
        }
    }

    if let Some(err) = session.last_save_error() {
        writeln!(
            console.output(),
            "Warning: could not write {}, changes are kept in memory only ({err})",
            session.path().display()
        )?;
    }

    Ok(())
}

fn report_task<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    options: &RunOptions,
    task: &Task,
    verb: &str,
) -> Result<(), AppError> {
    let out = console.output();
    if options.json {
        writeln!(out, "{}", render::task_json(task))?;
    } else {
        writeln!(out, "{verb}: {} ({})", task.title(), task.id())?;
    }
    Ok(())
}
