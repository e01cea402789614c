use crate::error::AppError;
use crate::model::{Task, TaskDraft, TaskId, TaskUpdate};
use crate::storage::json_store;
use crate::store::{SortCriterion, TaskStore};
use crate::validation::{self, require_text, validate_due_date};
use std::path::{Path, PathBuf};
use time::{Date, OffsetDateTime};

/// A task store bound to its file. Every successful mutation rewrites the
/// file; a failed write is logged and kept in `last_save_error` while the
/// in-memory state stays authoritative.
#[derive(Debug)]
pub struct TaskSession {
    store: TaskStore,
    path: PathBuf,
    load_error: Option<AppError>,
    last_save_error: Option<AppError>,
}

impl TaskSession {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let load = json_store::load_with_fallback(&path);
        if let Some(err) = load.error.as_ref() {
            tracing::error!(
                path = %path.display(),
                error = %err,
                "could not load tasks, starting with an empty list"
            );
        }

        let stored_ids: Vec<TaskId> = load.tasks.iter().map(|task| task.id().clone()).collect();
        let store = TaskStore::from_tasks(load.tasks);
        let reassigned = store
            .iter()
            .zip(&stored_ids)
            .filter(|(task, id)| task.id() != *id)
            .count();

        let mut session = Self {
            store,
            path,
            load_error: load.error,
            last_save_error: None,
        };

        // Ids handed out while loading must survive read-only runs.
        let assigned = load.fresh_ids + reassigned;
        if assigned > 0 {
            tracing::info!(assigned, "saving newly assigned task ids");
            session.persist();
        }
        session
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_error(&self) -> Option<&AppError> {
        self.load_error.as_ref()
    }

    pub fn last_save_error(&self) -> Option<&AppError> {
        self.last_save_error.as_ref()
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.store.get(id)
    }

    pub fn add(&mut self, draft: TaskDraft) -> Result<Task, AppError> {
        self.add_at(draft, validation::today(), validation::now())
    }

    /// Rejects blank text and due dates that are not after `today`; nothing
    /// is stored or written on rejection.
    pub fn add_at(
        &mut self,
        mut draft: TaskDraft,
        today: Date,
        now: OffsetDateTime,
    ) -> Result<Task, AppError> {
        draft.title = require_text("title", &draft.title)?;
        draft.description = require_text("description", &draft.description)?;
        validate_due_date(draft.due_at.date(), today)?;

        let task = self.store.add(draft, now).clone();
        self.persist();
        Ok(task)
    }

    pub fn update(&mut self, id: &TaskId, update: TaskUpdate) -> Result<Option<Task>, AppError> {
        self.update_at(id, update, validation::today(), validation::now())
    }

    /// `Ok(None)` when no task has `id`; the file is not rewritten then.
    pub fn update_at(
        &mut self,
        id: &TaskId,
        update: TaskUpdate,
        today: Date,
        now: OffsetDateTime,
    ) -> Result<Option<Task>, AppError> {
        let update = match update {
            TaskUpdate::Title(title) => TaskUpdate::Title(require_text("title", &title)?),
            TaskUpdate::Description(description) => {
                TaskUpdate::Description(require_text("description", &description)?)
            }
            TaskUpdate::DueAt(due_at) => {
                validate_due_date(due_at.date(), today)?;
                TaskUpdate::DueAt(due_at)
            }
            other => other,
        };

        let Some(task) = self.store.update(id, update, now).cloned() else {
            return Ok(None);
        };
        self.persist();
        Ok(Some(task))
    }

    /// `None` when no task has `id`; the file is not rewritten then.
    pub fn remove(&mut self, id: &TaskId) -> Option<Task> {
        let removed = self.store.remove(id)?;
        self.persist();
        Some(removed)
    }

    pub fn sort_by(&mut self, criterion: SortCriterion, ascending: bool) {
        self.store.sort_by(criterion, ascending);
        self.persist();
    }

    pub fn save(&self) -> Result<(), AppError> {
        json_store::save_tasks(&self.path, self.store.tasks())
    }

    fn persist(&mut self) {
        match self.save() {
            Ok(()) => self.last_save_error = None,
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "could not save tasks, keeping changes in memory"
                );
                self.last_save_error = Some(err);
            }
        }
    }
}
