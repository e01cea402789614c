//! In-memory ordered task collection.

mod stats;

pub use stats::round_percent;

use crate::model::{Priority, Task, TaskDraft, TaskId, TaskStatus, TaskUpdate};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortCriterion {
    Title,
    DueAt,
    CreatedAt,
    Difficulty,
}

impl SortCriterion {
    pub const ALL: [SortCriterion; 4] = [
        SortCriterion::Title,
        SortCriterion::DueAt,
        SortCriterion::CreatedAt,
        SortCriterion::Difficulty,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::DueAt => "due_at",
            Self::CreatedAt => "created_at",
            Self::Difficulty => "difficulty",
        }
    }

    fn compare(self, a: &Task, b: &Task) -> Ordering {
        match self {
            Self::Title => compare_caseless(a.title(), b.title()),
            Self::DueAt => a.due_at().cmp(&b.due_at()),
            Self::CreatedAt => a.created_at().cmp(&b.created_at()),
            Self::Difficulty => a.difficulty().cmp(&b.difficulty()),
        }
    }
}

impl fmt::Display for SortCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SortCriterion {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "title" => Ok(Self::Title),
            "due" | "due_at" | "due_date" => Ok(Self::DueAt),
            "created" | "created_at" => Ok(Self::CreatedAt),
            "difficulty" => Ok(Self::Difficulty),
            other => {
                let expected: Vec<&str> = Self::ALL.iter().map(|c| c.label()).collect();
                Err(format!(
                    "unknown sort criterion '{other}' (expected one of: {})",
                    expected.join(", ")
                ))
            }
        }
    }
}

fn compare_caseless(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

#[derive(Debug, Default, Clone)]
pub struct TaskStore {
    tasks: Vec<Task>,
    retired: HashSet<TaskId>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from persisted records, keeping their ids.
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        let mut store = Self::new();
        for task in tasks {
            store.insert_loaded(task);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> + '_ {
        self.tasks.iter()
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.tasks.iter().any(|task| task.id() == id)
    }

    fn fresh_id(&self) -> TaskId {
        loop {
            let id = TaskId::generate();
            if !self.contains(&id) && !self.retired.contains(&id) {
                return id;
            }
        }
    }

    pub fn add(&mut self, draft: TaskDraft, now: OffsetDateTime) -> &Task {
        let id = self.fresh_id();
        let task = Task::create(draft, now).with_id(id);
        tracing::debug!(id = %task.id(), "task added");
        self.push(task)
    }

    /// Append a task that already carries an id. Blank or colliding ids are
    /// replaced with a fresh one.
    pub fn insert_loaded(&mut self, task: Task) -> &Task {
        let task = if task.id().as_str().is_empty() {
            task.with_id(self.fresh_id())
        } else if self.contains(task.id()) || self.retired.contains(task.id()) {
            let id = self.fresh_id();
            tracing::warn!(duplicate = %task.id(), replacement = %id, "duplicate task id reassigned");
            task.with_id(id)
        } else {
            task
        };
        self.push(task)
    }

    fn push(&mut self, task: Task) -> &Task {
        let index = self.tasks.len();
        self.tasks.push(task);
        &self.tasks[index]
    }

    fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id() == id)
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id() == id)
    }

    pub fn remove(&mut self, id: &TaskId) -> Option<Task> {
        let index = self.position(id)?;
        let removed = self.tasks.remove(index);
        self.retired.insert(removed.id().clone());
        Some(removed)
    }

    pub fn update(&mut self, id: &TaskId, update: TaskUpdate, now: OffsetDateTime) -> Option<&Task> {
        let index = self.position(id)?;
        let field = update.field();
        let updated = self.tasks[index].with_update(update, now);
        self.tasks[index] = updated;
        tracing::debug!(id = %id, field, "task updated");
        Some(&self.tasks[index])
    }

    pub fn filter_by_status(&self, status: TaskStatus) -> impl Iterator<Item = &Task> + '_ {
        self.tasks.iter().filter(move |task| task.status() == status)
    }

    pub fn filter_by_priority(&self, priority: Priority) -> impl Iterator<Item = &Task> + '_ {
        self.tasks
            .iter()
            .filter(move |task| task.priority() == priority)
    }

    /// Case-insensitive substring match on title or description. An empty
    /// term matches every task.
    pub fn search(&self, term: &str) -> impl Iterator<Item = &Task> + '_ {
        let needle = term.to_lowercase();
        self.tasks.iter().filter(move |task| {
            task.title().to_lowercase().contains(&needle)
                || task.description().to_lowercase().contains(&needle)
        })
    }

    /// Stable sort; equal keys keep their current relative order in both
    /// directions.
    pub fn sort_by(&mut self, criterion: SortCriterion, ascending: bool) {
        if ascending {
            self.tasks.sort_by(|a, b| criterion.compare(a, b));
        } else {
            self.tasks.sort_by(|a, b| criterion.compare(b, a));
        }
    }
}
