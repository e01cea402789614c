use crate::validation::{day_stamp, normalize_timestamp};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

/// Opaque task identifier, assigned once and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value.trim().to_string())
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.trim().to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// 1-based menu index.
    pub fn from_choice(choice: u8) -> Option<Self> {
        let index = usize::from(choice).checked_sub(1)?;
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let key = canonical_label(raw);
        if let Ok(choice) = key.parse::<u8>() {
            return Self::from_choice(choice)
                .ok_or_else(|| format!("priority must be 1-{}", Self::ALL.len()));
        }

        match key.as_str() {
            "low" | "baja" => Ok(Self::Low),
            "medium" | "media" => Ok(Self::Medium),
            "high" | "alta" => Ok(Self::High),
            _ => Err(format!("unknown priority '{}'", raw.trim())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Done,
    Cancelled,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Done,
        TaskStatus::Cancelled,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }

    /// 1-based menu index.
    pub fn from_choice(choice: u8) -> Option<Self> {
        let index = usize::from(choice).checked_sub(1)?;
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let key = canonical_label(raw);
        if let Ok(choice) = key.parse::<u8>() {
            return Self::from_choice(choice)
                .ok_or_else(|| format!("status must be 1-{}", Self::ALL.len()));
        }

        match key.as_str() {
            "pending" | "pendiente" => Ok(Self::Pending),
            "in_progress" | "en_progreso" | "en_curso" => Ok(Self::InProgress),
            "done" | "completed" | "completada" | "terminada" => Ok(Self::Done),
            "cancelled" | "canceled" | "cancelada" => Ok(Self::Cancelled),
            _ => Err(format!("unknown status '{}'", raw.trim())),
        }
    }
}

fn canonical_label(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|ch| match ch {
            '-' | ' ' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Difficulty(u8);

impl Difficulty {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;
    pub const DEFAULT: Difficulty = Difficulty(3);

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX)
            .contains(&value)
            .then_some(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Construction input for [`Task::create`]. Text and due-date checks are
/// the caller's job; see [`crate::validation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub id: Option<TaskId>,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub difficulty: Option<Difficulty>,
    pub created_at: Option<OffsetDateTime>,
    pub due_at: OffsetDateTime,
    pub last_edited_at: Option<OffsetDateTime>,
}

impl TaskDraft {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        priority: Priority,
        status: TaskStatus,
        due_at: OffsetDateTime,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: description.into(),
            priority,
            status,
            difficulty: None,
            created_at: None,
            due_at,
            last_edited_at: None,
        }
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }
}

/// A single-field edit. `id` and `created_at` cannot be updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskUpdate {
    Title(String),
    Description(String),
    Priority(Priority),
    Status(TaskStatus),
    Difficulty(Difficulty),
    DueAt(OffsetDateTime),
}

impl TaskUpdate {
    pub fn field(&self) -> &'static str {
        match self {
            Self::Title(_) => "title",
            Self::Description(_) => "description",
            Self::Priority(_) => "priority",
            Self::Status(_) => "status",
            Self::Difficulty(_) => "difficulty",
            Self::DueAt(_) => "due_at",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: TaskId,
    title: String,
    description: String,
    priority: Priority,
    status: TaskStatus,
    difficulty: Difficulty,
    created_at: OffsetDateTime,
    due_at: OffsetDateTime,
    last_edited_at: OffsetDateTime,
}

impl Task {
    /// Build a task. Missing creation/edit stamps default to the local day of
    /// `now` at the reference hour; `last_edited_at` never precedes
    /// `created_at`.
    pub fn create(draft: TaskDraft, now: OffsetDateTime) -> Self {
        let default_stamp = day_stamp(now);
        let created_at = draft
            .created_at
            .map(normalize_timestamp)
            .unwrap_or(default_stamp);
        let last_edited_at = draft
            .last_edited_at
            .map(normalize_timestamp)
            .unwrap_or(default_stamp)
            .max(created_at);

        Self {
            id: draft.id.unwrap_or_else(TaskId::generate),
            title: draft.title,
            description: draft.description,
            priority: draft.priority,
            status: draft.status,
            difficulty: draft.difficulty.unwrap_or_default(),
            created_at,
            due_at: normalize_timestamp(draft.due_at),
            last_edited_at,
        }
    }

    /// Copy with one field replaced and `last_edited_at` set to `now`.
    pub fn with_update(&self, update: TaskUpdate, now: OffsetDateTime) -> Self {
        let mut next = self.clone();
        match update {
            TaskUpdate::Title(title) => next.title = title,
            TaskUpdate::Description(description) => next.description = description,
            TaskUpdate::Priority(priority) => next.priority = priority,
            TaskUpdate::Status(status) => next.status = status,
            TaskUpdate::Difficulty(difficulty) => next.difficulty = difficulty,
            TaskUpdate::DueAt(due_at) => next.due_at = normalize_timestamp(due_at),
        }
        next.last_edited_at = normalize_timestamp(now).max(next.created_at);
        next
    }

    pub(crate) fn with_id(mut self, id: TaskId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn due_at(&self) -> OffsetDateTime {
        self.due_at
    }

    pub fn last_edited_at(&self) -> OffsetDateTime {
        self.last_edited_at
    }
}
