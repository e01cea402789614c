use crate::config::{self, Config};
use crate::error::AppError;
use crate::model::{Difficulty, Priority, Task, TaskDraft, TaskId, TaskStatus};
use crate::validation::{self, at_reference_hour};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const STORE_FILE_NAME: &str = "tasks.json";
const STORE_ENV_VAR: &str = "TASKLIST_STORE_PATH";

/// On-disk shape of one task, as written.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredTask<'a> {
    id: &'a str,
    titulo: &'a str,
    descripcion: &'a str,
    prioridad: &'static str,
    estado: &'static str,
    dificultad: u8,
    fecha_creacion: Option<String>,
    fecha_ultima_edicion: Option<String>,
    fecha_vencimiento: Option<String>,
}

impl<'a> From<&'a Task> for StoredTask<'a> {
    fn from(task: &'a Task) -> Self {
        Self {
            id: task.id().as_str(),
            titulo: task.title(),
            descripcion: task.description(),
            prioridad: task.priority().label(),
            estado: task.status().label(),
            dificultad: task.difficulty().value(),
            fecha_creacion: format_timestamp(task.created_at()),
            fecha_ultima_edicion: format_timestamp(task.last_edited_at()),
            fecha_vencimiento: format_timestamp(task.due_at()),
        }
    }
}

/// On-disk shape of one task, as read. Fields stay untyped JSON so that a
/// wrongly typed value only affects its own record.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawTask {
    id: Value,
    titulo: Value,
    descripcion: Value,
    prioridad: Value,
    estado: Value,
    dificultad: Value,
    fecha_creacion: Value,
    fecha_ultima_edicion: Value,
    fecha_vencimiento: Value,
}

impl RawTask {
    /// Text ids are kept as written; numeric ids only when they are
    /// non-negative integers.
    fn stored_id(&self) -> Option<TaskId> {
        match &self.id {
            Value::String(text) if !text.trim().is_empty() => Some(TaskId::from(text.as_str())),
            Value::Number(number) => number.as_u64().map(|n| TaskId::from(n.to_string())),
            _ => None,
        }
    }

    fn into_task(self, now: OffsetDateTime) -> Result<Task, String> {
        let title = text(&self.titulo);
        if title.trim().is_empty() {
            return Err("title is missing or blank".to_string());
        }
        let description = text(&self.descripcion);
        if description.trim().is_empty() {
            return Err("description is missing or blank".to_string());
        }

        let priority: Priority = text(&self.prioridad).parse()?;
        let status: TaskStatus = text(&self.estado).parse()?;
        let difficulty = stored_difficulty(&self.dificultad).unwrap_or_else(|| {
            tracing::warn!(value = %self.dificultad, "difficulty out of range, using default");
            Difficulty::DEFAULT
        });

        let due_at = timestamp(&self.fecha_vencimiento).unwrap_or(now);
        let mut draft = TaskDraft::new(title, description, priority, status, due_at)
            .with_difficulty(difficulty);
        draft.id = self.stored_id();
        draft.created_at = timestamp(&self.fecha_creacion);
        draft.last_edited_at = timestamp(&self.fecha_ultima_edicion);

        Ok(Task::create(draft, now))
    }
}

fn text(value: &Value) -> &str {
    value.as_str().unwrap_or_default()
}

/// Absent means the default; numbers and numeric strings must be a whole
/// value in range.
fn stored_difficulty(value: &Value) -> Option<Difficulty> {
    let raw = match value {
        Value::Null => return Some(Difficulty::DEFAULT),
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if raw.fract() != 0.0 || !(1.0..=5.0).contains(&raw) {
        return None;
    }
    Difficulty::new(raw as u8)
}

fn format_timestamp(value: OffsetDateTime) -> Option<String> {
    value.format(&Rfc3339).ok()
}

/// Strings are RFC 3339 or a bare `YYYY-MM-DD` at the reference hour;
/// integers are epoch milliseconds. Anything else is treated as absent.
fn timestamp(value: &Value) -> Option<OffsetDateTime> {
    match value {
        Value::String(raw) => parse_timestamp(raw),
        Value::Number(number) => {
            let millis = number.as_i64()?;
            OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
        }
        _ => None,
    }
}

fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    OffsetDateTime::parse(raw, &Rfc3339)
        .ok()
        .or_else(|| validation::parse_date(raw).ok().map(at_reference_hour))
}

#[derive(Debug)]
pub struct StoreLoad {
    pub tasks: Vec<Task>,
    pub error: Option<AppError>,
    /// Records that had no usable id and were given a fresh one.
    pub fresh_ids: usize,
}

pub fn store_path(config: &Config) -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if let Some(path) = config.store_path.as_deref()
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    Ok(config::app_dir()?.join(STORE_FILE_NAME))
}

/// A missing file is an empty list, not an error.
pub fn load_tasks(path: &Path) -> Result<Vec<Task>, AppError> {
    read_tasks(path).map(|(tasks, _)| tasks)
}

/// Only a file that is not a JSON array fails; a bad record is skipped.
fn read_tasks(path: &Path) -> Result<(Vec<Task>, usize), AppError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no task file yet");
        return Ok((Vec::new(), 0));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let records: Vec<Value> = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;

    let now = validation::now();
    let mut tasks = Vec::with_capacity(records.len());
    let mut fresh_ids = 0;
    for (index, value) in records.into_iter().enumerate() {
        let record = match serde_json::from_value::<RawTask>(value) {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(index, error = %err, "skipping task record");
                continue;
            }
        };

        let has_id = record.stored_id().is_some();
        match record.into_task(now) {
            Ok(task) => {
                if !has_id {
                    fresh_ids += 1;
                }
                tasks.push(task);
            }
            Err(reason) => tracing::warn!(index, %reason, "skipping task record"),
        }
    }

    tracing::debug!(path = %path.display(), count = tasks.len(), fresh_ids, "tasks loaded");
    Ok((tasks, fresh_ids))
}

pub fn load_with_fallback(path: &Path) -> StoreLoad {
    match read_tasks(path) {
        Ok((tasks, fresh_ids)) => StoreLoad {
            tasks,
            error: None,
            fresh_ids,
        },
        Err(err) => StoreLoad {
            tasks: Vec::new(),
            error: Some(err),
            fresh_ids: 0,
        },
    }
}

/// Rewrites the whole file.
pub fn save_tasks(path: &Path, tasks: &[Task]) -> Result<(), AppError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|err| AppError::io(err.to_string()))?;
    }

    let stored: Vec<StoredTask<'_>> = tasks.iter().map(StoredTask::from).collect();
    let content = serde_json::to_string_pretty(&stored)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;
    std::fs::write(path, content).map_err(|err| AppError::io(err.to_string()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions).map_err(|err| AppError::io(err.to_string()))?;
    }

    tracing::debug!(path = %path.display(), count = tasks.len(), "tasks saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{load_tasks, load_with_fallback, save_tasks};
    use crate::model::{Difficulty, Priority, Task, TaskDraft, TaskId, TaskStatus};
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};
    use time::macros::datetime;

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("tasklist-{nanos}-{file_name}"))
    }

    fn sample(title: &str, id: &str) -> Task {
        let mut draft = TaskDraft::new(
            title,
            format!("{title} description"),
            Priority::High,
            TaskStatus::InProgress,
            datetime!(2026-11-30 03:00 UTC),
        )
        .with_difficulty(Difficulty::new(4).unwrap());
        draft.id = Some(TaskId::from(id));
        draft.created_at = Some(datetime!(2026-10-01 03:00 UTC));
        draft.last_edited_at = Some(datetime!(2026-10-02 14:21:09 UTC));
        Task::create(draft, datetime!(2026-10-18 10:00 UTC))
    }

    #[test]
    fn save_and_load_round_trip() {
        let path = temp_path("round-trip.json");
        let tasks = vec![sample("zeta", "id-b"), sample("alpha", "id-a")];

        save_tasks(&path, &tasks).unwrap();
        let loaded = load_tasks(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded, tasks);
    }

    #[test]
    fn missing_file_loads_empty() {
        let path = temp_path("missing.json");
        assert!(load_tasks(&path).unwrap().is_empty());

        let fallback = load_with_fallback(&path);
        assert!(fallback.tasks.is_empty());
        assert!(fallback.error.is_none());
    }

    #[test]
    fn malformed_json_falls_back_to_empty_with_error() {
        let path = temp_path("malformed.json");
        fs::write(&path, "[ { \"titulo\": ").unwrap();

        let err = load_tasks(&path).unwrap_err();
        let fallback = load_with_fallback(&path);
        fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_data");
        assert!(fallback.tasks.is_empty());
        assert_eq!(fallback.error.map(|e| e.code()), Some("invalid_data"));
    }

    #[test]
    fn writes_expected_field_names() {
        let path = temp_path("fields.json");
        save_tasks(&path, &[sample("demo", "id-1")]).unwrap();

        let stored: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        fs::remove_file(&path).ok();

        let record = &stored[0];
        assert_eq!(record["id"], "id-1");
        assert_eq!(record["titulo"], "demo");
        assert_eq!(record["descripcion"], "demo description");
        assert_eq!(record["prioridad"], "high");
        assert_eq!(record["estado"], "in_progress");
        assert_eq!(record["dificultad"], 4);
        assert!(record["fechaCreacion"].as_str().unwrap().starts_with("2026-10-01T03:00:00"));
        assert!(record["fechaUltimaEdicion"].is_string());
        assert!(record["fechaVencimiento"].is_string());
    }

    #[test]
    fn accepts_records_without_ids_or_difficulty() {
        let path = temp_path("legacy.json");
        let content = serde_json::json!([
            {
                "titulo": "Comprar pan",
                "descripcion": "En la panaderia",
                "prioridad": "Alta",
                "estado": "pendiente",
                "fechaCreacion": "2026-09-01T03:00:00.000Z",
                "fechaUltimaEdicion": null,
                "fechaVencimiento": "2026-12-24T03:00:00.000Z"
            },
            {
                "id": 7,
                "titulo": "Second",
                "descripcion": "numeric id",
                "prioridad": "low",
                "estado": "done",
                "dificultad": 1,
                "fechaVencimiento": "2026-12-25"
            }
        ]);
        fs::write(&path, content.to_string()).unwrap();

        let loaded = load_tasks(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.len(), 2);
        assert!(!loaded[0].id().as_str().is_empty());
        assert_eq!(loaded[0].priority(), Priority::High);
        assert_eq!(loaded[0].status(), TaskStatus::Pending);
        assert_eq!(loaded[0].difficulty(), Difficulty::DEFAULT);
        assert_eq!(loaded[0].created_at(), datetime!(2026-09-01 03:00 UTC));
        assert!(loaded[0].last_edited_at() >= loaded[0].created_at());
        assert_eq!(loaded[0].due_at(), datetime!(2026-12-24 03:00 UTC));

        assert_eq!(loaded[1].id().as_str(), "7");
        assert_eq!(loaded[1].difficulty().value(), 1);
        assert_eq!(loaded[1].due_at(), datetime!(2026-12-25 03:00 UTC));
    }

    #[test]
    fn bad_dates_fall_back_instead_of_failing() {
        let path = temp_path("bad-dates.json");
        let content = serde_json::json!([
            {
                "id": "a",
                "titulo": "t",
                "descripcion": "d",
                "prioridad": "medium",
                "estado": "cancelled",
                "dificultad": 9,
                "fechaCreacion": "yesterday-ish",
                "fechaUltimaEdicion": "",
                "fechaVencimiento": null
            }
        ]);
        fs::write(&path, content.to_string()).unwrap();

        let loaded = load_tasks(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].difficulty(), Difficulty::DEFAULT);
        assert!(loaded[0].last_edited_at() >= loaded[0].created_at());
        assert!(loaded[0].due_at() > datetime!(2026-01-01 00:00 UTC));
    }

    #[test]
    fn skips_records_with_unknown_labels_or_blank_text() {
        let path = temp_path("skip.json");
        let content = serde_json::json!([
            { "id": "ok", "titulo": "keep", "descripcion": "me", "prioridad": "low", "estado": "pending" },
            { "id": "p", "titulo": "x", "descripcion": "y", "prioridad": "urgent", "estado": "pending" },
            { "id": "s", "titulo": "x", "descripcion": "y", "prioridad": "low", "estado": "archived" },
            { "id": "t", "titulo": "   ", "descripcion": "y", "prioridad": "low", "estado": "pending" }
        ]);
        fs::write(&path, content.to_string()).unwrap();

        let loaded = load_tasks(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id().as_str(), "ok");
    }

    #[test]
    fn wrongly_typed_fields_only_affect_their_own_record() {
        let path = temp_path("typed.json");
        let content = serde_json::json!([
            { "id": "keep-1", "titulo": "keep", "descripcion": "me", "prioridad": "low", "estado": "pending" },
            {
                "id": -3,
                "titulo": "epoch dates",
                "descripcion": "written as milliseconds",
                "prioridad": "media",
                "estado": "done",
                "dificultad": "4",
                "fechaCreacion": 1700000000000u64,
                "fechaUltimaEdicion": { "when": "later" },
                "fechaVencimiento": "2026-12-01"
            },
            { "id": 2.5, "titulo": "odd id", "descripcion": "x", "prioridad": "high", "estado": "pending", "dificultad": true },
            { "id": "n", "titulo": 42, "descripcion": "numeric title", "prioridad": "low", "estado": "pending" },
            { "id": "l", "titulo": "t", "descripcion": "d", "prioridad": ["low"], "estado": "pending" },
            5,
            null
        ]);
        fs::write(&path, content.to_string()).unwrap();

        let fallback = load_with_fallback(&path);
        fs::remove_file(&path).ok();

        assert!(fallback.error.is_none());
        let loaded = fallback.tasks;
        let titles: Vec<_> = loaded.iter().map(|task| task.title()).collect();
        assert_eq!(titles, vec!["keep", "epoch dates", "odd id"]);
        assert_eq!(loaded[0].id().as_str(), "keep-1");

        assert_ne!(loaded[1].id().as_str(), "-3");
        assert_eq!(loaded[1].created_at(), datetime!(2023-11-14 22:13:20 UTC));
        assert!(loaded[1].last_edited_at() >= loaded[1].created_at());
        assert_eq!(loaded[1].difficulty().value(), 4);
        assert_eq!(loaded[1].due_at(), datetime!(2026-12-01 03:00 UTC));

        assert_ne!(loaded[2].id().as_str(), "2.5");
        assert_eq!(loaded[2].difficulty(), Difficulty::DEFAULT);
        assert_eq!(fallback.fresh_ids, 2);
    }

    #[test]
    fn counts_records_that_need_an_id() {
        let path = temp_path("id-less.json");
        let content = serde_json::json!([
            { "titulo": "a", "descripcion": "x", "prioridad": "low", "estado": "pending" },
            { "id": "", "titulo": "b", "descripcion": "x", "prioridad": "low", "estado": "pending" },
            { "id": 12, "titulo": "c", "descripcion": "x", "prioridad": "low", "estado": "pending" }
        ]);
        fs::write(&path, content.to_string()).unwrap();

        let fallback = load_with_fallback(&path);
        fs::remove_file(&path).ok();

        assert_eq!(fallback.tasks.len(), 3);
        assert_eq!(fallback.fresh_ids, 2);
        assert_eq!(fallback.tasks[2].id().as_str(), "12");
    }

    #[test]
    fn save_creates_parent_directory() {
        let dir = temp_path("nested");
        let path = dir.join("deeper").join("tasks.json");

        save_tasks(&path, &[]).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(content.trim(), "[]");
    }
}
