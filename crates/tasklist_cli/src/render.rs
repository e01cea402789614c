use std::collections::BTreeMap;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tasklist_core::config::Palette;
use tasklist_core::model::{Difficulty, Task, TaskStatus};
use tasklist_core::store::TaskStore;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

pub fn format_date(value: OffsetDateTime) -> String {
    value
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| "-".to_string())
}

fn format_timestamp(value: OffsetDateTime) -> Option<String> {
    value.format(&Rfc3339).ok()
}

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Diff.")]
    difficulty: u8,
    #[tabled(rename = "Due")]
    due: String,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id().to_string(),
            title: task.title().to_string(),
            priority: task.priority().to_string(),
            status: task.status().to_string(),
            difficulty: task.difficulty().value(),
            due: format_date(task.due_at()),
        }
    }
}

pub fn task_table(tasks: &[&Task], palette: &Palette) -> String {
    if tasks.is_empty() {
        return palette.dim("No tasks to show.");
    }

    let rows: Vec<TaskRow> = tasks.iter().map(|task| TaskRow::from(*task)).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

pub fn task_detail(task: &Task, palette: &Palette) -> String {
    let lines = [
        ("ID", task.id().to_string()),
        ("Title", task.title().to_string()),
        ("Description", task.description().to_string()),
        ("Priority", task.priority().to_string()),
        ("Status", task.status().to_string()),
        ("Difficulty", task.difficulty().to_string()),
        ("Created", format_date(task.created_at())),
        ("Due", format_date(task.due_at())),
        ("Last edited", format_date(task.last_edited_at())),
    ];

    lines
        .iter()
        .map(|(label, value)| format!("{}: {}", palette.heading(label), value))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn task_json(task: &Task) -> serde_json::Value {
    serde_json::json!({
        "id": task.id(),
        "title": task.title(),
        "description": task.description(),
        "priority": task.priority(),
        "status": task.status(),
        "difficulty": task.difficulty(),
        "created_at": format_timestamp(task.created_at()),
        "due_at": format_timestamp(task.due_at()),
        "last_edited_at": format_timestamp(task.last_edited_at()),
    })
}

pub fn tasks_json(tasks: &[&Task]) -> serde_json::Value {
    serde_json::Value::Array(tasks.iter().map(|task| task_json(task)).collect())
}

pub fn stats_json(store: &TaskStore) -> serde_json::Value {
    let statuses = stat_entries(&store.count_by_status(), &store.percent_by_status(), |s| {
        s.label().to_string()
    });
    let difficulties = stat_entries(
        &store.count_by_difficulty(),
        &store.percent_by_difficulty(),
        |d| d.to_string(),
    );

    serde_json::json!({
        "total": store.len(),
        "by_status": statuses,
        "by_difficulty": difficulties,
    })
}

fn stat_entries<K: Ord>(
    counts: &BTreeMap<K, usize>,
    percents: &BTreeMap<K, f64>,
    key: impl Fn(&K) -> String,
) -> serde_json::Map<String, serde_json::Value> {
    counts
        .iter()
        .map(|(k, count)| {
            let percent = percents.get(k).copied().unwrap_or(0.0);
            (
                key(k),
                serde_json::json!({ "count": count, "percent": percent }),
            )
        })
        .collect()
}

pub fn stats_plain(store: &TaskStore, palette: &Palette) -> String {
    let mut out = vec![format!("{} {}", palette.heading("Total tasks:"), store.len())];

    out.push(palette.heading("By status:"));
    let percents = store.percent_by_status();
    for (status, count) in store.count_by_status() {
        out.push(stat_line(status.label(), count, percent_of(&percents, &status)));
    }

    out.push(palette.heading("By difficulty:"));
    let counts = store.count_by_difficulty();
    if counts.is_empty() {
        out.push(palette.dim("  (no tasks)"));
    }
    let percents = store.percent_by_difficulty();
    for (difficulty, count) in counts {
        out.push(stat_line(
            &difficulty_label(difficulty),
            count,
            percent_of(&percents, &difficulty),
        ));
    }

    out.join("\n")
}

fn percent_of<K: Ord>(percents: &BTreeMap<K, f64>, key: &K) -> f64 {
    percents.get(key).copied().unwrap_or(0.0)
}

fn difficulty_label(difficulty: Difficulty) -> String {
    format!("difficulty {difficulty}")
}

fn stat_line(label: &str, count: usize, percent: f64) -> String {
    format!("  {label:<14} {count:>4}  {percent:>6.2}%")
}

pub fn status_heading(status: TaskStatus) -> String {
    format!("Tasks with status {}", status.label().to_uppercase())
}
