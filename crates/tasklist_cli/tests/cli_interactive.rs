use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};
use time::macros::format_description;
use tasklist_core::validation;
use time::Duration;

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("tasklist-{nanos}-{file_name}"))
}

fn due_parts(days: i64) -> (String, String, String) {
    let due = validation::today() + Duration::days(days);
    (
        due.format(format_description!("[year]")).unwrap(),
        due.format(format_description!("[month]")).unwrap(),
        due.format(format_description!("[day]")).unwrap(),
    )
}

fn run_session(store_path: &PathBuf, input: &str) -> std::process::Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_tasklist"))
        .env("TASKLIST_STORE_PATH", store_path)
        .env("TASKLIST_CONFIG_PATH", temp_path("missing-config.json"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to start tasklist");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().expect("failed to wait for tasklist")
}

#[test]
fn interactive_add_prompts_and_retries() {
    let store_path = temp_path("cli-interactive-add.json");
    let (year, month, day) = due_parts(15);
    let input = format!(
        "add\n\nGroceries\nEggs and bread\n7\n2\n1\n{year}\n13\n{month}\n{day}\n\nlist --json\nexit\n"
    );

    let output = run_session(&store_path, &input);
    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&store_path).unwrap()).unwrap();
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("0 tasks loaded"));
    assert!(stdout.contains("title is required. Try again."));
    assert!(stdout.contains("month must be 01-12. Try again."));
    assert!(stdout.contains("Added task: Groceries"));

    let task = &stored[0];
    assert_eq!(task["titulo"], "Groceries");
    assert_eq!(task["prioridad"], "medium");
    assert_eq!(task["estado"], "pending");
    assert_eq!(task["dificultad"], 3);
}

#[test]
fn interactive_errors_do_not_end_session() {
    let store_path = temp_path("cli-interactive-errors.json");

    let output = run_session(&store_path, "delete nope\nadd \"unterminated\nstats\nquit\n");
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: not_found"));
    assert!(stderr.contains("ERROR: invalid_input - unterminated quote in command"));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Total tasks: 0"));
}

#[test]
fn help_prints_usage_and_succeeds() {
    let store_path = temp_path("cli-help.json");

    let output = run_session(&store_path, "?\n");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Usage:"));

    let output = Command::new(env!("CARGO_BIN_EXE_tasklist"))
        .arg("--help")
        .env("TASKLIST_STORE_PATH", &store_path)
        .output()
        .expect("failed to run tasklist");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("stats"));
    assert!(!store_path.exists());
}
