pub mod config;
pub mod error;
pub mod model;
pub mod storage;
pub mod store;
pub mod task_api;
pub mod validation;

#[cfg(test)]
mod tests {
    use crate::error::AppError;
    use crate::model::{Priority, Task, TaskDraft, TaskStatus};
    use time::macros::datetime;

    #[test]
    fn task_has_required_fields() {
        let task = Task::create(
            TaskDraft::new(
                "demo",
                "demo description",
                Priority::Low,
                TaskStatus::Pending,
                datetime!(2026-12-20 03:00 UTC),
            ),
            datetime!(2026-12-01 09:00 UTC),
        );

        assert_eq!(task.title(), "demo");
        assert_eq!(task.description(), "demo description");
        assert_eq!(task.priority(), Priority::Low);
        assert_eq!(task.status(), TaskStatus::Pending);
        assert_eq!(task.difficulty().value(), 3);
        assert_eq!(task.due_at(), datetime!(2026-12-20 03:00 UTC));
        assert!(task.created_at() <= task.last_edited_at());
    }

    #[test]
    fn app_error_exposes_code() {
        let err = AppError::invalid_input("missing title");
        assert_eq!(err.code(), "invalid_input");
    }
}
