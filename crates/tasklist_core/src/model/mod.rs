mod task;

pub use task::{Difficulty, Priority, Task, TaskDraft, TaskId, TaskStatus, TaskUpdate};
