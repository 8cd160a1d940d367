pub mod local;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::sort::SortMode;
use crate::task::{NewTask, Task, TaskPatch, User};

/// Server-side order clause for a task select, one per sort mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOrder {
    CreatedDesc,
    PriorityAsc,
    TitleAsc,
    DeadlineAscNullsLast,
}

impl From<SortMode> for TaskOrder {
    fn from(mode: SortMode) -> Self {
        match mode {
            SortMode::Default => TaskOrder::CreatedDesc,
            SortMode::Urgents => TaskOrder::PriorityAsc,
            SortMode::Az => TaskOrder::TitleAsc,
            SortMode::Deadline => TaskOrder::DeadlineAscNullsLast,
        }
    }
}

/// Row-level task storage behind the hosted backend. Errors carry the
/// backend's message verbatim; callers surface it without classifying.
pub trait TaskGateway {
    /// All tasks owned by one user, in the requested server order.
    fn select_tasks(&self, user_id: Uuid, order: TaskOrder) -> anyhow::Result<Vec<Task>>;

    /// Inserts one row and returns it with the assigned id.
    fn insert_task(&self, row: NewTask) -> anyhow::Result<Task>;

    /// Partial update keyed by id. Returns the full updated row.
    fn update_task(&self, id: Uuid, patch: &TaskPatch, now: DateTime<Utc>)
    -> anyhow::Result<Task>;

    /// Deletes one row. Deletion is permanent.
    fn delete_task(&self, id: Uuid) -> anyhow::Result<()>;

    /// Deletes every row whose id is in the list.
    fn delete_tasks(&self, ids: &[Uuid]) -> anyhow::Result<()>;
}

/// Session and account operations of the backend. The task core only ever
/// consumes the current user this produces.
pub trait AuthGateway {
    fn sign_up(&self, name: &str, email: &str, password: &str) -> anyhow::Result<User>;

    fn sign_in_with_password(&self, email: &str, password: &str) -> anyhow::Result<User>;

    fn sign_out(&self) -> anyhow::Result<()>;

    /// Restores the persisted session, if any.
    fn get_session(&self) -> anyhow::Result<Option<User>>;

    fn reset_password_for_email(&self, email: &str) -> anyhow::Result<()>;

    /// Changes the password of the currently signed-in account.
    fn update_user_password(&self, new_password: &str) -> anyhow::Result<User>;
}
