//! Single source of truth for the signed-in user's task list within a
//! screen's lifetime. Mediates every read and write to the gateway and keeps
//! the local list consistent with server state.
//!
//! Mutations follow an optimistic pattern: apply the returned row locally,
//! re-sort in memory for immediate feedback, then re-issue the fetch so the
//! server stays authoritative for ordering and generated fields.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::gateway::TaskGateway;
use crate::session::Session;
use crate::sort::{SortMode, sort_tasks};
use crate::task::{NewTask, Task, TaskDraft, TaskPatch};

pub struct TaskRepository {
    gateway: Arc<dyn TaskGateway>,
    tasks: Vec<Task>,
    pub loading: bool,
    pub error: Option<String>,
}

impl std::fmt::Debug for TaskRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRepository")
            .field("tasks", &self.tasks.len())
            .field("loading", &self.loading)
            .field("error", &self.error)
            .finish()
    }
}

impl TaskRepository {
    pub fn new(gateway: Arc<dyn TaskGateway>) -> Self {
        Self {
            gateway,
            tasks: Vec::new(),
            loading: false,
            error: None,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Replaces the local list with the server result in server order. On
    /// failure the message is captured and the prior list is left untouched.
    /// Without a signed-in user this is a silent no-op.
    #[tracing::instrument(skip(self, session))]
    pub fn fetch(&mut self, session: &Session, sort: SortMode) {
        let Some(user) = session.user() else {
            debug!("fetch skipped: no signed-in user");
            return;
        };
        let user_id = user.id;

        self.begin();
        match self.gateway.select_tasks(user_id, sort.into()) {
            Ok(rows) => {
                debug!(count = rows.len(), "fetched tasks");
                self.tasks = rows;
            }
            Err(err) => {
                warn!(error = %err, "fetch failed");
                self.error = Some(err.to_string());
            }
        }
        self.loading = false;
    }

    /// Inserts a task owned by the current user. The created row is appended
    /// and the list re-sorted locally, then the follow-up fetch reconciles
    /// with server state. Returns the created task even when that follow-up
    /// fails; its message lands in `error`.
    #[tracing::instrument(skip(self, session, draft))]
    pub fn create(
        &mut self,
        session: &Session,
        draft: TaskDraft,
        sort: SortMode,
        now: DateTime<Utc>,
    ) -> Option<Task> {
        let user = session.user()?;
        let row = NewTask::from_draft(draft, user.id, now);

        self.begin();
        let created = match self.gateway.insert_task(row) {
            Ok(task) => task,
            Err(err) => {
                warn!(error = %err, "create failed");
                self.error = Some(err.to_string());
                self.loading = false;
                return None;
            }
        };
        self.loading = false;

        self.tasks.push(created.clone());
        self.tasks = sort_tasks(&self.tasks, sort);

        self.fetch(session, sort);
        Some(created)
    }

    /// Partial update keyed by id; the id itself never travels in the patch.
    /// The returned row replaces the matching local entry before the
    /// authoritative re-fetch.
    #[tracing::instrument(skip(self, session, patch), fields(id = %id))]
    pub fn update(
        &mut self,
        session: &Session,
        id: Uuid,
        patch: &TaskPatch,
        sort: SortMode,
        now: DateTime<Utc>,
    ) -> Option<Task> {
        session.user()?;

        self.begin();
        let updated = match self.gateway.update_task(id, patch, now) {
            Ok(task) => task,
            Err(err) => {
                warn!(error = %err, "update failed");
                self.error = Some(err.to_string());
                self.loading = false;
                return None;
            }
        };
        self.loading = false;

        for task in &mut self.tasks {
            if task.id == id {
                *task = updated.clone();
            }
        }
        self.tasks = sort_tasks(&self.tasks, sort);

        self.fetch(session, sort);
        Some(updated)
    }

    /// Permanent single delete. Success drops the local entry.
    #[tracing::instrument(skip(self, session), fields(id = %id))]
    pub fn delete(&mut self, session: &Session, id: Uuid) -> bool {
        if session.user().is_none() {
            debug!("delete skipped: no signed-in user");
            return false;
        }

        self.begin();
        let result = self.gateway.delete_task(id);
        self.loading = false;

        match result {
            Ok(()) => {
                self.tasks.retain(|t| t.id != id);
                true
            }
            Err(err) => {
                warn!(error = %err, "delete failed");
                self.error = Some(err.to_string());
                false
            }
        }
    }

    /// Bulk delete used for clearing archived tasks. Success drops exactly
    /// the deleted ids from local state.
    #[tracing::instrument(skip(self, session, tasks))]
    pub fn clear_archived(&mut self, session: &Session, tasks: &[Task]) -> bool {
        if session.user().is_none() {
            debug!("clear skipped: no signed-in user");
            return false;
        }

        let ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();

        self.begin();
        let result = self.gateway.delete_tasks(&ids);
        self.loading = false;

        match result {
            Ok(()) => {
                self.tasks.retain(|t| !ids.contains(&t.id));
                true
            }
            Err(err) => {
                warn!(error = %err, "bulk delete failed");
                self.error = Some(err.to_string());
                false
            }
        }
    }

    fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }
}
