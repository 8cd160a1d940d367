//! View-model for the task screen: composes the repository with UI state
//! (search term, sort mode, toast queue, staged delete confirmation) and
//! derives the visible list.

use chrono::{DateTime, Utc};
use tracing::debug;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;
use uuid::Uuid;

use crate::repo::TaskRepository;
use crate::session::Session;
use crate::sort::SortMode;
use crate::task::{Task, TaskDraft, TaskPatch};
use crate::toast::{Severity, ToastQueue};

/// Two-step delete confirmation: a requested delete waits for an explicit
/// confirm; cancelling discards the target without any gateway call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteConfirm {
    #[default]
    Idle,
    AwaitingConfirmation(Uuid),
}

pub struct TaskScreen {
    pub repo: TaskRepository,
    pub toasts: ToastQueue,
    sort: SortMode,
    search_term: String,
    delete_confirm: DeleteConfirm,
}

impl std::fmt::Debug for TaskScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskScreen")
            .field("sort", &self.sort)
            .field("search_term", &self.search_term)
            .field("delete_confirm", &self.delete_confirm)
            .finish()
    }
}

impl TaskScreen {
    pub fn new(repo: TaskRepository, sort: SortMode) -> Self {
        Self {
            repo,
            toasts: ToastQueue::new(),
            sort,
            search_term: String::new(),
            delete_confirm: DeleteConfirm::default(),
        }
    }

    pub fn sort(&self) -> SortMode {
        self.sort
    }

    pub fn delete_confirm(&self) -> DeleteConfirm {
        self.delete_confirm
    }

    /// Initial load: fetch with the persisted sort preference.
    pub fn mount(&mut self, session: &Session) {
        self.repo.fetch(session, self.sort);
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    /// Switches the ordering and re-fetches in server order. The caller
    /// persists the preference.
    pub fn change_sort(&mut self, session: &Session, sort: SortMode) {
        self.sort = sort;
        self.repo.fetch(session, sort);
    }

    /// The list as shown: archived tasks are hidden, and a present search
    /// term filters by case- and diacritic-insensitive title substring.
    pub fn visible_tasks(&self) -> Vec<&Task> {
        let needle = normalize(&self.search_term);
        self.repo
            .tasks()
            .iter()
            .filter(|task| !task.archived)
            .filter(|task| needle.is_empty() || normalize(&task.title).contains(&needle))
            .collect()
    }

    pub fn archived_tasks(&self) -> Vec<&Task> {
        self.repo.tasks().iter().filter(|task| task.archived).collect()
    }

    pub fn add_task(&mut self, session: &Session, draft: TaskDraft, now: DateTime<Utc>) {
        match self.repo.create(session, draft, self.sort, now) {
            Some(_) => self.toast("Task created successfully!", Severity::Success, now),
            None => self.toast("Failed to create task.", Severity::Error, now),
        }
    }

    pub fn save_edit(&mut self, session: &Session, id: Uuid, patch: TaskPatch, now: DateTime<Utc>) {
        match self.repo.update(session, id, &patch, self.sort, now) {
            Some(_) => self.toast("Task updated successfully!", Severity::Update, now),
            None => self.toast("Failed to update task.", Severity::Error, now),
        }
    }

    /// Completion toggle from the list row. Only failures toast.
    pub fn set_completed(
        &mut self,
        session: &Session,
        id: Uuid,
        completed: bool,
        now: DateTime<Utc>,
    ) {
        let patch = TaskPatch {
            completed: Some(completed),
            ..TaskPatch::default()
        };
        if self.repo.update(session, id, &patch, self.sort, now).is_none() {
            self.toast(
                "Unexpected error while marking the task as complete.",
                Severity::Error,
                now,
            );
        }
    }

    /// Archives a task. The UI only offers this for completed tasks, so a
    /// non-completed target gets a warning instead of a gateway call.
    pub fn set_archived(&mut self, session: &Session, id: Uuid, now: DateTime<Utc>) {
        let completed = self
            .repo
            .tasks()
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.completed);
        if completed != Some(true) {
            self.toast("Only completed tasks can be archived.", Severity::Warning, now);
            return;
        }

        let patch = TaskPatch {
            archived: Some(true),
            ..TaskPatch::default()
        };
        if self.repo.update(session, id, &patch, self.sort, now).is_none() {
            self.toast("Unexpected error while archiving the task.", Severity::Error, now);
        }
    }

    pub fn request_delete(&mut self, id: Uuid) {
        debug!(id = %id, "delete requested, awaiting confirmation");
        self.delete_confirm = DeleteConfirm::AwaitingConfirmation(id);
    }

    /// Discards the staged target without any gateway call.
    pub fn cancel_delete(&mut self) {
        self.delete_confirm = DeleteConfirm::Idle;
    }

    /// Fires the staged delete. A confirm with nothing staged is a no-op.
    pub fn confirm_delete(&mut self, session: &Session, now: DateTime<Utc>) {
        let DeleteConfirm::AwaitingConfirmation(id) = self.delete_confirm else {
            return;
        };
        self.delete_confirm = DeleteConfirm::Idle;

        if self.repo.delete(session, id) {
            self.toast("Task deleted successfully!", Severity::Success, now);
        } else {
            self.toast("Failed to delete task.", Severity::Error, now);
        }
    }

    /// Permanently deletes every archived task.
    pub fn clear_archived(&mut self, session: &Session, now: DateTime<Utc>) {
        let archived: Vec<Task> = self.archived_tasks().into_iter().cloned().collect();
        if self.repo.clear_archived(session, &archived) {
            self.toast("All archived tasks were deleted!", Severity::Success, now);
        } else {
            self.toast("Failed to delete archived tasks.", Severity::Error, now);
        }
    }

    fn toast(&mut self, message: &str, severity: Severity, now: DateTime<Utc>) {
        self.toasts.push(message, severity, now);
    }
}

/// Search normalization: lowercase, decompose, strip combining marks, trim.
/// Makes "café" match "Cafe run" and vice versa.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use tempfile::tempdir;

    use super::*;
    use crate::gateway::AuthGateway;
    use crate::gateway::local::LocalStore;
    use crate::task::Priority;

    fn screen_with_user() -> (TaskScreen, Session, tempfile::TempDir) {
        let temp = tempdir().expect("tempdir");
        let store = Arc::new(LocalStore::open(temp.path()).expect("open store"));
        store
            .sign_up("Ana", "ana@example.com", "Abc123!")
            .expect("sign up");
        let session = Session::restore(store.clone());
        let screen = TaskScreen::new(TaskRepository::new(store), SortMode::Default);
        (screen, session, temp)
    }

    fn draft(title: &str) -> TaskDraft {
        TaskDraft {
            title: title.to_string(),
            description: String::new(),
            deadline: None,
            priority: Priority::Medium,
        }
    }

    #[test]
    fn normalization_strips_case_and_diacritics() {
        assert_eq!(normalize("Café"), "cafe");
        assert_eq!(normalize("  AÇÃO  "), "acao");
        assert_eq!(normalize("plain"), "plain");
    }

    #[test]
    fn search_matches_across_diacritics() {
        let (mut screen, session, _temp) = screen_with_user();
        let now = Utc::now();
        screen.add_task(&session, draft("Cafe run"), now);
        screen.add_task(&session, draft("Laundry"), now);

        screen.set_search_term("café");
        let titles: Vec<&str> = screen.visible_tasks().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["Cafe run"]);
    }

    #[test]
    fn archived_tasks_are_hidden_from_the_visible_list() {
        let (mut screen, session, _temp) = screen_with_user();
        let now = Utc::now();
        screen.add_task(&session, draft("keep"), now);
        screen.add_task(&session, draft("hide"), now);

        let id = screen
            .repo
            .tasks()
            .iter()
            .find(|t| t.title == "hide")
            .map(|t| t.id)
            .expect("task present");
        screen.set_completed(&session, id, true, now);
        screen.set_archived(&session, id, now);

        let titles: Vec<&str> = screen.visible_tasks().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["keep"]);
        assert_eq!(screen.archived_tasks().len(), 1);
    }

    #[test]
    fn archiving_an_incomplete_task_warns_without_a_call() {
        let (mut screen, session, _temp) = screen_with_user();
        let now = Utc::now();
        screen.add_task(&session, draft("not done"), now);
        let id = screen.repo.tasks()[0].id;

        screen.set_archived(&session, id, now);

        assert!(!screen.repo.tasks()[0].archived);
        let last = screen.toasts.toasts().last().expect("toast pushed");
        assert_eq!(last.severity, Severity::Warning);
    }

    #[test]
    fn cancelled_delete_keeps_the_task() {
        let (mut screen, session, _temp) = screen_with_user();
        let now = Utc::now();
        screen.add_task(&session, draft("survivor"), now);
        let id = screen.repo.tasks()[0].id;

        screen.request_delete(id);
        assert_eq!(screen.delete_confirm(), DeleteConfirm::AwaitingConfirmation(id));
        screen.cancel_delete();
        assert_eq!(screen.delete_confirm(), DeleteConfirm::Idle);
        assert_eq!(screen.repo.tasks().len(), 1);
    }

    #[test]
    fn confirmed_delete_removes_the_task_and_resets_the_machine() {
        let (mut screen, session, _temp) = screen_with_user();
        let now = Utc::now();
        screen.add_task(&session, draft("doomed"), now);
        let id = screen.repo.tasks()[0].id;

        screen.request_delete(id);
        screen.confirm_delete(&session, now);

        assert_eq!(screen.delete_confirm(), DeleteConfirm::Idle);
        assert!(screen.repo.tasks().is_empty());

        // Fetch after the resolved delete must not resurrect the task.
        screen.mount(&session);
        assert!(screen.repo.tasks().is_empty());
    }

    #[test]
    fn confirm_with_nothing_staged_is_a_noop() {
        let (mut screen, session, _temp) = screen_with_user();
        let before = screen.toasts.toasts().len();
        screen.confirm_delete(&session, Utc::now());
        assert_eq!(screen.toasts.toasts().len(), before);
    }
}
